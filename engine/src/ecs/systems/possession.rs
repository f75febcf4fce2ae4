//
// Copyright 2025-2026 Hans W. Uhlig. All Rights Reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//

//! Possession protocol
//!
//! Only the authoritative role may decide a possession. The decision is
//! applied locally at once and mirrored to the owning participant with a
//! directed `ClientPossess` message; everybody else converges through the
//! periodic controller state broadcast.

use crate::ecs::components::{Authority, Controller, Pawn};
use crate::ecs::events::{EventBus, GameEvent};
use crate::ecs::registry::EntityRegistry;
use crate::ecs::{EcsEntity, GameWorld};
use pitlane_common::{EntityPath, ParticipantId, Payload, Role, RoleContext, Transport};
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PossessionError {
    #[error("participant {participant} with role {role} is not allowed to possess")]
    AuthorityViolation {
        participant: ParticipantId,
        role: Role,
    },
    #[error("entity {0:?} is not a controller")]
    ControllerNotFound(EcsEntity),
    #[error("entity {0:?} is not a pawn")]
    PawnNotFound(EcsEntity),
    #[error("entity {0:?} has no replicated path")]
    Unregistered(EcsEntity),
}

pub struct PossessionSystem {
    role: RoleContext,
    transport: Arc<dyn Transport>,
    event_bus: EventBus,
}

impl PossessionSystem {
    pub fn new(role: RoleContext, transport: Arc<dyn Transport>, event_bus: EventBus) -> Self {
        Self {
            role,
            transport,
            event_bus,
        }
    }

    pub fn role(&self) -> &RoleContext {
        &self.role
    }

    /// Bind `controller` to `pawn` and notify the owning participant
    pub fn possess(
        &self,
        world: &mut GameWorld,
        registry: &EntityRegistry,
        controller: EcsEntity,
        pawn: EcsEntity,
    ) -> Result<(), PossessionError> {
        if !self.role.is_server() {
            tracing::error!(
                "Participant {} ({}) attempted to possess {:?} with {:?}",
                self.role.local_participant(),
                self.role.role(),
                pawn,
                controller
            );
            return Err(PossessionError::AuthorityViolation {
                participant: self.role.local_participant(),
                role: self.role.role(),
            });
        }

        let controller_path = registry
            .get_path(controller)
            .cloned()
            .ok_or(PossessionError::Unregistered(controller))?;
        let pawn_path = registry
            .get_path(pawn)
            .cloned()
            .ok_or(PossessionError::Unregistered(pawn))?;

        let participant = bind(world, &self.event_bus, controller, pawn)?;
        tracing::debug!("{} possessed {}", controller_path, pawn_path);

        if !self.role.is_local(participant) {
            let payload = Payload::ClientPossess {
                controller: controller_path,
                pawn: pawn_path,
            };
            if let Err(e) = self.transport.send_to(participant, payload) {
                tracing::warn!("Failed to send ClientPossess to {}: {}", participant, e);
            }
        }
        Ok(())
    }

    /// Release whatever `controller` possesses
    pub fn unpossess(&self, world: &mut GameWorld, controller: EcsEntity) -> Option<EcsEntity> {
        let pawn = unbind_controller(world, controller)?;
        self.event_bus
            .publish(GameEvent::Unpossessed { controller, pawn });
        Some(pawn)
    }

    /// Mirror a possession announced by the server
    ///
    /// Returns whether the binding was applied. Paths that do not resolve
    /// locally are ignored.
    pub fn client_possess(
        &self,
        world: &mut GameWorld,
        registry: &EntityRegistry,
        from: ParticipantId,
        controller_path: &EntityPath,
        pawn_path: &EntityPath,
    ) -> bool {
        if !from.is_server() {
            tracing::warn!(
                "Ignoring ClientPossess({}) from non-server participant {}",
                pawn_path,
                from
            );
            return false;
        }
        let Some(pawn) = registry.get_entity(pawn_path) else {
            tracing::debug!("ClientPossess for unknown pawn {}", pawn_path);
            return false;
        };
        let Some(controller) = registry.get_entity(controller_path) else {
            tracing::debug!("ClientPossess for unknown controller {}", controller_path);
            return false;
        };
        match bind(world, &self.event_bus, controller, pawn) {
            Ok(_) => true,
            Err(e) => {
                tracing::warn!("Failed to mirror possession of {}: {}", pawn_path, e);
                false
            }
        }
    }
}

/// Bind a controller and a pawn, releasing both sides' previous partners
///
/// The pawn's authority becomes the controller's participant. Events are
/// only published when the binding actually changes. Returns the
/// controller's participant.
pub fn bind(
    world: &mut GameWorld,
    event_bus: &EventBus,
    controller: EcsEntity,
    pawn: EcsEntity,
) -> Result<ParticipantId, PossessionError> {
    let (participant, previous_pawn) = match world.get::<&Controller>(controller) {
        Ok(c) => (c.participant, c.possessed()),
        Err(_) => return Err(PossessionError::ControllerNotFound(controller)),
    };
    let previous_controller = match world.get::<&Pawn>(pawn) {
        Ok(p) => p.possessed_by,
        Err(_) => return Err(PossessionError::PawnNotFound(pawn)),
    };

    let changed = previous_pawn != Some(pawn) || previous_controller != Some(controller);

    if let Some(old_pawn) = previous_pawn.filter(|p| *p != pawn) {
        if let Ok(mut old) = world.get::<&mut Pawn>(old_pawn) {
            if old.possessed_by == Some(controller) {
                old.possessed_by = None;
            }
        }
        event_bus.publish(GameEvent::Unpossessed {
            controller,
            pawn: old_pawn,
        });
    }

    if let Some(old_controller) = previous_controller.filter(|c| *c != controller) {
        if let Ok(mut old) = world.get::<&mut Controller>(old_controller) {
            if old.is_possessing(pawn) {
                old.release();
            }
        }
        event_bus.publish(GameEvent::Unpossessed {
            controller: old_controller,
            pawn,
        });
    }

    if let Ok(mut c) = world.get::<&mut Controller>(controller) {
        c.possess(pawn);
    }
    if let Ok(mut p) = world.get::<&mut Pawn>(pawn) {
        p.possessed_by = Some(controller);
    }
    let authority_set = match world.get::<&mut Authority>(pawn) {
        Ok(mut authority) => {
            authority.0 = participant;
            true
        }
        Err(_) => false,
    };
    if !authority_set {
        if let Err(e) = world.insert_one(pawn, Authority(participant)) {
            tracing::warn!("Failed to grant authority over {:?}: {}", pawn, e);
        }
    }

    if changed {
        event_bus.publish(GameEvent::Possessed { controller, pawn });
    }
    Ok(participant)
}

/// Clear a controller's possession, returning the released pawn
pub fn unbind_controller(world: &mut GameWorld, controller: EcsEntity) -> Option<EcsEntity> {
    let pawn = match world.get::<&mut Controller>(controller) {
        Ok(mut c) => c.release()?,
        Err(_) => return None,
    };
    if let Ok(mut p) = world.get::<&mut Pawn>(pawn) {
        if p.possessed_by == Some(controller) {
            p.possessed_by = None;
        }
    }
    Some(pawn)
}

/// Detach a pawn from its controller, returning the controller
pub fn release_pawn(world: &mut GameWorld, pawn: EcsEntity) -> Option<EcsEntity> {
    let controller = match world.get::<&mut Pawn>(pawn) {
        Ok(mut p) => p.possessed_by.take()?,
        Err(_) => return None,
    };
    if let Ok(mut c) = world.get::<&mut Controller>(controller) {
        if c.is_possessing(pawn) {
            c.release();
        }
    }
    Some(controller)
}
