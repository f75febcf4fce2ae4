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

//! Periodic state replication
//!
//! The server broadcasts every controller's possessed pawn and each
//! participant broadcasts the positions of the pawns it has authority over.
//! The latest value is re-sent every interval so late or lossy receivers
//! converge.

use super::possession::{bind, unbind_controller};
use crate::ecs::components::{Authority, Controller, Identity, Position};
use crate::ecs::events::{EventBus, GameEvent};
use crate::ecs::registry::EntityRegistry;
use crate::ecs::{EcsEntity, GameWorld};
use pitlane_common::{EntityPath, NodeKind, ParticipantId, Payload, RoleContext, Transport, Vec2};
use std::sync::Arc;

/// Slack absorbing float error when summed frame deltas land on an interval
const INTERVAL_TOLERANCE: f64 = 1e-9;

pub struct ReplicationSystem {
    role: RoleContext,
    transport: Arc<dyn Transport>,
    interval: f64,
    elapsed: f64,
}

impl ReplicationSystem {
    pub fn new(role: RoleContext, transport: Arc<dyn Transport>, interval: f64) -> Self {
        Self {
            role,
            transport,
            interval,
            elapsed: 0.0,
        }
    }

    /// Advance the replication clock, broadcasting when an interval elapsed
    ///
    /// Overshoot carries into the next interval so the broadcast rate does
    /// not drift with the tick rate. A delta spanning several intervals still
    /// broadcasts once.
    pub fn update(&mut self, world: &GameWorld, registry: &EntityRegistry, delta: f64) -> usize {
        self.elapsed += delta;
        if self.elapsed + INTERVAL_TOLERANCE < self.interval {
            return 0;
        }
        self.elapsed = (self.elapsed - self.interval).max(0.0) % self.interval;
        self.broadcast(world, registry)
    }

    /// Broadcast the state this participant has authority over
    pub fn broadcast(&self, world: &GameWorld, registry: &EntityRegistry) -> usize {
        let mut sent = 0;
        if self.role.is_server() {
            for (identity, controller) in world.query::<(&Identity, &Controller)>().iter() {
                let possessed = controller
                    .possessed()
                    .and_then(|pawn| registry.get_path(pawn).cloned());
                self.transport.broadcast(Payload::ControllerState {
                    controller: identity.path.clone(),
                    possessed,
                });
                sent += 1;
            }
        }

        let local = self.role.local_participant();
        for (identity, authority, position) in
            world.query::<(&Identity, &Authority, &Position)>().iter()
        {
            if identity.kind != NodeKind::Pawn || !authority.is(local) {
                continue;
            }
            self.transport.broadcast(Payload::PawnState {
                pawn: identity.path.clone(),
                position: position.0,
            });
            sent += 1;
        }
        tracing::trace!("Replicated {} states", sent);
        sent
    }

    /// Mirror a controller's possession as broadcast by the server
    pub fn apply_controller_state(
        &self,
        world: &mut GameWorld,
        registry: &EntityRegistry,
        event_bus: &EventBus,
        from: ParticipantId,
        controller_path: &EntityPath,
        possessed: Option<&EntityPath>,
    ) -> bool {
        if self.role.is_server() || !from.is_server() {
            tracing::trace!("Ignoring controller state for {} from {}", controller_path, from);
            return false;
        }
        let Some(controller) = registry.get_entity(controller_path) else {
            tracing::trace!("Controller state for unknown {}", controller_path);
            return false;
        };
        match possessed {
            None => {
                if let Some(pawn) = unbind_controller(world, controller) {
                    event_bus.publish(GameEvent::Unpossessed { controller, pawn });
                }
                true
            }
            Some(pawn_path) => {
                let Some(pawn) = registry.get_entity(pawn_path) else {
                    tracing::trace!("Controller state names unknown pawn {}", pawn_path);
                    return false;
                };
                bind(world, event_bus, controller, pawn).is_ok()
            }
        }
    }

    /// Apply a pawn position sent by that pawn's authority
    pub fn apply_pawn_state(
        &self,
        world: &mut GameWorld,
        registry: &EntityRegistry,
        from: ParticipantId,
        pawn_path: &EntityPath,
        position: Vec2,
    ) -> Option<EcsEntity> {
        let pawn = registry.get_entity(pawn_path)?;
        let authority = world.get::<&Authority>(pawn).ok()?.participant();
        if authority != from || self.role.is_local(from) {
            tracing::trace!(
                "Ignoring position of {} from {}, authority is {}",
                pawn_path,
                from,
                authority
            );
            return None;
        }
        world.get::<&mut Position>(pawn).ok()?.0 = position;
        Some(pawn)
    }
}
