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

//! Server-side session coordinator
//!
//! Creates a controller for every participant that connects, spawns and
//! possesses a pawn for it at the next flush, and tears both down when the
//! participant leaves.

use crate::ecs::components::{Controller, Pawn};
use crate::ecs::events::{EventBus, GameEvent};
use crate::ecs::systems::{PossessionError, PossessionSystem};
use crate::ecs::{EcsEntity, RegistryError, WorldContext};
use pitlane_common::{
    EntityPath, NodeKind, ParticipantId, Payload, Role, RoleContext, Transport, Vec2,
};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoordinatorError {
    #[error("the session coordinator only runs on the server, not as {0}")]
    NotServer(Role),
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error(transparent)]
    Possession(#[from] PossessionError),
}

/// Work postponed to the next flush
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Deferred {
    Join(ParticipantId),
    Restart(ParticipantId),
}

impl Deferred {
    fn participant(&self) -> ParticipantId {
        match self {
            Deferred::Join(p) | Deferred::Restart(p) => *p,
        }
    }
}

pub struct GameMode {
    role: RoleContext,
    transport: Arc<dyn Transport>,
    possession: PossessionSystem,
    event_bus: EventBus,
    controllers: HashMap<ParticipantId, EcsEntity>,
    pending: VecDeque<Deferred>,
    started: bool,
}

impl GameMode {
    pub fn new(
        role: RoleContext,
        transport: Arc<dyn Transport>,
        event_bus: EventBus,
    ) -> Result<Self, CoordinatorError> {
        if !role.is_server() {
            return Err(CoordinatorError::NotServer(role.role()));
        }
        Ok(Self {
            role,
            possession: PossessionSystem::new(role, Arc::clone(&transport), event_bus.clone()),
            transport,
            event_bus,
            controllers: HashMap::new(),
            pending: VecDeque::new(),
            started: false,
        })
    }

    /// Begin the session, queueing the local player unless the server is dedicated
    pub fn start(&mut self) {
        if self.started {
            return;
        }
        self.started = true;
        tracing::info!(
            "Session started as {}{}",
            self.role.role(),
            if self.role.is_dedicated() { " (dedicated)" } else { "" }
        );
        if self.role.has_local_player() {
            self.pending
                .push_back(Deferred::Join(self.role.local_participant()));
        }
    }

    pub fn possession(&self) -> &PossessionSystem {
        &self.possession
    }

    /// Create a controller for a newly connected participant
    ///
    /// Its pawn is spawned at the next [`GameMode::flush_deferred`].
    pub fn on_participant_connected(
        &mut self,
        context: &mut WorldContext,
        participant: ParticipantId,
    ) -> Result<EcsEntity, CoordinatorError> {
        if let Some(existing) = self.controllers.get(&participant) {
            tracing::warn!("Participant {} is already connected", participant);
            return Ok(*existing);
        }

        if !self.role.is_local(participant) {
            for payload in context.snapshot() {
                if let Err(e) = self.transport.send_to(participant, payload) {
                    tracing::warn!("Failed to send world state to {}: {}", participant, e);
                    break;
                }
            }
        }

        let path = EntityPath::controller(participant);
        let controller = context.spawn_controller(path.clone(), participant)?;
        self.controllers.insert(participant, controller);
        self.event_bus.publish(GameEvent::ControllerCreated {
            controller,
            participant,
        });
        self.announce(Payload::Spawned {
            path,
            kind: NodeKind::Controller,
            authority: participant,
            position: Vec2::ZERO,
        });
        self.pending.push_back(Deferred::Restart(participant));

        tracing::info!("Participant {} connected", participant);
        Ok(controller)
    }

    /// Run work deferred by earlier calls, returning how many items ran
    ///
    /// Work queued while flushing runs on the next flush.
    pub fn flush_deferred(&mut self, context: &mut WorldContext) -> usize {
        let batch: Vec<Deferred> = self.pending.drain(..).collect();
        for deferred in &batch {
            let result = match *deferred {
                Deferred::Join(participant) => self
                    .on_participant_connected(context, participant)
                    .map(|_| ()),
                Deferred::Restart(participant) => match self.controllers.get(&participant) {
                    Some(&controller) => self.restart_player(context, controller).map(|_| ()),
                    None => {
                        tracing::debug!("Skipping restart of departed participant {}", participant);
                        Ok(())
                    }
                },
            };
            if let Err(e) = result {
                tracing::error!("Deferred {:?} failed: {}", deferred, e);
            }
        }
        batch.len()
    }

    /// Spawn a fresh pawn for `controller` and possess it
    ///
    /// Any pawn the controller already possesses is despawned first.
    pub fn restart_player(
        &mut self,
        context: &mut WorldContext,
        controller: EcsEntity,
    ) -> Result<EcsEntity, CoordinatorError> {
        let (participant, previous) = match context.world().get::<&Controller>(controller) {
            Ok(c) => (c.participant, c.possessed()),
            Err(_) => return Err(PossessionError::ControllerNotFound(controller).into()),
        };
        if let Some(previous) = previous {
            self.despawn_pawn(context, previous);
        }

        let path = EntityPath::pawn(participant);
        if let Some(stale) = context.resolve(&path) {
            self.despawn_pawn(context, stale);
        }

        let position = context.scene().start_location().unwrap_or(Vec2::ZERO);
        let pawn = context.spawn_pawn(path.clone(), participant, position)?;
        self.event_bus.publish(GameEvent::PawnSpawned {
            pawn,
            authority: participant,
        });
        self.announce(Payload::Spawned {
            path,
            kind: NodeKind::Pawn,
            authority: participant,
            position,
        });

        let (world, registry) = context.split_mut();
        self.possession.possess(world, registry, controller, pawn)?;
        tracing::info!("Restarted player {} at {:?}", participant, position);
        Ok(pawn)
    }

    /// Remove a pawn and tell every client
    pub fn despawn_pawn(
        &mut self,
        context: &mut WorldContext,
        pawn: EcsEntity,
    ) -> Option<EntityPath> {
        let possessed_by = context
            .world()
            .get::<&Pawn>(pawn)
            .ok()
            .and_then(|p| p.possessed_by);
        let path = context.despawn(pawn)?;
        if let Some(controller) = possessed_by {
            self.event_bus
                .publish(GameEvent::Unpossessed { controller, pawn });
        }
        self.event_bus.publish(GameEvent::PawnDespawned { pawn });
        self.announce(Payload::Despawned { path: path.clone() });
        Some(path)
    }

    /// Tear down a departed participant's controller and pawn
    ///
    /// Returns false for participants that are not connected.
    pub fn on_participant_disconnected(
        &mut self,
        context: &mut WorldContext,
        participant: ParticipantId,
    ) -> bool {
        let Some(controller) = self.controllers.remove(&participant) else {
            tracing::debug!("Disconnect of unknown participant {}", participant);
            return false;
        };
        self.pending.retain(|d| d.participant() != participant);

        let pawn = context
            .world()
            .get::<&Controller>(controller)
            .ok()
            .and_then(|c| c.possessed());
        if let Some(pawn) = pawn {
            self.despawn_pawn(context, pawn);
        }
        if let Some(path) = context.despawn(controller) {
            self.announce(Payload::Despawned { path });
        }
        self.event_bus
            .publish(GameEvent::ControllerRemoved { participant });

        tracing::info!("Participant {} disconnected", participant);
        true
    }

    pub fn controller_for(&self, participant: ParticipantId) -> Option<EcsEntity> {
        self.controllers.get(&participant).copied()
    }

    pub fn controller_count(&self) -> usize {
        self.controllers.len()
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn participants(&self) -> impl Iterator<Item = ParticipantId> + '_ {
        self.controllers.keys().copied()
    }

    /// Send a reliable message to every connected remote participant
    fn announce(&self, payload: Payload) {
        for participant in self.controllers.keys() {
            if self.role.is_local(*participant) {
                continue;
            }
            if let Err(e) = self.transport.send_to(*participant, payload.clone()) {
                tracing::warn!("Failed to send {} to {}: {}", payload.name(), participant, e);
            }
        }
    }
}

impl std::fmt::Debug for GameMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameMode")
            .field("role", &self.role)
            .field("controllers", &self.controllers)
            .field("pending", &self.pending)
            .finish_non_exhaustive()
    }
}
