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

//! Per-process runtime
//!
//! A [`Participant`] owns one local replica of the world together with the
//! systems that drive it. Servers additionally run the session coordinator.

use crate::config::Configuration;
use crate::coordinator::{CoordinatorError, GameMode};
use crate::ecs::components::{Authority, CollisionLayers, DragInput, GameLayer, Pawn};
use crate::ecs::events::{EventBus, GameEvent};
use crate::ecs::systems::{EffectSystem, MovementSystem, PossessionSystem, ReplicationSystem};
use crate::ecs::{EcsEntity, WorldContext};
use crate::gameplay::{EffectApplication, EffectError, GameplayEffect, SourceId};
use crate::hud::{HealthBar, HealthReadout, HudManager};
use crate::scene::SceneHost;
use flagset::FlagSet;
use pitlane_common::{EntityPath, NetMessage, ParticipantId, Payload, RoleContext, Transport};
use std::sync::{Arc, Mutex, PoisonError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParticipantError {
    #[error(transparent)]
    Coordinator(#[from] CoordinatorError),
    #[error(transparent)]
    Effect(#[from] EffectError),
    #[error("entity {0} is not known locally")]
    UnknownEntity(EntityPath),
}

pub struct Participant {
    role: RoleContext,
    context: WorldContext,
    event_bus: EventBus,
    possession: PossessionSystem,
    effects: EffectSystem,
    movement: MovementSystem,
    replication: ReplicationSystem,
    game_mode: Option<GameMode>,
    hud: HudManager,
    health: Option<Arc<Mutex<HealthReadout>>>,
    collision_effect: GameplayEffect,
}

impl Participant {
    pub fn new(
        role: RoleContext,
        config: &Configuration,
        transport: Arc<dyn Transport>,
        scene: Box<dyn SceneHost>,
    ) -> Result<Self, ParticipantError> {
        let event_bus = EventBus::new();
        let game_mode = if role.is_server() {
            let mut game_mode = GameMode::new(role, Arc::clone(&transport), event_bus.clone())?;
            game_mode.start();
            Some(game_mode)
        } else {
            None
        };

        tracing::info!(
            "Participant {} running as {}",
            role.local_participant(),
            role.role()
        );
        Ok(Self {
            role,
            context: WorldContext::new(scene, config.pawn.template()),
            possession: PossessionSystem::new(role, Arc::clone(&transport), event_bus.clone()),
            effects: EffectSystem::new(event_bus.clone()),
            movement: MovementSystem::new(role.local_participant()),
            replication: ReplicationSystem::new(
                role,
                transport,
                *config.simulation.replication_interval,
            ),
            event_bus,
            game_mode,
            hud: HudManager::new(),
            health: None,
            collision_effect: config.pawn.collision_effect.clone(),
        })
    }

    pub fn role(&self) -> &RoleContext {
        &self.role
    }

    pub fn context(&self) -> &WorldContext {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut WorldContext {
        &mut self.context
    }

    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }

    pub fn game_mode(&self) -> Option<&GameMode> {
        self.game_mode.as_ref()
    }

    /// Pawn possessed by the local player's controller
    pub fn local_pawn(&self) -> Option<EcsEntity> {
        self.context.pawn_for(self.role.local_participant())
    }

    /// Health shown on the local HUD, once a pawn has been possessed
    pub fn health_readout(&self) -> Option<HealthReadout> {
        self.health
            .as_ref()
            .map(|readout| *readout.lock().unwrap_or_else(PoisonError::into_inner))
    }

    /// Scene reported a new network participant
    pub fn connected(&mut self, participant: ParticipantId) -> Result<(), ParticipantError> {
        match self.game_mode.as_mut() {
            Some(game_mode) => {
                game_mode.on_participant_connected(&mut self.context, participant)?;
            }
            None => tracing::trace!("Client ignores connect of {}", participant),
        }
        Ok(())
    }

    /// Scene reported a network participant left
    pub fn disconnected(&mut self, participant: ParticipantId) -> bool {
        match self.game_mode.as_mut() {
            Some(game_mode) => {
                game_mode.on_participant_disconnected(&mut self.context, participant)
            }
            None => false,
        }
    }

    /// Apply a message received from the transport, returning whether it changed anything
    pub fn handle_message(&mut self, message: NetMessage) -> bool {
        let from = message.from;
        match message.payload {
            Payload::ClientPossess { controller, pawn } => {
                let (world, registry) = self.context.split_mut();
                self.possession
                    .client_possess(world, registry, from, &controller, &pawn)
            }
            Payload::Spawned {
                path,
                kind,
                authority,
                position,
            } => {
                if !self.accepts_world_state(from) {
                    return false;
                }
                if self.context.resolve(&path).is_some() {
                    tracing::trace!("Already replicating {}", path);
                    return false;
                }
                match self.context.spawn_replica(path.clone(), kind, authority, position) {
                    Ok(_) => true,
                    Err(e) => {
                        tracing::warn!("Failed to replicate {}: {}", path, e);
                        false
                    }
                }
            }
            Payload::Despawned { path } => {
                if !self.accepts_world_state(from) {
                    return false;
                }
                let Some(entity) = self.context.resolve(&path) else {
                    return false;
                };
                let was_pawn = self.context.world().get::<&Pawn>(entity).is_ok();
                self.context.despawn(entity);
                if was_pawn {
                    self.event_bus
                        .publish(GameEvent::PawnDespawned { pawn: entity });
                }
                true
            }
            Payload::ControllerState {
                controller,
                possessed,
            } => {
                let (world, registry) = self.context.split_mut();
                self.replication.apply_controller_state(
                    world,
                    registry,
                    &self.event_bus,
                    from,
                    &controller,
                    possessed.as_ref(),
                )
            }
            Payload::PawnState { pawn, position } => {
                let (world, registry) = self.context.split_mut();
                match self
                    .replication
                    .apply_pawn_state(world, registry, from, &pawn, position)
                {
                    Some(entity) => self.context.set_position(entity, position),
                    None => false,
                }
            }
        }
    }

    fn accepts_world_state(&self, from: ParticipantId) -> bool {
        if self.role.is_server() || !from.is_server() {
            tracing::warn!("Ignoring world state from {}", from);
            return false;
        }
        true
    }

    /// Scene reported that a pawn collided with bodies on `layers`
    ///
    /// Only the pawn's authority reacts. Returns whether the collision
    /// effect was applied.
    pub fn collision(
        &mut self,
        pawn_path: &EntityPath,
        layers: FlagSet<GameLayer>,
    ) -> Result<bool, ParticipantError> {
        let pawn = self
            .context
            .resolve(pawn_path)
            .ok_or_else(|| ParticipantError::UnknownEntity(pawn_path.clone()))?;
        let authority = self
            .context
            .world()
            .get::<&Authority>(pawn)
            .map(|a| a.participant())
            .ok();
        if authority != Some(self.role.local_participant()) {
            tracing::trace!("Ignoring collision of remote pawn {}", pawn_path);
            return Ok(false);
        }

        let own = self
            .context
            .world()
            .get::<&CollisionLayers>(pawn)
            .map(|own| *own)
            .unwrap_or_default();
        let layers = own.foreign(layers);
        if layers.is_empty() {
            tracing::trace!("Ignoring same-layer contact of {}", pawn_path);
            return Ok(false);
        }

        self.event_bus.publish(GameEvent::Collided { pawn, layers });
        if !layers.contains(GameLayer::Track) {
            return Ok(false);
        }
        let effect = self.collision_effect.clone();
        self.apply_effect(pawn, &effect, SourceId::new())?;
        tracing::debug!("Pawn {} hit the track boundary", pawn_path);
        Ok(true)
    }

    pub fn apply_effect(
        &mut self,
        pawn: EcsEntity,
        effect: &GameplayEffect,
        source: SourceId,
    ) -> Result<EffectApplication, ParticipantError> {
        Ok(self
            .effects
            .apply(self.context.world_mut(), pawn, effect, source)?)
    }

    pub fn remove_effect_source(&mut self, pawn: EcsEntity, source: SourceId) -> usize {
        self.effects
            .remove_source(self.context.world_mut(), pawn, source)
    }

    /// Feed pointer input to the locally possessed pawn
    pub fn drag(&mut self, input: DragInput) -> bool {
        match self.local_pawn() {
            Some(pawn) => self.movement.drag(self.context.world_mut(), pawn, input),
            None => false,
        }
    }

    /// Advance one frame, returning the events raised during it
    pub fn tick(&mut self, delta: f64) -> Vec<GameEvent> {
        if let Some(game_mode) = self.game_mode.as_mut() {
            game_mode.flush_deferred(&mut self.context);
        }

        self.effects.update(self.context.world_mut(), delta);

        for (pawn, position) in self.movement.update(self.context.world_mut(), delta) {
            self.context.set_position(pawn, position);
        }

        self.replication
            .update(self.context.world(), self.context.registry(), delta);

        let events = self.event_bus.process_events();
        self.attach_hud();
        for event in &events {
            self.hud.dispatch(self.context.world_mut(), event);
        }
        events
    }

    /// Bind the health bar once the local controller exists
    fn attach_hud(&mut self) {
        if self.health.is_some() || !self.role.has_local_player() {
            return;
        }
        let Some(controller) = self.context.controller_for(self.role.local_participant()) else {
            return;
        };
        let bar = HealthBar::new();
        self.health = Some(bar.readout_handle());
        self.hud
            .add_controller_widget(self.context.world_mut(), controller, Box::new(bar));
    }
}

impl std::fmt::Debug for Participant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Participant")
            .field("role", &self.role)
            .field("context", &self.context)
            .field("game_mode", &self.game_mode)
            .field("hud", &self.hud)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::components::Position;
    use crate::gameplay::{AttributeSet, HEALTH, ModifierOp};
    use crate::scene::HeadlessScene;
    use pitlane_common::{NullTransport, Vec2};

    fn listen_server() -> Participant {
        let config = Configuration::default();
        Participant::new(
            RoleContext::server(false),
            &config,
            Arc::new(NullTransport::new(ParticipantId::SERVER)),
            Box::new(HeadlessScene::new()),
        )
        .unwrap()
    }

    fn health(participant: &Participant, pawn: EcsEntity) -> f64 {
        participant
            .context()
            .world()
            .get::<&AttributeSet>(pawn)
            .unwrap()
            .current(HEALTH)
    }

    #[test]
    fn test_listen_server_possesses_own_pawn() {
        let mut server = listen_server();
        server.tick(0.016);
        assert_eq!(server.local_pawn(), None);

        let events = server.tick(0.016);
        let pawn = server.local_pawn().unwrap();
        assert!(
            events
                .iter()
                .any(|e| matches!(e, GameEvent::Possessed { pawn: p, .. } if *p == pawn))
        );
        assert_eq!(server.health_readout().unwrap().label(), "100 / 100");
    }

    #[test]
    fn test_track_collision_damages_pawn() {
        let mut server = listen_server();
        server.tick(0.016);
        server.tick(0.016);
        let pawn = server.local_pawn().unwrap();
        let path = EntityPath::pawn(ParticipantId::SERVER);

        assert!(server.collision(&path, GameLayer::Track.into()).unwrap());
        assert_eq!(health(&server, pawn), 90.0);

        assert!(!server.collision(&path, GameLayer::Pickable.into()).unwrap());
        assert_eq!(health(&server, pawn), 90.0);

        server.tick(0.016);
        assert_eq!(server.health_readout().unwrap().label(), "90 / 90");

        assert!(matches!(
            server.collision(&EntityPath::from("Pawn_7"), GameLayer::Track.into()),
            Err(ParticipantError::UnknownEntity(_))
        ));
    }

    #[test]
    fn test_player_contact_is_ignored() {
        let mut server = listen_server();
        server.tick(0.016);
        server.tick(0.016);
        let pawn = server.local_pawn().unwrap();
        let path = EntityPath::pawn(ParticipantId::SERVER);

        assert!(!server.collision(&path, GameLayer::Player.into()).unwrap());
        assert!(
            !server
                .tick(0.016)
                .iter()
                .any(|e| matches!(e, GameEvent::Collided { .. }))
        );

        assert!(
            server
                .collision(&path, GameLayer::Player | GameLayer::Track)
                .unwrap()
        );
        assert_eq!(health(&server, pawn), 90.0);
        assert!(server.tick(0.016).contains(&GameEvent::Collided {
            pawn,
            layers: GameLayer::Track.into(),
        }));
    }

    #[test]
    fn test_remote_pawn_collisions_are_ignored() {
        let mut server = listen_server();
        server.connected(ParticipantId::new(2)).unwrap();
        server.tick(0.016);
        server.tick(0.016);
        let path = EntityPath::pawn(ParticipantId::new(2));
        let pawn = server.context().resolve(&path).unwrap();

        assert!(!server.collision(&path, GameLayer::Track.into()).unwrap());
        assert_eq!(health(&server, pawn), 100.0);
    }

    #[test]
    fn test_drag_moves_local_pawn() {
        let mut server = listen_server();
        server.tick(0.016);
        server.tick(0.016);
        let pawn = server.local_pawn().unwrap();

        assert!(server.drag(DragInput::Press(Vec2::ZERO)));
        assert!(server.drag(DragInput::Move(Vec2::new(8.0, 0.0))));
        // FollowSpeed 10 over a tenth of a second closes the whole gap
        server.tick(0.1);

        let position = server.context().world().get::<&Position>(pawn).unwrap().0;
        assert_eq!(position, Vec2::new(8.0, 0.0));
    }

    #[test]
    fn test_client_ignores_connects_and_foreign_state() {
        let config = Configuration::default();
        let mut client = Participant::new(
            RoleContext::client(ParticipantId::new(2)),
            &config,
            Arc::new(NullTransport::new(ParticipantId::new(2))),
            Box::new(HeadlessScene::new()),
        )
        .unwrap();
        assert!(client.game_mode().is_none());
        client.connected(ParticipantId::new(3)).unwrap();
        assert!(!client.disconnected(ParticipantId::new(3)));

        let spoofed = NetMessage::new(
            ParticipantId::new(3),
            Payload::Spawned {
                path: EntityPath::pawn(ParticipantId::new(3)),
                kind: pitlane_common::NodeKind::Pawn,
                authority: ParticipantId::new(3),
                position: Vec2::ZERO,
            },
        );
        assert!(!client.handle_message(spoofed));
        assert!(client.context().is_empty());
    }

    #[test]
    fn test_duration_effect_through_participant() {
        let mut server = listen_server();
        server.tick(0.016);
        server.tick(0.016);
        let pawn = server.local_pawn().unwrap();
        let shield = GameplayEffect::timed(0.5)
            .unwrap()
            .with(HEALTH, 50.0, ModifierOp::Add);

        server.apply_effect(pawn, &shield, SourceId::new()).unwrap();
        assert_eq!(health(&server, pawn), 150.0);
        server.tick(0.5);
        assert_eq!(health(&server, pawn), 100.0);
    }
}
