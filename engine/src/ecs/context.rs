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

use crate::ecs::components::{
    ActiveEffects, Authority, CollisionLayers, Controller, DragState, Identity, Pawn, PawnTemplate,
    Position,
};
use crate::ecs::registry::{EntityRegistry, RegistryError};
use crate::ecs::systems::{release_pawn, unbind_controller};
use crate::ecs::{EcsEntity, GameWorld};
use crate::scene::SceneHost;
use pitlane_common::{EntityPath, NodeKind, ParticipantId, Payload, Vec2};

/// Local replica of the game world
///
/// Owns the ECS world, the path registry and the scene collaborator so that
/// spawning and despawning keep all three in step.
pub struct WorldContext {
    world: GameWorld,
    registry: EntityRegistry,
    scene: Box<dyn SceneHost>,
    template: PawnTemplate,
}

impl WorldContext {
    pub fn new(scene: Box<dyn SceneHost>, template: PawnTemplate) -> Self {
        Self {
            world: GameWorld::new(),
            registry: EntityRegistry::new(),
            scene,
            template,
        }
    }

    pub fn world(&self) -> &GameWorld {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut GameWorld {
        &mut self.world
    }

    pub fn registry(&self) -> &EntityRegistry {
        &self.registry
    }

    pub fn scene(&self) -> &dyn SceneHost {
        self.scene.as_ref()
    }

    pub fn scene_mut(&mut self) -> &mut dyn SceneHost {
        self.scene.as_mut()
    }

    pub fn template(&self) -> &PawnTemplate {
        &self.template
    }

    /// Borrow the world mutably alongside the registry
    pub fn split_mut(&mut self) -> (&mut GameWorld, &EntityRegistry) {
        (&mut self.world, &self.registry)
    }

    /// Spawn a controller node for `participant`
    pub fn spawn_controller(
        &mut self,
        path: EntityPath,
        participant: ParticipantId,
    ) -> Result<EcsEntity, RegistryError> {
        if self.registry.contains_path(&path) {
            return Err(RegistryError::PathRegistered(path));
        }
        let entity = self.world.spawn((
            Identity::controller(path.clone()),
            Controller::new(participant),
            Authority(participant),
        ));
        self.registry.register(entity, path.clone())?;
        self.scene.instantiate(NodeKind::Controller, &path);
        tracing::debug!("Spawned controller {} for participant {}", path, participant);
        Ok(entity)
    }

    /// Spawn a pawn with the template attributes
    pub fn spawn_pawn(
        &mut self,
        path: EntityPath,
        authority: ParticipantId,
        position: Vec2,
    ) -> Result<EcsEntity, RegistryError> {
        if self.registry.contains_path(&path) {
            return Err(RegistryError::PathRegistered(path));
        }
        let entity = self.world.spawn((
            Identity::pawn(path.clone()),
            Pawn::new(),
            Authority(authority),
            Position(position),
            DragState::new(),
            CollisionLayers::player(),
            ActiveEffects::new(),
            self.template.build_attributes(),
        ));
        self.registry.register(entity, path.clone())?;
        self.scene.instantiate(NodeKind::Pawn, &path);
        self.scene.place(&path, position);
        tracing::debug!("Spawned pawn {} at {:?} for participant {}", path, position, authority);
        Ok(entity)
    }

    /// Spawn a node announced by the server
    pub fn spawn_replica(
        &mut self,
        path: EntityPath,
        kind: NodeKind,
        authority: ParticipantId,
        position: Vec2,
    ) -> Result<EcsEntity, RegistryError> {
        match kind {
            NodeKind::Controller => self.spawn_controller(path, authority),
            NodeKind::Pawn => self.spawn_pawn(path, authority, position),
        }
    }

    /// Remove an entity, breaking any possession link it takes part in
    pub fn despawn(&mut self, entity: EcsEntity) -> Option<EntityPath> {
        unbind_controller(&mut self.world, entity);
        release_pawn(&mut self.world, entity);

        let path = self.registry.unregister_entity(entity);
        if self.world.despawn(entity).is_err() {
            tracing::debug!("Entity {:?} was already despawned", entity);
        }
        if let Some(path) = &path {
            self.scene.destroy(path);
            tracing::debug!("Despawned {}", path);
        }
        path
    }

    pub fn resolve(&self, path: &EntityPath) -> Option<EcsEntity> {
        self.registry.get_entity(path)
    }

    pub fn path_of(&self, entity: EcsEntity) -> Option<EntityPath> {
        self.registry.get_path(entity).cloned()
    }

    /// Controller owned by `participant`
    pub fn controller_for(&self, participant: ParticipantId) -> Option<EcsEntity> {
        self.world
            .query::<(hecs::Entity, &Controller)>()
            .iter()
            .find(|(_, controller)| controller.participant == participant)
            .map(|(entity, _)| entity)
    }

    /// Pawn currently possessed by `participant`'s controller
    pub fn pawn_for(&self, participant: ParticipantId) -> Option<EcsEntity> {
        let controller = self.controller_for(participant)?;
        self.world.get::<&Controller>(controller).ok()?.possessed()
    }

    pub fn position(&self, entity: EcsEntity) -> Option<Vec2> {
        self.world.get::<&Position>(entity).ok().map(|p| p.0)
    }

    /// Set a pawn's position and mirror it into the scene
    pub fn set_position(&mut self, entity: EcsEntity, position: Vec2) -> bool {
        match self.world.get::<&mut Position>(entity) {
            Ok(mut current) => current.0 = position,
            Err(_) => return false,
        }
        if let Some(path) = self.registry.get_path(entity) {
            self.scene.place(path, position);
        }
        true
    }

    /// Spawn announcements describing every replicated node, controllers first
    pub fn snapshot(&self) -> Vec<Payload> {
        let mut payloads: Vec<Payload> = self
            .world
            .query::<(&Identity, &Authority, Option<&Position>)>()
            .iter()
            .map(|(identity, authority, position)| Payload::Spawned {
                path: identity.path.clone(),
                kind: identity.kind,
                authority: authority.participant(),
                position: position.map(|p| p.0).unwrap_or_default(),
            })
            .collect();
        payloads.sort_by_key(|payload| match payload {
            Payload::Spawned {
                kind: NodeKind::Controller,
                ..
            } => 0,
            _ => 1,
        });
        payloads
    }

    pub fn len(&self) -> usize {
        self.registry.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }
}

impl std::fmt::Debug for WorldContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorldContext")
            .field("entities", &self.world.len())
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::test_utils::{headless_context, spawn_possessed};
    use crate::gameplay::{AttributeSet, HEALTH};

    #[test]
    fn test_spawn_pawn_registers_and_places() {
        let mut context = headless_context();
        let path = EntityPath::pawn(ParticipantId::new(2));
        let pawn = context
            .spawn_pawn(path.clone(), ParticipantId::new(2), Vec2::new(3.0, 4.0))
            .unwrap();

        assert_eq!(context.resolve(&path), Some(pawn));
        assert_eq!(context.position(pawn), Some(Vec2::new(3.0, 4.0)));
        assert_eq!(
            context.world().get::<&Authority>(pawn).unwrap().participant(),
            ParticipantId::new(2)
        );
        assert_eq!(
            context.world().get::<&AttributeSet>(pawn).unwrap().current(HEALTH),
            100.0
        );
    }

    #[test]
    fn test_duplicate_path_is_rejected() {
        let mut context = headless_context();
        let path = EntityPath::controller(ParticipantId::new(2));
        context
            .spawn_controller(path.clone(), ParticipantId::new(2))
            .unwrap();
        assert_eq!(
            context.spawn_controller(path.clone(), ParticipantId::new(2)),
            Err(RegistryError::PathRegistered(path))
        );
        assert_eq!(context.world().len(), 1);
    }

    #[test]
    fn test_despawn_breaks_possession() {
        let mut context = headless_context();
        let (controller, pawn) = spawn_possessed(&mut context, ParticipantId::new(2));

        assert_eq!(context.pawn_for(ParticipantId::new(2)), Some(pawn));
        assert_eq!(
            context.despawn(pawn),
            Some(EntityPath::pawn(ParticipantId::new(2)))
        );
        assert_eq!(
            context.world().get::<&Controller>(controller).unwrap().possessed(),
            None
        );
        assert_eq!(context.pawn_for(ParticipantId::new(2)), None);
        assert_eq!(context.despawn(pawn), None);
    }

    #[test]
    fn test_snapshot_lists_controllers_first() {
        let mut context = headless_context();
        spawn_possessed(&mut context, ParticipantId::new(2));
        spawn_possessed(&mut context, ParticipantId::new(3));

        let snapshot = context.snapshot();
        assert_eq!(snapshot.len(), 4);
        assert!(matches!(
            snapshot[0],
            Payload::Spawned {
                kind: NodeKind::Controller,
                ..
            }
        ));
        assert!(matches!(
            snapshot[3],
            Payload::Spawned {
                kind: NodeKind::Pawn,
                ..
            }
        ));
    }

    #[test]
    fn test_set_position() {
        let mut context = headless_context();
        let (_, pawn) = spawn_possessed(&mut context, ParticipantId::new(2));
        assert!(context.set_position(pawn, Vec2::new(9.0, 9.0)));
        assert_eq!(context.position(pawn), Some(Vec2::new(9.0, 9.0)));
    }
}
