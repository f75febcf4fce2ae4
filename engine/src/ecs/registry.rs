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

//! Mapping between replicated entity paths and local ECS handles
//!
//! Every participant spawns its own copy of a replicated node, so ECS handles
//! differ between processes. Paths are the only names that cross the network.

use crate::ecs::EcsEntity;
use pitlane_common::EntityPath;
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("entity {0:?} is already registered")]
    EntityRegistered(EcsEntity),
    #[error("path {0} is already registered")]
    PathRegistered(EntityPath),
}

#[derive(Debug, Default)]
pub struct EntityRegistry {
    /// Map from replicated path to ECS entity handle
    path_to_entity: HashMap<EntityPath, EcsEntity>,

    /// Map from ECS entity handle to replicated path
    entity_to_path: HashMap<EcsEntity, EntityPath>,
}

impl EntityRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            path_to_entity: HashMap::new(),
            entity_to_path: HashMap::new(),
        }
    }

    /// Register a mapping between an ECS entity and its path
    ///
    /// # Returns
    /// * `Ok(())` if registration succeeded
    /// * `Err(RegistryError)` if either the entity or path is already registered
    pub fn register(&mut self, entity: EcsEntity, path: EntityPath) -> Result<(), RegistryError> {
        if self.entity_to_path.contains_key(&entity) {
            return Err(RegistryError::EntityRegistered(entity));
        }
        if self.path_to_entity.contains_key(&path) {
            return Err(RegistryError::PathRegistered(path));
        }

        self.path_to_entity.insert(path.clone(), entity);
        self.entity_to_path.insert(entity, path);

        Ok(())
    }

    /// Unregister an entity by its ECS handle, returning its path
    pub fn unregister_entity(&mut self, entity: EcsEntity) -> Option<EntityPath> {
        let path = self.entity_to_path.remove(&entity)?;
        self.path_to_entity.remove(&path);
        Some(path)
    }

    /// Unregister an entity by its path, returning its ECS handle
    pub fn unregister_path(&mut self, path: &EntityPath) -> Option<EcsEntity> {
        let entity = self.path_to_entity.remove(path)?;
        self.entity_to_path.remove(&entity);
        Some(entity)
    }

    /// Look up an ECS entity by its path
    pub fn get_entity(&self, path: &EntityPath) -> Option<EcsEntity> {
        self.path_to_entity.get(path).copied()
    }

    /// Look up a path by its ECS entity
    pub fn get_path(&self, entity: EcsEntity) -> Option<&EntityPath> {
        self.entity_to_path.get(&entity)
    }

    pub fn contains_entity(&self, entity: EcsEntity) -> bool {
        self.entity_to_path.contains_key(&entity)
    }

    pub fn contains_path(&self, path: &EntityPath) -> bool {
        self.path_to_entity.contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.entity_to_path.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entity_to_path.is_empty()
    }

    pub fn clear(&mut self) {
        self.path_to_entity.clear();
        self.entity_to_path.clear();
    }

    pub fn paths(&self) -> impl Iterator<Item = &EntityPath> {
        self.path_to_entity.keys()
    }

    pub fn entities(&self) -> impl Iterator<Item = &EcsEntity> {
        self.entity_to_path.keys()
    }
}
