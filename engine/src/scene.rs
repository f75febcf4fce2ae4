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

//! Scene boundary
//!
//! The scene owns everything visual. The engine tells it which nodes exist
//! and where they are, and asks it for spawn locations.

use pitlane_common::{EntityPath, NodeKind, Vec2};
use std::collections::BTreeMap;

#[cfg_attr(test, mockall::automock)]
pub trait SceneHost: Send {
    /// Create the visual node backing a replicated entity
    fn instantiate(&mut self, kind: NodeKind, path: &EntityPath);

    fn place(&mut self, path: &EntityPath, position: Vec2);

    fn destroy(&mut self, path: &EntityPath);

    /// Designated player start, if the loaded level has one
    fn start_location(&self) -> Option<Vec2>;
}

/// Scene that only tracks node placement, for servers without a display
#[derive(Debug, Clone, Default)]
pub struct HeadlessScene {
    nodes: BTreeMap<EntityPath, (NodeKind, Vec2)>,
    start: Option<Vec2>,
}

impl HeadlessScene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_start_location(mut self, start: Vec2) -> Self {
        self.start = Some(start);
        self
    }

    pub fn contains(&self, path: &EntityPath) -> bool {
        self.nodes.contains_key(path)
    }

    pub fn position(&self, path: &EntityPath) -> Option<Vec2> {
        self.nodes.get(path).map(|(_, position)| *position)
    }

    pub fn kind(&self, path: &EntityPath) -> Option<NodeKind> {
        self.nodes.get(path).map(|(kind, _)| *kind)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

impl SceneHost for HeadlessScene {
    fn instantiate(&mut self, kind: NodeKind, path: &EntityPath) {
        tracing::trace!("Instantiating {:?} node {}", kind, path);
        self.nodes.insert(path.clone(), (kind, Vec2::ZERO));
    }

    fn place(&mut self, path: &EntityPath, position: Vec2) {
        match self.nodes.get_mut(path) {
            Some((_, current)) => *current = position,
            None => tracing::warn!("Cannot place missing node {}", path),
        }
    }

    fn destroy(&mut self, path: &EntityPath) {
        if self.nodes.remove(path).is_none() {
            tracing::debug!("Node {} already destroyed", path);
        }
    }

    fn start_location(&self) -> Option<Vec2> {
        self.start
    }
}
