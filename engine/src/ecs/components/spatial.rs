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

use flagset::{FlagSet, flags};
use pitlane_common::Vec2;
use serde::{Deserialize, Serialize};

flags! {
    /// Physics layers reported by the scene on collision
    pub enum GameLayer: u8 {
        Track = 1,
        Player = 2,
        Pickable = 4,
    }
}

/// Layers an entity occupies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CollisionLayers(pub FlagSet<GameLayer>);

impl CollisionLayers {
    pub fn player() -> Self {
        Self(GameLayer::Player.into())
    }

    pub fn contains(&self, layer: GameLayer) -> bool {
        self.0.contains(layer)
    }

    /// Layers of `other` this entity does not occupy itself
    ///
    /// Contacts between bodies on the same layer, such as two players, leave
    /// nothing to react to.
    pub fn foreign(&self, other: FlagSet<GameLayer>) -> FlagSet<GameLayer> {
        other & !self.0
    }
}

/// World position of an entity
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position(pub Vec2);

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self(Vec2::new(x, y))
    }
}

/// Pointer input driving drag-follow movement
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum DragInput {
    Press(Vec2),
    Move(Vec2),
    Release,
}

/// Drag-follow state of a locally controlled pawn
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct DragState {
    pub dragging: bool,
    pub offset: Vec2,
    pub pointer: Vec2,
}

impl DragState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start dragging, keeping the grab offset between pointer and pawn
    pub fn press(&mut self, position: Vec2, pointer: Vec2) {
        self.dragging = true;
        self.offset = position - pointer;
        self.pointer = pointer;
    }

    pub fn move_to(&mut self, pointer: Vec2) {
        self.pointer = pointer;
    }

    pub fn release(&mut self) {
        self.dragging = false;
    }

    pub fn apply(&mut self, position: Vec2, input: DragInput) {
        match input {
            DragInput::Press(pointer) => self.press(position, pointer),
            DragInput::Move(pointer) => self.move_to(pointer),
            DragInput::Release => self.release(),
        }
    }

    /// Where the pawn wants to be, if it is being dragged
    pub fn target(&self) -> Option<Vec2> {
        self.dragging.then(|| self.pointer + self.offset)
    }
}
