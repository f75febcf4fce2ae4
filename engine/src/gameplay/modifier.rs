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

//! Attribute modifiers and the stack that combines them
//!
//! Combination order is fixed:
//! 1. The first attached `Override` wins outright
//! 2. Otherwise every `Add` is summed onto the base
//! 3. The sum is multiplied by every `Multiply`

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use uuid::Uuid;

static NEXT_MODIFIER_ID: AtomicU64 = AtomicU64::new(1);

/// How a modifier combines with the base value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ModifierOp {
    #[default]
    Add,
    Multiply,
    Override,
}

impl ModifierOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModifierOp::Add => "Add",
            ModifierOp::Multiply => "Multiply",
            ModifierOp::Override => "Override",
        }
    }
}

/// Identity of whatever caused a modifier, used for bulk removal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SourceId(Uuid);

impl SourceId {
    /// Create a new random source identity
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SourceId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SourceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Process-unique modifier handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ModifierId(u64);

impl ModifierId {
    fn next() -> Self {
        Self(NEXT_MODIFIER_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// A single adjustment attached to one attribute
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Modifier {
    pub id: ModifierId,
    pub value: f64,
    pub operation: ModifierOp,
    pub source: SourceId,
}

impl Modifier {
    pub fn new(value: f64, operation: ModifierOp, source: SourceId) -> Self {
        Self {
            id: ModifierId::next(),
            value,
            operation,
            source,
        }
    }

    pub fn add(value: f64, source: SourceId) -> Self {
        Self::new(value, ModifierOp::Add, source)
    }

    pub fn multiply(value: f64, source: SourceId) -> Self {
        Self::new(value, ModifierOp::Multiply, source)
    }

    pub fn overriding(value: f64, source: SourceId) -> Self {
        Self::new(value, ModifierOp::Override, source)
    }
}

/// Modifiers of one attribute, kept in attachment order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModifierStack {
    modifiers: Vec<Modifier>,
}

impl ModifierStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, modifier: Modifier) {
        self.modifiers.push(modifier);
    }

    /// Remove every modifier tagged with `source`
    pub fn remove_by_source(&mut self, source: SourceId) -> usize {
        let before = self.modifiers.len();
        self.modifiers.retain(|m| m.source != source);
        before - self.modifiers.len()
    }

    pub fn remove_by_id(&mut self, id: ModifierId) -> bool {
        let before = self.modifiers.len();
        self.modifiers.retain(|m| m.id != id);
        self.modifiers.len() != before
    }

    pub fn contains(&self, id: ModifierId) -> bool {
        self.modifiers.iter().any(|m| m.id == id)
    }

    /// Combine the stack with `base`
    pub fn evaluate(&self, base: f64) -> f64 {
        // Ties between overrides go to the earliest attachment
        if let Some(first) = self
            .modifiers
            .iter()
            .find(|m| m.operation == ModifierOp::Override)
        {
            return first.value;
        }

        let sum: f64 = self
            .modifiers
            .iter()
            .filter(|m| m.operation == ModifierOp::Add)
            .map(|m| m.value)
            .sum();

        self.modifiers
            .iter()
            .filter(|m| m.operation == ModifierOp::Multiply)
            .fold(base + sum, |value, m| value * m.value)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Modifier> {
        self.modifiers.iter()
    }

    pub fn len(&self) -> usize {
        self.modifiers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modifiers.is_empty()
    }
}
