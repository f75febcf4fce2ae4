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

//! Observable numeric attribute

use super::modifier::{Modifier, ModifierId, ModifierStack, SourceId};
use super::observer::{Observers, SubscriptionId};
use serde::{Deserialize, Serialize};

/// Tolerance used to decide whether an effective value changed
pub const CMP_EPSILON: f64 = 1e-5;

/// Approximate float equality scaled to the magnitude of the operands
pub fn is_equal_approx(a: f64, b: f64) -> bool {
    if a == b {
        return true;
    }
    let tolerance = (CMP_EPSILON * a.abs()).max(CMP_EPSILON);
    (a - b).abs() < tolerance
}

/// Payload delivered to attribute observers
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AttributeChange {
    pub current: f64,
    pub base: f64,
    pub previous: f64,
}

/// A numeric value with a base and a cached effective value
///
/// The effective value is recomputed on every mutation. Observers are only
/// notified when it moves by more than [`CMP_EPSILON`].
#[derive(Debug)]
pub struct Attribute {
    base_value: f64,
    current_value: f64,
    modifiers: ModifierStack,
    observers: Observers<AttributeChange>,
}

impl Attribute {
    pub fn new(base_value: f64) -> Self {
        Self {
            base_value,
            current_value: base_value,
            modifiers: ModifierStack::new(),
            observers: Observers::new(),
        }
    }

    pub fn base(&self) -> f64 {
        self.base_value
    }

    /// Cached effective value
    pub fn current(&self) -> f64 {
        self.current_value
    }

    pub fn modifiers(&self) -> &ModifierStack {
        &self.modifiers
    }

    pub fn set_base(&mut self, value: f64) {
        self.base_value = value;
        self.recompute();
    }

    pub fn add_to_base(&mut self, delta: f64) {
        self.set_base(self.base_value + delta);
    }

    pub fn add_modifier(&mut self, modifier: Modifier) -> ModifierId {
        let id = modifier.id;
        self.modifiers.push(modifier);
        self.recompute();
        id
    }

    /// Remove every modifier attached by `source`
    pub fn remove_modifiers_by_source(&mut self, source: SourceId) -> usize {
        let removed = self.modifiers.remove_by_source(source);
        if removed > 0 {
            self.recompute();
        }
        removed
    }

    pub fn remove_modifier(&mut self, id: ModifierId) -> bool {
        let removed = self.modifiers.remove_by_id(id);
        if removed {
            self.recompute();
        }
        removed
    }

    pub fn subscribe<F>(&mut self, handler: F) -> SubscriptionId
    where
        F: Fn(&AttributeChange) + Send + Sync + 'static,
    {
        self.observers.subscribe(handler)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.observers.unsubscribe(id)
    }

    pub fn subscriber_count(&self) -> usize {
        self.observers.len()
    }

    fn recompute(&mut self) {
        let previous = self.current_value;
        self.current_value = self.modifiers.evaluate(self.base_value);

        if !is_equal_approx(previous, self.current_value) {
            self.observers.notify(&AttributeChange {
                current: self.current_value,
                base: self.base_value,
                previous,
            });
        }
    }
}

impl Default for Attribute {
    fn default() -> Self {
        Self::new(0.0)
    }
}

impl From<&Attribute> for f64 {
    fn from(attribute: &Attribute) -> Self {
        attribute.current()
    }
}
