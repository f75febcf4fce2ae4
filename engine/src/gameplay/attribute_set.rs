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

//! Named attributes belonging to one entity

use super::attribute::{Attribute, AttributeChange};
use super::effect::{DurationType, EffectError, GameplayEffect};
use super::modifier::{Modifier, ModifierId, ModifierOp, SourceId};
use super::observer::SubscriptionId;
use std::collections::HashMap;
use thiserror::Error;

pub const HEALTH: &str = "Health";
pub const MAX_HEALTH: &str = "MaxHealth";
pub const FOLLOW_SPEED: &str = "FollowSpeed";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AttributeError {
    #[error("attribute '{0}' is not registered")]
    NotRegistered(String),
}

/// Record of what one effect application attached
#[derive(Debug, Clone, PartialEq)]
pub struct EffectApplication {
    pub source: SourceId,
    pub duration_type: DurationType,
    /// Attribute name and modifier handle for each attached modifier
    pub modifiers: Vec<(String, ModifierId)>,
    /// Attribute names that were not registered
    pub skipped: Vec<String>,
}

impl EffectApplication {
    fn new(source: SourceId, duration_type: DurationType) -> Self {
        Self {
            source,
            duration_type,
            modifiers: Vec::new(),
            skipped: Vec::new(),
        }
    }
}

/// Attribute set component
#[derive(Debug, Default)]
pub struct AttributeSet {
    attributes: HashMap<String, Attribute>,
}

impl AttributeSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a set from `(name, base)` pairs
    pub fn with_defaults<'a, I>(defaults: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, f64)>,
    {
        let mut set = Self::new();
        for (name, base) in defaults {
            set.register(name, base);
        }
        set
    }

    /// Register an attribute; an existing attribute of the same name is replaced
    pub fn register(&mut self, name: impl Into<String>, base_value: f64) {
        let name = name.into();
        if self
            .attributes
            .insert(name.clone(), Attribute::new(base_value))
            .is_some()
        {
            tracing::debug!("Attribute {} reset to {}", name, base_value);
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.attributes.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Result<&Attribute, AttributeError> {
        self.attributes.get(name).ok_or_else(|| {
            tracing::warn!("Attribute {} not found", name);
            AttributeError::NotRegistered(name.to_string())
        })
    }

    pub fn get_mut(&mut self, name: &str) -> Result<&mut Attribute, AttributeError> {
        self.attributes.get_mut(name).ok_or_else(|| {
            tracing::warn!("Attribute {} not found", name);
            AttributeError::NotRegistered(name.to_string())
        })
    }

    /// Effective value of `name`, or 0 when it is not registered
    pub fn current(&self, name: &str) -> f64 {
        self.get(name).map(Attribute::current).unwrap_or_default()
    }

    /// Effective value of `name` without logging a miss
    pub fn try_current(&self, name: &str) -> Option<f64> {
        self.attributes.get(name).map(Attribute::current)
    }

    /// Apply an effect on behalf of `source`
    ///
    /// Instant effects add each value to the base whatever operation is
    /// declared. Infinite effects attach one modifier per modification.
    /// Duration effects need the effect system's timers and are rejected.
    pub fn apply_effect(
        &mut self,
        effect: &GameplayEffect,
        source: SourceId,
    ) -> Result<EffectApplication, EffectError> {
        effect.validate()?;
        match effect.duration_type() {
            DurationType::Instant => {
                let mut application = EffectApplication::new(source, DurationType::Instant);
                for modification in effect.modifications() {
                    match self.get_mut(&modification.attribute) {
                        Ok(attribute) => {
                            if modification.operation != ModifierOp::Add {
                                tracing::debug!(
                                    "Instant {} on {} treated as Add",
                                    modification.operation.as_str(),
                                    modification.attribute
                                );
                            }
                            attribute.add_to_base(modification.value);
                        }
                        Err(_) => application.skipped.push(modification.attribute.clone()),
                    }
                }
                Ok(application)
            }
            DurationType::Infinite => Ok(self.attach_modifiers(effect, source)),
            DurationType::Duration => Err(EffectError::UnsupportedDuration(effect.duration())),
        }
    }

    pub(crate) fn attach_modifiers(
        &mut self,
        effect: &GameplayEffect,
        source: SourceId,
    ) -> EffectApplication {
        let mut application = EffectApplication::new(source, effect.duration_type());
        for modification in effect.modifications() {
            match self.get_mut(&modification.attribute) {
                Ok(attribute) => {
                    let id = attribute.add_modifier(Modifier::new(
                        modification.value,
                        modification.operation,
                        source,
                    ));
                    application
                        .modifiers
                        .push((modification.attribute.clone(), id));
                }
                Err(_) => application.skipped.push(modification.attribute.clone()),
            }
        }
        application
    }

    /// Remove every modifier attached by `source` across all attributes
    pub fn remove_modifiers_by_source(&mut self, source: SourceId) -> usize {
        self.attributes
            .values_mut()
            .map(|attribute| attribute.remove_modifiers_by_source(source))
            .sum()
    }

    /// Remove exactly the modifiers recorded in `application`
    pub fn remove_application(&mut self, application: &EffectApplication) -> usize {
        application
            .modifiers
            .iter()
            .filter(|(name, id)| {
                self.attributes
                    .get_mut(name)
                    .is_some_and(|attribute| attribute.remove_modifier(*id))
            })
            .count()
    }

    pub fn subscribe<F>(&mut self, name: &str, handler: F) -> Result<SubscriptionId, AttributeError>
    where
        F: Fn(&AttributeChange) + Send + Sync + 'static,
    {
        Ok(self.get_mut(name)?.subscribe(handler))
    }

    pub fn unsubscribe(&mut self, name: &str, id: SubscriptionId) -> bool {
        self.attributes
            .get_mut(name)
            .is_some_and(|attribute| attribute.unsubscribe(id))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.attributes.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }
}
