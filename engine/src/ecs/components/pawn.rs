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

use crate::ecs::EcsEntity;
use crate::gameplay::{AttributeSet, EffectApplication, FOLLOW_SPEED, HEALTH, MAX_HEALTH, SourceId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Controllable entity marker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Pawn {
    pub possessed_by: Option<EcsEntity>,
}

impl Pawn {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Duration effect waiting for its modifiers to expire
#[derive(Debug, Clone, PartialEq)]
pub struct TimedEffect {
    pub source: SourceId,
    pub remaining: f64,
    pub application: EffectApplication,
}

/// Duration effects currently attached to an entity
#[derive(Debug, Clone, Default)]
pub struct ActiveEffects {
    pub effects: Vec<TimedEffect>,
}

impl ActiveEffects {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, effect: TimedEffect) {
        self.effects.push(effect);
    }

    /// Forget every timer started by `source`
    pub fn remove_source(&mut self, source: SourceId) -> usize {
        let before = self.effects.len();
        self.effects.retain(|e| e.source != source);
        before - self.effects.len()
    }

    pub fn has_source(&self, source: SourceId) -> bool {
        self.effects.iter().any(|e| e.source == source)
    }

    /// Advance timers and return the effects that ran out
    pub fn tick(&mut self, delta: f64) -> Vec<TimedEffect> {
        for effect in &mut self.effects {
            effect.remaining -= delta;
        }
        let (expired, active): (Vec<_>, Vec<_>) = std::mem::take(&mut self.effects)
            .into_iter()
            .partition(|e| e.remaining <= 0.0);
        self.effects = active;
        expired
    }

    pub fn len(&self) -> usize {
        self.effects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }
}

/// Attributes every newly spawned pawn starts with
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PawnTemplate {
    #[serde(default = "PawnTemplate::default_attributes")]
    pub attributes: BTreeMap<String, f64>,
}

impl PawnTemplate {
    fn default_attributes() -> BTreeMap<String, f64> {
        BTreeMap::from([
            (HEALTH.to_string(), 100.0),
            (MAX_HEALTH.to_string(), 100.0),
            (FOLLOW_SPEED.to_string(), 10.0),
        ])
    }

    pub fn build_attributes(&self) -> AttributeSet {
        AttributeSet::with_defaults(
            self.attributes
                .iter()
                .map(|(name, base)| (name.as_str(), *base)),
        )
    }
}

impl Default for PawnTemplate {
    fn default() -> Self {
        Self {
            attributes: Self::default_attributes(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gameplay::DurationType;

    fn timer(source: SourceId, remaining: f64) -> TimedEffect {
        TimedEffect {
            source,
            remaining,
            application: EffectApplication {
                source,
                duration_type: DurationType::Duration,
                modifiers: Vec::new(),
                skipped: Vec::new(),
            },
        }
    }

    #[test]
    fn test_tick_expires_effects() {
        let short = SourceId::new();
        let long = SourceId::new();
        let mut active = ActiveEffects::new();
        active.add(timer(short, 1.0));
        active.add(timer(long, 3.0));

        assert!(active.tick(0.5).is_empty());
        let expired = active.tick(0.5);
        assert_eq!(expired.len(), 1);
        assert_eq!(expired[0].source, short);
        assert!(active.has_source(long));
        assert_eq!(active.len(), 1);
    }

    #[test]
    fn test_remove_source() {
        let source = SourceId::new();
        let mut active = ActiveEffects::new();
        active.add(timer(source, 1.0));
        active.add(timer(source, 2.0));
        assert_eq!(active.remove_source(source), 2);
        assert!(active.is_empty());
    }

    #[test]
    fn test_default_template() {
        let attributes = PawnTemplate::default().build_attributes();
        assert_eq!(attributes.current(HEALTH), 100.0);
        assert_eq!(attributes.current(MAX_HEALTH), 100.0);
        assert_eq!(attributes.current(FOLLOW_SPEED), 10.0);
    }
}
