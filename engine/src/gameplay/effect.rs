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

//! Gameplay effect definitions

use super::modifier::ModifierOp;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EffectError {
    #[error("duration effects require a positive duration, got {0}")]
    InvalidDuration(f64),
    #[error("duration effects of {0}s need a ticking scheduler and cannot be applied to a bare attribute set")]
    UnsupportedDuration(f64),
    #[error("entity has no attribute set")]
    NoAttributeSet,
}

/// Lifetime policy of an applied effect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DurationType {
    /// Modifies base values once
    #[default]
    Instant,
    /// Attaches modifiers that expire after `duration` seconds
    Duration,
    /// Attaches modifiers until removed by source
    Infinite,
}

impl DurationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DurationType::Instant => "Instant",
            DurationType::Duration => "Duration",
            DurationType::Infinite => "Infinite",
        }
    }
}

/// One attribute change inside an effect
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Modification {
    pub attribute: String,
    pub value: f64,
    #[serde(default)]
    pub operation: ModifierOp,
}

impl Modification {
    pub fn new(attribute: impl Into<String>, value: f64, operation: ModifierOp) -> Self {
        Self {
            attribute: attribute.into(),
            value,
            operation,
        }
    }
}

/// Stateless description of a set of attribute changes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawEffect")]
pub struct GameplayEffect {
    duration_type: DurationType,
    duration: f64,
    modifications: Vec<Modification>,
}

impl GameplayEffect {
    pub fn instant() -> Self {
        Self {
            duration_type: DurationType::Instant,
            duration: 0.0,
            modifications: Vec::new(),
        }
    }

    pub fn infinite() -> Self {
        Self {
            duration_type: DurationType::Infinite,
            duration: 0.0,
            modifications: Vec::new(),
        }
    }

    /// Effect whose modifiers expire after `duration` seconds
    pub fn timed(duration: f64) -> Result<Self, EffectError> {
        let effect = Self {
            duration_type: DurationType::Duration,
            duration,
            modifications: Vec::new(),
        };
        effect.validate()?;
        Ok(effect)
    }

    /// Append a modification, builder style
    pub fn with(mut self, attribute: impl Into<String>, value: f64, operation: ModifierOp) -> Self {
        self.modifications
            .push(Modification::new(attribute, value, operation));
        self
    }

    pub fn validate(&self) -> Result<(), EffectError> {
        match self.duration_type {
            // Written as a negated comparison so NaN is rejected as well
            DurationType::Duration if !(self.duration > 0.0) => {
                Err(EffectError::InvalidDuration(self.duration))
            }
            _ => Ok(()),
        }
    }

    pub fn duration_type(&self) -> DurationType {
        self.duration_type
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn modifications(&self) -> &[Modification] {
        &self.modifications
    }
}

#[derive(Deserialize)]
struct RawEffect {
    duration_type: DurationType,
    #[serde(default)]
    duration: f64,
    #[serde(default)]
    modifications: Vec<Modification>,
}

impl TryFrom<RawEffect> for GameplayEffect {
    type Error = EffectError;

    fn try_from(raw: RawEffect) -> Result<Self, Self::Error> {
        let effect = GameplayEffect {
            duration_type: raw.duration_type,
            duration: raw.duration,
            modifications: raw.modifications,
        };
        effect.validate()?;
        Ok(effect)
    }
}
