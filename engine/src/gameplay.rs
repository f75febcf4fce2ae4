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

//! Gameplay attribute model
//!
//! Attributes hold a base value and a modifier stack. Effects describe
//! changes to a set of attributes and are applied with a source identity so
//! that the modifiers they attach can later be removed together.

pub mod attribute;
pub mod attribute_set;
pub mod effect;
pub mod modifier;
pub mod observer;

pub use attribute::{Attribute, AttributeChange, CMP_EPSILON, is_equal_approx};
pub use attribute_set::{
    AttributeError, AttributeSet, EffectApplication, FOLLOW_SPEED, HEALTH, MAX_HEALTH,
};
pub use effect::{DurationType, EffectError, GameplayEffect, Modification};
pub use modifier::{Modifier, ModifierId, ModifierOp, ModifierStack, SourceId};
pub use observer::{Observers, SubscriptionId};
