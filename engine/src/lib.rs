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

//! Pitlane Engine
//!
//! Gameplay state for a small networked racing session:
//! - Observable attributes combined from stacked modifiers
//! - Instant, timed and infinite gameplay effects
//! - Controller and pawn possession with explicit authority
//! - A server-only coordinator that owns the session lifecycle

pub mod config;
pub mod coordinator;
pub mod ecs;
pub mod gameplay;
pub mod hud;
pub mod participant;
pub mod scene;
