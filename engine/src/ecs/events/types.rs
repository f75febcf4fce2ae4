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
use crate::ecs::components::GameLayer;
use crate::gameplay::{DurationType, SourceId};
use flagset::FlagSet;
use pitlane_common::ParticipantId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    // Session lifecycle
    ControllerCreated {
        controller: EcsEntity,
        participant: ParticipantId,
    },
    ControllerRemoved {
        participant: ParticipantId,
    },
    PawnSpawned {
        pawn: EcsEntity,
        authority: ParticipantId,
    },
    PawnDespawned {
        pawn: EcsEntity,
    },

    // Possession
    Possessed {
        controller: EcsEntity,
        pawn: EcsEntity,
    },
    Unpossessed {
        controller: EcsEntity,
        pawn: EcsEntity,
    },

    // Effects
    EffectApplied {
        pawn: EcsEntity,
        source: SourceId,
        duration_type: DurationType,
    },
    EffectExpired {
        pawn: EcsEntity,
        source: SourceId,
    },

    // Scene
    Collided {
        pawn: EcsEntity,
        layers: FlagSet<GameLayer>,
    },
}

impl GameEvent {
    pub fn name(&self) -> &'static str {
        match self {
            GameEvent::ControllerCreated { .. } => "ControllerCreated",
            GameEvent::ControllerRemoved { .. } => "ControllerRemoved",
            GameEvent::PawnSpawned { .. } => "PawnSpawned",
            GameEvent::PawnDespawned { .. } => "PawnDespawned",
            GameEvent::Possessed { .. } => "Possessed",
            GameEvent::Unpossessed { .. } => "Unpossessed",
            GameEvent::EffectApplied { .. } => "EffectApplied",
            GameEvent::EffectExpired { .. } => "EffectExpired",
            GameEvent::Collided { .. } => "Collided",
        }
    }
}
