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
use pitlane_common::ParticipantId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PossessionState {
    #[default]
    Unpossessed,
    Possessing(EcsEntity),
}

/// One participant's control session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Controller {
    pub participant: ParticipantId,
    pub state: PossessionState,
}

impl Controller {
    pub fn new(participant: ParticipantId) -> Self {
        Self {
            participant,
            state: PossessionState::Unpossessed,
        }
    }

    /// Bind to a pawn, returning the previously possessed pawn
    pub fn possess(&mut self, pawn: EcsEntity) -> Option<EcsEntity> {
        let previous = self.possessed();
        self.state = PossessionState::Possessing(pawn);
        previous
    }

    pub fn release(&mut self) -> Option<EcsEntity> {
        let previous = self.possessed();
        self.state = PossessionState::Unpossessed;
        previous
    }

    pub fn possessed(&self) -> Option<EcsEntity> {
        match self.state {
            PossessionState::Possessing(pawn) => Some(pawn),
            PossessionState::Unpossessed => None,
        }
    }

    pub fn is_possessing(&self, pawn: EcsEntity) -> bool {
        self.state == PossessionState::Possessing(pawn)
    }
}
