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

use pitlane_common::{EntityPath, NodeKind, ParticipantId};
use serde::{Deserialize, Serialize};

/// Replicated identity of a node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub path: EntityPath,
    pub kind: NodeKind,
}

impl Identity {
    pub fn controller(path: EntityPath) -> Self {
        Self {
            path,
            kind: NodeKind::Controller,
        }
    }

    pub fn pawn(path: EntityPath) -> Self {
        Self {
            path,
            kind: NodeKind::Pawn,
        }
    }
}

/// Participant allowed to originate changes to this entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Authority(pub ParticipantId);

impl Authority {
    pub fn participant(&self) -> ParticipantId {
        self.0
    }

    pub fn is(&self, participant: ParticipantId) -> bool {
        self.0 == participant
    }
}
