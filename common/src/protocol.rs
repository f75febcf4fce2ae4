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

//! Possession and replication protocol
//!
//! Wire framing belongs to the transport; these types only describe what is
//! exchanged between participants.

use crate::ids::{EntityPath, ParticipantId};
use crate::math::Vec2;
use serde::{Deserialize, Serialize};

/// Kind of replicated node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    Controller,
    Pawn,
}

/// Message body exchanged between participants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Payload {
    /// Directed: mirror a possession decided by the server
    ClientPossess {
        controller: EntityPath,
        pawn: EntityPath,
    },
    /// Directed: a node was spawned on the server
    Spawned {
        path: EntityPath,
        kind: NodeKind,
        authority: ParticipantId,
        position: Vec2,
    },
    /// Directed: a node was removed on the server
    Despawned { path: EntityPath },
    /// Broadcast: current possession of a controller
    ControllerState {
        controller: EntityPath,
        possessed: Option<EntityPath>,
    },
    /// Broadcast: current position of a pawn
    PawnState { pawn: EntityPath, position: Vec2 },
}

impl Payload {
    /// Reliable payloads are sent directed and in order; the rest are
    /// periodic best-effort broadcasts.
    pub fn is_reliable(&self) -> bool {
        !matches!(
            self,
            Payload::ControllerState { .. } | Payload::PawnState { .. }
        )
    }

    pub fn name(&self) -> &'static str {
        match self {
            Payload::ClientPossess { .. } => "ClientPossess",
            Payload::Spawned { .. } => "Spawned",
            Payload::Despawned { .. } => "Despawned",
            Payload::ControllerState { .. } => "ControllerState",
            Payload::PawnState { .. } => "PawnState",
        }
    }
}

/// Payload stamped with its sender
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetMessage {
    pub from: ParticipantId,
    pub payload: Payload,
}

impl NetMessage {
    pub fn new(from: ParticipantId, payload: Payload) -> Self {
        Self { from, payload }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reliability() {
        let possess = Payload::ClientPossess {
            controller: EntityPath::controller(ParticipantId::new(2)),
            pawn: EntityPath::pawn(ParticipantId::new(2)),
        };
        assert!(possess.is_reliable());
        assert_eq!(possess.name(), "ClientPossess");

        let state = Payload::PawnState {
            pawn: EntityPath::pawn(ParticipantId::new(2)),
            position: Vec2::ZERO,
        };
        assert!(!state.is_reliable());
    }

    #[test]
    fn test_message_serialization() {
        let message = NetMessage::new(
            ParticipantId::SERVER,
            Payload::ControllerState {
                controller: EntityPath::controller(ParticipantId::new(3)),
                possessed: Some(EntityPath::pawn(ParticipantId::new(3))),
            },
        );

        let json = serde_json::to_string(&message).unwrap();
        assert!(json.contains("GameMode/3"));
        let deserialized: NetMessage = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized, message);
    }
}
