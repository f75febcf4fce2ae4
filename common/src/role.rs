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

//! Local participant role
//!
//! Every authority decision in the engine goes through a [`RoleContext`]
//! that is handed to the coordinator and the possession system when they are
//! built, instead of being queried from ambient state.

use crate::ids::ParticipantId;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

/// Role of the local process in a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Authoritative host of a networked session
    Server,
    /// Remote participant mirroring the server
    Client,
    /// Offline session; authoritative with no peers
    #[default]
    Standalone,
}

impl FromStr for Role {
    type Err = RoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "server" => Ok(Role::Server),
            "client" => Ok(Role::Client),
            "standalone" | "offline" => Ok(Role::Standalone),
            other => Err(RoleError::UnknownRole(other.to_string())),
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Server => write!(f, "server"),
            Role::Client => write!(f, "client"),
            Role::Standalone => write!(f, "standalone"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoleError {
    #[error("unknown role '{0}'")]
    UnknownRole(String),
    #[error("clients cannot use the server participant id {0}")]
    ClientUsesServerId(ParticipantId),
    #[error("the {role} role must use participant id {expected}, got {actual}")]
    AuthorityIdMismatch {
        role: Role,
        expected: ParticipantId,
        actual: ParticipantId,
    },
}

/// Role of the local participant together with its id
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoleContext {
    role: Role,
    local: ParticipantId,
    dedicated: bool,
}

impl RoleContext {
    /// Server context; a dedicated server has no local player
    pub fn server(dedicated: bool) -> Self {
        Self {
            role: Role::Server,
            local: ParticipantId::SERVER,
            dedicated,
        }
    }

    /// Client context for a remote participant
    pub fn client(local: ParticipantId) -> Self {
        Self {
            role: Role::Client,
            local,
            dedicated: false,
        }
    }

    pub fn standalone() -> Self {
        Self {
            role: Role::Standalone,
            local: ParticipantId::SERVER,
            dedicated: false,
        }
    }

    /// Build a context from configuration values, validating the id
    pub fn from_parts(
        role: Role,
        local: ParticipantId,
        dedicated: bool,
    ) -> Result<Self, RoleError> {
        match role {
            Role::Client if local.is_server() => Err(RoleError::ClientUsesServerId(local)),
            Role::Client => Ok(Self::client(local)),
            Role::Server | Role::Standalone if !local.is_server() => {
                Err(RoleError::AuthorityIdMismatch {
                    role,
                    expected: ParticipantId::SERVER,
                    actual: local,
                })
            }
            Role::Server => Ok(Self::server(dedicated)),
            Role::Standalone => Ok(Self::standalone()),
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn local_participant(&self) -> ParticipantId {
        self.local
    }

    pub fn is_dedicated(&self) -> bool {
        self.dedicated
    }

    /// Whether this participant is the authoritative server
    pub fn is_server(&self) -> bool {
        matches!(self.role, Role::Server | Role::Standalone)
    }

    /// Whether a player sits at this process
    pub fn has_local_player(&self) -> bool {
        !self.dedicated
    }

    pub fn is_local(&self, participant: ParticipantId) -> bool {
        self.local == participant
    }
}
