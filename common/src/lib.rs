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

//! Pitlane Common Types and Protocols
//!
//! This crate defines the types shared by every participant of a Pitlane session:
//! - Participant and entity identities
//! - Participant roles (server, client, standalone)
//! - The possession and replication protocol
//! - The transport abstraction and an in-process loopback network

pub mod ids;
pub mod math;
pub mod protocol;
pub mod role;
pub mod transport;

pub use ids::{EntityPath, ParticipantId};
pub use math::Vec2;
pub use protocol::{NetMessage, NodeKind, Payload};
pub use role::{Role, RoleContext, RoleError};
pub use transport::{Inbox, LocalNetwork, LocalTransport, NullTransport, Transport, TransportError};
