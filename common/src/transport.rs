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

//! Transport abstraction
//!
//! The engine only needs two primitives from the network layer: a directed,
//! reliable, ordered send and a best-effort broadcast. Neither blocks the
//! caller. [`LocalNetwork`] provides both in-process over unbounded channels
//! so that a server and its clients can run in one process.

use crate::ids::ParticipantId;
use crate::protocol::{NetMessage, Payload};
use dashmap::DashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};

/// Receiving half handed to a participant when it joins a network
pub type Inbox = UnboundedReceiver<NetMessage>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("participant {0} is not reachable")]
    Unreachable(ParticipantId),
    #[error("participant {0} cannot address itself")]
    SelfAddressed(ParticipantId),
}

/// Network transport used by the engine
pub trait Transport: Send + Sync {
    /// Participant this transport sends on behalf of
    fn local_participant(&self) -> ParticipantId;

    /// Reliable, ordered delivery to exactly one participant
    fn send_to(&self, to: ParticipantId, payload: Payload) -> Result<(), TransportError>;

    /// Best-effort delivery to every other participant
    fn broadcast(&self, payload: Payload);
}

/// In-process network connecting participants through unbounded channels
#[derive(Debug, Clone, Default)]
pub struct LocalNetwork {
    peers: Arc<DashMap<ParticipantId, UnboundedSender<NetMessage>>>,
}

impl LocalNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a participant, replacing any previous attachment with the same id
    pub fn join(&self, participant: ParticipantId) -> (LocalTransport, Inbox) {
        let (sender, receiver) = unbounded_channel();
        if self.peers.insert(participant, sender).is_some() {
            tracing::warn!("Participant {} rejoined the local network", participant);
        }
        let transport = LocalTransport {
            local: participant,
            network: self.clone(),
        };
        (transport, receiver)
    }

    /// Detach a participant; its inbox stops receiving
    pub fn leave(&self, participant: ParticipantId) -> bool {
        self.peers.remove(&participant).is_some()
    }

    pub fn is_joined(&self, participant: ParticipantId) -> bool {
        self.peers.contains_key(&participant)
    }

    pub fn len(&self) -> usize {
        self.peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }
}

/// Sending half of a [`LocalNetwork`] attachment
#[derive(Debug, Clone)]
pub struct LocalTransport {
    local: ParticipantId,
    network: LocalNetwork,
}

impl Transport for LocalTransport {
    fn local_participant(&self) -> ParticipantId {
        self.local
    }

    fn send_to(&self, to: ParticipantId, payload: Payload) -> Result<(), TransportError> {
        if to == self.local {
            return Err(TransportError::SelfAddressed(to));
        }
        let peer = self
            .network
            .peers
            .get(&to)
            .ok_or(TransportError::Unreachable(to))?;
        tracing::trace!("{} -> {}: {}", self.local, to, payload.name());
        peer.send(NetMessage::new(self.local, payload))
            .map_err(|_| TransportError::Unreachable(to))
    }

    fn broadcast(&self, payload: Payload) {
        for peer in self.network.peers.iter() {
            if *peer.key() == self.local {
                continue;
            }
            if peer
                .value()
                .send(NetMessage::new(self.local, payload.clone()))
                .is_err()
            {
                tracing::trace!("Dropped {} for closed inbox of {}", payload.name(), peer.key());
            }
        }
    }
}

/// Transport for sessions without peers
#[derive(Debug, Clone, Copy, Default)]
pub struct NullTransport {
    local: ParticipantId,
}

impl NullTransport {
    pub fn new(local: ParticipantId) -> Self {
        Self { local }
    }
}

impl Transport for NullTransport {
    fn local_participant(&self) -> ParticipantId {
        self.local
    }

    fn send_to(&self, to: ParticipantId, _payload: Payload) -> Result<(), TransportError> {
        Err(TransportError::Unreachable(to))
    }

    fn broadcast(&self, _payload: Payload) {}
}
