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

//! Session, possession and replication integration tests over a loopback network

use pitlane_common::{
    EntityPath, Inbox, LocalNetwork, ParticipantId, Payload, RoleContext, Transport, Vec2,
};
use pitlane_engine::config::Configuration;
use pitlane_engine::ecs::EcsEntity;
use pitlane_engine::ecs::components::{Authority, DragInput, GameLayer};
use pitlane_engine::participant::Participant;
use pitlane_engine::scene::HeadlessScene;
use std::sync::Arc;

const FRAME: f64 = 0.016;

struct Peer {
    participant: Participant,
    inbox: Inbox,
}

impl Peer {
    fn join(network: &LocalNetwork, role: RoleContext) -> Self {
        let (transport, inbox) = network.join(role.local_participant());
        let participant = Participant::new(
            role,
            &Configuration::default(),
            Arc::new(transport),
            Box::new(HeadlessScene::new()),
        )
        .unwrap();
        Self { participant, inbox }
    }

    fn drain(&mut self) -> usize {
        let mut handled = 0;
        while let Ok(message) = self.inbox.try_recv() {
            if self.participant.handle_message(message) {
                handled += 1;
            }
        }
        handled
    }

    fn resolve(&self, path: &EntityPath) -> Option<EcsEntity> {
        self.participant.context().resolve(path)
    }

    fn possessed_by(&self, participant: ParticipantId) -> Option<EntityPath> {
        let pawn = self.participant.context().pawn_for(participant)?;
        self.participant.context().path_of(pawn)
    }
}

fn id(value: u32) -> ParticipantId {
    ParticipantId::new(value)
}

/// Dedicated server with one connected client whose pawn is already possessed
fn session_with_client(network: &LocalNetwork) -> (Peer, Peer) {
    let mut server = Peer::join(network, RoleContext::server(true));
    let mut client = Peer::join(network, RoleContext::client(id(2)));

    server.participant.connected(id(2)).unwrap();
    server.participant.tick(FRAME);
    client.drain();
    client.participant.tick(FRAME);
    (server, client)
}

#[test]
fn test_connect_spawns_and_possesses_remote_pawn() {
    let network = LocalNetwork::new();
    let (server, client) = session_with_client(&network);
    let pawn_path = EntityPath::pawn(id(2));

    assert_eq!(server.possessed_by(id(2)), Some(pawn_path.clone()));
    assert_eq!(client.possessed_by(id(2)), Some(pawn_path.clone()));

    let pawn = client.resolve(&pawn_path).unwrap();
    let authority = client
        .participant
        .context()
        .world()
        .get::<&Authority>(pawn)
        .unwrap()
        .participant();
    assert_eq!(authority, id(2));

    // A dedicated server has no pawn of its own
    assert_eq!(server.participant.local_pawn(), None);
    assert_eq!(
        server.participant.game_mode().unwrap().controller_count(),
        1
    );
    assert_eq!(
        client.participant.health_readout().unwrap().label(),
        "100 / 100"
    );
}

#[test]
fn test_client_movement_reaches_server() {
    let network = LocalNetwork::new();
    let (mut server, mut client) = session_with_client(&network);

    assert!(client.participant.drag(DragInput::Press(Vec2::ZERO)));
    assert!(client.participant.drag(DragInput::Move(Vec2::new(4.0, 0.0))));
    client.participant.tick(0.1);

    let pawn = client.participant.local_pawn().unwrap();
    assert_eq!(client.participant.context().position(pawn), Some(Vec2::new(4.0, 0.0)));

    assert!(server.drain() > 0);
    let server_pawn = server.resolve(&EntityPath::pawn(id(2))).unwrap();
    assert_eq!(
        server.participant.context().position(server_pawn),
        Some(Vec2::new(4.0, 0.0))
    );
}

#[test]
fn test_server_ignores_moves_of_pawns_it_does_not_own_locally() {
    let network = LocalNetwork::new();
    let (mut server, _client) = session_with_client(&network);
    let (spoofer, _inbox) = network.join(id(3));

    spoofer
        .send_to(
            ParticipantId::SERVER,
            Payload::PawnState {
                pawn: EntityPath::pawn(id(2)),
                position: Vec2::new(99.0, 99.0),
            },
        )
        .unwrap();

    assert_eq!(server.drain(), 0);
    let pawn = server.resolve(&EntityPath::pawn(id(2))).unwrap();
    assert_eq!(server.participant.context().position(pawn), Some(Vec2::ZERO));
}

#[test]
fn test_late_joiner_learns_existing_possessions() {
    let network = LocalNetwork::new();
    let (mut server, mut early) = session_with_client(&network);
    let mut late = Peer::join(&network, RoleContext::client(id(3)));

    server.participant.connected(id(3)).unwrap();
    // Long enough to both restart the new player and replicate controllers
    server.participant.tick(0.1);
    late.drain();
    early.drain();

    let early_pawn = EntityPath::pawn(id(2));
    assert!(late.resolve(&early_pawn).is_some());
    assert!(late.resolve(&EntityPath::controller(id(2))).is_some());
    assert_eq!(late.possessed_by(id(2)), Some(early_pawn));
    assert_eq!(late.possessed_by(id(3)), Some(EntityPath::pawn(id(3))));
    assert_eq!(early.possessed_by(id(3)), Some(EntityPath::pawn(id(3))));
}

#[test]
fn test_disconnect_removes_controller_and_pawn_everywhere() {
    let network = LocalNetwork::new();
    let (mut server, mut leaving) = session_with_client(&network);
    let mut staying = Peer::join(&network, RoleContext::client(id(3)));
    server.participant.connected(id(3)).unwrap();
    server.participant.tick(FRAME);
    staying.drain();
    leaving.drain();
    assert!(staying.resolve(&EntityPath::pawn(id(2))).is_some());

    assert!(server.participant.disconnected(id(2)));
    assert!(!server.participant.disconnected(id(2)));
    network.leave(id(2));

    assert!(server.resolve(&EntityPath::pawn(id(2))).is_none());
    assert!(server.resolve(&EntityPath::controller(id(2))).is_none());
    assert!(server.participant.context().controller_for(id(2)).is_none());

    staying.drain();
    assert!(staying.resolve(&EntityPath::pawn(id(2))).is_none());
    assert!(staying.resolve(&EntityPath::controller(id(2))).is_none());
    assert!(staying.resolve(&EntityPath::pawn(id(3))).is_some());
}

#[test]
fn test_client_collision_updates_local_hud() {
    let network = LocalNetwork::new();
    let (_server, mut client) = session_with_client(&network);
    let pawn_path = EntityPath::pawn(id(2));

    assert!(
        client
            .participant
            .collision(&pawn_path, GameLayer::Track.into())
            .unwrap()
    );
    client.participant.tick(FRAME);

    let readout = client.participant.health_readout().unwrap();
    assert_eq!(readout.current, 90.0);
    assert_eq!(readout.label(), "90 / 90");
}
