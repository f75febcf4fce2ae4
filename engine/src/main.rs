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

use anyhow::{Context, bail};
use clap::Parser;
use pitlane_common::{EntityPath, Inbox, LocalNetwork, ParticipantId, RoleContext, Vec2};
use pitlane_engine::config::{Arguments, Configuration};
use pitlane_engine::ecs::components::{DragInput, GameLayer};
use pitlane_engine::participant::Participant;
use pitlane_engine::scene::HeadlessScene;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Ticks between simulated track collisions of each bot
const BOT_COLLISION_PERIOD: u64 = 120;

struct Node {
    participant: Participant,
    inbox: Inbox,
}

impl Node {
    /// Apply every message waiting in the inbox
    fn drain(&mut self) -> usize {
        let mut handled = 0;
        while let Ok(message) = self.inbox.try_recv() {
            if self.participant.handle_message(message) {
                handled += 1;
            }
        }
        handled
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load arguments from the command line
    let arguments: Arguments = Parser::parse();

    // Initialize tracing/logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_thread_ids(true)
        .with_level(true)
        .with_ansi(true)
        .init();

    // Load environment variables from .env file if specified
    if let Some(ref env_file) = arguments.env_file {
        if std::path::Path::new(env_file).exists() {
            tracing::debug!("Loading environment variables from file: {}", env_file);
            dotenv::from_filename(env_file).ok();
        }
    } else {
        tracing::debug!("Loading environment variables from default file");
        dotenv::dotenv().ok();
    }

    // Load configuration from a file with environment variable substitution
    let config = Configuration::load(&arguments.config_file)
        .with_context(|| format!("Unable to load configuration {}", arguments.config_file))?;
    tracing::debug!("Configuration loaded: {:?}", config);

    let role = config.role_context()?;
    if !role.is_server() {
        bail!("pitlane-server must run with the server role, got {}", role.role());
    }
    tracing::info!("Starting Pitlane Server...");

    let network = LocalNetwork::new();
    let (transport, inbox) = network.join(role.local_participant());
    let mut server = Node {
        participant: Participant::new(
            role,
            &config,
            Arc::new(transport),
            Box::new(HeadlessScene::new()),
        )?,
        inbox,
    };

    let mut bots = Vec::new();
    for index in 0..arguments.bots {
        let id = ParticipantId::new(index + 2);
        let (transport, inbox) = network.join(id);
        let participant = Participant::new(
            RoleContext::client(id),
            &config,
            Arc::new(transport),
            Box::new(HeadlessScene::new()),
        )?;
        server.participant.connected(id)?;
        bots.push(Node { participant, inbox });
        tracing::info!("Bot {} joined", id);
    }

    let interval = config.simulation.tick_interval();
    let delta = interval.as_secs_f64();
    let mut ticker = tokio::time::interval(interval);
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    let mut tick: u64 = 0;
    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = &mut shutdown => {
                tracing::info!("Shutdown requested");
                break;
            }
        }
        tick += 1;

        server.drain();
        for event in server.participant.tick(delta) {
            tracing::debug!("Server event {}", event.name());
        }

        for (index, bot) in bots.iter_mut().enumerate() {
            bot.drain();
            drive_bot(&mut bot.participant, tick, index);
            bot.participant.tick(delta);
        }

        if arguments.ticks > 0 && tick >= arguments.ticks {
            tracing::info!("Completed {} ticks", tick);
            break;
        }
    }

    for bot in &bots {
        let id = bot.participant.role().local_participant();
        match bot.participant.health_readout() {
            Some(readout) => tracing::info!("Bot {} finished with health {}", id, readout.label()),
            None => tracing::info!("Bot {} never possessed a pawn", id),
        }
        server.participant.disconnected(id);
        network.leave(id);
    }
    server.participant.tick(delta);

    tracing::info!("Pitlane Server stopped");
    Ok(())
}

/// Steer a bot around a circle and scrape the track now and then
fn drive_bot(bot: &mut Participant, tick: u64, index: usize) {
    let Some(pawn) = bot.local_pawn() else {
        return;
    };
    if let Some(position) = bot.context().position(pawn) {
        bot.drag(DragInput::Press(position));
    }
    let angle = (tick as f64) * 0.05 + index as f64;
    bot.drag(DragInput::Move(Vec2::new(angle.cos() * 50.0, angle.sin() * 50.0)));

    if tick % BOT_COLLISION_PERIOD == 0 {
        let path = EntityPath::pawn(bot.role().local_participant());
        if let Err(e) = bot.collision(&path, GameLayer::Track.into()) {
            tracing::warn!("Collision of {} failed: {}", path, e);
        }
    }
}
