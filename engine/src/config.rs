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

use crate::ecs::components::PawnTemplate;
use crate::gameplay::{GameplayEffect, HEALTH, ModifierOp};
use clap::Parser;
use pitlane_common::{ParticipantId, Role, RoleContext, RoleError};
use serde::{Deserialize, Serialize};
use serde_env_field::EnvField;
use std::collections::BTreeMap;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
pub struct Arguments {
    #[arg(
        short = 'c',
        long = "config",
        help = "Path to configuration file",
        default_value = "engine/config.yaml"
    )]
    pub config_file: String,

    #[arg(
        short = 'e',
        long = "env",
        help = "Path to environment file",
        default_value = "engine/.env"
    )]
    pub env_file: Option<String>,

    #[arg(
        short = 'b',
        long = "bots",
        help = "Number of loopback clients to connect",
        default_value_t = 0
    )]
    pub bots: u32,

    #[arg(
        short = 't',
        long = "ticks",
        help = "Stop after this many ticks, 0 runs until interrupted",
        default_value_t = 0
    )]
    pub ticks: u64,
}

impl Default for Arguments {
    fn default() -> Self {
        Self {
            config_file: "config.yaml".to_string(),
            env_file: Some(".env".to_string()),
            bots: 0,
            ticks: 0,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to open config file {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("invalid configuration: {0}")]
    Invalid(String),
    #[error(transparent)]
    Role(#[from] RoleError),
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Configuration {
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub simulation: SimulationConfig,
    #[serde(default)]
    pub pawn: PawnConfig,
}

impl Configuration {
    pub fn load(path: &str) -> Result<Configuration, ConfigError> {
        let file = std::fs::File::open(path).map_err(|source| ConfigError::Open {
            path: path.to_string(),
            source,
        })?;
        let config: Configuration =
            serde_yaml::from_reader(file).map_err(|source| ConfigError::Parse {
                path: path.to_string(),
                source,
            })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if *self.simulation.tick_rate == 0 {
            return Err(ConfigError::Invalid("tick_rate must be positive".into()));
        }
        if !(*self.simulation.replication_interval > 0.0) {
            return Err(ConfigError::Invalid(
                "replication_interval must be positive".into(),
            ));
        }
        self.role_context()?;
        Ok(())
    }

    /// Role context described by the session section
    pub fn role_context(&self) -> Result<RoleContext, RoleError> {
        RoleContext::from_parts(
            *self.session.role,
            *self.session.participant_id,
            *self.session.dedicated,
        )
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub role: EnvField<Role>,
    pub participant_id: EnvField<ParticipantId>,
    /// A dedicated server hosts no local player
    pub dedicated: EnvField<bool>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            role: Role::Server.into(),
            participant_id: ParticipantId::SERVER.into(),
            dedicated: true.into(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Ticks per second
    pub tick_rate: EnvField<u32>,
    /// Seconds between state broadcasts
    pub replication_interval: EnvField<f64>,
}

impl SimulationConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / f64::from(*self.tick_rate))
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            tick_rate: 60_u32.into(),
            replication_interval: 0.1_f64.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PawnConfig {
    /// Base values of the attributes every pawn spawns with
    pub attributes: BTreeMap<String, f64>,
    /// Effect applied when a pawn hits the track boundary
    pub collision_effect: GameplayEffect,
}

impl PawnConfig {
    pub fn template(&self) -> PawnTemplate {
        PawnTemplate {
            attributes: self.attributes.clone(),
        }
    }
}

impl Default for PawnConfig {
    fn default() -> Self {
        Self {
            attributes: PawnTemplate::default().attributes,
            collision_effect: GameplayEffect::instant().with(HEALTH, -10.0, ModifierOp::Add),
        }
    }
}
