use std::{net::IpAddr, path::Path, time::Duration};

use cgmath::Vector3;
use serde::{Deserialize, Serialize};

use crate::{game::world::DEFAULT_CHUNK_SIZE, TITLE};

const SERVER_CONFIG_NAME: &str = "server";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub world_size: [u32; 3],
    pub ground_height: u32,
    pub max_slots: Option<usize>,
    pub one_user_per_address: bool,
    pub admin_address: Option<IpAddr>,
    pub listen_address: String,
    pub max_name_length: usize,
    pub max_chat_length: usize,
    pub protected_radius: f32,
    pub edit_rate_window_ms: u64,
    pub edit_rate_limit: u32,
    pub simulate_block_physics: bool,
    pub physics_step_ms: u64,
}

impl ServerSettings {
    pub fn load_from_file() -> Self {
        match confy::load(TITLE, Some(SERVER_CONFIG_NAME)) {
            Ok(settings) => settings,
            Err(e) => {
                log::error!("Failed to load server config from file - {}", e);
                ServerSettings::default()
            }
        }
    }

    /// Strict variant for explicitly requested config files.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, confy::ConfyError> {
        confy::load_path(path.as_ref())
    }

    pub fn world_size(&self) -> Vector3<u32> {
        Vector3::from(self.world_size)
    }

    pub fn edit_rate_window(&self) -> Duration {
        Duration::from_millis(self.edit_rate_window_ms)
    }

    pub fn physics_step(&self) -> Duration {
        Duration::from_millis(self.physics_step_ms)
    }
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            world_size: [128, 128, 32],
            ground_height: 16,
            max_slots: Some(16),
            one_user_per_address: true,
            admin_address: None,
            listen_address: "0.0.0.0:3000".to_owned(),
            max_name_length: 15,
            max_chat_length: 100,
            protected_radius: 10.0,
            edit_rate_window_ms: 100,
            edit_rate_limit: 5,
            simulate_block_physics: false,
            physics_step_ms: 100,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientSettings {
    pub chunk_size: u32,
    pub max_chunk_rebuilds_per_tick: usize,
    pub movement_update_interval_ms: u64,
    pub walk_speed: f32,
    pub jump_velocity: f32,
    pub gravity_per_tick: f32,
    pub look_sensitivity: f32,
}

impl ClientSettings {
    pub fn movement_update_interval(&self) -> Duration {
        Duration::from_millis(self.movement_update_interval_ms)
    }
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            max_chunk_rebuilds_per_tick: 1,
            movement_update_interval_ms: 100,
            walk_speed: 4.0,
            jump_velocity: 8.0,
            gravity_per_tick: 0.5,
            look_sensitivity: 0.005,
        }
    }
}
