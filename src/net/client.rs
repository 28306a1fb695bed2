use std::{collections::VecDeque, sync::Arc};

use cgmath::{InnerSpace, Vector3};
use instant::Instant;

use crate::{
    game::{
        world::{BlockCatalog, BlockKind, PlayerState, SnapshotError, World},
        State,
    },
    misc::ClientSettings,
    net::protocol::{ClientMessage, ServerMessage},
};

/// Remote players moving further than this between updates are animated as walking.
const MOVING_THRESHOLD: f32 = 0.1;

/// Client side of a connection. Applies server messages to the local world and queues the
/// messages to send back.
pub struct ClientSession {
    settings: ClientSettings,
    catalog: Arc<BlockCatalog>,
    name: String,
    state: Option<State>,
    kicked: Option<String>,
    outbox: VecDeque<ClientMessage>,
    chat_log: Vec<String>,
    last_movement_update: Option<Instant>,
}

impl ClientSession {
    /// Starts a session and queues the identity claim.
    pub fn new(name: impl Into<String>, settings: ClientSettings, catalog: Arc<BlockCatalog>) -> Self {
        let name = name.into();

        Self {
            outbox: VecDeque::from([ClientMessage::IdentityClaim { name: name.clone() }]),
            settings,
            catalog,
            name,
            state: None,
            kicked: None,
            chat_log: Vec::new(),
            last_movement_update: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn settings(&self) -> &ClientSettings {
        &self.settings
    }

    /// Present once the world snapshot arrived.
    pub fn state(&self) -> Option<&State> {
        self.state.as_ref()
    }

    pub fn state_mut(&mut self) -> Option<&mut State> {
        self.state.as_mut()
    }

    pub fn kick_reason(&self) -> Option<&str> {
        self.kicked.as_deref()
    }

    pub fn chat_log(&self) -> &[String] {
        &self.chat_log
    }

    pub fn drain_outgoing(&mut self) -> impl Iterator<Item = ClientMessage> + '_ {
        self.outbox.drain(..)
    }

    // --------------------------------

    pub fn handle(&mut self, message: ServerMessage) -> Result<(), SnapshotError> {
        if let ServerMessage::WorldSnapshot { sx, sy, sz, blocks } = message {
            let world = World::from_network_string(Vector3::new(sx, sy, sz), &blocks, self.catalog.clone())?;
            log::info!("Received {}x{}x{} world", sx, sy, sz);

            self.state = Some(State::new(world, &self.settings));
            return Ok(());
        }

        match message {
            ServerMessage::ChatBroadcast { speaker, text } => self.chat_log.push(format!("<{speaker}> {text}")),
            ServerMessage::Notice { text } => self.chat_log.push(text),
            ServerMessage::Kick { reason } => {
                log::warn!("Kicked from the server - {reason}");
                self.kicked = Some(reason);
            }
            message => match self.state.as_mut() {
                Some(state) => Self::apply(state, message),
                None => log::debug!("Ignored {message:?} before the world arrived"),
            },
        }

        Ok(())
    }

    fn apply(state: &mut State, message: ServerMessage) {
        match message {
            ServerMessage::Spawn { x, y, z } => state.set_spawn(Vector3::new(x, y, z)),
            ServerMessage::SetPosition { x, y, z } => state.player_mut().teleport(Vector3::new(x, y, z)),
            ServerMessage::EditConfirmed { x, y, z, block } => {
                let pos = Vector3::new(x, y, z);
                let Some(kind) = BlockKind::from_id(block as i64) else {
                    log::warn!("Server confirmed unknown block id {block}");
                    return;
                };
                if let Err(e) = state.set_block(pos, kind) {
                    log::warn!("Failed applying confirmed edit - {e}");
                }
            }
            ServerMessage::Join {
                name,
                x,
                y,
                z,
                pitch,
                yaw,
            } => state
                .world_mut()
                .add_player(name, PlayerState::new(Vector3::new(x, y, z), pitch, yaw)),
            ServerMessage::Leave { name } => {
                state.world_mut().remove_player(&name);
            }
            ServerMessage::MovementBroadcast {
                name,
                x,
                y,
                z,
                pitch,
                yaw,
            } => {
                if let Some(other) = state.world_mut().player_mut(&name) {
                    let position = Vector3::new(x, y, z);
                    other.moving = (position - other.position).magnitude() > MOVING_THRESHOLD;
                    other.position = position;
                    other.pitch = pitch;
                    other.yaw = yaw;
                }
            }
            _ => {}
        }
    }

    // --------------------------------

    /// Asks the server to place `kind` at `pos`. Nothing changes locally until it is confirmed.
    pub fn request_edit(&mut self, pos: Vector3<i32>, kind: BlockKind) {
        self.outbox.push_back(ClientMessage::EditRequest {
            x: pos.x as i64,
            y: pos.y as i64,
            z: pos.z as i64,
            block: kind.id() as i64,
        })
    }

    pub fn chat(&mut self, text: impl Into<String>) {
        self.outbox.push_back(ClientMessage::Chat { text: text.into() })
    }

    /// Advances the local simulation and queues a movement update once per interval.
    /// Returns the number of chunks rebuilt.
    pub fn tick(&mut self, dt: f32, now: Instant) -> usize {
        let Some(state) = self.state.as_mut() else {
            return 0;
        };
        let rebuilt = state.update(dt, &self.settings);

        let due = self
            .last_movement_update
            .map_or(true, |last| now.saturating_duration_since(last) >= self.settings.movement_update_interval());
        if due {
            let player = state.player();
            self.outbox.push_back(ClientMessage::MovementUpdate {
                x: player.position.x,
                y: player.position.y,
                z: player.position.z,
                pitch: player.camera.pitch().0,
                yaw: player.camera.yaw().0,
            });
            self.last_movement_update = Some(now);
        }

        rebuilt
    }
}
