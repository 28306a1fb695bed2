//! Messages exchanged between clients and the server, one JSON document per line.

use serde::{Deserialize, Serialize};

/// Messages sent from a client to the server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Claim a player name, once per connection
    IdentityClaim { name: String },
    /// Ask for a block to be placed; `block` 0 removes it
    EditRequest { x: i64, y: i64, z: i64, block: i64 },
    Chat { text: String },
    /// Current position and orientation of the sender
    MovementUpdate {
        x: f32,
        y: f32,
        z: f32,
        pitch: f32,
        yaw: f32,
    },
}

/// Messages sent from the server to clients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Full world, one character per voxel
    WorldSnapshot { sx: u32, sy: u32, sz: u32, blocks: String },
    Spawn { x: f32, y: f32, z: f32 },
    EditConfirmed { x: i32, y: i32, z: i32, block: u8 },
    ChatBroadcast { speaker: String, text: String },
    /// Server generated text line
    Notice { text: String },
    Join {
        name: String,
        x: f32,
        y: f32,
        z: f32,
        pitch: f32,
        yaw: f32,
    },
    Leave { name: String },
    MovementBroadcast {
        name: String,
        x: f32,
        y: f32,
        z: f32,
        pitch: f32,
        yaw: f32,
    },
    /// The connection is about to be closed
    Kick { reason: String },
    SetPosition { x: f32, y: f32, z: f32 },
}

impl ClientMessage {
    pub fn decode(line: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(line.trim())
    }

    pub fn encode(&self) -> Result<String, serde_json::Error> {
        encode_line(self)
    }
}

impl ServerMessage {
    pub fn decode(line: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(line.trim())
    }

    pub fn encode(&self) -> Result<String, serde_json::Error> {
        encode_line(self)
    }

    pub fn notice(text: impl Into<String>) -> Self {
        ServerMessage::Notice { text: text.into() }
    }
}

fn encode_line(message: &impl Serialize) -> Result<String, serde_json::Error> {
    let mut line = serde_json::to_string(message)?;
    line.push('\n');
    Ok(line)
}

/// Trims and HTML-escapes text coming from a client before it is stored or shown to others.
pub fn sanitize(input: &str) -> String {
    let trimmed = input.trim();
    let mut out = String::with_capacity(trimmed.len());

    for c in trimmed.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }

    out
}
