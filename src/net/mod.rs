mod client;
mod command;
mod protocol;
mod server;
mod transport;

pub use client::ClientSession;
pub use command::{ChatCommand, CommandRegistry, KICKED_BY_ADMIN, PLAYER_NOT_FOUND, UNKNOWN_COMMAND};
pub use protocol::{sanitize, ClientMessage, ServerMessage};
pub use server::{
    in_view_frustum, ConnectionId, Outgoing, Rejection, Server, ADDRESS_IN_USE, BLOCK_SPAMMING, NAME_IN_USE, SERVER_FULL,
};
pub use transport::{bind, serve};
