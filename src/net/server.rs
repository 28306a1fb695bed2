//! Authoritative game server core. It performs no I/O: the session layer feeds it connection
//! events and drains the queued outgoing messages.

use std::{
    collections::{BTreeMap, VecDeque},
    f32::consts::{FRAC_PI_2, PI, TAU},
    fmt,
    net::IpAddr,
    sync::Arc,
};

use cgmath::{InnerSpace, Vector3};
use instant::{Duration, Instant};
use thiserror::Error;

use crate::{
    game::world::{BlockCatalog, BlockPhysics, PlayerState, World, WorldError},
    misc::ServerSettings,
    net::{
        command::CommandRegistry,
        protocol::{sanitize, ClientMessage, ServerMessage},
    },
};

pub const SERVER_FULL: &str = "The server is full!";
pub const ADDRESS_IN_USE: &str = "Multiple clients connecting from the same IP address!";
pub const NAME_IN_USE: &str = "That username is already in use!";
pub const BLOCK_SPAMMING: &str = "Block spamming.";

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ConnectionId(pub u64);

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Instruction for the session layer.
#[derive(Clone, Debug, PartialEq)]
pub enum Outgoing {
    Send(ConnectionId, ServerMessage),
    /// Stop reading from and writing to the connection.
    Close(ConnectionId),
}

/// Why a client message was dropped without a reply.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum Rejection {
    #[error("name must be 1 to {0} characters long")]
    InvalidName(usize),
    #[error("connection is already known as {0}")]
    AlreadyIdentified(String),
    #[error("{0} sent before identifying")]
    NotIdentified(&'static str),
    #[error("edit at ({0}, {1}, {2}) is outside the world")]
    OutOfBounds(i64, i64, i64),
    #[error("edit at ({0}, {1}, {2}) is inside the protected spawn area")]
    ProtectedArea(i64, i64, i64),
    #[error("block id {0} cannot be placed")]
    DisallowedBlock(i64),
    #[error("chat message is empty or longer than {0} characters")]
    InvalidChat(usize),
    #[error("movement update contains a non-finite value")]
    NonFinite,
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum ConnectionState {
    Connected,
    Identified { name: String },
    Active { name: String },
}

/// Counts edits inside a fixed window that restarts whenever it has run out.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct EditRateLimiter {
    window_start: Instant,
    count: u32,
}

impl EditRateLimiter {
    fn new(now: Instant) -> Self {
        Self {
            window_start: now,
            count: 0,
        }
    }

    /// Records one edit and returns whether it stays within `limit`.
    fn record(&mut self, now: Instant, window: Duration, limit: u32) -> bool {
        if now.saturating_duration_since(self.window_start) < window {
            self.count += 1;
        } else {
            self.count = 1;
            self.window_start = now;
        }

        self.count <= limit
    }
}

#[derive(Clone, Debug)]
struct Connection {
    address: IpAddr,
    state: ConnectionState,
    edits: EditRateLimiter,
    holds_slot: bool,
}

impl Connection {
    fn name(&self) -> Option<&str> {
        match &self.state {
            ConnectionState::Connected => None,
            ConnectionState::Identified { name } | ConnectionState::Active { name } => Some(name),
        }
    }

    fn active_name(&self) -> Option<&str> {
        match &self.state {
            ConnectionState::Active { name } => Some(name),
            _ => None,
        }
    }
}

pub struct Server {
    settings: ServerSettings,
    world: World,
    connections: BTreeMap<ConnectionId, Connection>,
    used_slots: usize,
    commands: CommandRegistry,
    outbox: VecDeque<Outgoing>,
    physics_step: u64,
}

impl Server {
    pub fn new(
        settings: ServerSettings,
        catalog: Arc<BlockCatalog>,
        commands: CommandRegistry,
    ) -> Result<Self, WorldError> {
        let world = World::flat(settings.world_size(), settings.ground_height, catalog)?;

        Ok(Self {
            settings,
            world,
            connections: BTreeMap::new(),
            used_slots: 0,
            commands,
            outbox: VecDeque::new(),
            physics_step: 0,
        })
    }

    pub fn settings(&self) -> &ServerSettings {
        &self.settings
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn used_slots(&self) -> usize {
        self.used_slots
    }

    pub fn address(&self, conn: ConnectionId) -> Option<IpAddr> {
        self.connections.get(&conn).map(|connection| connection.address)
    }

    pub fn is_connected(&self, conn: ConnectionId) -> bool {
        self.connections.contains_key(&conn)
    }

    /// Names of fully joined players, in connection order.
    pub fn active_players(&self) -> impl Iterator<Item = (ConnectionId, &str)> {
        self.connections
            .iter()
            .filter_map(|(conn, connection)| connection.active_name().map(|name| (*conn, name)))
    }

    pub fn player_name(&self, conn: ConnectionId) -> Option<&str> {
        self.connections.get(&conn).and_then(Connection::active_name)
    }

    /// First player whose name contains `query`, ignoring case.
    pub fn find_player(&self, query: &str) -> Option<(ConnectionId, String)> {
        let query = query.to_lowercase();

        self.active_players()
            .find(|(_, name)| name.to_lowercase().contains(&query))
            .map(|(conn, name)| (conn, name.to_owned()))
    }

    pub fn drain_outgoing(&mut self) -> impl Iterator<Item = Outgoing> + '_ {
        self.outbox.drain(..)
    }

    // --------------------------------

    pub fn send(&mut self, conn: ConnectionId, message: ServerMessage) {
        self.outbox.push_back(Outgoing::Send(conn, message))
    }

    pub fn send_notice(&mut self, conn: ConnectionId, text: impl Into<String>) {
        self.send(conn, ServerMessage::notice(text))
    }

    /// Sends to every fully joined player.
    pub fn broadcast(&mut self, message: ServerMessage) {
        self.broadcast_except(None, message)
    }

    pub fn broadcast_notice(&mut self, text: impl Into<String>) {
        self.broadcast(ServerMessage::notice(text))
    }

    fn broadcast_except(&mut self, skip: Option<ConnectionId>, message: ServerMessage) {
        let targets: Vec<_> = self
            .active_players()
            .map(|(conn, _)| conn)
            .filter(|conn| Some(*conn) != skip)
            .collect();

        for conn in targets {
            self.send(conn, message.clone());
        }
    }

    pub fn set_position(&mut self, conn: ConnectionId, position: Vector3<f32>) {
        self.send(
            conn,
            ServerMessage::SetPosition {
                x: position.x,
                y: position.y,
                z: position.z,
            },
        )
    }

    pub fn kick(&mut self, conn: ConnectionId, reason: &str) {
        let Some(connection) = self.connections.get(&conn) else {
            return;
        };

        log::info!("Client {} was kicked ({}).", connection.address, reason);
        if let Some(name) = connection.active_name().map(str::to_owned) {
            self.broadcast_notice(format!("{name} was kicked ({reason})."));
        }

        self.send(conn, ServerMessage::Kick { reason: reason.to_owned() });
        self.outbox.push_back(Outgoing::Close(conn));
        self.disconnect(conn);
    }

    // --------------------------------

    pub fn connect(&mut self, conn: ConnectionId, address: IpAddr, now: Instant) {
        log::info!("Client {} connected to the server.", address);

        let same_address = self
            .connections
            .values()
            .any(|connection| connection.address == address);
        self.connections.insert(
            conn,
            Connection {
                address,
                state: ConnectionState::Connected,
                edits: EditRateLimiter::new(now),
                holds_slot: false,
            },
        );

        if self.settings.max_slots.map_or(false, |max| self.used_slots >= max) {
            self.kick(conn, SERVER_FULL);
            return;
        }
        if self.settings.one_user_per_address && same_address {
            self.kick(conn, ADDRESS_IN_USE);
            return;
        }

        if let Some(connection) = self.connections.get_mut(&conn) {
            connection.holds_slot = true;
            self.used_slots += 1;
        }
    }

    /// Tears the connection down. Safe to call more than once.
    pub fn disconnect(&mut self, conn: ConnectionId) {
        let Some(connection) = self.connections.remove(&conn) else {
            return;
        };

        log::info!("Client {} disconnected from the server.", connection.address);
        if connection.holds_slot {
            self.used_slots -= 1;
        }

        if let Some(name) = connection.name() {
            self.world.remove_player(name);
        }
        if let ConnectionState::Active { name } = connection.state {
            self.broadcast_notice(format!("{name} left the game."));
            self.broadcast(ServerMessage::Leave { name });
        }
    }

    pub fn handle(&mut self, conn: ConnectionId, message: ClientMessage, now: Instant) {
        let Some(name) = self.connections.get(&conn).map(|connection| connection.name().map(str::to_owned)) else {
            log::debug!("Dropped message from closed connection {conn}");
            return;
        };

        let result = match (name, message) {
            (None, ClientMessage::IdentityClaim { name }) => self.on_identity(conn, &name),
            (None, _) => Err(Rejection::NotIdentified("message")),
            (Some(name), ClientMessage::IdentityClaim { .. }) => Err(Rejection::AlreadyIdentified(name)),
            (Some(_), ClientMessage::EditRequest { x, y, z, block }) => self.on_edit(conn, [x, y, z], block, now),
            (Some(_), ClientMessage::Chat { text }) => self.on_chat(conn, &text),
            (Some(_), ClientMessage::MovementUpdate { x, y, z, pitch, yaw }) => {
                self.on_movement(conn, Vector3::new(x, y, z), pitch, yaw)
            }
        };

        if let Err(rejection) = result {
            log::debug!("Rejected message from {conn} - {rejection}");
        }
    }

    /// Runs one block physics step and broadcasts what changed.
    pub fn physics_tick(&mut self) {
        if !self.settings.simulate_block_physics {
            return;
        }

        for update in BlockPhysics::simulate(&mut self.world, self.physics_step) {
            self.broadcast(ServerMessage::EditConfirmed {
                x: update.pos.x,
                y: update.pos.y,
                z: update.pos.z,
                block: update.kind.id(),
            });
        }
        self.physics_step += 1;
    }

    // --------------------------------

    fn on_identity(&mut self, conn: ConnectionId, claimed: &str) -> Result<(), Rejection> {
        let claimed = claimed.trim();
        let length = claimed.chars().count();
        if length == 0 || length > self.settings.max_name_length {
            return Err(Rejection::InvalidName(self.settings.max_name_length));
        }

        let name = sanitize(claimed);
        let taken = self
            .connections
            .values()
            .filter_map(Connection::name)
            .any(|existing| existing.to_lowercase() == name.to_lowercase());
        if taken {
            self.kick(conn, NAME_IN_USE);
            return Ok(());
        }

        if let Some(connection) = self.connections.get_mut(&conn) {
            log::info!("Client {} is now known as {}.", connection.address, name);
            connection.state = ConnectionState::Identified { name: name.clone() };
        }

        let size = self.world.size();
        let spawn = self.world.spawn_point();
        self.send(
            conn,
            ServerMessage::WorldSnapshot {
                sx: size.x,
                sy: size.y,
                sz: size.z,
                blocks: self.world.to_network_string(),
            },
        );
        self.send(
            conn,
            ServerMessage::Spawn {
                x: spawn.x,
                y: spawn.y,
                z: spawn.z,
            },
        );

        let existing: Vec<_> = self
            .active_players()
            .filter_map(|(_, other)| self.world.player(other).map(|state| join_message(other, state)))
            .collect();
        for message in existing {
            self.send(conn, message);
        }

        let state = PlayerState::new(spawn, 0.0, 0.0);
        self.broadcast(join_message(&name, &state));
        self.world.add_player(name.clone(), state);

        if let Some(connection) = self.connections.get_mut(&conn) {
            connection.state = ConnectionState::Active { name: name.clone() };
        }

        self.send_notice(conn, format!("Welcome! Enjoy your stay, {name}!"));
        self.broadcast_except(Some(conn), ServerMessage::notice(format!("{name} joined the game.")));

        Ok(())
    }

    fn on_edit(&mut self, conn: ConnectionId, coords: [i64; 3], block: i64, now: Instant) -> Result<(), Rejection> {
        let [x, y, z] = coords;
        let size = self.world.size();
        let in_bounds = [(x, size.x), (y, size.y), (z, size.z)]
            .iter()
            .all(|(val, max)| *val >= 0 && *val < *max as i64);
        if !in_bounds {
            return Err(Rejection::OutOfBounds(x, y, z));
        }

        let pos = Vector3::new(x as i32, y as i32, z as i32);
        let distance = (pos.map(|val| val as f32) - self.world.spawn_point()).magnitude();
        if distance < self.settings.protected_radius {
            return Err(Rejection::ProtectedArea(x, y, z));
        }

        let kind = match self.world.catalog().from_id(block) {
            Some(target) if target.is_spawnable() || target.is_air() => target.kind(),
            _ => return Err(Rejection::DisallowedBlock(block)),
        };

        let (window, limit) = (self.settings.edit_rate_window(), self.settings.edit_rate_limit);
        let within_limit = self
            .connections
            .get_mut(&conn)
            .map_or(false, |connection| connection.edits.record(now, window, limit));
        if !within_limit {
            self.kick(conn, BLOCK_SPAMMING);
            return Ok(());
        }

        if let Err(e) = self.world.set_block(pos, kind) {
            log::error!("Validated edit was refused by the world - {e}");
            return Ok(());
        }
        self.broadcast(ServerMessage::EditConfirmed {
            x: pos.x,
            y: pos.y,
            z: pos.z,
            block: kind.id(),
        });

        Ok(())
    }

    fn on_chat(&mut self, conn: ConnectionId, text: &str) -> Result<(), Rejection> {
        let trimmed = text.trim();
        let length = trimmed.chars().count();
        if length == 0 || length > self.settings.max_chat_length {
            return Err(Rejection::InvalidChat(self.settings.max_chat_length));
        }

        let text = sanitize(trimmed);
        let speaker = self.player_name(conn).unwrap_or_default().to_owned();
        log::info!("<{}> {}", speaker, text);

        if let Some(command_line) = text.strip_prefix(CommandRegistry::PREFIX) {
            let commands = self.commands.clone();
            commands.dispatch(self, conn, command_line);
            return Ok(());
        }

        self.broadcast(ServerMessage::ChatBroadcast { speaker, text });

        Ok(())
    }

    fn on_movement(&mut self, conn: ConnectionId, position: Vector3<f32>, pitch: f32, yaw: f32) -> Result<(), Rejection> {
        let finite = position.x.is_finite()
            && position.y.is_finite()
            && position.z.is_finite()
            && pitch.is_finite()
            && yaw.is_finite();
        if !finite {
            return Err(Rejection::NonFinite);
        }

        let Some(name) = self.player_name(conn).map(str::to_owned) else {
            return Err(Rejection::NotIdentified("movement update"));
        };
        let Some(mover) = self.world.player_mut(&name) else {
            return Err(Rejection::NotIdentified("movement update"));
        };
        mover.moving = (position - mover.position).magnitude() > 0.1;
        mover.position = position;
        mover.pitch = pitch;
        mover.yaw = yaw;
        let mover = mover.clone();

        let observers: Vec<_> = self
            .active_players()
            .filter(|(other, _)| *other != conn)
            .filter(|(_, other)| {
                self.world
                    .player(other)
                    .map_or(false, |observer| in_view_frustum(observer, &mover))
            })
            .map(|(other, _)| other)
            .collect();

        let message = ServerMessage::MovementBroadcast {
            name,
            x: position.x,
            y: position.y,
            z: position.z,
            pitch,
            yaw,
        };
        for observer in observers {
            self.send(observer, message.clone());
        }

        Ok(())
    }
}

fn join_message(name: &str, state: &PlayerState) -> ServerMessage {
    ServerMessage::Join {
        name: name.to_owned(),
        x: state.position.x,
        y: state.position.y,
        z: state.position.z,
        pitch: state.pitch,
        yaw: state.yaw,
    }
}

/// Maps an angle into `[0, 2π)`.
fn normalize_angle(angle: f32) -> f32 {
    let angle = angle % TAU;
    if angle < 0.0 {
        TAU + angle
    } else {
        angle
    }
}

/// Whether `mover` lies within the half space in front of `observer`. Compares the
/// normalised angles directly, so directions close to the 0/2π seam count as far apart.
pub fn in_view_frustum(observer: &PlayerState, mover: &PlayerState) -> bool {
    let angle = PI + (observer.position.y - mover.position.y).atan2(observer.position.x - mover.position.x);
    let observer_yaw = PI - observer.yaw - FRAC_PI_2;

    (normalize_angle(observer_yaw) - normalize_angle(angle)).abs() < FRAC_PI_2
}

#[cfg(test)]
mod tests {
    use std::net::Ipv4Addr;

    use super::*;
    use crate::game::world::BlockKind;

    fn settings() -> ServerSettings {
        ServerSettings {
            world_size: [16, 16, 16],
            ground_height: 8,
            ..ServerSettings::default()
        }
    }

    fn server_with(settings: ServerSettings) -> Server {
        Server::new(
            settings,
            Arc::new(BlockCatalog::new().unwrap()),
            CommandRegistry::with_builtins(),
        )
        .unwrap()
    }

    fn address(last: u8) -> IpAddr {
        IpAddr::V4(Ipv4Addr::new(10, 0, 0, last))
    }

    fn join(server: &mut Server, id: u64, name: &str, now: Instant) -> ConnectionId {
        let conn = ConnectionId(id);
        server.connect(conn, address(id as u8), now);
        server.handle(conn, ClientMessage::IdentityClaim { name: name.to_owned() }, now);
        conn
    }

    fn sent_to(outgoing: &[Outgoing], conn: ConnectionId) -> Vec<ServerMessage> {
        outgoing
            .iter()
            .filter_map(|out| match out {
                Outgoing::Send(target, message) if *target == conn => Some(message.clone()),
                _ => None,
            })
            .collect()
    }

    fn player(x: f32, y: f32, yaw: f32) -> PlayerState {
        PlayerState::new(Vector3::new(x, y, 0.0), 0.0, yaw)
    }

    #[test]
    fn rate_limiter_resets_on_each_window() {
        let start = Instant::now();
        let window = Duration::from_millis(100);
        let mut limiter = EditRateLimiter::new(start);

        for _ in 0..5 {
            assert!(limiter.record(start, window, 5));
        }
        assert!(!limiter.record(start + Duration::from_millis(50), window, 5));

        assert!(limiter.record(start + Duration::from_millis(150), window, 5));
        assert_eq!(limiter.count, 1);
    }

    #[test]
    fn frustum_follows_observer_yaw() {
        let observer = player(0.0, 0.0, 0.0);

        assert!(in_view_frustum(&observer, &player(0.0, 5.0, 0.0)));
        assert!(!in_view_frustum(&observer, &player(0.0, -5.0, 0.0)));
        assert!(in_view_frustum(&player(0.0, 0.0, FRAC_PI_2), &player(5.0, 1.0, 0.0)));
        assert!(!in_view_frustum(&player(0.0, 0.0, FRAC_PI_2), &player(-5.0, 0.0, 0.0)));
    }

    #[test]
    fn full_server_kicks_new_connections() {
        let mut server = server_with(ServerSettings {
            max_slots: Some(1),
            ..settings()
        });
        let now = Instant::now();
        join(&mut server, 1, "Alice", now);
        server.drain_outgoing().for_each(drop);

        server.connect(ConnectionId(2), address(2), now);
        let outgoing: Vec<_> = server.drain_outgoing().collect();

        assert_eq!(
            sent_to(&outgoing, ConnectionId(2)),
            vec![ServerMessage::Kick { reason: SERVER_FULL.to_owned() }]
        );
        assert!(outgoing.contains(&Outgoing::Close(ConnectionId(2))));
        assert_eq!(server.used_slots(), 1);
        assert!(!server.is_connected(ConnectionId(2)));
    }

    #[test]
    fn one_connection_per_address() {
        let mut server = server_with(settings());
        let now = Instant::now();
        server.connect(ConnectionId(1), address(7), now);
        server.connect(ConnectionId(2), address(7), now);

        let outgoing: Vec<_> = server.drain_outgoing().collect();
        assert_eq!(
            sent_to(&outgoing, ConnectionId(2)),
            vec![ServerMessage::Kick { reason: ADDRESS_IN_USE.to_owned() }]
        );
        assert_eq!(server.used_slots(), 1);
    }

    #[test]
    fn messages_before_identity_are_ignored() {
        let mut server = server_with(settings());
        let now = Instant::now();
        server.connect(ConnectionId(1), address(1), now);

        server.handle(ConnectionId(1), ClientMessage::EditRequest { x: 0, y: 0, z: 0, block: 8 }, now);
        server.handle(ConnectionId(1), ClientMessage::Chat { text: "hi".to_owned() }, now);

        assert_eq!(server.drain_outgoing().count(), 0);
        assert_eq!(server.world().block_kind(Vector3::new(0, 0, 0)), BlockKind::Dirt);
    }

    #[test]
    fn invalid_names_are_dropped_silently() {
        let mut server = server_with(settings());
        let now = Instant::now();
        server.connect(ConnectionId(1), address(1), now);

        server.handle(ConnectionId(1), ClientMessage::IdentityClaim { name: String::new() }, now);
        server.handle(ConnectionId(1), ClientMessage::IdentityClaim { name: "x".repeat(16) }, now);

        assert_eq!(server.drain_outgoing().count(), 0);
        assert!(server.is_connected(ConnectionId(1)));
        assert_eq!(server.active_players().count(), 0);
    }

    #[test]
    fn blank_names_are_dropped() {
        let mut server = server_with(settings());
        let now = Instant::now();
        server.connect(ConnectionId(1), address(1), now);

        server.handle(ConnectionId(1), ClientMessage::IdentityClaim { name: "   ".to_owned() }, now);
        server.handle(ConnectionId(1), ClientMessage::IdentityClaim { name: "\t\n".to_owned() }, now);

        assert_eq!(server.drain_outgoing().count(), 0);
        assert!(server.is_connected(ConnectionId(1)));
        assert_eq!(server.active_players().count(), 0);

        server.handle(ConnectionId(1), ClientMessage::IdentityClaim { name: "  Bob  ".to_owned() }, now);
        assert_eq!(server.player_name(ConnectionId(1)), Some("Bob"));
    }

    #[test]
    fn names_are_sanitized() {
        let mut server = server_with(settings());
        join(&mut server, 1, "<b>", Instant::now());

        assert_eq!(server.player_name(ConnectionId(1)), Some("&lt;b&gt;"));
    }

    #[test]
    fn joining_announces_both_ways() {
        let mut server = server_with(settings());
        let now = Instant::now();
        let alice = join(&mut server, 1, "Alice", now);
        server.drain_outgoing().for_each(drop);

        let bob = join(&mut server, 2, "Bob", now);
        let outgoing: Vec<_> = server.drain_outgoing().collect();

        let to_bob = sent_to(&outgoing, bob);
        assert!(matches!(to_bob[0], ServerMessage::WorldSnapshot { .. }));
        assert!(matches!(to_bob[1], ServerMessage::Spawn { .. }));
        assert!(matches!(&to_bob[2], ServerMessage::Join { name, .. } if name == "Alice"));
        assert!(to_bob.contains(&ServerMessage::notice("Welcome! Enjoy your stay, Bob!")));

        let to_alice = sent_to(&outgoing, alice);
        assert!(matches!(&to_alice[0], ServerMessage::Join { name, .. } if name == "Bob"));
        assert!(to_alice.contains(&ServerMessage::notice("Bob joined the game.")));
    }

    #[test]
    fn leaving_announces_and_frees_the_name() {
        let mut server = server_with(settings());
        let now = Instant::now();
        let alice = join(&mut server, 1, "Alice", now);
        let bob = join(&mut server, 2, "Bob", now);
        server.drain_outgoing().for_each(drop);

        server.disconnect(bob);
        server.disconnect(bob);
        let outgoing: Vec<_> = server.drain_outgoing().collect();

        assert_eq!(
            sent_to(&outgoing, alice),
            vec![
                ServerMessage::notice("Bob left the game."),
                ServerMessage::Leave { name: "Bob".to_owned() }
            ]
        );
        assert_eq!(server.used_slots(), 1);
        assert!(server.world().player("Bob").is_none());

        join(&mut server, 3, "bob", now);
        assert_eq!(server.player_name(ConnectionId(3)), Some("bob"));
    }

    #[test]
    fn edits_validate_block_types() {
        let mut server = server_with(settings());
        let now = Instant::now();
        let alice = join(&mut server, 1, "Alice", now);
        server.drain_outgoing().for_each(drop);

        for block in [-1, 18, BlockKind::Lava.id() as i64, BlockKind::Bedrock.id() as i64] {
            server.handle(alice, ClientMessage::EditRequest { x: 0, y: 0, z: 7, block }, now);
        }
        server.handle(alice, ClientMessage::EditRequest { x: 0, y: 0, z: 16, block: 8 }, now);
        server.handle(alice, ClientMessage::EditRequest { x: -1, y: 0, z: 7, block: 8 }, now);
        assert_eq!(server.drain_outgoing().count(), 0);

        server.handle(alice, ClientMessage::EditRequest { x: 0, y: 0, z: 7, block: 0 }, now);
        assert_eq!(
            server.drain_outgoing().collect::<Vec<_>>(),
            vec![Outgoing::Send(alice, ServerMessage::EditConfirmed { x: 0, y: 0, z: 7, block: 0 })]
        );
        assert_eq!(server.world().block_kind(Vector3::new(0, 0, 7)), BlockKind::Air);
    }

    #[test]
    fn chat_is_trimmed_sanitized_and_broadcast() {
        let mut server = server_with(settings());
        let now = Instant::now();
        let alice = join(&mut server, 1, "Alice", now);
        let bob = join(&mut server, 2, "Bob", now);
        server.drain_outgoing().for_each(drop);

        server.handle(alice, ClientMessage::Chat { text: "   ".to_owned() }, now);
        server.handle(alice, ClientMessage::Chat { text: "y".repeat(101) }, now);
        assert_eq!(server.drain_outgoing().count(), 0);

        server.handle(alice, ClientMessage::Chat { text: "  a<b ".to_owned() }, now);
        let outgoing: Vec<_> = server.drain_outgoing().collect();
        let expected = ServerMessage::ChatBroadcast {
            speaker: "Alice".to_owned(),
            text: "a&lt;b".to_owned(),
        };
        assert_eq!(sent_to(&outgoing, alice), vec![expected.clone()]);
        assert_eq!(sent_to(&outgoing, bob), vec![expected]);
    }

    #[test]
    fn movement_is_stored_and_filtered_by_view() {
        let mut server = server_with(settings());
        let now = Instant::now();
        let alice = join(&mut server, 1, "Alice", now);
        let bob = join(&mut server, 2, "Bob", now);
        server.drain_outgoing().for_each(drop);

        // Both stand on the spawn point facing +y; Alice steps behind Bob.
        server.handle(alice, ClientMessage::MovementUpdate { x: 8.5, y: 2.0, z: 8.0, pitch: 0.0, yaw: 0.0 }, now);
        assert_eq!(sent_to(&server.drain_outgoing().collect::<Vec<_>>(), bob), vec![]);
        assert_eq!(server.world().player("Alice").map(|state| state.position), Some(Vector3::new(8.5, 2.0, 8.0)));

        server.handle(alice, ClientMessage::MovementUpdate { x: 8.5, y: 14.0, z: 8.0, pitch: 0.0, yaw: 0.0 }, now);
        let to_bob = sent_to(&server.drain_outgoing().collect::<Vec<_>>(), bob);
        assert!(matches!(&to_bob[..], [ServerMessage::MovementBroadcast { name, .. }] if name == "Alice"));

        server.handle(alice, ClientMessage::MovementUpdate { x: f32::NAN, y: 14.0, z: 8.0, pitch: 0.0, yaw: 0.0 }, now);
        assert_eq!(server.drain_outgoing().count(), 0);
    }

    #[test]
    fn physics_broadcasts_falling_blocks() {
        let mut server = server_with(ServerSettings {
            simulate_block_physics: true,
            ..settings()
        });
        let now = Instant::now();
        let alice = join(&mut server, 1, "Alice", now);
        server.handle(alice, ClientMessage::EditRequest { x: 0, y: 0, z: 10, block: 11 }, now);
        server.drain_outgoing().for_each(drop);

        server.physics_tick();

        assert_eq!(
            sent_to(&server.drain_outgoing().collect::<Vec<_>>(), alice),
            vec![
                ServerMessage::EditConfirmed { x: 0, y: 0, z: 9, block: 11 },
                ServerMessage::EditConfirmed { x: 0, y: 0, z: 10, block: 0 },
            ]
        );
    }
}
