use std::{
    net::{IpAddr, Ipv4Addr},
    sync::Arc,
};

use cgmath::Vector3;
use instant::{Duration, Instant};
use voxcraft::{
    game::world::{BlockCatalog, BlockKind, VoxelGrid},
    misc::{ClientSettings, ServerSettings},
    net::{
        ClientMessage, ClientSession, CommandRegistry, ConnectionId, Outgoing, Server, ServerMessage, BLOCK_SPAMMING,
        NAME_IN_USE,
    },
};

fn catalog() -> Arc<BlockCatalog> {
    Arc::new(BlockCatalog::new().unwrap())
}

fn server() -> Server {
    let settings = ServerSettings {
        world_size: [16, 16, 16],
        ground_height: 8,
        ..ServerSettings::default()
    };
    Server::new(settings, catalog(), CommandRegistry::with_builtins()).unwrap()
}

fn address(last: u8) -> IpAddr {
    IpAddr::V4(Ipv4Addr::new(192, 168, 0, last))
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

fn edit(x: i64, y: i64, z: i64, block: BlockKind) -> ClientMessage {
    ClientMessage::EditRequest {
        x,
        y,
        z,
        block: block.id() as i64,
    }
}

#[test]
fn new_player_receives_world_and_spawn() {
    let mut server = server();
    let alice = join(&mut server, 1, "Alice", Instant::now());
    let to_alice = sent_to(&server.drain_outgoing().collect::<Vec<_>>(), alice);

    let ServerMessage::WorldSnapshot { sx, sy, sz, blocks } = &to_alice[0] else {
        panic!("expected a world snapshot, got {:?}", to_alice[0]);
    };
    let grid = VoxelGrid::from_network_string(Vector3::new(*sx, *sy, *sz), blocks).unwrap();
    assert_eq!(grid.count(BlockKind::Dirt), 16 * 16 * 8);
    assert_eq!(grid.count(BlockKind::Air), 16 * 16 * 8);
    assert_eq!(to_alice[1], ServerMessage::Spawn { x: 8.5, y: 8.5, z: 8.0 });
}

#[test]
fn edits_near_spawn_are_dropped() {
    let mut server = server();
    let now = Instant::now();
    let alice = join(&mut server, 1, "Alice", now);
    server.drain_outgoing().for_each(drop);

    server.handle(alice, edit(8, 8, 9, BlockKind::Brick), now);

    assert_eq!(server.drain_outgoing().count(), 0);
    assert_eq!(server.world().block_kind(Vector3::new(8, 8, 9)), BlockKind::Air);
}

#[test]
fn edit_spam_is_confirmed_then_kicked() {
    let mut server = server();
    let start = Instant::now();
    let alice = join(&mut server, 1, "Alice", start);
    let bob = join(&mut server, 2, "Bob", start);
    server.drain_outgoing().for_each(drop);

    for z in 0..6 {
        server.handle(alice, edit(0, 0, z, BlockKind::Air), start + Duration::from_millis(z as u64 * 10));
    }
    let outgoing: Vec<_> = server.drain_outgoing().collect();

    let confirmed: Vec<_> = sent_to(&outgoing, bob)
        .into_iter()
        .filter(|message| matches!(message, ServerMessage::EditConfirmed { .. }))
        .collect();
    assert_eq!(confirmed.len(), 5);

    let to_alice = sent_to(&outgoing, alice);
    let kick_at = to_alice
        .iter()
        .position(|message| *message == ServerMessage::Kick { reason: BLOCK_SPAMMING.to_owned() })
        .unwrap();
    assert_eq!(
        to_alice[..kick_at]
            .iter()
            .filter(|message| matches!(message, ServerMessage::EditConfirmed { .. }))
            .count(),
        5
    );
    assert!(outgoing.contains(&Outgoing::Close(alice)));
    assert!(sent_to(&outgoing, bob).contains(&ServerMessage::Leave { name: "Alice".to_owned() }));
    assert_eq!(server.world().block_kind(Vector3::new(0, 0, 5)), BlockKind::Dirt);
}

#[test]
fn names_collide_ignoring_case() {
    let mut server = server();
    let now = Instant::now();
    join(&mut server, 1, "Bob", now);
    server.drain_outgoing().for_each(drop);

    let second = join(&mut server, 2, "bob", now);
    let outgoing: Vec<_> = server.drain_outgoing().collect();

    assert_eq!(
        sent_to(&outgoing, second),
        vec![ServerMessage::Kick { reason: NAME_IN_USE.to_owned() }]
    );
    assert!(!server.is_connected(second));
    assert_eq!(server.active_players().map(|(_, name)| name).collect::<Vec<_>>(), ["Bob"]);
}

#[test]
fn client_follows_server_edits() {
    let mut server = server();
    let now = Instant::now();
    let conn = ConnectionId(1);
    server.connect(conn, address(1), now);

    let mut client = ClientSession::new("Alice", ClientSettings::default(), catalog());
    for message in client.drain_outgoing().collect::<Vec<_>>() {
        server.handle(conn, message, now);
    }
    client.request_edit(Vector3::new(1, 1, 8), BlockKind::Glass);
    for message in client.drain_outgoing().collect::<Vec<_>>() {
        server.handle(conn, message, now);
    }

    for outgoing in server.drain_outgoing().collect::<Vec<_>>() {
        if let Outgoing::Send(target, message) = outgoing {
            assert_eq!(target, conn);
            let line = message.encode().unwrap();
            client.handle(ServerMessage::decode(&line).unwrap()).unwrap();
        }
    }

    let state = client.state().unwrap();
    assert_eq!(state.world().block_kind(Vector3::new(1, 1, 8)), BlockKind::Glass);
    assert_eq!(state.world().spawn_point(), Vector3::new(8.5, 8.5, 8.0));
    assert_eq!(state.player().position, Vector3::new(8.5, 8.5, 8.0));
    assert_eq!(client.chat_log(), ["Welcome! Enjoy your stay, Alice!"]);
    assert!(state.dirty_chunks() > 0);
}
