//! TCP session layer. Each connection gets a reader and a writer task; everything touching
//! the game runs on the single core loop.

use std::time::Duration;

use instant::Instant;
use rustc_hash::FxHashMap;
use tokio::{
    io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWriteExt, BufReader},
    net::{tcp::OwnedWriteHalf, TcpListener},
    sync::mpsc::{self, UnboundedReceiver, UnboundedSender},
    task::JoinHandle,
};

use crate::net::{
    protocol::ClientMessage,
    server::{ConnectionId, Outgoing, Server},
};

/// Longest accepted client line in bytes, newline included. Longer lines close the connection.
pub const MAX_LINE_LENGTH: usize = 64 * 1024;

#[derive(Debug)]
enum SessionEvent {
    Line(ConnectionId, String),
    Closed(ConnectionId),
}

struct Peer {
    lines: UnboundedSender<String>,
    reader: JoinHandle<()>,
}

pub async fn bind(address: &str) -> std::io::Result<TcpListener> {
    let listener = TcpListener::bind(address).await?;
    log::info!("Listening on {}", listener.local_addr()?);
    Ok(listener)
}

/// Accepts connections and drives `server` until the process exits.
pub async fn serve(mut server: Server, listener: TcpListener) {
    let (events, mut incoming) = mpsc::unbounded_channel();
    let mut peers: FxHashMap<ConnectionId, Peer> = FxHashMap::default();
    let mut next_id = 0;

    let mut physics = tokio::time::interval(server.settings().physics_step().max(Duration::from_millis(1)));

    loop {
        tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok((stream, address)) => {
                    let conn = ConnectionId(next_id);
                    next_id += 1;

                    let (read_half, write_half) = stream.into_split();
                    let (lines, outgoing_lines) = mpsc::unbounded_channel();
                    tokio::spawn(write_lines(write_half, outgoing_lines));
                    let reader = tokio::spawn(read_lines(conn, read_half, events.clone()));

                    peers.insert(conn, Peer { lines, reader });
                    server.connect(conn, address.ip(), Instant::now());
                }
                Err(e) => log::error!("Failed to accept connection - {e}"),
            },
            Some(event) = incoming.recv() => match event {
                SessionEvent::Line(conn, line) => match ClientMessage::decode(&line) {
                    Ok(message) => server.handle(conn, message, Instant::now()),
                    Err(e) => log::debug!("Dropped malformed message from {conn} - {e}"),
                },
                SessionEvent::Closed(conn) => {
                    server.disconnect(conn);
                    peers.remove(&conn);
                }
            },
            _ = physics.tick() => server.physics_tick(),
        }

        flush(&mut server, &mut peers);
    }
}

fn flush(server: &mut Server, peers: &mut FxHashMap<ConnectionId, Peer>) {
    for outgoing in server.drain_outgoing() {
        match outgoing {
            Outgoing::Send(conn, message) => {
                let Some(peer) = peers.get(&conn) else {
                    continue;
                };
                match message.encode() {
                    Ok(line) => {
                        if peer.lines.send(line).is_err() {
                            log::debug!("Writer for {conn} already stopped");
                        }
                    }
                    Err(e) => log::error!("Failed to encode message for {conn} - {e}"),
                }
            }
            // Dropping the sender lets the writer finish the queued lines and shut down.
            Outgoing::Close(conn) => {
                if let Some(peer) = peers.remove(&conn) {
                    peer.reader.abort();
                }
            }
        }
    }
}

async fn read_lines<R: AsyncRead + Unpin>(conn: ConnectionId, reader: R, events: UnboundedSender<SessionEvent>) {
    let mut reader = BufReader::new(reader);
    let mut line = String::new();

    loop {
        line.clear();
        match (&mut reader).take(MAX_LINE_LENGTH as u64 + 1).read_line(&mut line).await {
            Ok(0) => break,
            Ok(_) => {
                if line.len() > MAX_LINE_LENGTH {
                    log::debug!("Closing {conn} after a line over {MAX_LINE_LENGTH} bytes");
                    break;
                }
                if line.trim().is_empty() {
                    continue;
                }
                if events.send(SessionEvent::Line(conn, line.clone())).is_err() {
                    return;
                }
            }
            Err(e) => {
                log::debug!("Failed reading from {conn} - {e}");
                break;
            }
        }
    }

    let _ = events.send(SessionEvent::Closed(conn));
}

async fn write_lines(mut writer: OwnedWriteHalf, mut lines: UnboundedReceiver<String>) {
    while let Some(line) = lines.recv().await {
        if let Err(e) = writer.write_all(line.as_bytes()).await {
            log::debug!("Failed writing to client - {e}");
            break;
        }
    }

    let _ = writer.shutdown().await;
}
