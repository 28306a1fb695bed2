use std::rc::Rc;

use rustc_hash::FxHashMap;

use crate::net::server::{ConnectionId, Server};

pub const UNKNOWN_COMMAND: &str = "Unknown command!";
pub const PLAYER_NOT_FOUND: &str = "Couldn't find that player!";
pub const KICKED_BY_ADMIN: &str = "Kicked by an administrator";

/// A chat line starting with `/`. `args` are the words after the command name.
pub trait ChatCommand {
    fn execute(&self, server: &mut Server, sender: ConnectionId, args: &[&str]);

    /// Only accepted from the configured admin address.
    fn admin_only(&self) -> bool {
        false
    }
}

#[derive(Clone, Default)]
pub struct CommandRegistry {
    commands: FxHashMap<String, Rc<dyn ChatCommand>>,
}

impl CommandRegistry {
    pub const PREFIX: &'static str = "/";

    pub fn with_builtins() -> Self {
        let mut registry = Self::default();

        registry.register("spawn", SpawnCommand);
        registry.register("tp", TeleportCommand);
        registry.register("kick", KickCommand);
        registry.register("list", ListCommand);

        registry
    }

    pub fn register(&mut self, name: &str, command: impl ChatCommand + 'static) {
        self.commands.insert(name.to_lowercase(), Rc::new(command));
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Runs `line`, the chat text without its leading `/`.
    pub fn dispatch(&self, server: &mut Server, sender: ConnectionId, line: &str) {
        let mut words = line.split(' ');
        let name = words.next().unwrap_or_default().to_lowercase();
        let args: Vec<&str> = words.collect();

        let command = self.commands.get(&name).filter(|command| {
            !command.admin_only() || server.settings().admin_address.is_some_and(|admin| server.address(sender) == Some(admin))
        });

        match command {
            Some(command) => command.execute(server, sender, &args),
            None => server.send_notice(sender, UNKNOWN_COMMAND),
        }
    }
}

// ------------------------------------

struct SpawnCommand;

impl ChatCommand for SpawnCommand {
    fn execute(&self, server: &mut Server, sender: ConnectionId, _args: &[&str]) {
        let spawn = server.world().spawn_point();
        server.set_position(sender, spawn);
    }
}

struct TeleportCommand;

impl ChatCommand for TeleportCommand {
    fn execute(&self, server: &mut Server, sender: ConnectionId, args: &[&str]) {
        let query = args.join(" ");
        let Some((target, target_name)) = server.find_player(&query).filter(|_| !query.is_empty()) else {
            server.send_notice(sender, PLAYER_NOT_FOUND);
            return;
        };

        let destination = server
            .player_name(target)
            .and_then(|name| server.world().player(name))
            .map(|state| state.position);
        let sender_name = server.player_name(sender).unwrap_or_default().to_owned();

        if let Some(destination) = destination {
            server.set_position(sender, destination);
            server.broadcast_notice(format!("{sender_name} was teleported to {target_name}."));
        }
    }
}

struct KickCommand;

impl ChatCommand for KickCommand {
    fn execute(&self, server: &mut Server, sender: ConnectionId, args: &[&str]) {
        let query = args.join(" ");
        match server.find_player(&query).filter(|_| !query.is_empty()) {
            Some((target, _)) => server.kick(target, KICKED_BY_ADMIN),
            None => server.send_notice(sender, PLAYER_NOT_FOUND),
        }
    }

    fn admin_only(&self) -> bool {
        true
    }
}

struct ListCommand;

impl ChatCommand for ListCommand {
    fn execute(&self, server: &mut Server, sender: ConnectionId, _args: &[&str]) {
        let names: Vec<_> = server.active_players().map(|(_, name)| name.to_owned()).collect();
        server.send_notice(sender, format!("Players: {}", names.join(", ")));
    }
}
