use std::{cell::RefCell, rc::Rc};

use cgmath::Vector3;

use crate::{
    game::{
        player::Player,
        world::{BlockKind, ChunkMeshRaw, ChunkMesher, World, WorldError},
    },
    misc::ClientSettings,
};

/// Client side game state: the local copy of the world, its chunk meshes and the local player.
pub struct State {
    world: World,
    mesher: Rc<RefCell<ChunkMesher>>,
    player: Player,
}

impl State {
    /// Wires a fresh mesher to `world` so every block write marks the affected chunks dirty.
    pub fn new(mut world: World, settings: &ClientSettings) -> Self {
        let mesher = Rc::new(RefCell::new(ChunkMesher::new(world.size(), settings.chunk_size)));

        let hook_mesher = mesher.clone();
        world.set_block_changed_hook(move |pos| hook_mesher.borrow_mut().on_block_changed(pos));

        Self {
            player: Player::new(world.spawn_point()),
            world,
            mesher,
        }
    }

    pub fn update(&mut self, dt: f32, settings: &ClientSettings) -> usize {
        self.player.update(dt, &self.world, settings);

        self.mesher
            .borrow_mut()
            .rebuild_dirty(&self.world, settings.max_chunk_rebuilds_per_tick)
    }

    pub fn set_block(&mut self, pos: Vector3<i32>, kind: BlockKind) -> Result<(), WorldError> {
        self.world.set_block(pos, kind)
    }

    pub fn set_spawn(&mut self, spawn: Vector3<f32>) {
        self.world.set_spawn_point(spawn);
        self.player.teleport(spawn);
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    pub fn player_mut(&mut self) -> &mut Player {
        &mut self.player
    }

    pub fn dirty_chunks(&self) -> usize {
        self.mesher.borrow().dirty_count()
    }

    /// Snapshot of every chunk's last built geometry.
    pub fn meshes_to_render(&self) -> Vec<ChunkMeshRaw> {
        self.mesher.borrow().meshes().cloned().collect()
    }
}
