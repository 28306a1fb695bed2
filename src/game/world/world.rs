use std::{fmt, sync::Arc};

use cgmath::{Vector3, Zero};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::game::world::{Block, BlockCatalog, BlockKind, SnapshotError, TerrainGenerator, VoxelGrid, WorldError};

pub type BlockChangedHook = Box<dyn FnMut(Vector3<i32>)>;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlayerState {
    pub position: Vector3<f32>,
    pub pitch: f32,
    pub yaw: f32,
    pub velocity: Vector3<f32>,
    pub falling: bool,
    /// Moved noticeably with the last update.
    pub moving: bool,
}

impl PlayerState {
    pub fn new(position: Vector3<f32>, pitch: f32, yaw: f32) -> Self {
        Self {
            position,
            pitch,
            yaw,
            velocity: Vector3::zero(),
            falling: false,
            moving: false,
        }
    }

    pub fn eye_position(&self) -> Vector3<f32> {
        self.position + Vector3::new(0.0, 0.0, crate::game::EYE_HEIGHT)
    }
}

/// Owns the voxel grid and the player table. Every block write goes through `set_block`.
pub struct World {
    grid: VoxelGrid,
    spawn_point: Vector3<f32>,
    players: FxHashMap<String, PlayerState>,
    catalog: Arc<BlockCatalog>,
    block_changed: Option<BlockChangedHook>,
}

impl fmt::Debug for World {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("World")
            .field("size", &self.grid.size())
            .field("spawn_point", &self.spawn_point)
            .field("players", &self.players.len())
            .field("has_block_changed_hook", &self.block_changed.is_some())
            .finish()
    }
}

impl World {
    pub fn new(grid: VoxelGrid, catalog: Arc<BlockCatalog>) -> Self {
        Self {
            grid,
            spawn_point: Vector3::zero(),
            players: FxHashMap::default(),
            catalog,
            block_changed: None,
        }
    }

    pub fn flat(size: Vector3<u32>, ground_height: u32, catalog: Arc<BlockCatalog>) -> Result<Self, WorldError> {
        let generator = TerrainGenerator::flat(ground_height);

        let mut world = Self::new(generator.generate_blocks(size)?, catalog);
        world.spawn_point = generator.spawn_point(size);

        log::info!(
            "Created flat {}x{}x{} world with ground at {}",
            size.x,
            size.y,
            size.z,
            ground_height
        );

        Ok(world)
    }

    pub fn from_network_string(
        size: Vector3<u32>,
        blocks: &str,
        catalog: Arc<BlockCatalog>,
    ) -> Result<Self, SnapshotError> {
        Ok(Self::new(VoxelGrid::from_network_string(size, blocks)?, catalog))
    }

    pub fn to_network_string(&self) -> String {
        self.grid.to_network_string()
    }

    pub fn set_block_changed_hook(&mut self, hook: impl FnMut(Vector3<i32>) + 'static) {
        self.block_changed = Some(Box::new(hook));
    }

    // --------------------------------

    pub fn size(&self) -> Vector3<u32> {
        self.grid.size()
    }

    pub fn grid(&self) -> &VoxelGrid {
        &self.grid
    }

    pub fn catalog(&self) -> &Arc<BlockCatalog> {
        &self.catalog
    }

    pub fn in_bounds(&self, pos: Vector3<i32>) -> bool {
        self.grid.in_bounds(pos)
    }

    pub fn block_kind(&self, pos: Vector3<i32>) -> BlockKind {
        self.grid.get(pos)
    }

    pub fn block(&self, pos: Vector3<i32>) -> &Block {
        self.catalog.get(self.grid.get(pos))
    }

    pub fn is_transparent(&self, pos: Vector3<i32>) -> bool {
        self.block(pos).is_transparent()
    }

    pub fn set_block(&mut self, pos: Vector3<i32>, kind: BlockKind) -> Result<(), WorldError> {
        self.grid.set(pos, kind)?;

        if let Some(hook) = self.block_changed.as_mut() {
            hook(pos)
        }

        Ok(())
    }

    // --------------------------------

    pub fn spawn_point(&self) -> Vector3<f32> {
        self.spawn_point
    }

    pub fn set_spawn_point(&mut self, spawn_point: Vector3<f32>) {
        self.spawn_point = spawn_point
    }

    pub fn players(&self) -> impl Iterator<Item = (&String, &PlayerState)> {
        self.players.iter()
    }

    pub fn player(&self, name: &str) -> Option<&PlayerState> {
        self.players.get(name)
    }

    pub fn player_mut(&mut self, name: &str) -> Option<&mut PlayerState> {
        self.players.get_mut(name)
    }

    pub fn add_player(&mut self, name: String, state: PlayerState) {
        self.players.insert(name, state);
    }

    pub fn remove_player(&mut self, name: &str) -> Option<PlayerState> {
        self.players.remove(name)
    }
}
