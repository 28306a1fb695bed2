use cgmath::{Vector3, Zero};

use crate::game::world::{BlockKind, VoxelGrid, WorldError};

/// Dirt up to the ground level and air above it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TerrainGenerator {
    ground_height: u32,
}

impl TerrainGenerator {
    pub const fn flat(ground_height: u32) -> Self {
        Self { ground_height }
    }

    pub const fn ground_height(&self) -> u32 {
        self.ground_height
    }

    pub fn generate_blocks(&self, size: Vector3<u32>) -> Result<VoxelGrid, WorldError> {
        VoxelGrid::from_fn(size, |pos| self.generate_block(&pos))
    }

    pub fn generate_block(&self, abs_pos: &Vector3<i32>) -> BlockKind {
        if abs_pos.z < self.ground_height as i32 {
            BlockKind::Dirt
        } else {
            BlockKind::Air
        }
    }

    /// Centre of the middle column, standing on the ground.
    pub fn spawn_point(&self, size: Vector3<u32>) -> Vector3<f32> {
        let mut spawn = Vector3::zero();
        spawn.x = (size.x / 2) as f32 + 0.5;
        spawn.y = (size.y / 2) as f32 + 0.5;
        spawn.z = self.ground_height as f32;

        spawn
    }
}
