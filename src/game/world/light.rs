use cgmath::{Vector2, Vector3};
use thiserror::Error;

use crate::game::world::World;

pub const SHADE_MULTIPLIER: f32 = 0.6;
pub const FULL_LIGHT: f32 = 1.0;

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum MeshError {
    #[error("no light column cached for ({x}, {y})")]
    LightColumnMissing { x: i32, y: i32 },
}

/// Sunlight boundary per (x, y) column: the height of the topmost non-transparent block,
/// or 0 for an empty column. Anything at or above the boundary sees the sky.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LightColumnCache {
    min: Vector2<i32>,
    extent: Vector2<i32>,
    columns: Vec<i32>,
}

impl LightColumnCache {
    /// Scans every column in the inclusive range `min..=max`. Columns outside the world are empty.
    pub fn new(world: &World, min: Vector2<i32>, max: Vector2<i32>) -> Self {
        let extent = Vector2::new((max.x - min.x + 1).max(0), (max.y - min.y + 1).max(0));

        let mut columns = Vec::with_capacity((extent.x * extent.y) as usize);
        for x in min.x..=max.x {
            for y in min.y..=max.y {
                columns.push(Self::scan_column(world, x, y));
            }
        }

        Self { min, extent, columns }
    }

    /// Chunk footprint `[start, end)` grown by one column on every side.
    pub fn for_footprint(world: &World, start: Vector2<i32>, end: Vector2<i32>) -> Self {
        Self::new(world, start - Vector2::new(1, 1), end)
    }

    fn scan_column(world: &World, x: i32, y: i32) -> i32 {
        (0..world.size().z as i32)
            .rev()
            .find(|z| !world.is_transparent(Vector3::new(x, y, *z)))
            .unwrap_or(0)
    }

    pub fn boundary(&self, x: i32, y: i32) -> Result<i32, MeshError> {
        let (dx, dy) = (x - self.min.x, y - self.min.y);
        if dx < 0 || dy < 0 || dx >= self.extent.x || dy >= self.extent.y {
            return Err(MeshError::LightColumnMissing { x, y });
        }

        Ok(self.columns[(dx * self.extent.y + dy) as usize])
    }

    pub fn is_lit(&self, x: i32, y: i32, z: i32) -> Result<bool, MeshError> {
        Ok(z >= self.boundary(x, y)?)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::game::world::{BlockCatalog, BlockKind};

    fn world() -> World {
        World::flat(Vector3::new(8, 8, 8), 4, Arc::new(BlockCatalog::new().unwrap())).unwrap()
    }

    #[test]
    fn flat_ground_boundary_is_top_block() {
        let cache = LightColumnCache::for_footprint(&world(), Vector2::new(0, 0), Vector2::new(8, 8));

        assert_eq!(cache.boundary(3, 3), Ok(3));
        assert_eq!(cache.is_lit(3, 3, 3), Ok(true));
        assert_eq!(cache.is_lit(3, 3, 2), Ok(false));
    }

    #[test]
    fn columns_outside_the_world_are_open_sky() {
        let cache = LightColumnCache::for_footprint(&world(), Vector2::new(0, 0), Vector2::new(8, 8));

        assert_eq!(cache.boundary(-1, 0), Ok(0));
        assert_eq!(cache.boundary(8, 8), Ok(0));
    }

    #[test]
    fn overhang_moves_boundary_up_and_glass_does_not() {
        let mut world = world();
        world.set_block(Vector3::new(2, 2, 6), BlockKind::Brick).unwrap();
        world.set_block(Vector3::new(5, 5, 7), BlockKind::Glass).unwrap();

        let cache = LightColumnCache::new(&world, Vector2::new(0, 0), Vector2::new(7, 7));
        assert_eq!(cache.boundary(2, 2), Ok(6));
        assert_eq!(cache.is_lit(2, 2, 3), Ok(false));
        assert_eq!(cache.boundary(5, 5), Ok(3));
    }

    #[test]
    fn lookups_outside_the_cached_range_fail() {
        let cache = LightColumnCache::new(&world(), Vector2::new(0, 0), Vector2::new(3, 3));

        assert_eq!(cache.boundary(4, 0), Err(MeshError::LightColumnMissing { x: 4, y: 0 }));
        assert_eq!(cache.boundary(0, -1), Err(MeshError::LightColumnMissing { x: 0, y: -1 }));
    }
}
