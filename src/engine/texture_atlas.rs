use serde::{Deserialize, Serialize};

pub const ATLAS_TILES: u32 = 16;

/// Normalised atlas rectangle: `u0, v0` is the top left corner, `u1, v1` the bottom right.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TextureRect {
    pub u0: f32,
    pub v0: f32,
    pub u1: f32,
    pub v1: f32,
}

impl TextureRect {
    pub const fn new(u0: f32, v0: f32, u1: f32, v1: f32) -> Self {
        Self { u0, v0, u1, v1 }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TextureAtlas {
    atlas_size: (u32, u32),
}

impl TextureAtlas {
    pub const fn new(tiles_x: u32, tiles_y: u32) -> Self {
        Self {
            atlas_size: (tiles_x, tiles_y),
        }
    }

    pub fn texture_coordinates(&self, tile: (u32, u32)) -> TextureRect {
        debug_assert!(tile.0 < self.atlas_size.0 && tile.1 < self.atlas_size.1);

        let (tile_width, tile_height) = self.tile_size();
        TextureRect::new(
            tile.0 as f32 * tile_width,
            tile.1 as f32 * tile_height,
            (tile.0 + 1) as f32 * tile_width,
            (tile.1 + 1) as f32 * tile_height,
        )
    }

    pub fn atlas_size(&self) -> (f32, f32) {
        (self.atlas_size.0 as f32, self.atlas_size.1 as f32)
    }

    pub fn tile_size(&self) -> (f32, f32) {
        let atlas_size = self.atlas_size();
        (1.0 / atlas_size.0, 1.0 / atlas_size.1)
    }
}

impl Default for TextureAtlas {
    fn default() -> Self {
        Self::new(ATLAS_TILES, ATLAS_TILES)
    }
}
