pub mod face;
mod texture_atlas;

pub use texture_atlas::{TextureAtlas, TextureRect, ATLAS_TILES};
