mod block;
mod chunk;
mod grid;
mod light;
mod mesh;
mod physics;
mod terrain_generator;
#[allow(clippy::module_inception)]
mod world;

pub use block::{Block, BlockCatalog, BlockKind, CatalogError};
pub use chunk::{Chunk, ChunkMesher, DEFAULT_CHUNK_SIZE};
pub use grid::{SnapshotError, VoxelGrid, WorldError};
pub use light::{LightColumnCache, MeshError, FULL_LIGHT, SHADE_MULTIPLIER};
pub use mesh::{BlockVertex, ChunkMeshRaw, FLUID_SURFACE_HEIGHT};
pub use physics::{BlockPhysics, BlockUpdate, FLUID_STEP_INTERVAL};
pub use terrain_generator::TerrainGenerator;
pub use world::{BlockChangedHook, PlayerState, World};
