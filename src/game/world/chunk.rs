use cgmath::Vector3;

use crate::game::world::{ChunkMeshRaw, World};

pub const DEFAULT_CHUNK_SIZE: u32 = 8;

#[derive(Clone, Debug)]
pub struct Chunk {
    start: Vector3<i32>,
    end: Vector3<i32>,
    dirty: bool,
    mesh: Option<ChunkMeshRaw>,
}

impl Chunk {
    pub fn new(start: Vector3<i32>, end: Vector3<i32>) -> Self {
        Self {
            start,
            end,
            dirty: true,
            mesh: None,
        }
    }

    pub const fn start(&self) -> Vector3<i32> {
        self.start
    }

    pub const fn end(&self) -> Vector3<i32> {
        self.end
    }

    pub const fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn set_dirty(&mut self) {
        self.dirty = true
    }

    /// Last built geometry. Stays valid, if stale, while the chunk is dirty.
    pub fn mesh(&self) -> Option<&ChunkMeshRaw> {
        self.mesh.as_ref()
    }

    pub fn contains(&self, pos: Vector3<i32>) -> bool {
        (self.start.x..self.end.x).contains(&pos.x)
            && (self.start.y..self.end.y).contains(&pos.y)
            && (self.start.z..self.end.z).contains(&pos.z)
    }

    /// Whether a write at `pos` can change this chunk's geometry: the block itself, a horizontal
    /// neighbour across a seam, a block directly below, or anything above that shades it.
    pub fn is_affected_by(&self, pos: Vector3<i32>) -> bool {
        (self.start.x - 1..=self.end.x).contains(&pos.x)
            && (self.start.y - 1..=self.end.y).contains(&pos.y)
            && pos.z >= self.start.z - 1
    }

    fn rebuild(&mut self, world: &World) {
        match ChunkMeshRaw::build(world, self.start, self.end) {
            Ok(mesh) => self.mesh = Some(mesh),
            Err(e) => {
                if cfg!(debug_assertions) {
                    panic!("Chunk rebuild at {:?} failed - {e}", self.start);
                }
                log::warn!("Skipped rebuilding chunk at {:?} - {e}", self.start);
            }
        }

        self.dirty = false
    }
}

/// Splits the world into fixed-size chunks and keeps their geometry in step with block writes.
#[derive(Clone, Debug)]
pub struct ChunkMesher {
    chunk_size: u32,
    chunks: Vec<Chunk>,
}

impl ChunkMesher {
    pub fn new(world_size: Vector3<u32>, chunk_size: u32) -> Self {
        debug_assert!(chunk_size > 0);
        let chunk_size = chunk_size.max(1);

        let mut chunks = Vec::new();
        for x in (0..world_size.x).step_by(chunk_size as usize) {
            for y in (0..world_size.y).step_by(chunk_size as usize) {
                for z in (0..world_size.z).step_by(chunk_size as usize) {
                    let start = Vector3::new(x as i32, y as i32, z as i32);
                    let end = Vector3::new(
                        (x + chunk_size).min(world_size.x) as i32,
                        (y + chunk_size).min(world_size.y) as i32,
                        (z + chunk_size).min(world_size.z) as i32,
                    );

                    chunks.push(Chunk::new(start, end));
                }
            }
        }

        Self { chunk_size, chunks }
    }

    pub const fn chunk_size(&self) -> u32 {
        self.chunk_size
    }

    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    pub fn chunk_at(&self, pos: Vector3<i32>) -> Option<&Chunk> {
        self.chunks.iter().find(|chunk| chunk.contains(pos))
    }

    pub fn dirty_count(&self) -> usize {
        self.chunks.iter().filter(|chunk| chunk.is_dirty()).count()
    }

    pub fn on_block_changed(&mut self, pos: Vector3<i32>) {
        self.chunks
            .iter_mut()
            .filter(|chunk| chunk.is_affected_by(pos))
            .for_each(Chunk::set_dirty)
    }

    /// Rebuilds up to `budget` dirty chunks in partition order and returns how many were rebuilt.
    pub fn rebuild_dirty(&mut self, world: &World, budget: usize) -> usize {
        let mut rebuilt = 0;
        for chunk in self.chunks.iter_mut().filter(|chunk| chunk.is_dirty()).take(budget) {
            chunk.rebuild(world);
            rebuilt += 1;
        }

        rebuilt
    }

    pub fn meshes(&self) -> impl Iterator<Item = &ChunkMeshRaw> {
        self.chunks.iter().filter_map(Chunk::mesh)
    }
}
