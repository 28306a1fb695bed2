use block_mesh::ndshape::{RuntimeShape, Shape};
use cgmath::Vector3;
use rle_vec::RleVec;
use thiserror::Error;

use crate::game::world::BlockKind;

const NETWORK_CHAR_BASE: u32 = 'a' as u32;

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum WorldError {
    #[error("block position ({x}, {y}, {z}) is outside the world")]
    OutOfBounds { x: i32, y: i32, z: i32 },
    #[error("a {sx}x{sy}x{sz} world holds more voxels than can be indexed")]
    TooLarge { sx: u32, sy: u32, sz: u32 },
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum SnapshotError {
    #[error("snapshot holds {actual} voxels but a {sx}x{sy}x{sz} world needs {expected}")]
    LengthMismatch {
        sx: u32,
        sy: u32,
        sz: u32,
        expected: usize,
        actual: usize,
    },
    #[error("snapshot character {0:?} is not a known block")]
    UnknownBlock(char),
    #[error("world dimensions must be non-zero")]
    EmptyWorld,
    #[error(transparent)]
    Size(#[from] WorldError),
}

/// Dense block storage. Voxels are laid out x-major, then y, with z varying fastest,
/// which is also the network snapshot order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VoxelGrid {
    size: Vector3<u32>,
    buffer: RleVec<BlockKind>,
}

impl VoxelGrid {
    pub fn new(size: Vector3<u32>, fill: BlockKind) -> Result<Self, WorldError> {
        Self::from_fn(size, |_| fill)
    }

    pub fn from_fn(
        size: Vector3<u32>,
        mut block_at: impl FnMut(Vector3<i32>) -> BlockKind,
    ) -> Result<Self, WorldError> {
        let shape = Self::checked_shape(size)?;

        let buffer = (0..shape.size())
            .map(|index| {
                let [z, y, x] = shape.delinearize(index);
                block_at(Vector3::new(x as i32, y as i32, z as i32))
            })
            .collect();

        Ok(Self { size, buffer })
    }

    /// Index shape for `size`, refusing dimensions whose volume does not fit a `u32` index.
    /// Coordinates must also fit an `i32`.
    fn checked_shape(size: Vector3<u32>) -> Result<RuntimeShape<u32, 3>, WorldError> {
        let fits = size.x <= i32::MAX as u32
            && size.y <= i32::MAX as u32
            && size.z <= i32::MAX as u32
            && size.x.checked_mul(size.y).and_then(|area| area.checked_mul(size.z)).is_some();
        if !fits {
            return Err(WorldError::TooLarge {
                sx: size.x,
                sy: size.y,
                sz: size.z,
            });
        }

        Ok(RuntimeShape::<u32, 3>::new([size.z, size.y, size.x]))
    }

    fn shape(&self) -> RuntimeShape<u32, 3> {
        RuntimeShape::<u32, 3>::new([self.size.z, self.size.y, self.size.x])
    }

    pub fn size(&self) -> Vector3<u32> {
        self.size
    }

    pub fn volume(&self) -> usize {
        self.shape().usize()
    }

    pub fn in_bounds(&self, pos: Vector3<i32>) -> bool {
        pos.x >= 0
            && pos.y >= 0
            && pos.z >= 0
            && (pos.x as u32) < self.size.x
            && (pos.y as u32) < self.size.y
            && (pos.z as u32) < self.size.z
    }

    /// Out of bounds reads see air.
    pub fn get(&self, pos: Vector3<i32>) -> BlockKind {
        if self.in_bounds(pos) {
            self.buffer[self.index(pos)]
        } else {
            BlockKind::Air
        }
    }

    pub fn set(&mut self, pos: Vector3<i32>, kind: BlockKind) -> Result<(), WorldError> {
        if !self.in_bounds(pos) {
            return Err(WorldError::OutOfBounds {
                x: pos.x,
                y: pos.y,
                z: pos.z,
            });
        }

        let index = self.index(pos);
        self.buffer.set(index, kind);

        Ok(())
    }

    pub fn count(&self, kind: BlockKind) -> usize {
        self.buffer
            .runs()
            .filter(|run| *run.value == kind)
            .map(|run| run.len)
            .sum()
    }

    pub fn to_network_string(&self) -> String {
        self.buffer
            .iter()
            .map(|kind| char::from_u32(NETWORK_CHAR_BASE + kind.id() as u32).unwrap_or('a'))
            .collect()
    }

    pub fn from_network_string(size: Vector3<u32>, blocks: &str) -> Result<Self, SnapshotError> {
        if size.x == 0 || size.y == 0 || size.z == 0 {
            return Err(SnapshotError::EmptyWorld);
        }

        let shape = Self::checked_shape(size)?;
        let actual = blocks.chars().count();
        if actual != shape.usize() {
            return Err(SnapshotError::LengthMismatch {
                sx: size.x,
                sy: size.y,
                sz: size.z,
                expected: shape.usize(),
                actual,
            });
        }

        let buffer = blocks
            .chars()
            .map(|c| {
                (c as u32)
                    .checked_sub(NETWORK_CHAR_BASE)
                    .and_then(|id| BlockKind::from_id(id as i64))
                    .ok_or(SnapshotError::UnknownBlock(c))
            })
            .collect::<Result<RleVec<_>, _>>()?;

        Ok(Self { size, buffer })
    }

    fn index(&self, pos: Vector3<i32>) -> usize {
        debug_assert!(self.in_bounds(pos));

        self.shape().linearize([pos.z as u32, pos.y as u32, pos.x as u32]) as usize
    }
}
