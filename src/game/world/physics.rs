use cgmath::Vector3;
use rustc_hash::FxHashSet;

use crate::game::world::{BlockKind, World};

pub const FLUID_STEP_INTERVAL: u64 = 10;

const HORIZONTAL_NEIGHBOURS: [Vector3<i32>; 4] = [
    Vector3::new(-1, 0, 0),
    Vector3::new(1, 0, 0),
    Vector3::new(0, -1, 0),
    Vector3::new(0, 1, 0),
];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BlockUpdate {
    pub pos: Vector3<i32>,
    pub kind: BlockKind,
}

impl BlockUpdate {
    pub const fn new(pos: Vector3<i32>, kind: BlockKind) -> Self {
        Self { pos, kind }
    }
}

/// Falling blocks and spreading fluids. Stateless, driven by a step counter.
pub struct BlockPhysics;

impl BlockPhysics {
    /// Runs one physics step and returns every block write it made, in order.
    pub fn simulate(world: &mut World, step: u64) -> Vec<BlockUpdate> {
        let mut updates = Vec::new();

        Self::apply_gravity(world, &mut updates);
        if step % FLUID_STEP_INTERVAL == 0 {
            Self::spread_fluids(world, &mut updates);
        }

        updates
    }

    fn apply_gravity(world: &mut World, updates: &mut Vec<BlockUpdate>) {
        let size = world.size().cast::<i32>().unwrap_or(Vector3::new(0, 0, 0));

        for x in 0..size.x {
            for y in 0..size.y {
                for z in 1..size.z {
                    let pos = Vector3::new(x, y, z);
                    let below = Vector3::new(x, y, z - 1);
                    let kind = world.block_kind(pos);

                    if world.catalog().get(kind).has_gravity() && world.block_kind(below) == BlockKind::Air {
                        Self::write(world, below, kind, updates);
                        Self::write(world, pos, BlockKind::Air, updates);
                    }
                }
            }
        }
    }

    fn spread_fluids(world: &mut World, updates: &mut Vec<BlockUpdate>) {
        let size = world.size().cast::<i32>().unwrap_or(Vector3::new(0, 0, 0));
        let mut created = FxHashSet::default();

        for x in 0..size.x {
            for y in 0..size.y {
                for z in 0..size.z {
                    let pos = Vector3::new(x, y, z);
                    let kind = world.block_kind(pos);
                    if !world.catalog().get(kind).is_fluid() || created.contains(&pos) {
                        continue;
                    }

                    for offset in HORIZONTAL_NEIGHBOURS {
                        let target = pos + offset;
                        if world.in_bounds(target) && world.block_kind(target) == BlockKind::Air {
                            Self::write(world, target, kind, updates);
                            created.insert(target);
                        }
                    }
                }
            }
        }
    }

    fn write(world: &mut World, pos: Vector3<i32>, kind: BlockKind, updates: &mut Vec<BlockUpdate>) {
        match world.set_block(pos, kind) {
            Ok(()) => updates.push(BlockUpdate::new(pos, kind)),
            Err(e) => log::warn!("Block physics write rejected - {e}"),
        }
    }
}
