use cgmath::Vector3;

use crate::game::world::{BlockKind, World};

pub const PLAYER_FOOTPRINT: f32 = 0.25;
pub const PLAYER_HEIGHT: f32 = 1.8;
pub const HEAD_PROBE_HEIGHT: f32 = 1.7;
const HEAD_PROBE_LOOKAHEAD: f32 = 1.1;
const GROUND_PROBE: f32 = 0.01;

/// Vertical face of a solid block that borders air, seen from above as a unit segment.
#[derive(Clone, Copy, Debug, PartialEq)]
enum SideFace {
    /// Plane `x = x`, spanning `y1..y2`. `dir` is the face normal along x.
    X { x: f32, dir: f32, y1: f32, y2: f32 },
    /// Plane `y = y`, spanning `x1..x2`.
    Y { y: f32, dir: f32, x1: f32, x2: f32 },
}

impl SideFace {
    /// Strict overlap between the segment and a square footprint centred on `(x, y)`.
    fn overlaps(&self, x: f32, y: f32, size: f32) -> bool {
        let half = size / 2.0;

        match *self {
            SideFace::X { x: line, y1, y2, .. } => x > line - half && x < line + half && y > y1 - half && y < y2 + half,
            SideFace::Y { y: line, x1, x2, .. } => y > line - half && y < line + half && x > x1 - half && x < x2 + half,
        }
    }
}

/// Horizontal face at height `z`: a block top (`dir > 0`) or bottom (`dir < 0`).
#[derive(Clone, Copy, Debug, PartialEq)]
struct FlatFace {
    z: f32,
    dir: f32,
    x1: f32,
    y1: f32,
    x2: f32,
    y2: f32,
}

impl FlatFace {
    /// True when a corner of `other` lies strictly inside this face.
    fn contains_corner_of(&self, other: &FlatFace) -> bool {
        let inside = |x: f32, y: f32| x > self.x1 && x < self.x2 && y > self.y1 && y < self.y2;

        inside(other.x1, other.y1) || inside(other.x2, other.y1) || inside(other.x2, other.y2) || inside(other.x1, other.y2)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CollisionResult {
    pub position: Vector3<f32>,
    /// Per axis, whether the displacement was stopped by a face.
    pub blocked: Vector3<bool>,
    pub falling: bool,
}

/// Axis separated sweep of the player's box against the voxels around it.
pub struct CollisionResolver<'a> {
    world: &'a World,
}

impl<'a> CollisionResolver<'a> {
    pub const fn new(world: &'a World) -> Self {
        Self { world }
    }

    fn is_solid(&self, x: i32, y: i32, z: i32) -> bool {
        self.world.block_kind(Vector3::new(x, y, z)) != BlockKind::Air
    }

    pub fn resolve(&self, position: Vector3<f32>, displacement: Vector3<f32>) -> CollisionResult {
        let mut pos = position;
        let mut delta = displacement;
        let mut blocked = Vector3::new(false, false, false);
        let block = position.map(|val| val.floor() as i32);

        // Horizontal phase.
        let (footprint_x, footprint_y) = (pos.x + delta.x, pos.y + delta.y);
        for side in self.side_faces(block) {
            if !side.overlaps(footprint_x, footprint_y, PLAYER_FOOTPRINT) {
                continue;
            }

            match side {
                SideFace::X { x, dir, .. } if delta.x * dir < 0.0 => {
                    pos.x = x + PLAYER_FOOTPRINT / 2.0 * if delta.x > 0.0 { -1.0 } else { 1.0 };
                    delta.x = 0.0;
                    blocked.x = true;
                }
                SideFace::Y { y, dir, .. } if delta.y * dir < 0.0 => {
                    pos.y = y + PLAYER_FOOTPRINT / 2.0 * if delta.y > 0.0 { -1.0 } else { 1.0 };
                    delta.y = 0.0;
                    blocked.y = true;
                }
                _ => {}
            }
        }

        // Vertical phase. A resting player probes slightly downwards so standing still stays grounded.
        let probe_z = if delta.z.abs() < f32::EPSILON { -GROUND_PROBE } else { delta.z };
        let half = PLAYER_FOOTPRINT / 2.0;
        let player_face = FlatFace {
            z: pos.z,
            dir: 0.0,
            x1: pos.x + delta.x - half,
            y1: pos.y + delta.y - half,
            x2: pos.x + delta.x + half,
            y2: pos.y + delta.y + half,
        };
        let lower = (pos.z + probe_z).floor() as i32;
        let upper = (pos.z + HEAD_PROBE_HEIGHT + probe_z * HEAD_PROBE_LOOKAHEAD).floor() as i32;

        let mut falling = true;
        for face in self.flat_faces(block, lower, upper) {
            if face.contains_corner_of(&player_face) && probe_z * face.dir < 0.0 {
                if probe_z < 0.0 {
                    falling = false;
                    pos.z = face.z;
                } else {
                    pos.z = face.z - PLAYER_HEIGHT;
                }
                delta.z = 0.0;
                blocked.z = true;

                break;
            }
        }

        CollisionResult {
            position: pos + delta,
            blocked,
            falling,
        }
    }

    fn side_faces(&self, block: Vector3<i32>) -> Vec<SideFace> {
        let mut faces = Vec::new();

        for x in block.x - 1..=block.x + 1 {
            for y in block.y - 1..=block.y + 1 {
                for z in block.z..=block.z + 1 {
                    if !self.is_solid(x, y, z) {
                        continue;
                    }

                    let (fx, fy) = (x as f32, y as f32);
                    if !self.is_solid(x - 1, y, z) {
                        faces.push(SideFace::X { x: fx, dir: -1.0, y1: fy, y2: fy + 1.0 });
                    }
                    if !self.is_solid(x + 1, y, z) {
                        faces.push(SideFace::X { x: fx + 1.0, dir: 1.0, y1: fy, y2: fy + 1.0 });
                    }
                    if !self.is_solid(x, y - 1, z) {
                        faces.push(SideFace::Y { y: fy, dir: -1.0, x1: fx, x2: fx + 1.0 });
                    }
                    if !self.is_solid(x, y + 1, z) {
                        faces.push(SideFace::Y { y: fy + 1.0, dir: 1.0, x1: fx, x2: fx + 1.0 });
                    }
                }
            }
        }

        faces
    }

    fn flat_faces(&self, block: Vector3<i32>, lower: i32, upper: i32) -> Vec<FlatFace> {
        let mut faces = Vec::new();

        for x in block.x - 1..=block.x + 1 {
            for y in block.y - 1..=block.y + 1 {
                let (x1, y1) = (x as f32, y as f32);
                let (x2, y2) = (x1 + 1.0, y1 + 1.0);

                if self.is_solid(x, y, lower) {
                    faces.push(FlatFace { z: (lower + 1) as f32, dir: 1.0, x1, y1, x2, y2 });
                }
                if self.is_solid(x, y, upper) {
                    faces.push(FlatFace { z: upper as f32, dir: -1.0, x1, y1, x2, y2 });
                }
            }
        }

        faces
    }
}
