use cgmath::Vector3;
use strum::IntoEnumIterator;

use crate::{
    engine::{face::FaceDirection, TextureRect},
    game::world::{LightColumnCache, MeshError, World, FULL_LIGHT, SHADE_MULTIPLIER},
};

pub const FLUID_SURFACE_HEIGHT: f32 = 0.9;

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct BlockVertex {
    pub pos: [f32; 3],
    pub texture_atlas_pos: [f32; 2],
    pub color: [f32; 4],
}

impl BlockVertex {
    const fn new(pos: [f32; 3], texture_atlas_pos: [f32; 2], light: f32) -> Self {
        Self {
            pos,
            texture_atlas_pos,
            color: [light, light, light, 1.0],
        }
    }
}

/// Finished geometry of one chunk, ready for upload. Four vertices and six indices per quad.
#[derive(Clone, Debug, PartialEq)]
pub struct ChunkMeshRaw {
    pub vertices: Vec<BlockVertex>,
    pub indices: Vec<u32>,
    pub chunk_start: Vector3<i32>,
}

impl ChunkMeshRaw {
    pub fn new(chunk_start: Vector3<i32>) -> Self {
        Self {
            vertices: Vec::new(),
            indices: Vec::new(),
            chunk_start,
        }
    }

    pub fn num_quads(&self) -> usize {
        self.vertices.len() / 4
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }

    fn push_quad(&mut self, corners: [BlockVertex; 4]) {
        let base = self.vertices.len() as u32;

        self.vertices.extend_from_slice(&corners);
        self.indices
            .extend_from_slice(&[base, base + 1, base + 2, base + 2, base + 3, base]);
    }

    /// Builds geometry for every non-air voxel in `[start, end)`.
    pub fn build(world: &World, start: Vector3<i32>, end: Vector3<i32>) -> Result<Self, MeshError> {
        let lights = LightColumnCache::for_footprint(world, start.truncate(), end.truncate());
        let atlas = world.catalog().atlas();
        let mut mesh = Self::new(start);

        for x in start.x..end.x {
            for y in start.y..end.y {
                for z in start.z..end.z {
                    let pos = Vector3::new(x, y, z);
                    let block = world.block(pos);
                    if block.is_air() {
                        continue;
                    }

                    let voxel_lit = lights.is_lit(x, y, z)?;

                    for face in FaceDirection::iter() {
                        if !world.is_transparent(pos + face.as_dir()) {
                            continue;
                        }

                        let light = if block.is_self_lit() {
                            FULL_LIGHT
                        } else if face.faces_sun() {
                            let column = pos.truncate() + face.as_dir().truncate();
                            if lights.is_lit(column.x, column.y, z)? {
                                FULL_LIGHT
                            } else {
                                SHADE_MULTIPLIER
                            }
                        } else {
                            SHADE_MULTIPLIER
                        };

                        let Some(rect) = block.kind().face_appearance(face, voxel_lit, atlas) else {
                            continue;
                        };

                        let height = if block.is_fluid()
                            && face == FaceDirection::Top
                            && !world.block(pos + face.as_dir()).is_fluid()
                        {
                            FLUID_SURFACE_HEIGHT
                        } else {
                            1.0
                        };

                        mesh.push_quad(face_corners(face, pos, height, &rect, light));
                    }
                }
            }
        }

        Ok(mesh)
    }
}

fn face_corners(face: FaceDirection, pos: Vector3<i32>, height: f32, rect: &TextureRect, light: f32) -> [BlockVertex; 4] {
    let (x0, y0, z0) = (pos.x as f32, pos.y as f32, pos.z as f32);
    let (x1, y1, z1) = (x0 + 1.0, y0 + 1.0, z0 + 1.0);
    let (u0, v0, u1, v1) = (rect.u0, rect.v0, rect.u1, rect.v1);
    let v = |pos, uv| BlockVertex::new(pos, uv, light);

    match face {
        FaceDirection::Top => {
            let top = z0 + height;
            [
                v([x0, y0, top], [u0, v0]),
                v([x1, y0, top], [u1, v0]),
                v([x1, y1, top], [u1, v1]),
                v([x0, y1, top], [u0, v1]),
            ]
        }
        FaceDirection::Bottom => [
            v([x0, y1, z0], [u0, v1]),
            v([x1, y1, z0], [u1, v1]),
            v([x1, y0, z0], [u1, v0]),
            v([x0, y0, z0], [u0, v0]),
        ],
        FaceDirection::Front => [
            v([x0, y0, z0], [u0, v1]),
            v([x1, y0, z0], [u1, v1]),
            v([x1, y0, z1], [u1, v0]),
            v([x0, y0, z1], [u0, v0]),
        ],
        FaceDirection::Back => [
            v([x0, y1, z1], [u1, v0]),
            v([x1, y1, z1], [u0, v0]),
            v([x1, y1, z0], [u0, v1]),
            v([x0, y1, z0], [u1, v1]),
        ],
        FaceDirection::Left => [
            v([x0, y0, z1], [u1, v0]),
            v([x0, y1, z1], [u0, v0]),
            v([x0, y1, z0], [u0, v1]),
            v([x0, y0, z0], [u1, v1]),
        ],
        FaceDirection::Right => [
            v([x1, y0, z0], [u0, v1]),
            v([x1, y1, z0], [u1, v1]),
            v([x1, y1, z1], [u1, v0]),
            v([x1, y0, z1], [u0, v0]),
        ],
    }
}
