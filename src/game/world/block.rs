use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;
use strum_macros::{EnumIter, FromRepr, IntoStaticStr};
use thiserror::Error;

use crate::engine::{
    face::{FaceDirection, SideDirection},
    TextureAtlas, TextureRect,
};

const CATALOG_YAML: &str = include_str!("../../../res/blocks.yaml");

#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, EnumIter, FromRepr, IntoStaticStr,
)]
#[repr(u8)]
pub enum BlockKind {
    #[default]
    Air = 0,
    Bedrock = 1,
    Dirt = 2,
    Wood = 3,
    Tnt = 4,
    Bookcase = 5,
    Lava = 6,
    Plank = 7,
    Cobblestone = 8,
    Concrete = 9,
    Brick = 10,
    Sand = 11,
    Gravel = 12,
    Iron = 13,
    Gold = 14,
    Diamond = 15,
    Glass = 16,
    Sponge = 17,
}

impl BlockKind {
    pub const fn id(&self) -> u8 {
        *self as u8
    }

    pub fn from_id(id: i64) -> Option<Self> {
        u8::try_from(id).ok().and_then(Self::from_repr)
    }

    pub fn name(&self) -> &'static str {
        self.into()
    }

    /// Atlas tile `(column, row)` for one face. `lit` tells whether the voxel sits in sunlight.
    pub fn face_tile(&self, face: FaceDirection, lit: bool) -> Option<(u32, u32)> {
        let side = SideDirection::from(face);

        Some(match self {
            BlockKind::Air => return None,
            BlockKind::Bedrock => (1, 1),
            BlockKind::Dirt => match side {
                SideDirection::Top if lit => (14, 0),
                SideDirection::Bottom => (2, 0),
                _ if !lit => (2, 0),
                _ => (3, 0),
            },
            BlockKind::Wood => match side {
                SideDirection::Top | SideDirection::Bottom => (5, 1),
                SideDirection::Side => (4, 1),
            },
            BlockKind::Tnt => match side {
                SideDirection::Top => (9, 0),
                SideDirection::Bottom => (10, 0),
                SideDirection::Side => (8, 0),
            },
            BlockKind::Bookcase => match side {
                SideDirection::Top | SideDirection::Bottom => (4, 0),
                SideDirection::Side => (3, 2),
            },
            BlockKind::Lava => (13, 14),
            BlockKind::Plank => (4, 0),
            BlockKind::Cobblestone => (0, 1),
            BlockKind::Concrete => (1, 0),
            BlockKind::Brick => (7, 0),
            BlockKind::Sand => (2, 1),
            BlockKind::Gravel => (3, 1),
            BlockKind::Iron => (6, 1),
            BlockKind::Gold => (7, 1),
            BlockKind::Diamond => (8, 3),
            BlockKind::Glass => (1, 3),
            BlockKind::Sponge => (0, 3),
        })
    }

    pub fn face_appearance(&self, face: FaceDirection, lit: bool, atlas: &TextureAtlas) -> Option<TextureRect> {
        self.face_tile(face, lit).map(|tile| atlas.texture_coordinates(tile))
    }
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed parsing block catalog - {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("block `{name}` declares id {declared} but its kind has id {expected}")]
    IdMismatch { name: &'static str, declared: u8, expected: u8 },
    #[error("block `{0}` is described more than once")]
    Duplicate(&'static str),
    #[error("block `{0}` has no catalog entry")]
    Missing(&'static str),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
struct BlockDescriptor {
    kind: BlockKind,
    id: u8,
    #[serde(default)]
    is_transparent: bool,
    #[serde(default)]
    is_self_lit: bool,
    #[serde(default)]
    has_gravity: bool,
    #[serde(default)]
    is_fluid: bool,
    #[serde(default)]
    is_spawnable: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Block {
    kind: BlockKind,
    is_transparent: bool,
    is_self_lit: bool,
    has_gravity: bool,
    is_fluid: bool,
    is_spawnable: bool,
}

impl From<BlockDescriptor> for Block {
    fn from(val: BlockDescriptor) -> Self {
        Block {
            kind: val.kind,
            is_transparent: val.is_transparent,
            is_self_lit: val.is_self_lit,
            has_gravity: val.has_gravity,
            is_fluid: val.is_fluid,
            is_spawnable: val.is_spawnable,
        }
    }
}

impl Block {
    pub const fn kind(&self) -> BlockKind {
        self.kind
    }

    pub const fn id(&self) -> u8 {
        self.kind.id()
    }

    pub const fn is_air(&self) -> bool {
        matches!(self.kind, BlockKind::Air)
    }

    pub const fn is_transparent(&self) -> bool {
        self.is_transparent
    }

    pub const fn is_opaque(&self) -> bool {
        !self.is_transparent
    }

    pub const fn is_self_lit(&self) -> bool {
        self.is_self_lit
    }

    pub const fn has_gravity(&self) -> bool {
        self.has_gravity
    }

    pub const fn is_fluid(&self) -> bool {
        self.is_fluid
    }

    pub const fn is_spawnable(&self) -> bool {
        self.is_spawnable
    }
}

/// Immutable table of block properties, indexed by block id.
#[derive(Clone, Debug)]
pub struct BlockCatalog {
    blocks: Vec<Block>,
    by_name: FxHashMap<String, BlockKind>,
    atlas: TextureAtlas,
}

impl BlockCatalog {
    pub fn new() -> Result<Self, CatalogError> {
        Self::from_yaml(CATALOG_YAML)
    }

    pub fn from_yaml(text: &str) -> Result<Self, CatalogError> {
        let descriptors: Vec<BlockDescriptor> = serde_yaml::from_str(text)?;

        let mut slots: Vec<Option<Block>> = vec![None; BlockKind::iter().count()];
        for descriptor in descriptors {
            let kind = descriptor.kind;
            if descriptor.id != kind.id() {
                return Err(CatalogError::IdMismatch {
                    name: kind.name(),
                    declared: descriptor.id,
                    expected: kind.id(),
                });
            }

            let slot = &mut slots[kind.id() as usize];
            if slot.is_some() {
                return Err(CatalogError::Duplicate(kind.name()));
            }
            *slot = Some(descriptor.into());
        }

        let blocks = BlockKind::iter()
            .zip(slots)
            .map(|(kind, slot)| slot.ok_or(CatalogError::Missing(kind.name())))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            by_name: blocks
                .iter()
                .map(|block| (block.kind().name().to_lowercase(), block.kind()))
                .collect(),
            blocks,
            atlas: TextureAtlas::default(),
        })
    }

    pub fn get(&self, kind: BlockKind) -> &Block {
        &self.blocks[kind.id() as usize]
    }

    pub fn from_id(&self, id: i64) -> Option<&Block> {
        BlockKind::from_id(id).map(|kind| self.get(kind))
    }

    pub fn by_name(&self, name: &str) -> Option<&Block> {
        self.by_name.get(&name.to_lowercase()).map(|kind| self.get(*kind))
    }

    pub fn atlas(&self) -> &TextureAtlas {
        &self.atlas
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_catalog_is_complete() {
        let catalog = BlockCatalog::new().unwrap();

        for kind in BlockKind::iter() {
            assert_eq!(catalog.get(kind).kind(), kind);
        }
    }

    #[test]
    fn air_is_transparent_and_not_spawnable() {
        let catalog = BlockCatalog::new().unwrap();
        let air = catalog.get(BlockKind::Air);

        assert!(air.is_air());
        assert!(air.is_transparent());
        assert!(!air.is_spawnable());
    }

    #[test]
    fn lava_is_self_lit_fluid_and_protected() {
        let catalog = BlockCatalog::new().unwrap();
        let lava = catalog.get(BlockKind::Lava);

        assert!(lava.is_self_lit());
        assert!(lava.is_fluid());
        assert!(lava.is_transparent());
        assert!(!lava.is_spawnable());
    }

    #[test]
    fn sand_and_gravel_fall() {
        let catalog = BlockCatalog::new().unwrap();

        let falling: Vec<_> = BlockKind::iter().filter(|kind| catalog.get(*kind).has_gravity()).collect();
        assert_eq!(falling, vec![BlockKind::Sand, BlockKind::Gravel]);
    }

    #[test]
    fn unknown_ids_are_rejected() {
        let catalog = BlockCatalog::new().unwrap();

        assert!(catalog.from_id(-1).is_none());
        assert!(catalog.from_id(18).is_none());
        assert!(catalog.from_id(300).is_none());
        assert_eq!(catalog.from_id(16).map(Block::kind), Some(BlockKind::Glass));
    }

    #[test]
    fn names_are_case_insensitive() {
        let catalog = BlockCatalog::new().unwrap();

        assert_eq!(catalog.by_name("cobblestone").map(Block::kind), Some(BlockKind::Cobblestone));
        assert_eq!(catalog.by_name("TNT").map(Block::kind), Some(BlockKind::Tnt));
        assert!(catalog.by_name("obsidian").is_none());
    }

    #[test]
    fn duplicate_and_missing_entries_fail() {
        let duplicate = "- kind: Air\n  id: 0\n- kind: Air\n  id: 0\n";
        assert!(matches!(BlockCatalog::from_yaml(duplicate), Err(CatalogError::Duplicate("Air"))));

        let missing = "- kind: Air\n  id: 0\n";
        assert!(matches!(BlockCatalog::from_yaml(missing), Err(CatalogError::Missing("Bedrock"))));

        let mismatch = "- kind: Dirt\n  id: 5\n";
        assert!(matches!(BlockCatalog::from_yaml(mismatch), Err(CatalogError::IdMismatch { .. })));
    }

    #[test]
    fn dirt_shows_grass_only_when_lit_from_above() {
        assert_eq!(BlockKind::Dirt.face_tile(FaceDirection::Top, true), Some((14, 0)));
        assert_eq!(BlockKind::Dirt.face_tile(FaceDirection::Top, false), Some((2, 0)));
        assert_eq!(BlockKind::Dirt.face_tile(FaceDirection::Bottom, true), Some((2, 0)));
        assert_eq!(BlockKind::Dirt.face_tile(FaceDirection::Left, true), Some((3, 0)));
        assert_eq!(BlockKind::Dirt.face_tile(FaceDirection::Left, false), Some((2, 0)));
        assert_eq!(BlockKind::Air.face_tile(FaceDirection::Top, true), None);
    }
}
