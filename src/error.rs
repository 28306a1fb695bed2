use thiserror::Error;

use crate::game::world::{CatalogError, MeshError, SnapshotError, WorldError};

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error(transparent)]
    World(#[from] WorldError),
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
    #[error(transparent)]
    Mesh(#[from] MeshError),
    #[error("failed loading config - {0}")]
    Config(#[from] confy::ConfyError),
    #[error("io error - {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
