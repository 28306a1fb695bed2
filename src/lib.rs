pub mod engine;
pub mod error;
pub mod game;
pub mod misc;
pub mod net;

pub use error::{Error, Result};

pub const TITLE: &str = "voxcraft";
