mod settings;

pub use settings::{ClientSettings, ServerSettings};
