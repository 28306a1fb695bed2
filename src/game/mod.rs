mod camera;
mod collision;
mod player;
mod state;
pub mod world;

pub use camera::{Camera, MAX_PITCH};
pub use collision::{CollisionResolver, CollisionResult, PLAYER_FOOTPRINT, PLAYER_HEIGHT};
pub use player::{MovementInput, Player, MAX_STEP_PER_AXIS};
pub use state::State;

/// Eye height above the feet.
pub const EYE_HEIGHT: f32 = 1.7;
