use cgmath::{InnerSpace, Vector3, Zero};
use serde::{Deserialize, Serialize};

use crate::{
    game::{collision::CollisionResolver, world::World, Camera, EYE_HEIGHT},
    misc::ClientSettings,
};

/// Largest distance moved along one axis in a single tick.
pub const MAX_STEP_PER_AXIS: f32 = 0.9;
const GROUNDED_DRAG: f32 = 1.5;
const AIRBORNE_DRAG: f32 = 1.01;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovementInput {
    pub forward: bool,
    pub backward: bool,
    pub left: bool,
    pub right: bool,
    pub jump: bool,
}

/// The locally controlled player.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub position: Vector3<f32>,
    pub camera: Camera,
    pub velocity: Vector3<f32>,
    falling: bool,
    #[serde(skip)]
    input: MovementInput,
}

impl Player {
    pub fn new(position: Vector3<f32>) -> Self {
        Self {
            position,
            camera: Camera::default(),
            velocity: Vector3::zero(),
            falling: false,
            input: MovementInput::default(),
        }
    }

    pub const fn is_falling(&self) -> bool {
        self.falling
    }

    pub fn eye_position(&self) -> Vector3<f32> {
        self.position + Vector3::new(0.0, 0.0, EYE_HEIGHT)
    }

    pub fn input_mut(&mut self) -> &mut MovementInput {
        &mut self.input
    }

    pub fn set_input(&mut self, input: MovementInput) {
        self.input = input
    }

    pub fn input_mouse(&mut self, delta: (f64, f64), settings: &ClientSettings) {
        self.camera
            .rotate(delta.0 as f32, delta.1 as f32, settings.look_sensitivity)
    }

    pub fn teleport(&mut self, position: Vector3<f32>) {
        self.position = position;
        self.velocity = Vector3::zero();
    }

    pub fn update(&mut self, dt: f32, world: &World, settings: &ClientSettings) {
        if self.falling {
            self.velocity.z -= settings.gravity_per_tick;
        }

        if self.input.jump && !self.falling {
            self.velocity.z = settings.jump_velocity;
        }

        let walk = if self.falling { Vector3::zero() } else { self.walk_direction() };
        if walk.magnitude2() > 0.0 {
            let walk = walk.normalize() * settings.walk_speed;
            self.velocity.x = walk.x;
            self.velocity.y = walk.y;
        } else {
            let drag = if self.falling { AIRBORNE_DRAG } else { GROUNDED_DRAG };
            self.velocity.x /= drag;
            self.velocity.y /= drag;
        }

        let displacement = (self.velocity * dt).map(|val| val.clamp(-MAX_STEP_PER_AXIS, MAX_STEP_PER_AXIS));
        let result = CollisionResolver::new(world).resolve(self.position, displacement);

        self.position = result.position;
        self.falling = result.falling;
        if result.blocked.x {
            self.velocity.x = 0.0;
        }
        if result.blocked.y {
            self.velocity.y = 0.0;
        }
        if result.blocked.z {
            self.velocity.z = 0.0;
        }
    }

    fn walk_direction(&self) -> Vector3<f32> {
        let forward = self.camera.forward_vec_xy();
        let right = self.camera.right_vec();

        let mut direction = Vector3::zero();
        if self.input.forward {
            direction += forward;
        }
        if self.input.backward {
            direction -= forward;
        }
        if self.input.right {
            direction += right;
        }
        if self.input.left {
            direction -= right;
        }

        direction
    }
}
