use std::f32::consts::FRAC_PI_2;

use cgmath::{Angle, InnerSpace, Rad, Vector3};
use serde::{Deserialize, Serialize};

pub const MAX_PITCH: f32 = FRAC_PI_2;

/// Look direction of a player. Yaw 0 faces +y and grows clockwise seen from above.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    pub yaw: Rad<f32>,
    pub pitch: Rad<f32>,
}

impl Camera {
    pub fn new(yaw: impl Into<Rad<f32>>, pitch: impl Into<Rad<f32>>) -> Self {
        Self {
            yaw: yaw.into(),
            pitch: pitch.into(),
        }
    }

    pub fn yaw(&self) -> Rad<f32> {
        self.yaw
    }

    pub fn pitch(&self) -> Rad<f32> {
        self.pitch
    }

    /// Horizontal forward direction, ignoring pitch.
    pub fn forward_vec_xy(&self) -> Vector3<f32> {
        let (yaw_sin, yaw_cos) = self.yaw.0.sin_cos();
        Vector3::new(yaw_sin, yaw_cos, 0.0).normalize()
    }

    pub fn forward_vec_xyz(&self) -> Vector3<f32> {
        let xy_len = self.pitch.cos();
        let (yaw_sin, yaw_cos) = self.yaw.0.sin_cos();
        Vector3::new(yaw_sin * xy_len, yaw_cos * xy_len, self.pitch.sin()).normalize()
    }

    pub fn right_vec(&self) -> Vector3<f32> {
        let (yaw_sin, yaw_cos) = self.yaw.0.sin_cos();
        Vector3::new(yaw_cos, -yaw_sin, 0.0).normalize()
    }

    /// Applies a mouse delta in pixels.
    pub fn rotate(&mut self, horizontal: f32, vertical: f32, sensitivity: f32) {
        self.yaw += Rad(horizontal * sensitivity);
        self.pitch += Rad(-vertical * sensitivity);

        if self.pitch < -Rad(MAX_PITCH) {
            self.pitch = -Rad(MAX_PITCH);
        } else if self.pitch > Rad(MAX_PITCH) {
            self.pitch = Rad(MAX_PITCH);
        }
        self.yaw = self.yaw.normalize();
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(Rad(0.0), Rad(0.0))
    }
}
