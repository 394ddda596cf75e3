//! Planar geometry for the axon cross-section
//!
//! All positions are `glam::Vec2` in nanometers, centered on the axon axis.

pub use glam::Vec2;

/// Vector of length `magnitude` at `angle` radians from +x
#[inline]
pub fn polar(magnitude: f32, angle: f32) -> Vec2 {
    Vec2::from_angle(angle) * magnitude
}

/// Smallest signed difference between two angles, in -π..π
pub fn angle_difference(a: f32, b: f32) -> f32 {
    use std::f32::consts::{PI, TAU};
    let mut diff = (a - b) % TAU;
    if diff > PI {
        diff -= TAU;
    } else if diff < -PI {
        diff += TAU;
    }
    diff
}
