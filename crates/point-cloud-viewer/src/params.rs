//! Per-frame tunables.
//!
//! `FrameParams` is an immutable snapshot. The UI panel and input bindings
//! produce a new snapshot each frame; update and draw only read it.

use depthcam::{TILT_MAX_DEGREES, TILT_MIN_DEGREES};
use glam::Quat;
use std::ops::RangeInclusive;

pub const CAMERA_DISTANCE_RANGE: RangeInclusive<f32> = 100.0..=5000.0;
pub const CAMERA_DISTANCE_STEP: f32 = 100.0;
pub const TILT_RANGE: RangeInclusive<f32> = TILT_MIN_DEGREES..=TILT_MAX_DEGREES;
pub const TILT_STEP: f32 = 1.0;
pub const POINT_SIZE_RANGE: RangeInclusive<f32> = 1.0..=20.0;
pub const POINT_SIZE_STEP: f32 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameParams {
    scene_rotation: Quat,
    camera_distance: f32,
    tilt_degrees: f32,
    point_size: f32,
}

impl Default for FrameParams {
    fn default() -> Self {
        Self {
            scene_rotation: Quat::IDENTITY,
            camera_distance: 1000.0,
            tilt_degrees: 0.0,
            point_size: 1.0,
        }
    }
}

/// Clamps into `range`; NaN keeps `current`.
fn clamp_or(value: f32, range: &RangeInclusive<f32>, current: f32) -> f32 {
    if value.is_nan() {
        current
    } else {
        value.clamp(*range.start(), *range.end())
    }
}

impl FrameParams {
    #[inline]
    pub fn scene_rotation(&self) -> Quat {
        self.scene_rotation
    }

    #[inline]
    pub fn camera_distance(&self) -> f32 {
        self.camera_distance
    }

    #[inline]
    pub fn tilt_degrees(&self) -> f32 {
        self.tilt_degrees
    }

    #[inline]
    pub fn point_size(&self) -> f32 {
        self.point_size
    }

    pub fn with_scene_rotation(self, rotation: Quat) -> Self {
        let rotation = if rotation.is_finite() && rotation.length_squared() > 0.0 {
            rotation.normalize()
        } else {
            self.scene_rotation
        };
        Self {
            scene_rotation: rotation,
            ..self
        }
    }

    /// Applies `delta` on top of the current scene rotation.
    pub fn rotated_by(self, delta: Quat) -> Self {
        self.with_scene_rotation(delta * self.scene_rotation)
    }

    pub fn with_camera_distance(self, distance: f32) -> Self {
        Self {
            camera_distance: clamp_or(distance, &CAMERA_DISTANCE_RANGE, self.camera_distance),
            ..self
        }
    }

    pub fn with_tilt_degrees(self, tilt: f32) -> Self {
        Self {
            tilt_degrees: clamp_or(tilt, &TILT_RANGE, self.tilt_degrees),
            ..self
        }
    }

    pub fn with_point_size(self, size: f32) -> Self {
        Self {
            point_size: clamp_or(size, &POINT_SIZE_RANGE, self.point_size),
            ..self
        }
    }
}
