//! Keyboard and mouse bindings that produce new `FrameParams` snapshots.

use crate::params::{FrameParams, CAMERA_DISTANCE_STEP, POINT_SIZE_STEP, TILT_STEP};
use glam::Quat;
use winit::{
    event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent},
    keyboard::Key,
};

/// Radians of scene rotation per pixel of mouse drag.
const DRAG_RAD_PER_PX: f32 = 0.005;

/// Maps a typed character to a parameter step.
///
/// `s`/`w` move the camera away/closer, `T`/`t` raise/lower the tilt,
/// `P`/`p` grow/shrink the points.
pub fn apply_key(params: &FrameParams, key: &str) -> Option<FrameParams> {
    let p = *params;
    let next = match key {
        "s" => p.with_camera_distance(p.camera_distance() + CAMERA_DISTANCE_STEP),
        "w" => p.with_camera_distance(p.camera_distance() - CAMERA_DISTANCE_STEP),
        "T" => p.with_tilt_degrees(p.tilt_degrees() + TILT_STEP),
        "t" => p.with_tilt_degrees(p.tilt_degrees() - TILT_STEP),
        "P" => p.with_point_size(p.point_size() + POINT_SIZE_STEP),
        "p" => p.with_point_size(p.point_size() - POINT_SIZE_STEP),
        _ => return None,
    };
    Some(next)
}

/// Rotates the scene for a drag of `(dx, dy)` pixels: yaw about Y, pitch about X.
pub fn drag_rotation(params: &FrameParams, dx: f32, dy: f32) -> FrameParams {
    let delta =
        Quat::from_rotation_y(dx * DRAG_RAD_PER_PX) * Quat::from_rotation_x(dy * DRAG_RAD_PER_PX);
    params.rotated_by(delta)
}

#[derive(Debug, Default)]
pub struct ParamsController {
    mouse_down: bool,
    last_mouse: Option<(f64, f64)>,
}

impl ParamsController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a new snapshot when the event changed a parameter.
    pub fn handle_event(
        &mut self,
        event: &WindowEvent,
        params: &FrameParams,
    ) -> Option<FrameParams> {
        match event {
            WindowEvent::KeyboardInput { event, .. } if event.state == ElementState::Pressed => {
                match &event.logical_key {
                    Key::Character(c) => apply_key(params, c.as_str()),
                    _ => None,
                }
            }
            WindowEvent::MouseInput { button, state, .. } => {
                if *button == MouseButton::Left {
                    self.mouse_down = *state == ElementState::Pressed;
                }
                None
            }
            WindowEvent::CursorMoved { position, .. } => {
                let xy = (position.x, position.y);
                let next = match self.last_mouse {
                    Some(last) if self.mouse_down => Some(drag_rotation(
                        params,
                        (xy.0 - last.0) as f32,
                        (xy.1 - last.1) as f32,
                    )),
                    _ => None,
                };
                self.last_mouse = Some(xy);
                next
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let scroll = match delta {
                    MouseScrollDelta::LineDelta(_, y) => *y,
                    MouseScrollDelta::PixelDelta(pos) => pos.y as f32 / 120.0,
                };
                // Scroll up moves closer.
                Some(params.with_camera_distance(
                    params.camera_distance() - scroll * CAMERA_DISTANCE_STEP,
                ))
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_keys_step_by_one_hundred() {
        let p = FrameParams::default();
        assert_eq!(apply_key(&p, "s").unwrap().camera_distance(), 1100.0);
        assert_eq!(apply_key(&p, "w").unwrap().camera_distance(), 900.0);
    }

    #[test]
    fn tilt_keys_are_case_sensitive() {
        let p = FrameParams::default();
        assert_eq!(apply_key(&p, "T").unwrap().tilt_degrees(), 1.0);
        assert_eq!(apply_key(&p, "t").unwrap().tilt_degrees(), -1.0);
    }

    #[test]
    fn point_size_keys_respect_lower_bound() {
        let p = FrameParams::default();
        assert_eq!(apply_key(&p, "P").unwrap().point_size(), 1.5);
        assert_eq!(apply_key(&p, "p").unwrap().point_size(), 1.0);
    }

    #[test]
    fn other_keys_are_ignored() {
        assert!(apply_key(&FrameParams::default(), "x").is_none());
    }

    #[test]
    fn drag_changes_rotation_only() {
        let p = FrameParams::default();
        let q = drag_rotation(&p, 100.0, 0.0);
        assert_ne!(q.scene_rotation(), p.scene_rotation());
        assert_eq!(q.camera_distance(), p.camera_distance());

        let (axis, angle) = q.scene_rotation().to_axis_angle();
        assert!((angle - 0.5).abs() < 1e-5);
        assert!((axis.y - 1.0).abs() < 1e-5);
    }
}
