//! Procedural Kinect stand-in.
//!
//! Renders a sloped back wall with an orbiting sphere in front of it and a
//! ripple across the surface. The left-most columns carry no reading, like
//! the shadow band of a real structured-light sensor. Tilting the motor
//! shifts the scene vertically.

use crate::{check_tilt, DepthDevice, DepthFrame, DeviceError, VideoFrame, DEPTH_NO_READING};
use rayon::prelude::*;
use std::time::{Duration, Instant};

/// Columns on the left edge that never report depth.
const DEAD_BAND_PX: u32 = 8;
/// Raw reading of the back wall at the image centre.
const WALL_RAW: f32 = 950.0;
/// Raw reading of the sphere's nearest point.
const SPHERE_RAW: f32 = 620.0;
/// Vertical scene shift per degree of tilt.
const TILT_SHIFT_PX: f32 = 4.0;

enum Clock {
    Wall(Instant),
    Manual(Duration),
}

impl Clock {
    fn elapsed(&self) -> Duration {
        match self {
            Clock::Wall(start) => start.elapsed(),
            Clock::Manual(t) => *t,
        }
    }
}

pub struct SyntheticKinect {
    width: u32,
    height: u32,
    frame_interval: Duration,
    clock: Clock,
    last_depth_frame: Option<u64>,
    last_video_frame: Option<u64>,
    tilt_deg: f32,
}

impl SyntheticKinect {
    /// Creates a device driven by wall-clock time.
    pub fn new(width: u32, height: u32, frame_rate_hz: f32) -> Self {
        Self::with_clock(width, height, frame_rate_hz, Clock::Wall(Instant::now()))
    }

    /// Creates a device whose time only moves through [`advance`](Self::advance).
    pub fn manual(width: u32, height: u32, frame_rate_hz: f32) -> Self {
        Self::with_clock(width, height, frame_rate_hz, Clock::Manual(Duration::ZERO))
    }

    fn with_clock(width: u32, height: u32, frame_rate_hz: f32, clock: Clock) -> Self {
        let hz = if frame_rate_hz.is_finite() {
            frame_rate_hz.max(1.0)
        } else {
            30.0
        };
        Self {
            width,
            height,
            frame_interval: Duration::from_nanos((1e9 / hz as f64).round() as u64),
            clock,
            last_depth_frame: None,
            last_video_frame: None,
            tilt_deg: 0.0,
        }
    }

    /// Moves a manual clock forward. No-op on a wall clock.
    pub fn advance(&mut self, dt: Duration) {
        if let Clock::Manual(t) = &mut self.clock {
            *t += dt;
        }
    }

    fn current_frame(&self) -> u64 {
        (self.clock.elapsed().as_nanos() / self.frame_interval.as_nanos().max(1)) as u64
    }

    fn frame_time_s(&self, frame: u64) -> f32 {
        frame as f32 * self.frame_interval.as_secs_f32()
    }

    fn sphere(&self, t: f32) -> (f32, f32, f32) {
        let (w, h) = (self.width as f32, self.height as f32);
        let shift = self.tilt_deg * TILT_SHIFT_PX;
        let cx = w * 0.5 + (t * 0.7).cos() * w * 0.25;
        let cy = h * 0.5 + (t * 1.1).sin() * h * 0.2 + shift;
        (cx, cy, h * 0.22)
    }

    /// Renders the depth frame for time `t` seconds.
    pub fn render_depth(&self, t: f32) -> DepthFrame {
        let (w, h) = (self.width, self.height);
        let (cx, cy, r) = self.sphere(t);
        let shift = self.tilt_deg * TILT_SHIFT_PX;
        let half_h = h as f32 * 0.5;

        let data: Vec<u16> = (0..h)
            .into_par_iter()
            .flat_map_iter(|y| {
                (0..w).map(move |x| {
                    if x < DEAD_BAND_PX {
                        return DEPTH_NO_READING;
                    }
                    let (fx, fy) = (x as f32, y as f32);
                    let dx = fx - cx;
                    let dy = fy - cy;
                    let d2 = dx * dx + dy * dy;
                    let d = d2.sqrt();

                    let ripple = 12.0 * (d * 0.05 - t * 3.0).sin();
                    let raw = if d2 < r * r {
                        SPHERE_RAW + (r - (r * r - d2).sqrt()) * 0.8
                    } else {
                        WALL_RAW + (fy - half_h - shift) * 0.4 + ripple
                    };
                    raw.clamp(0.0, (DEPTH_NO_READING - 1) as f32) as u16
                })
            })
            .collect();

        DepthFrame {
            width: w,
            height: h,
            data,
        }
    }

    /// Renders the colour frame for time `t` seconds.
    pub fn render_video(&self, t: f32) -> VideoFrame {
        let (w, h) = (self.width, self.height);
        let (cx, cy, r) = self.sphere(t);
        let blue = (128.0 + 100.0 * t.sin()) as u8;

        let rgb: Vec<u8> = (0..h)
            .into_par_iter()
            .flat_map_iter(|y| {
                (0..w).flat_map(move |x| {
                    let dx = x as f32 - cx;
                    let dy = y as f32 - cy;
                    if dx * dx + dy * dy < r * r {
                        [230, 120, 40]
                    } else {
                        [
                            (x * 255 / w.max(1)) as u8,
                            (y * 255 / h.max(1)) as u8,
                            blue,
                        ]
                    }
                })
            })
            .collect();

        VideoFrame { width: w, height: h, rgb }
    }
}

impl DepthDevice for SyntheticKinect {
    fn check_new_depth_frame(&mut self) -> bool {
        self.last_depth_frame
            .map_or(true, |last| self.current_frame() > last)
    }

    fn depth_image(&mut self) -> Option<DepthFrame> {
        let frame = self.current_frame();
        self.last_depth_frame = Some(frame);
        Some(self.render_depth(self.frame_time_s(frame)))
    }

    fn check_new_video_frame(&mut self) -> bool {
        self.last_video_frame
            .map_or(true, |last| self.current_frame() > last)
    }

    fn video_image(&mut self) -> Option<VideoFrame> {
        let frame = self.current_frame();
        self.last_video_frame = Some(frame);
        Some(self.render_video(self.frame_time_s(frame)))
    }

    fn tilt(&self) -> f32 {
        self.tilt_deg
    }

    fn set_tilt(&mut self, degrees: f32) -> Result<(), DeviceError> {
        self.tilt_deg = check_tilt(degrees)?;
        log::debug!("Synthetic motor tilt set to {:.1}°", self.tilt_deg);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_check_reports_a_frame() {
        let mut dev = SyntheticKinect::manual(16, 12, 30.0);
        assert!(dev.check_new_depth_frame());
        assert!(dev.check_new_video_frame());
    }

    #[test]
    fn fetch_consumes_until_clock_advances() {
        let mut dev = SyntheticKinect::manual(16, 12, 10.0);
        assert!(dev.depth_image().is_some());
        assert!(!dev.check_new_depth_frame());

        dev.advance(Duration::from_millis(50));
        assert!(!dev.check_new_depth_frame());

        dev.advance(Duration::from_millis(60));
        assert!(dev.check_new_depth_frame());
    }

    #[test]
    fn depth_streams_are_independent_of_video() {
        let mut dev = SyntheticKinect::manual(16, 12, 10.0);
        dev.depth_image();
        assert!(!dev.check_new_depth_frame());
        assert!(dev.check_new_video_frame());
    }

    #[test]
    fn dead_band_has_no_reading() {
        let dev = SyntheticKinect::manual(64, 48, 30.0);
        let frame = dev.render_depth(0.0);
        for y in 0..48 {
            assert_eq!(frame.get(0, y), Some(DEPTH_NO_READING));
            assert_ne!(frame.get(DEAD_BAND_PX, y), Some(DEPTH_NO_READING));
        }
    }

    #[test]
    fn rendering_is_deterministic_for_a_given_time() {
        let dev = SyntheticKinect::manual(32, 24, 30.0);
        assert_eq!(dev.render_depth(1.5), dev.render_depth(1.5));
        assert_eq!(dev.render_video(1.5), dev.render_video(1.5));
    }

    #[test]
    fn tilt_is_validated() {
        let mut dev = SyntheticKinect::manual(8, 8, 30.0);
        dev.set_tilt(12.0).unwrap();
        assert_eq!(dev.tilt(), 12.0);

        assert!(matches!(
            dev.set_tilt(45.0),
            Err(DeviceError::TiltOutOfRange(_))
        ));
        assert_eq!(dev.tilt(), 12.0);
    }
}
