//! depthcam: frame buffers and a device seam for Kinect-class depth cameras.
//!
//! - `DepthFrame`: 640x480 raw 11-bit depth, 2047 = no reading.
//! - `VideoFrame`: packed RGB8 colour frame of the same resolution.
//! - `DepthDevice`: the polling interface a viewer drives once per frame
//!   (new-frame checks, frame fetch, tilt motor query/command).
//! - `SyntheticKinect`: a procedural device used when no hardware binding
//!   is available.
//!
//! All calls are synchronous and non-blocking. Frame fetches consume the
//! "new frame" flag; checks do not.

pub mod frame;
pub mod synthetic;

pub use frame::{DepthFrame, VideoFrame, DEPTH_NO_READING, KINECT_HEIGHT, KINECT_WIDTH};
pub use synthetic::SyntheticKinect;

/// Tilt motor limits in degrees.
pub const TILT_MIN_DEGREES: f32 = -31.0;
pub const TILT_MAX_DEGREES: f32 = 31.0;

#[derive(Debug, thiserror::Error)]
pub enum DeviceError {
    #[error("tilt {0}° is outside the motor range")]
    TiltOutOfRange(f32),
    #[error("frame buffer holds {actual} samples, expected {expected}")]
    FrameSize { expected: usize, actual: usize },
}

/// Polling interface to a depth camera.
pub trait DepthDevice {
    /// True when a depth frame newer than the last fetched one is available.
    fn check_new_depth_frame(&mut self) -> bool;

    /// Fetches the latest depth frame, or `None` if nothing was captured yet.
    fn depth_image(&mut self) -> Option<DepthFrame>;

    /// True when a colour frame newer than the last fetched one is available.
    fn check_new_video_frame(&mut self) -> bool;

    /// Fetches the latest colour frame.
    fn video_image(&mut self) -> Option<VideoFrame>;

    /// Last tilt angle reported by the motor, in degrees.
    fn tilt(&self) -> f32;

    /// Commands the tilt motor. Fire-and-forget; no acknowledgement.
    fn set_tilt(&mut self, degrees: f32) -> Result<(), DeviceError>;
}

impl<D: DepthDevice + ?Sized> DepthDevice for Box<D> {
    fn check_new_depth_frame(&mut self) -> bool {
        (**self).check_new_depth_frame()
    }

    fn depth_image(&mut self) -> Option<DepthFrame> {
        (**self).depth_image()
    }

    fn check_new_video_frame(&mut self) -> bool {
        (**self).check_new_video_frame()
    }

    fn video_image(&mut self) -> Option<VideoFrame> {
        (**self).video_image()
    }

    fn tilt(&self) -> f32 {
        (**self).tilt()
    }

    fn set_tilt(&mut self, degrees: f32) -> Result<(), DeviceError> {
        (**self).set_tilt(degrees)
    }
}

/// Opens the default device at the given frame rate.
///
/// Only the synthetic source is built in; hardware bindings plug in by
/// implementing `DepthDevice`.
pub fn open_default(frame_rate_hz: f32) -> Box<dyn DepthDevice> {
    log::info!(
        "Opening synthetic Kinect ({}x{} @ {:.1} Hz)",
        KINECT_WIDTH,
        KINECT_HEIGHT,
        frame_rate_hz
    );
    Box::new(SyntheticKinect::new(KINECT_WIDTH, KINECT_HEIGHT, frame_rate_hz))
}

/// Validates a tilt command against the motor limits.
pub fn check_tilt(degrees: f32) -> Result<f32, DeviceError> {
    if (TILT_MIN_DEGREES..=TILT_MAX_DEGREES).contains(&degrees) {
        Ok(degrees)
    } else {
        Err(DeviceError::TiltOutOfRange(degrees))
    }
}
