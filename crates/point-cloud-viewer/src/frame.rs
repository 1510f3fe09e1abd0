//! Per-frame device polling: texture replacement and tilt forwarding.

use crate::params::FrameParams;
use depthcam::{DepthDevice, DepthFrame, VideoFrame};
use std::sync::Arc;

/// Builds textures from device frames. The renderer implements this over
/// wgpu; tests use a plain counter.
pub trait TextureFactory {
    type Texture;

    fn depth_texture(&mut self, frame: &DepthFrame) -> Self::Texture;
    fn video_texture(&mut self, frame: &VideoFrame) -> Self::Texture;
}

/// What a single tick changed.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TickOutcome {
    pub depth_replaced: bool,
    pub video_replaced: bool,
    /// Tilt sent to the device this tick, if any.
    pub tilt_command: Option<f32>,
    /// A rejected tilt was logged this tick. Repeats of the same value stay quiet.
    pub tilt_warning: bool,
}

/// Owns the currently bound textures.
///
/// Textures are replaced wholesale, never written in place, so a draw that
/// still holds the previous `Arc` keeps seeing a complete frame.
pub struct FrameUpdater<T> {
    depth: Arc<T>,
    depth_received: bool,
    video: Option<Arc<T>>,
    stream_video: bool,
    last_failed_tilt: Option<f32>,
}

impl<T> FrameUpdater<T> {
    /// `initial_depth` stays bound until the first depth frame arrives.
    pub fn new(initial_depth: T, stream_video: bool) -> Self {
        Self {
            depth: Arc::new(initial_depth),
            depth_received: false,
            video: None,
            stream_video,
            last_failed_tilt: None,
        }
    }

    pub fn depth_texture(&self) -> &Arc<T> {
        &self.depth
    }

    /// The depth texture, once the device has delivered a frame.
    pub fn received_depth_texture(&self) -> Option<&Arc<T>> {
        self.depth_received.then_some(&self.depth)
    }

    pub fn video_texture(&self) -> Option<&Arc<T>> {
        self.video.as_ref()
    }

    pub fn tick<D, F>(
        &mut self,
        device: &mut D,
        factory: &mut F,
        params: &FrameParams,
    ) -> TickOutcome
    where
        D: DepthDevice + ?Sized,
        F: TextureFactory<Texture = T>,
    {
        let mut outcome = TickOutcome::default();

        if device.check_new_depth_frame() {
            match device.depth_image() {
                Some(frame) => {
                    self.depth = Arc::new(factory.depth_texture(&frame));
                    self.depth_received = true;
                    outcome.depth_replaced = true;
                }
                None => log::debug!("Depth frame announced but not delivered"),
            }
        }

        if self.stream_video && device.check_new_video_frame() {
            match device.video_image() {
                Some(frame) => {
                    self.video = Some(Arc::new(factory.video_texture(&frame)));
                    outcome.video_replaced = true;
                }
                None => log::debug!("Video frame announced but not delivered"),
            }
        }

        let desired = params.tilt_degrees();
        if desired != device.tilt() {
            outcome.tilt_command = Some(desired);
            match device.set_tilt(desired) {
                Ok(()) => {
                    log::debug!("Tilt set to {:.1}°", desired);
                    self.last_failed_tilt = None;
                }
                Err(e) => {
                    if self.last_failed_tilt != Some(desired) {
                        log::warn!("Tilt command failed: {}", e);
                        outcome.tilt_warning = true;
                    }
                    self.last_failed_tilt = Some(desired);
                }
            }
        }

        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use depthcam::DeviceError;

    /// Device whose frame availability is scripted by the test.
    #[derive(Default)]
    struct ScriptedDevice {
        depth_ready: bool,
        deliver: bool,
        video_ready: bool,
        tilt: f32,
        reject_tilt: bool,
        tilt_calls: Vec<f32>,
    }

    impl DepthDevice for ScriptedDevice {
        fn check_new_depth_frame(&mut self) -> bool {
            self.depth_ready
        }

        fn depth_image(&mut self) -> Option<DepthFrame> {
            self.depth_ready = false;
            self.deliver
                .then(|| DepthFrame::new(2, 2, vec![0, 1, 2, 3]).unwrap())
        }

        fn check_new_video_frame(&mut self) -> bool {
            self.video_ready
        }

        fn video_image(&mut self) -> Option<VideoFrame> {
            self.video_ready = false;
            Some(VideoFrame::new(1, 1, vec![9, 9, 9]).unwrap())
        }

        fn tilt(&self) -> f32 {
            self.tilt
        }

        fn set_tilt(&mut self, degrees: f32) -> Result<(), DeviceError> {
            self.tilt_calls.push(degrees);
            if self.reject_tilt {
                return Err(DeviceError::TiltOutOfRange(degrees));
            }
            self.tilt = degrees;
            Ok(())
        }
    }

    /// Numbers each texture it creates.
    #[derive(Default)]
    struct CountingFactory {
        created: u32,
    }

    impl TextureFactory for CountingFactory {
        type Texture = u32;

        fn depth_texture(&mut self, _frame: &DepthFrame) -> u32 {
            self.created += 1;
            self.created
        }

        fn video_texture(&mut self, _frame: &VideoFrame) -> u32 {
            self.created += 1;
            self.created
        }
    }

    #[test]
    fn no_new_frame_keeps_the_same_texture_object() {
        let mut updater = FrameUpdater::new(0u32, false);
        let mut device = ScriptedDevice::default();
        let mut factory = CountingFactory::default();

        let before = Arc::clone(updater.depth_texture());
        let outcome = updater.tick(&mut device, &mut factory, &FrameParams::default());

        assert!(!outcome.depth_replaced);
        assert!(Arc::ptr_eq(&before, updater.depth_texture()));
        assert_eq!(factory.created, 0);
    }

    #[test]
    fn new_frame_replaces_the_texture() {
        let mut updater = FrameUpdater::new(0u32, false);
        let mut device = ScriptedDevice {
            depth_ready: true,
            deliver: true,
            ..Default::default()
        };
        let mut factory = CountingFactory::default();

        let before = Arc::clone(updater.depth_texture());
        assert!(updater.received_depth_texture().is_none());
        let outcome = updater.tick(&mut device, &mut factory, &FrameParams::default());

        assert!(outcome.depth_replaced);
        assert!(Arc::ptr_eq(
            updater.received_depth_texture().unwrap(),
            updater.depth_texture()
        ));
        assert!(!Arc::ptr_eq(&before, updater.depth_texture()));
        assert_eq!(**updater.depth_texture(), 1);
        assert_eq!(*before, 0);
    }

    #[test]
    fn announced_but_missing_frame_keeps_previous_texture() {
        let mut updater = FrameUpdater::new(0u32, false);
        let mut device = ScriptedDevice {
            depth_ready: true,
            deliver: false,
            ..Default::default()
        };
        let mut factory = CountingFactory::default();

        let before = Arc::clone(updater.depth_texture());
        let outcome = updater.tick(&mut device, &mut factory, &FrameParams::default());

        assert!(!outcome.depth_replaced);
        assert!(Arc::ptr_eq(&before, updater.depth_texture()));
        assert!(updater.received_depth_texture().is_none());
    }

    #[test]
    fn tilt_mismatch_sends_exactly_one_command() {
        let mut updater = FrameUpdater::new(0u32, false);
        let mut device = ScriptedDevice::default();
        let mut factory = CountingFactory::default();
        let params = FrameParams::default().with_tilt_degrees(10.0);

        let outcome = updater.tick(&mut device, &mut factory, &params);
        assert_eq!(outcome.tilt_command, Some(10.0));
        assert_eq!(device.tilt_calls, vec![10.0]);

        let outcome = updater.tick(&mut device, &mut factory, &params);
        assert_eq!(outcome.tilt_command, None);
        assert_eq!(device.tilt_calls.len(), 1);
    }

    #[test]
    fn rejected_tilt_is_not_retried_within_a_tick() {
        let mut updater = FrameUpdater::new(0u32, false);
        let mut device = ScriptedDevice {
            reject_tilt: true,
            ..Default::default()
        };
        let mut factory = CountingFactory::default();
        let params = FrameParams::default().with_tilt_degrees(-5.0);

        updater.tick(&mut device, &mut factory, &params);
        assert_eq!(device.tilt_calls, vec![-5.0]);
        assert_eq!(device.tilt(), 0.0);
    }

    #[test]
    fn rejected_tilt_warns_once_per_value() {
        let mut updater = FrameUpdater::new(0u32, false);
        let mut device = ScriptedDevice {
            reject_tilt: true,
            ..Default::default()
        };
        let mut factory = CountingFactory::default();
        let down = FrameParams::default().with_tilt_degrees(-5.0);
        let up = FrameParams::default().with_tilt_degrees(7.0);

        let warnings: Vec<bool> = [&down, &down, &down, &up, &up, &down]
            .into_iter()
            .map(|p| updater.tick(&mut device, &mut factory, p).tilt_warning)
            .collect();

        assert_eq!(warnings, vec![true, false, false, true, false, true]);
        assert_eq!(device.tilt_calls.len(), 6);
    }

    #[test]
    fn accepted_tilt_resets_the_warning() {
        let mut updater = FrameUpdater::new(0u32, false);
        let mut device = ScriptedDevice {
            reject_tilt: true,
            ..Default::default()
        };
        let mut factory = CountingFactory::default();
        let params = FrameParams::default().with_tilt_degrees(3.0);

        assert!(updater.tick(&mut device, &mut factory, &params).tilt_warning);

        device.reject_tilt = false;
        let outcome = updater.tick(&mut device, &mut factory, &params);
        assert!(!outcome.tilt_warning);
        assert_eq!(device.tilt(), 3.0);

        device.reject_tilt = true;
        device.tilt = 0.0;
        assert!(updater.tick(&mut device, &mut factory, &params).tilt_warning);
    }

    #[test]
    fn video_is_only_streamed_when_enabled() {
        let mut factory = CountingFactory::default();

        let mut device = ScriptedDevice {
            video_ready: true,
            ..Default::default()
        };
        let mut depth_only = FrameUpdater::new(0u32, false);
        let outcome = depth_only.tick(&mut device, &mut factory, &FrameParams::default());
        assert!(!outcome.video_replaced);
        assert!(depth_only.video_texture().is_none());

        let mut overlay = FrameUpdater::new(0u32, true);
        assert!(overlay.video_texture().is_none());
        let outcome = overlay.tick(&mut device, &mut factory, &FrameParams::default());
        assert!(outcome.video_replaced);
        assert_eq!(overlay.video_texture().map(|t| **t), Some(1));
    }
}
