//! Raw frame buffers delivered by a depth camera.

use crate::DeviceError;
use rayon::prelude::*;

/// Native depth/video resolution of a Kinect-class sensor.
pub const KINECT_WIDTH: u32 = 640;
pub const KINECT_HEIGHT: u32 = 480;

/// Largest raw depth reading; also the sentinel for "no measurement".
pub const DEPTH_NO_READING: u16 = 2047;

/// One depth frame: row-major 11-bit readings, smaller is nearer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepthFrame {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u16>,
}

impl DepthFrame {
    /// Wraps a raw buffer, checking it holds exactly `width * height` samples.
    pub fn new(width: u32, height: u32, data: Vec<u16>) -> Result<Self, DeviceError> {
        let expected = width as usize * height as usize;
        if data.len() != expected {
            return Err(DeviceError::FrameSize {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Raw reading at pixel `(x, y)`.
    #[inline]
    pub fn get(&self, x: u32, y: u32) -> Option<u16> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.data.get((y * self.width + x) as usize).copied()
    }

    /// Maps readings into [0, 1] with near = bright. Pixels without a
    /// measurement become 0.
    pub fn normalized(&self) -> Vec<f32> {
        const SCALE: f32 = 1.0 / DEPTH_NO_READING as f32;
        self.data
            .par_iter()
            .map(|&raw| {
                if raw >= DEPTH_NO_READING {
                    0.0
                } else {
                    1.0 - raw as f32 * SCALE
                }
            })
            .collect()
    }
}

/// One colour frame: row-major packed RGB8.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoFrame {
    pub width: u32,
    pub height: u32,
    pub rgb: Vec<u8>,
}

impl VideoFrame {
    pub fn new(width: u32, height: u32, rgb: Vec<u8>) -> Result<Self, DeviceError> {
        let expected = width as usize * height as usize * 3;
        if rgb.len() != expected {
            return Err(DeviceError::FrameSize {
                expected,
                actual: rgb.len(),
            });
        }
        Ok(Self { width, height, rgb })
    }

    /// Expands to RGBA8 with opaque alpha, the layout GPU textures expect.
    pub fn to_rgba(&self) -> Vec<u8> {
        self.rgb
            .par_chunks_exact(3)
            .flat_map_iter(|px| [px[0], px[1], px[2], u8::MAX])
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn depth_frame_rejects_wrong_length() {
        let err = DepthFrame::new(4, 4, vec![0; 15]).unwrap_err();
        assert!(matches!(
            err,
            DeviceError::FrameSize {
                expected: 16,
                actual: 15
            }
        ));
    }

    #[test]
    fn normalized_maps_near_to_one_and_missing_to_zero() {
        let frame = DepthFrame::new(3, 1, vec![0, DEPTH_NO_READING, 1000]).unwrap();
        let n = frame.normalized();
        assert_eq!(n[0], 1.0);
        assert_eq!(n[1], 0.0);
        assert!(n[2] > 0.0 && n[2] < 1.0);
    }

    #[test]
    fn get_is_row_major() {
        let frame = DepthFrame::new(2, 2, vec![1, 2, 3, 4]).unwrap();
        assert_eq!(frame.get(1, 0), Some(2));
        assert_eq!(frame.get(0, 1), Some(3));
        assert_eq!(frame.get(2, 0), None);
    }

    #[test]
    fn video_to_rgba_appends_alpha() {
        let frame = VideoFrame::new(2, 1, vec![1, 2, 3, 4, 5, 6]).unwrap();
        assert_eq!(frame.to_rgba(), vec![1, 2, 3, 255, 4, 5, 6, 255]);
    }
}
