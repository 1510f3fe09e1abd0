//! GPU textures built from device frames.

use crate::frame::TextureFactory;
use depthcam::{DepthFrame, VideoFrame};

/// Normalized depth, one float per pixel. Not filterable; shaders use `textureLoad`.
pub const DEPTH_TEXTURE_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::R32Float;
pub const VIDEO_TEXTURE_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;

/// An immutable sampled texture. Replaced wholesale when a new frame arrives.
#[derive(Debug)]
pub struct GpuTexture {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub size: wgpu::Extent3d,
}

impl GpuTexture {
    fn create(
        device: &wgpu::Device,
        label: &str,
        width: u32,
        height: u32,
        format: wgpu::TextureFormat,
    ) -> Self {
        let size = wgpu::Extent3d {
            width: width.max(1),
            height: height.max(1),
            depth_or_array_layers: 1,
        };
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self {
            texture,
            view,
            size,
        }
    }

    fn upload(&self, queue: &wgpu::Queue, bytes: &[u8], bytes_per_pixel: u32) {
        queue.write_texture(
            wgpu::ImageCopyTexture {
                texture: &self.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            bytes,
            wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(self.size.width * bytes_per_pixel),
                rows_per_image: Some(self.size.height),
            },
            self.size,
        );
    }

    /// All-zero depth texture ("no reading" everywhere). wgpu zero-initializes.
    pub fn blank_depth(device: &wgpu::Device, width: u32, height: u32) -> Self {
        Self::create(device, "Blank Depth Texture", width, height, DEPTH_TEXTURE_FORMAT)
    }

    pub fn from_depth(device: &wgpu::Device, queue: &wgpu::Queue, frame: &DepthFrame) -> Self {
        if frame.data.is_empty() {
            return Self::blank_depth(device, 1, 1);
        }
        let tex = Self::create(
            device,
            "Depth Texture",
            frame.width,
            frame.height,
            DEPTH_TEXTURE_FORMAT,
        );
        let normalized = frame.normalized();
        tex.upload(queue, bytemuck::cast_slice(&normalized), 4);
        tex
    }

    pub fn from_video(device: &wgpu::Device, queue: &wgpu::Queue, frame: &VideoFrame) -> Self {
        let tex = Self::create(
            device,
            "Video Texture",
            frame.width,
            frame.height,
            VIDEO_TEXTURE_FORMAT,
        );
        if !frame.rgb.is_empty() {
            tex.upload(queue, &frame.to_rgba(), 4);
        }
        tex
    }
}

/// Uploads frames through the renderer's device and queue.
pub struct WgpuTextureFactory<'a> {
    pub device: &'a wgpu::Device,
    pub queue: &'a wgpu::Queue,
}

impl TextureFactory for WgpuTextureFactory<'_> {
    type Texture = GpuTexture;

    fn depth_texture(&mut self, frame: &DepthFrame) -> GpuTexture {
        GpuTexture::from_depth(self.device, self.queue, frame)
    }

    fn video_texture(&mut self, frame: &VideoFrame) -> GpuTexture {
        GpuTexture::from_video(self.device, self.queue, frame)
    }
}
