//! Flat view: depth at native resolution from the left edge, colour right
//! of it. Streams are cropped, never scaled, when the window is smaller.

use crate::renderer::texture::GpuTexture;
use depthcam::KINECT_WIDTH;
use std::sync::Arc;
use wgpu::util::DeviceExt;

/// Full-screen triangle vertices
const FS_TRI: [[f32; 2]; 3] = [
    [-1.0, -1.0],
    [3.0, -1.0],
    [-1.0, 3.0],
];

const CHANNEL_DEPTH: u32 = 0;
const CHANNEL_COLOR: u32 = 1;

/// Left edge of the colour stream in window pixels.
const VIDEO_X: u32 = KINECT_WIDTH;

pub const OVERLAY_WGSL: &str = r#"
struct QuadUniforms {
    channel: u32,
    _pad: u32,
    uv_scale: vec2<f32>,
};

@group(0) @binding(0) var<uniform> U: QuadUniforms;
@group(0) @binding(1) var tSrc: texture_2d<f32>;

struct VSOut {
    @builtin(position) clip: vec4<f32>,
    @location(0)         uv: vec2<f32>,
}

@vertex
fn vs_main(@location(0) pos: vec2<f32>) -> VSOut {
    var out: VSOut;
    out.clip = vec4<f32>(pos, 0.0, 1.0);
    out.uv = vec2<f32>(0.5 * (pos.x + 1.0), 0.5 * (-pos.y + 1.0));
    return out;
}

@fragment
fn fs_main(in: VSOut) -> @location(0) vec4<f32> {
    let dims = vec2<i32>(textureDimensions(tSrc));
    let uv = in.uv * U.uv_scale;
    let px = clamp(vec2<i32>(uv * vec2<f32>(dims)), vec2<i32>(0), dims - vec2<i32>(1));
    let texel = textureLoad(tSrc, px, 0);
    if (U.channel == 0u) {
        return vec4<f32>(vec3<f32>(texel.r), 1.0);
    }
    return vec4<f32>(texel.rgb, 1.0);
}
"#;

#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable, Default)]
struct QuadUniforms {
    channel: u32,
    _pad: u32,
    uv_scale: [f32; 2],
}

/// Window region a stream occupies, in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Viewport {
    x: f32,
    width: f32,
    height: f32,
    /// Fraction of the texture visible along each axis.
    uv_scale: [f32; 2],
}

/// Places a `texture`-sized stream at `x`, cropped to `window`.
/// `None` when nothing of it is visible.
fn native_viewport(x: u32, texture: wgpu::Extent3d, window: (u32, u32)) -> Option<Viewport> {
    let width = texture.width.min(window.0.saturating_sub(x));
    let height = texture.height.min(window.1);
    if width == 0 || height == 0 {
        return None;
    }
    Some(Viewport {
        x: x as f32,
        width: width as f32,
        height: height as f32,
        uv_scale: [
            width as f32 / texture.width as f32,
            height as f32 / texture.height as f32,
        ],
    })
}

/// One stream's uniforms, bind group and placement.
struct QuadSlot {
    channel: u32,
    x: u32,
    ubo: wgpu::Buffer,
    bound: Option<(Arc<GpuTexture>, wgpu::BindGroup)>,
    viewport: Option<Viewport>,
}

impl QuadSlot {
    fn new(device: &wgpu::Device, label: &str, channel: u32, x: u32) -> Self {
        let ubo = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytemuck::bytes_of(&QuadUniforms {
                channel,
                ..Default::default()
            }),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        Self {
            channel,
            x,
            ubo,
            bound: None,
            viewport: None,
        }
    }

    fn update(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        layout: &wgpu::BindGroupLayout,
        tex: Option<&Arc<GpuTexture>>,
        window: (u32, u32),
    ) {
        let Some(tex) = tex else {
            self.bound = None;
            self.viewport = None;
            return;
        };

        let viewport = native_viewport(self.x, tex.size, window);
        if let Some(vp) = viewport {
            if self.viewport.map(|cur| cur.uv_scale) != Some(vp.uv_scale) {
                let uniforms = QuadUniforms {
                    channel: self.channel,
                    _pad: 0,
                    uv_scale: vp.uv_scale,
                };
                queue.write_buffer(&self.ubo, 0, bytemuck::bytes_of(&uniforms));
            }
        }
        self.viewport = viewport;
        self.bind(device, layout, tex);
    }

    fn bind(
        &mut self,
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        tex: &Arc<GpuTexture>,
    ) {
        if matches!(&self.bound, Some((cur, _)) if Arc::ptr_eq(cur, tex)) {
            return;
        }
        let bind = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Overlay BindGroup"),
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: self.ubo.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&tex.view),
                },
            ],
        });
        self.bound = Some((Arc::clone(tex), bind));
    }
}

pub struct OverlayPipeline {
    pipeline: wgpu::RenderPipeline,
    layout: wgpu::BindGroupLayout,
    tri_vb: wgpu::Buffer,
    depth: QuadSlot,
    video: QuadSlot,
}

impl OverlayPipeline {
    pub fn new(
        device: &wgpu::Device,
        color_fmt: wgpu::TextureFormat,
        depth_fmt: wgpu::TextureFormat,
    ) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Overlay Shader"),
            source: wgpu::ShaderSource::Wgsl(OVERLAY_WGSL.into()),
        });

        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Overlay Layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: wgpu::BufferSize::new(
                            std::mem::size_of::<QuadUniforms>() as u64,
                        ),
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: false },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
            ],
        });

        let tri_vb = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Overlay FS Triangle"),
            contents: bytemuck::cast_slice(&FS_TRI),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Overlay PipelineLayout"),
            bind_group_layouts: &[&layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Overlay Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: "vs_main",
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<[f32; 2]>() as u64,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &[wgpu::VertexAttribute {
                        shader_location: 0,
                        offset: 0,
                        format: wgpu::VertexFormat::Float32x2,
                    }],
                }],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            primitive: wgpu::PrimitiveState::default(),
            // The scene pass always carries a depth attachment.
            depth_stencil: Some(wgpu::DepthStencilState {
                format: depth_fmt,
                depth_write_enabled: false,
                depth_compare: wgpu::CompareFunction::Always,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: "fs_main",
                targets: &[Some(wgpu::ColorTargetState {
                    format: color_fmt,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
        });

        Self {
            depth: QuadSlot::new(device, "Overlay Depth UBO", CHANNEL_DEPTH, 0),
            video: QuadSlot::new(device, "Overlay Video UBO", CHANNEL_COLOR, VIDEO_X),
            pipeline,
            layout,
            tri_vb,
        }
    }

    /// Binds the current textures. Each half stays empty until its stream
    /// delivers a first frame.
    pub fn prepare(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        window: (u32, u32),
        depth: Option<&Arc<GpuTexture>>,
        video: Option<&Arc<GpuTexture>>,
    ) {
        self.depth.update(device, queue, &self.layout, depth, window);
        self.video.update(device, queue, &self.layout, video, window);
    }

    pub fn draw<'a>(&'a self, rpass: &mut wgpu::RenderPass<'a>) {
        rpass.set_pipeline(&self.pipeline);
        rpass.set_vertex_buffer(0, self.tri_vb.slice(..));

        for slot in [&self.depth, &self.video] {
            if let (Some((_, bind)), Some(vp)) = (&slot.bound, slot.viewport) {
                rpass.set_viewport(vp.x, 0.0, vp.width, vp.height, 0.0, 1.0);
                rpass.set_bind_group(0, bind, &[]);
                rpass.draw(0..3, 0..1);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::{context::headless_device, targets::DEPTH_FORMAT};
    use depthcam::{VideoFrame, KINECT_HEIGHT};

    fn kinect_extent() -> wgpu::Extent3d {
        wgpu::Extent3d {
            width: KINECT_WIDTH,
            height: KINECT_HEIGHT,
            depth_or_array_layers: 1,
        }
    }

    #[test]
    fn uniforms_match_wgsl_layout() {
        assert_eq!(std::mem::size_of::<QuadUniforms>(), 16);
    }

    #[test]
    fn streams_sit_side_by_side_at_native_size() {
        let window = (1280, 480);
        let depth = native_viewport(0, kinect_extent(), window).unwrap();
        let video = native_viewport(VIDEO_X, kinect_extent(), window).unwrap();

        assert_eq!((depth.x, depth.width, depth.height), (0.0, 640.0, 480.0));
        assert_eq!((video.x, video.width, video.height), (640.0, 640.0, 480.0));
        assert_eq!(depth.uv_scale, [1.0, 1.0]);
        assert_eq!(video.uv_scale, [1.0, 1.0]);
    }

    #[test]
    fn small_window_crops_instead_of_scaling() {
        let vp = native_viewport(VIDEO_X, kinect_extent(), (800, 240)).unwrap();
        assert_eq!((vp.x, vp.width, vp.height), (640.0, 160.0, 240.0));
        assert_eq!(vp.uv_scale, [0.25, 0.5]);
    }

    #[test]
    fn stream_outside_the_window_is_skipped() {
        assert!(native_viewport(VIDEO_X, kinect_extent(), (640, 480)).is_none());
        assert!(native_viewport(VIDEO_X, kinect_extent(), (600, 480)).is_none());
        assert!(native_viewport(0, kinect_extent(), (600, 0)).is_none());
    }

    #[test]
    fn slots_bind_only_delivered_streams() {
        let Some((device, queue)) = pollster::block_on(headless_device()) else {
            return;
        };
        let mut overlay =
            OverlayPipeline::new(&device, wgpu::TextureFormat::Rgba8UnormSrgb, DEPTH_FORMAT);
        let window = (1280, 480);

        overlay.prepare(&device, &queue, window, None, None);
        assert!(overlay.depth.bound.is_none());
        assert!(overlay.video.bound.is_none());

        let depth = Arc::new(GpuTexture::blank_depth(&device, KINECT_WIDTH, KINECT_HEIGHT));
        overlay.prepare(&device, &queue, window, Some(&depth), None);
        assert!(matches!(&overlay.depth.bound, Some((t, _)) if Arc::ptr_eq(t, &depth)));
        assert!(overlay.video.bound.is_none());
        assert_eq!(overlay.depth.viewport.map(|vp| vp.x), Some(0.0));

        let frame = VideoFrame::new(4, 2, vec![200; 4 * 2 * 3]).unwrap();
        let video = Arc::new(GpuTexture::from_video(&device, &queue, &frame));
        overlay.prepare(&device, &queue, window, Some(&depth), Some(&video));
        assert!(matches!(&overlay.video.bound, Some((t, _)) if Arc::ptr_eq(t, &video)));
        assert_eq!(overlay.video.viewport.map(|vp| vp.width), Some(4.0));
    }

    #[test]
    fn replaced_texture_is_rebound() {
        let Some((device, queue)) = pollster::block_on(headless_device()) else {
            return;
        };
        let mut overlay =
            OverlayPipeline::new(&device, wgpu::TextureFormat::Rgba8UnormSrgb, DEPTH_FORMAT);
        let window = (1280, 480);

        let first = Arc::new(GpuTexture::blank_depth(&device, 8, 8));
        overlay.prepare(&device, &queue, window, Some(&first), None);
        overlay.prepare(&device, &queue, window, Some(&first), None);
        assert!(matches!(&overlay.depth.bound, Some((t, _)) if Arc::ptr_eq(t, &first)));

        let second = Arc::new(GpuTexture::blank_depth(&device, 8, 8));
        overlay.prepare(&device, &queue, window, Some(&second), None);
        assert!(matches!(&overlay.depth.bound, Some((t, _)) if Arc::ptr_eq(t, &second)));

        overlay.prepare(&device, &queue, window, None, None);
        assert!(overlay.depth.bound.is_none());
        assert!(overlay.depth.viewport.is_none());
    }
}
