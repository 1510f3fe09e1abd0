use crate::{
    camera::{scene_model, Camera},
    error::InitError,
    lattice::{Particle, ParticleLattice},
    params::FrameParams,
    renderer::texture::GpuTexture,
};
use std::{borrow::Cow, path::Path, sync::Arc};
use wgpu::util::DeviceExt;

/// How far (scene units) a full-scale depth reading pushes a particle toward the camera.
pub const DEPTH_EXTRUSION: f32 = 600.0;

const BUILTIN_SHADER: &str = include_str!("../../../shaders/point_cloud.wgsl");

/// Per-frame uniforms. Must match `PointUniforms` in `point_cloud.wgsl`.
#[repr(C)]
#[derive(Clone, Copy, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct PointUniforms {
    pub view_proj: [[f32; 4]; 4],
    pub model: [[f32; 4]; 4],
    /// Size of the viewport in physical pixels.
    pub viewport_size: [f32; 2],
    pub point_size_px: f32,
    pub depth_extrusion: f32,
}

impl PointUniforms {
    pub fn new(camera: &Camera, params: &FrameParams, viewport_size: [f32; 2]) -> Self {
        Self {
            view_proj: camera.view_proj().to_cols_array_2d(),
            model: scene_model(params.scene_rotation()).to_cols_array_2d(),
            viewport_size,
            point_size_px: params.point_size(),
            depth_extrusion: DEPTH_EXTRUSION,
        }
    }
}

/// Reads the point cloud shader from `path`, or returns the built-in one.
pub fn load_shader_source(path: Option<&Path>) -> Result<Cow<'static, str>, InitError> {
    match path {
        Some(path) => {
            let src = std::fs::read_to_string(path).map_err(|source| InitError::ShaderIo {
                path: path.to_path_buf(),
                source,
            })?;
            log::info!("Loaded point cloud shader from {}", path.display());
            Ok(Cow::Owned(src))
        }
        None => Ok(Cow::Borrowed(BUILTIN_SHADER)),
    }
}

pub struct PointCloudPipeline {
    pipeline: wgpu::RenderPipeline,
    layout: wgpu::BindGroupLayout,
    ubo: wgpu::Buffer,
    quad_vb: wgpu::Buffer,
    lattice_vb: wgpu::Buffer,
    particle_count: u32,
    /// Bind group for the depth texture it was built from.
    bound: Option<(Arc<GpuTexture>, wgpu::BindGroup)>,
}

impl PointCloudPipeline {
    /// Validates the shader against the pipeline, then uploads the lattice.
    /// A shader that fails to compile, or lacks the entry points and
    /// bindings below, aborts before any lattice buffer is created.
    pub async fn new(
        device: &wgpu::Device,
        color_fmt: wgpu::TextureFormat,
        depth_fmt: wgpu::TextureFormat,
        shader_src: &str,
        lattice: &ParticleLattice,
    ) -> Result<Self, InitError> {
        device.push_error_scope(wgpu::ErrorFilter::Validation);
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("shaders/point_cloud.wgsl"),
            source: wgpu::ShaderSource::Wgsl(shader_src.into()),
        });

        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Point Cloud Layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: wgpu::BufferSize::new(
                            std::mem::size_of::<PointUniforms>() as u64,
                        ),
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: false },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
            ],
        });

        let vbuf_layouts = [
            wgpu::VertexBufferLayout {
                array_stride: std::mem::size_of::<[f32; 2]>() as u64,
                step_mode: wgpu::VertexStepMode::Vertex,
                attributes: &[wgpu::VertexAttribute {
                    shader_location: 0,
                    offset: 0,
                    format: wgpu::VertexFormat::Float32x2,
                }],
            },
            wgpu::VertexBufferLayout {
                array_stride: std::mem::size_of::<Particle>() as u64,
                step_mode: wgpu::VertexStepMode::Instance,
                attributes: &[
                    // Position (vec3)
                    wgpu::VertexAttribute {
                        shader_location: 1,
                        offset: 0,
                        format: wgpu::VertexFormat::Float32x3,
                    },
                    // Texture coordinate (vec2)
                    wgpu::VertexAttribute {
                        shader_location: 2,
                        offset: 12,
                        format: wgpu::VertexFormat::Float32x2,
                    },
                ],
            },
        ];

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Point Cloud PipelineLayout"),
            bind_group_layouts: &[&layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Point Cloud Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: "vs_main",
                buffers: &vbuf_layouts,
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: depth_fmt,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::LessEqual,
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

        if let Some(err) = device.pop_error_scope().await {
            return Err(InitError::Shader(err.to_string()));
        }

        let ubo = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Point Cloud UBO"),
            size: std::mem::size_of::<PointUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        // Point sprite corners
        let quad_corners: [[f32; 2]; 6] = [
            [-1.0, -1.0],
            [1.0, -1.0],
            [1.0, 1.0],
            [-1.0, -1.0],
            [1.0, 1.0],
            [-1.0, 1.0],
        ];
        let quad_vb = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Point Sprite Quad VB"),
            contents: bytemuck::cast_slice(&quad_corners),
            usage: wgpu::BufferUsages::VERTEX,
        });

        // The lattice never changes after upload.
        let lattice_vb = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Particle Lattice VB"),
            contents: lattice.as_bytes(),
            usage: wgpu::BufferUsages::VERTEX,
        });

        log::info!(
            "Point cloud ready: {}x{} lattice ({} particles)",
            lattice.width(),
            lattice.height(),
            lattice.len()
        );

        Ok(Self {
            pipeline,
            layout,
            ubo,
            quad_vb,
            lattice_vb,
            particle_count: lattice.len() as u32,
            bound: None,
        })
    }

    /// Writes uniforms and rebinds if the depth texture was replaced.
    pub fn prepare(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        depth: &Arc<GpuTexture>,
        uniforms: &PointUniforms,
    ) {
        queue.write_buffer(&self.ubo, 0, bytemuck::bytes_of(uniforms));

        let stale = self
            .bound
            .as_ref()
            .map_or(true, |(tex, _)| !Arc::ptr_eq(tex, depth));
        if stale {
            let bind = device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("Point Cloud BindGroup"),
                layout: &self.layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: self.ubo.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: wgpu::BindingResource::TextureView(&depth.view),
                    },
                ],
            });
            self.bound = Some((Arc::clone(depth), bind));
        }
    }

    /// One instanced draw over the whole lattice.
    pub fn draw<'a>(&'a self, rpass: &mut wgpu::RenderPass<'a>) {
        let Some((_, bind)) = &self.bound else {
            return;
        };
        rpass.set_pipeline(&self.pipeline);
        rpass.set_bind_group(0, bind, &[]);
        rpass.set_vertex_buffer(0, self.quad_vb.slice(..));
        rpass.set_vertex_buffer(1, self.lattice_vb.slice(..));
        rpass.draw(0..6, 0..self.particle_count);
    }
}
