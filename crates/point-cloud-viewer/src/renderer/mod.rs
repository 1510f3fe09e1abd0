//! The rendering orchestrator. Owns the GPU context, the depth target, the
//! pipeline for the active view mode and the egui renderer.

pub mod context;
pub mod pipelines;
pub mod targets;
pub mod texture;

use self::{
    context::GfxContext,
    pipelines::{
        overlay::OverlayPipeline,
        point_cloud::{load_shader_source, PointCloudPipeline, PointUniforms},
    },
    targets::{DepthTarget, DEPTH_FORMAT},
    texture::{GpuTexture, WgpuTextureFactory},
};
use crate::{
    camera::Camera, config::ViewMode, error::InitError, frame::FrameUpdater,
    lattice::ParticleLattice, params::FrameParams,
};
use std::{path::Path, sync::Arc};
use winit::window::Window;

/// Pipeline for the active view mode.
pub enum Scene {
    PointCloud(PointCloudPipeline),
    Overlay(OverlayPipeline),
}

pub struct Renderer {
    pub gfx: GfxContext,
    pub depth_target: DepthTarget,
    pub scene: Scene,
    pub egui_renderer: egui_wgpu::Renderer,
}

impl Renderer {
    /// `lattice_size` is the depth sensor resolution; ignored in overlay mode.
    pub async fn new(
        window: Arc<Window>,
        mode: ViewMode,
        lattice_size: (u32, u32),
        shader_path: Option<&Path>,
    ) -> Result<Self, InitError> {
        let gfx = GfxContext::new(window).await?;
        let depth_target = DepthTarget::new(&gfx.device, gfx.size);

        let scene = match mode {
            ViewMode::PointCloud => {
                let shader_src = load_shader_source(shader_path)?;
                let lattice = ParticleLattice::build(lattice_size.0, lattice_size.1)?;
                Scene::PointCloud(
                    PointCloudPipeline::new(
                        &gfx.device,
                        gfx.config.format,
                        DEPTH_FORMAT,
                        &shader_src,
                        &lattice,
                    )
                    .await?,
                )
            }
            ViewMode::Overlay => {
                Scene::Overlay(OverlayPipeline::new(&gfx.device, gfx.config.format, DEPTH_FORMAT))
            }
        };

        let egui_renderer = egui_wgpu::Renderer::new(&gfx.device, gfx.config.format, None, 1);

        Ok(Self {
            gfx,
            depth_target,
            scene,
            egui_renderer,
        })
    }

    pub fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.gfx.resize(new_size);
            self.depth_target.resize(&self.gfx.device, new_size);
        }
    }

    pub fn texture_factory(&self) -> WgpuTextureFactory<'_> {
        WgpuTextureFactory {
            device: &self.gfx.device,
            queue: &self.gfx.queue,
        }
    }

    pub fn viewport_size(&self) -> [f32; 2] {
        [self.gfx.size.width as f32, self.gfx.size.height as f32]
    }

    /// Clears the frame and draws the active scene.
    pub fn render(
        &mut self,
        swap_view: &wgpu::TextureView,
        frames: &FrameUpdater<GpuTexture>,
        camera: &Camera,
        params: &FrameParams,
    ) {
        let viewport_size = self.viewport_size();
        let window = (self.gfx.config.width, self.gfx.config.height);
        let (device, queue) = (&self.gfx.device, &self.gfx.queue);

        match &mut self.scene {
            Scene::PointCloud(points) => {
                let uniforms = PointUniforms::new(camera, params, viewport_size);
                points.prepare(device, queue, frames.depth_texture(), &uniforms);
            }
            Scene::Overlay(overlay) => overlay.prepare(
                device,
                queue,
                window,
                frames.received_depth_texture(),
                frames.video_texture(),
            ),
        }

        let mut encoder = self
            .gfx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Frame Encoder"),
            });

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Scene Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: swap_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_target.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            match &self.scene {
                Scene::PointCloud(points) => points.draw(&mut pass),
                Scene::Overlay(overlay) => overlay.draw(&mut pass),
            }
        }

        self.gfx.queue.submit(std::iter::once(encoder.finish()));
    }

    /// Draws the egui overlay on top of the scene already in `swap_view`.
    pub fn render_ui(
        &mut self,
        swap_view: &wgpu::TextureView,
        ctx: &egui::Context,
        output: egui::FullOutput,
    ) {
        let pixels_per_point = ctx.pixels_per_point();
        let shapes = ctx.tessellate(output.shapes, pixels_per_point);
        let screen = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [self.gfx.config.width, self.gfx.config.height],
            pixels_per_point,
        };

        for (id, delta) in &output.textures_delta.set {
            self.egui_renderer
                .update_texture(&self.gfx.device, &self.gfx.queue, *id, delta);
        }

        let mut encoder = self
            .gfx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("UI Encoder"),
            });
        let user_cmds = self.egui_renderer.update_buffers(
            &self.gfx.device,
            &self.gfx.queue,
            &mut encoder,
            &shapes,
            &screen,
        );

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("UI Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: swap_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            self.egui_renderer.render(&mut pass, &shapes, &screen);
        }

        for id in &output.textures_delta.free {
            self.egui_renderer.free_texture(id);
        }

        self.gfx
            .queue
            .submit(user_cmds.into_iter().chain(std::iter::once(encoder.finish())));
    }
}
