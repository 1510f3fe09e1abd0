use crate::{
    camera::Camera,
    config::{Config, ViewMode},
    frame::FrameUpdater,
    input::ParamsController,
    params::FrameParams,
    renderer::{texture::GpuTexture, Renderer},
    ui::{self, FrameStats},
};
use anyhow::Result;
use depthcam::{DepthDevice, KINECT_HEIGHT, KINECT_WIDTH};
use std::sync::Arc;
use winit::{
    event::{ElementState, WindowEvent},
    keyboard::{KeyCode, PhysicalKey},
    window::Window,
};

pub struct App {
    pub renderer: Renderer,
    pub camera: Camera,
    pub mode: ViewMode,
    pub device: Box<dyn DepthDevice>,
    pub frames: FrameUpdater<GpuTexture>,
    pub params: FrameParams,
    pub controller: ParamsController,
    pub stats: FrameStats,
    pub show_panel: bool,
    pub egui_ctx: egui::Context,
    pub egui_state: egui_winit::State,
}

impl App {
    pub async fn new(
        window: Arc<Window>,
        config: &Config,
        device: Box<dyn DepthDevice>,
    ) -> Result<Self> {
        let renderer = Renderer::new(
            window.clone(),
            config.mode,
            (KINECT_WIDTH, KINECT_HEIGHT),
            config.shader.as_deref(),
        )
        .await?;
        let size = renderer.gfx.size;

        let params = FrameParams::default();
        let camera = Camera::new(
            size.width as f32 / size.height.max(1) as f32,
            params.camera_distance(),
        );

        // Nothing is drawn from the sensor until its first frame arrives.
        let blank = GpuTexture::blank_depth(&renderer.gfx.device, KINECT_WIDTH, KINECT_HEIGHT);
        let frames = FrameUpdater::new(blank, config.mode == ViewMode::Overlay);

        let egui_ctx = egui::Context::default();
        let egui_state = egui_winit::State::new(
            egui_ctx.clone(),
            egui_ctx.viewport_id(),
            &*window,
            None,
            None,
        );

        log::info!("Viewer started in {:?} mode", config.mode);

        Ok(Self {
            renderer,
            camera,
            mode: config.mode,
            device,
            frames,
            params,
            controller: ParamsController::new(),
            stats: FrameStats::default(),
            show_panel: !config.no_panel,
            egui_ctx,
            egui_state,
        })
    }

    pub fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.renderer.resize(new_size);
            self.camera.set_viewport(new_size.width, new_size.height);
        }
    }

    /// Returns true when the event was consumed by the UI or a binding.
    pub fn handle_event(&mut self, window: &Window, event: &WindowEvent) -> bool {
        if let WindowEvent::Resized(physical_size) = event {
            self.resize(*physical_size);
        }

        let response = self.egui_state.on_window_event(window, event);
        if response.consumed {
            return true;
        }

        if let WindowEvent::KeyboardInput { event: key, .. } = event {
            if key.state == ElementState::Pressed
                && key.physical_key == PhysicalKey::Code(KeyCode::F1)
            {
                self.show_panel = !self.show_panel;
                return true;
            }
        }

        if self.mode == ViewMode::PointCloud {
            if let Some(next) = self.controller.handle_event(event, &self.params) {
                self.params = next;
                return true;
            }
        }

        false
    }

    /// Polls the device and places the camera for this frame.
    pub fn update(&mut self) {
        let mut factory = self.renderer.texture_factory();
        let outcome = self.frames.tick(&mut self.device, &mut factory, &self.params);

        if outcome.depth_replaced {
            self.stats.depth_frames += 1;
        }
        if outcome.video_replaced {
            self.stats.video_frames += 1;
        }
        if outcome.tilt_command.is_some() {
            self.stats.tilt_commands += 1;
        }
        self.stats.device_tilt = self.device.tilt();

        self.camera.set_distance(self.params.camera_distance());
    }

    pub fn render(&mut self, window: &Window) -> Result<(), wgpu::SurfaceError> {
        let frame = self.renderer.gfx.surface.get_current_texture()?;
        let swap_view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        self.renderer
            .render(&swap_view, &self.frames, &self.camera, &self.params);

        let egui_input = self.egui_state.take_egui_input(window);
        self.egui_ctx.begin_frame(egui_input);

        if self.show_panel {
            // The panel yields the snapshot the next frame will use.
            self.params = ui::draw_params_panel(&self.egui_ctx, &self.params, &self.stats);
        }

        let egui_output = self.egui_ctx.end_frame();
        self.egui_state
            .handle_platform_output(window, egui_output.platform_output.clone());
        self.renderer.render_ui(&swap_view, &self.egui_ctx, egui_output);

        frame.present();

        Ok(())
    }
}
