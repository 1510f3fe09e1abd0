//! Entry point for the Kinect point cloud viewer.

use anyhow::Result;
use clap::Parser;
use point_cloud_viewer::{app::App, config::Config};
use std::sync::Arc;
use winit::{
    event::{Event, WindowEvent},
    event_loop::{ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::WindowBuilder,
};

fn main() -> Result<()> {
    // Initialize logging; default to "info" if RUST_LOG is unset.
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("info")
    ).init();

    let config = Config::parse();
    log::info!("Starting with {:?}", config);

    let (width, height) = config.window_size();
    let event_loop = EventLoop::new()?;
    let window = Arc::new(
        WindowBuilder::new()
            .with_title(config.window_title())
            .with_inner_size(winit::dpi::LogicalSize::new(width, height))
            .build(&event_loop)?,
    );

    let device = depthcam::open_default(config.frame_rate);

    // Setup runs once (async → sync); update and draw then alternate per frame.
    let mut app = pollster::block_on(App::new(window.clone(), &config, device))?;

    event_loop.run(move |event, elwt| {
        elwt.set_control_flow(ControlFlow::Poll);

        match event {
            Event::WindowEvent { window_id, event } if window_id == window.id() => {
                if !app.handle_event(&window, &event) {
                    match event {
                        WindowEvent::CloseRequested => elwt.exit(),
                        WindowEvent::KeyboardInput { event, .. } => {
                            if event.physical_key == PhysicalKey::Code(KeyCode::Escape) {
                                elwt.exit();
                            }
                        }
                        WindowEvent::RedrawRequested => {
                            app.update();
                            match app.render(&window) {
                                Ok(_) => {}
                                Err(wgpu::SurfaceError::Lost) => {
                                    app.resize(app.renderer.gfx.size);
                                }
                                Err(wgpu::SurfaceError::OutOfMemory) => {
                                    log::error!("WGPU out of memory – exiting.");
                                    elwt.exit();
                                }
                                Err(e) => log::error!("Render error: {:?}", e),
                            }
                        }
                        _ => {}
                    }
                }
            }
            Event::AboutToWait => {
                window.request_redraw();
            }
            _ => {}
        }
    })?;

    Ok(())
}
