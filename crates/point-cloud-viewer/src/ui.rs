use crate::params::{
    FrameParams, CAMERA_DISTANCE_RANGE, CAMERA_DISTANCE_STEP, POINT_SIZE_RANGE, POINT_SIZE_STEP,
    TILT_RANGE,
};
use glam::{EulerRot, Quat};

/// Running counters shown in the panel.
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameStats {
    pub depth_frames: u64,
    pub video_frames: u64,
    pub tilt_commands: u64,
    pub device_tilt: f32,
}

/// Parameter panel. Returns the snapshot to use from the next frame on.
pub fn draw_params_panel(
    ctx: &egui::Context,
    params: &FrameParams,
    stats: &FrameStats,
) -> FrameParams {
    let mut next = *params;

    egui::Window::new("KinectPointCloud")
        .default_pos([10.0, 10.0])
        .default_width(200.0)
        .resizable(false)
        .show(ctx, |ui| {
            let (yaw, pitch, roll) = params.scene_rotation().to_euler(EulerRot::YXZ);
            let (mut yaw_deg, mut pitch_deg, mut roll_deg) =
                (yaw.to_degrees(), pitch.to_degrees(), roll.to_degrees());

            ui.label("Scene Rotation");
            let mut rotated = false;
            ui.horizontal(|ui| {
                rotated |= ui
                    .add(egui::DragValue::new(&mut yaw_deg).prefix("yaw ").suffix("°"))
                    .changed();
                rotated |= ui
                    .add(egui::DragValue::new(&mut pitch_deg).prefix("pitch ").suffix("°"))
                    .changed();
                rotated |= ui
                    .add(egui::DragValue::new(&mut roll_deg).prefix("roll ").suffix("°"))
                    .changed();
            });
            if rotated {
                next = next.with_scene_rotation(Quat::from_euler(
                    EulerRot::YXZ,
                    yaw_deg.to_radians(),
                    pitch_deg.to_radians(),
                    roll_deg.to_radians(),
                ));
            }
            if ui.button("Reset rotation").clicked() {
                next = next.with_scene_rotation(Quat::IDENTITY);
            }

            ui.separator();

            let mut distance = params.camera_distance();
            if ui
                .add(
                    egui::Slider::new(&mut distance, CAMERA_DISTANCE_RANGE)
                        .step_by(CAMERA_DISTANCE_STEP as f64)
                        .text("Cam Distance"),
                )
                .changed()
            {
                next = next.with_camera_distance(distance);
            }

            let mut tilt = params.tilt_degrees();
            if ui
                .add(
                    egui::Slider::new(&mut tilt, TILT_RANGE)
                        .step_by(1.0)
                        .text("Kinect Tilt"),
                )
                .changed()
            {
                next = next.with_tilt_degrees(tilt);
            }

            let mut point_size = params.point_size();
            if ui
                .add(
                    egui::Slider::new(&mut point_size, POINT_SIZE_RANGE)
                        .step_by(POINT_SIZE_STEP as f64)
                        .text("Point Size"),
                )
                .changed()
            {
                next = next.with_point_size(point_size);
            }

            ui.separator();
            ui.label(format!(
                "Depth frames: {}  Video frames: {}",
                stats.depth_frames, stats.video_frames
            ));
            ui.label(format!(
                "Device tilt: {:.0}°  ({} commands)",
                stats.device_tilt, stats.tilt_commands
            ));
            ui.small("s/w distance · T/t tilt · P/p point size · drag to rotate · F1 panel");
        });

    next
}
