use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// What the window shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ViewMode {
    /// Per-pixel point cloud displaced by depth.
    PointCloud,
    /// Depth and colour streams side by side.
    Overlay,
}

/// `point_cloud_viewer` - live view of a Kinect-class depth camera.
///
/// Renders the depth stream either as a 640x480 point cloud or as a flat
/// depth/colour overlay. Without a hardware binding a synthetic sensor is
/// used.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Config {
    /// Visualization mode.
    #[arg(long, value_enum, default_value_t = ViewMode::PointCloud, env = "KPC_MODE")]
    pub mode: ViewMode,

    /// Window width in logical pixels. Defaults to 1280.
    #[arg(long, env = "KPC_WINDOW_WIDTH")]
    pub width: Option<u32>,

    /// Window height in logical pixels.
    ///
    /// Defaults to 720 for the point cloud and 480 for the overlay, which
    /// fits two 640x480 streams exactly.
    #[arg(long, env = "KPC_WINDOW_HEIGHT")]
    pub height: Option<u32>,

    /// Frame rate of the synthetic sensor in Hz.
    #[arg(long, default_value_t = 30.0, env = "KPC_FRAME_RATE")]
    pub frame_rate: f32,

    /// WGSL file replacing the built-in point cloud shader.
    ///
    /// Must provide `vs_main` and `fs_main` with the same bindings.
    #[arg(long, env = "KPC_SHADER")]
    pub shader: Option<PathBuf>,

    /// Start with the parameter panel hidden (toggle with F1).
    #[arg(long)]
    pub no_panel: bool,
}

impl Config {
    /// Window size with mode-dependent defaults.
    pub fn window_size(&self) -> (u32, u32) {
        let default_height = match self.mode {
            ViewMode::PointCloud => 720,
            ViewMode::Overlay => 480,
        };
        (
            self.width.unwrap_or(1280).max(1),
            self.height.unwrap_or(default_height).max(1),
        )
    }

    pub fn window_title(&self) -> &'static str {
        match self.mode {
            ViewMode::PointCloud => "Kinect Point Cloud",
            ViewMode::Overlay => "Kinect Depth + Colour",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_point_cloud_window() {
        let cfg = Config::try_parse_from(["point_cloud_viewer"]).unwrap();
        assert_eq!(cfg.mode, ViewMode::PointCloud);
        assert_eq!(cfg.window_size(), (1280, 720));
        assert_eq!(cfg.frame_rate, 30.0);
        assert!(cfg.shader.is_none());
        assert!(!cfg.no_panel);
    }

    #[test]
    fn overlay_defaults_to_two_streams_wide() {
        let cfg = Config::try_parse_from(["point_cloud_viewer", "--mode", "overlay"]).unwrap();
        assert_eq!(cfg.mode, ViewMode::Overlay);
        assert_eq!(cfg.window_size(), (1280, 480));
    }

    #[test]
    fn explicit_size_wins() {
        let cfg = Config::try_parse_from([
            "point_cloud_viewer",
            "--width",
            "800",
            "--height",
            "600",
            "--no-panel",
        ])
        .unwrap();
        assert_eq!(cfg.window_size(), (800, 600));
        assert!(cfg.no_panel);
    }

    #[test]
    fn unknown_mode_is_rejected() {
        assert!(Config::try_parse_from(["point_cloud_viewer", "--mode", "mesh"]).is_err());
    }
}
