use glam::{Mat4, Quat, Vec3};

/// Perspective camera on the +Z axis looking back at the origin.
#[derive(Debug, Clone)]
pub struct Camera {
    /// Vertical field of view (degrees).
    pub fov_y_deg: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,

    pub eye: Vec3,
    pub center: Vec3,
    pub up: Vec3,
}

impl Camera {
    pub fn new(aspect: f32, distance: f32) -> Self {
        let mut camera = Self {
            fov_y_deg: 75.0,
            aspect,
            near: 1.0,
            far: 8000.0,
            eye: Vec3::ZERO,
            center: Vec3::ZERO,
            up: Vec3::Y,
        };
        camera.set_distance(distance);
        camera
    }

    /// Places the eye at `(0, 0, distance)`, looking at the origin with +Y up.
    pub fn set_distance(&mut self, distance: f32) {
        self.look_at(Vec3::new(0.0, 0.0, distance), Vec3::ZERO, Vec3::Y);
    }

    pub fn look_at(&mut self, eye: Vec3, center: Vec3, up: Vec3) {
        self.eye = eye;
        self.center = center;
        self.up = up;
    }

    pub fn set_viewport(&mut self, width: u32, height: u32) {
        self.aspect = width as f32 / height.max(1) as f32;
    }

    pub fn view(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye, self.center, self.up)
    }

    /// wgpu clip space: depth in [0, 1].
    pub fn proj(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_y_deg.to_radians(), self.aspect, self.near, self.far)
    }

    pub fn view_proj(&self) -> Mat4 {
        self.proj() * self.view()
    }
}

/// Scene transform for the point cloud: mirror X and Y, then rotate.
pub fn scene_model(rotation: Quat) -> Mat4 {
    Mat4::from_scale(Vec3::new(-1.0, -1.0, 1.0)) * Mat4::from_quat(rotation)
}
