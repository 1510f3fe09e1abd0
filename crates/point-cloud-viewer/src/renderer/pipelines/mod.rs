pub mod overlay;
pub mod point_cloud;
