// src/lib.rs
//! Kinect depth viewer library.
//!
//! Renders a depth camera either as a per-pixel point cloud (a fixed
//! particle lattice displaced by the latest depth texture) or as a flat
//! depth/colour overlay.

pub mod app;
pub mod camera;
pub mod config;
pub mod error;
pub mod frame;
pub mod input;
pub mod lattice;
pub mod params;
pub mod renderer;
pub mod ui;
