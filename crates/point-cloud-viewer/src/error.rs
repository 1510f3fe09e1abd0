use crate::lattice::LatticeError;
use std::path::PathBuf;

/// Failures while bringing up the GPU and scene resources.
#[derive(Debug, thiserror::Error)]
pub enum InitError {
    #[error("failed to find a suitable GPU adapter")]
    Adapter,
    #[error(transparent)]
    Surface(#[from] wgpu::CreateSurfaceError),
    #[error("surface reports no supported texture format")]
    SurfaceFormat,
    #[error(transparent)]
    Device(#[from] wgpu::RequestDeviceError),
    #[error("failed to read shader {path}: {source}")]
    ShaderIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("shader module is invalid: {0}")]
    Shader(String),
    #[error(transparent)]
    Lattice(#[from] LatticeError),
}
