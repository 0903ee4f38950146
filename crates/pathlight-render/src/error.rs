use crate::math::Vec3;
use thiserror::Error;

/// Which primitive list an index refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveKind {
    Sphere,
    Box,
}

impl std::fmt::Display for PrimitiveKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PrimitiveKind::Sphere => f.write_str("sphere"),
            PrimitiveKind::Box => f.write_str("box"),
        }
    }
}

/// Scene geometry or material rejected at construction.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SceneError {
    #[error("sphere {index} has non-positive radius {radius}")]
    NonPositiveRadius { index: usize, radius: f32 },

    #[error("box {index} has non-positive half extents {half_extents:?}")]
    NonPositiveHalfExtent { index: usize, half_extents: Vec3 },

    #[error("box {index} rotation is not orthonormal")]
    NonOrthonormalRotation { index: usize },

    #[error("{kind} {index} has an invalid material: {reason}")]
    InvalidMaterial {
        kind: PrimitiveKind,
        index: usize,
        reason: &'static str,
    },
}

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("failed to build render thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    /// The in-flight frame was dropped; accumulated state is unchanged.
    #[error("frame cancelled")]
    Cancelled,
}
