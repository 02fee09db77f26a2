#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// 2d points in pixel space.
pub mod point;

/// Row-major 3x3 matrix and 3-vector helpers.
pub mod mat33;

/// Isotropic normalization of 2d point sets.
pub mod normalize;

/// Singular value decomposition helpers backed by faer.
pub mod svd;

/// Small dense linear systems.
pub mod solve;

pub use point::{ParsePointError, Point2d};
