/// Errors returned by the two-view estimators and checks.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum TwoViewError {
    /// Fewer correspondences than the minimal sample of the model.
    #[error("Need at least {required} correspondences, got {actual}")]
    InsufficientData {
        /// Minimum number of correspondences required by the model.
        required: usize,
        /// Number of correspondences provided.
        actual: usize,
    },

    /// The two point lists of a correspondence set differ in length.
    #[error("Mismatched point lists: {left} points in the first image, {right} in the second")]
    MismatchedLengths {
        /// Number of points in the first image.
        left: usize,
        /// Number of points in the second image.
        right: usize,
    },

    /// A sample does not determine a unique model.
    #[error("Degenerate sample: {0}")]
    DegenerateSample(String),

    /// RANSAC did not find a consensus set large enough.
    #[error("Estimation failed after {iterations} iterations: best consensus {best_inliers}, need {required}")]
    EstimationFailed {
        /// Number of iterations performed.
        iterations: usize,
        /// Largest consensus found.
        best_inliers: usize,
        /// Consensus size required for acceptance.
        required: usize,
    },

    /// An epipolar line with a vanishing direction.
    #[error("Degenerate epipolar line ({a}, {b}, {c})")]
    DegenerateLine {
        /// First line coefficient.
        a: f64,
        /// Second line coefficient.
        b: f64,
        /// Third line coefficient.
        c: f64,
    },

    /// A point is mapped to infinity by a homography.
    #[error("Point ({x}, {y}) is mapped to infinity")]
    PointAtInfinity {
        /// Horizontal coordinate of the source point.
        x: f64,
        /// Vertical coordinate of the source point.
        y: f64,
    },

    /// The lines are parallel or coincident.
    #[error("Lines have no unique intersection (det = {det})")]
    ParallelLines {
        /// Determinant of the 2x2 intersection system.
        det: f64,
    },
}

impl TwoViewError {
    /// Whether the error only rejects one sample and can be recovered by resampling.
    pub fn is_degenerate_sample(&self) -> bool {
        matches!(self, TwoViewError::DegenerateSample(_))
    }
}
