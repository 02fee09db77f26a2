use serde::{Deserialize, Serialize};
use twoview_linalg::{mat33, Point2d};

use crate::error::TwoViewError;
use crate::types::FundamentalMatrix;

/// One of the two views related by a fundamental matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum View {
    /// The first image, the one `F` multiplies on the right.
    Left,
    /// The second image.
    Right,
}

impl View {
    /// The other view.
    pub fn other(&self) -> View {
        match self {
            View::Left => View::Right,
            View::Right => View::Left,
        }
    }
}

/// An epipolar line `a x + b y + c = 0` with `a^2 + b^2 = 1`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EpipolarLine {
    coeffs: [f64; 3],
    source: Point2d,
    source_view: View,
}

impl EpipolarLine {
    /// Build a line from raw homogeneous coefficients, normalizing its direction.
    pub fn from_coeffs(
        coeffs: [f64; 3],
        source: Point2d,
        source_view: View,
    ) -> Result<Self, TwoViewError> {
        let [a, b, c] = coeffs;
        let norm = a.hypot(b);
        if norm == 0.0 || !norm.is_finite() || norm <= f64::EPSILON * c.abs() {
            return Err(TwoViewError::DegenerateLine { a, b, c });
        }
        Ok(Self {
            coeffs: [a / norm, b / norm, c / norm],
            source,
            source_view,
        })
    }

    /// The normalized coefficients `[a, b, c]`.
    pub fn coeffs(&self) -> [f64; 3] {
        self.coeffs
    }

    /// The point whose epipolar line this is.
    pub fn source(&self) -> Point2d {
        self.source
    }

    /// The view the source point lives in.
    pub fn source_view(&self) -> View {
        self.source_view
    }

    /// The view the line lives in.
    pub fn target_view(&self) -> View {
        self.source_view.other()
    }

    /// Perpendicular distance in pixels from a point to the line.
    pub fn distance(&self, p: &Point2d) -> f64 {
        let [a, b, c] = self.coeffs;
        (a * p.x + b * p.y + c).abs()
    }

    /// Endpoints of the part of the line inside a `width x height` image.
    ///
    /// Returns `None` if the line misses the image.
    pub fn clip_to_image(&self, width: f64, height: f64) -> Option<(Point2d, Point2d)> {
        let [a, b, c] = self.coeffs;
        let inside = |p: &Point2d| {
            let tol = 1e-9 * (width + height);
            p.x >= -tol && p.x <= width + tol && p.y >= -tol && p.y <= height + tol
        };

        let mut hits: Vec<Point2d> = Vec::with_capacity(4);
        if b.abs() > f64::EPSILON {
            hits.push(Point2d::new(0.0, -c / b));
            hits.push(Point2d::new(width, -(a * width + c) / b));
        }
        if a.abs() > f64::EPSILON {
            hits.push(Point2d::new(-c / a, 0.0));
            hits.push(Point2d::new(-(b * height + c) / a, height));
        }
        hits.retain(|p| inside(p));

        let first = *hits.first()?;
        let last = hits
            .iter()
            .copied()
            .max_by(|p, q| p.distance(&first).total_cmp(&q.distance(&first)))?;
        Some((first, last))
    }
}

/// Compute the epipolar line of a point in the other view.
///
/// For a point in the left view the line in the right view is `F [x, y, 1]^T`;
/// for a point in the right view the line in the left view is `F^T [x, y, 1]^T`.
///
/// # Errors
///
/// [`TwoViewError::DegenerateLine`] if the line direction vanishes, which
/// happens for the epipole itself or an invalid `F`.
pub fn epiline(
    point: &Point2d,
    f: &FundamentalMatrix,
    source_view: View,
) -> Result<EpipolarLine, TwoViewError> {
    let m = match source_view {
        View::Left => *f.matrix(),
        View::Right => mat33::transpose_mat33(f.matrix()),
    };
    let mut l = [0.0; 3];
    mat33::mat33_mul_vec3(&m, &point.to_homogeneous(), &mut l);
    EpipolarLine::from_coeffs(l, *point, source_view)
}

/// Compute the epipolar lines of several points of the same view.
pub fn epilines(
    points: &[Point2d],
    f: &FundamentalMatrix,
    source_view: View,
) -> Result<Vec<EpipolarLine>, TwoViewError> {
    points.iter().map(|p| epiline(p, f, source_view)).collect()
}
