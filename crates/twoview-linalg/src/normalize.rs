use crate::{mat33::Mat33, point::Point2d};

/// A point set moved to the origin and scaled to a mean distance of sqrt(2).
#[derive(Debug, Clone)]
pub struct NormalizedPoints {
    /// The normalized points.
    pub points: Vec<Point2d>,
    /// Similarity transform mapping input points to normalized ones.
    pub transform: Mat33,
    /// Inverse of `transform`.
    pub inverse: Mat33,
}

/// Isotropic normalization of a set of 2d points.
///
/// Translates the centroid to the origin and scales the points so that their
/// mean distance to the origin is sqrt(2). The similarity transform is
///
/// ```text
/// T = [[s, 0, -s * mx], [0, s, -s * my], [0, 0, 1]]
/// ```
///
/// When all points coincide the scale is left at one.
///
/// # Example
///
/// ```
/// use twoview_linalg::{normalize::normalize_points_2d, Point2d};
///
/// let pts = [Point2d::new(0.0, 0.0), Point2d::new(2.0, 0.0)];
/// let norm = normalize_points_2d(&pts);
/// assert_eq!(norm.points.len(), 2);
/// ```
pub fn normalize_points_2d(x: &[Point2d]) -> NormalizedPoints {
    let n = x.len().max(1) as f64;

    let (mut mx, mut my) = (0.0, 0.0);
    for p in x {
        mx += p.x;
        my += p.y;
    }
    mx /= n;
    my /= n;

    let mean_dist = x
        .iter()
        .map(|p| (p.x - mx).hypot(p.y - my))
        .sum::<f64>()
        / n;
    let scale = if mean_dist > 0.0 {
        std::f64::consts::SQRT_2 / mean_dist
    } else {
        1.0
    };

    let points = x
        .iter()
        .map(|p| Point2d::new((p.x - mx) * scale, (p.y - my) * scale))
        .collect();

    NormalizedPoints {
        points,
        transform: [
            [scale, 0.0, -scale * mx],
            [0.0, scale, -scale * my],
            [0.0, 0.0, 1.0],
        ],
        inverse: [
            [1.0 / scale, 0.0, mx],
            [0.0, 1.0 / scale, my],
            [0.0, 0.0, 1.0],
        ],
    }
}
