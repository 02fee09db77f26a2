use serde::{Deserialize, Serialize};
use twoview_linalg::{
    mat33::{self, Mat33},
    svd, Point2d,
};

use crate::error::TwoViewError;

/// A pair of matching points, `a` in the first image and `b` in the second.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Correspondence {
    /// Point in the first image.
    pub a: Point2d,
    /// Point in the second image.
    pub b: Point2d,
}

impl Correspondence {
    /// Create a correspondence from its two points.
    pub const fn new(a: Point2d, b: Point2d) -> Self {
        Self { a, b }
    }
}

/// The names of the two images a correspondence set relates.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImagePair {
    /// Name of the first image.
    pub a: String,
    /// Name of the second image.
    pub b: String,
}

impl ImagePair {
    /// Create an image pair from two image names.
    pub fn new(a: impl Into<String>, b: impl Into<String>) -> Self {
        Self {
            a: a.into(),
            b: b.into(),
        }
    }
}

impl std::fmt::Display for ImagePair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}|{}", self.a, self.b)
    }
}

/// The ordered correspondences of one image pair.
///
/// Index `i` in the first image matches index `i` in the second one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrespondenceSet {
    pair: ImagePair,
    correspondences: Vec<Correspondence>,
}

impl CorrespondenceSet {
    /// Create a set from already paired points.
    pub fn new(pair: ImagePair, correspondences: Vec<Correspondence>) -> Self {
        Self {
            pair,
            correspondences,
        }
    }

    /// Pair up two point lists by index.
    pub fn from_points(
        pair: ImagePair,
        points_a: &[Point2d],
        points_b: &[Point2d],
    ) -> Result<Self, TwoViewError> {
        check_lengths(points_a, points_b)?;
        let correspondences = points_a
            .iter()
            .zip(points_b.iter())
            .map(|(a, b)| Correspondence::new(*a, *b))
            .collect();
        Ok(Self::new(pair, correspondences))
    }

    /// The image pair.
    pub fn pair(&self) -> &ImagePair {
        &self.pair
    }

    /// The correspondences in input order.
    pub fn as_slice(&self) -> &[Correspondence] {
        &self.correspondences
    }

    /// Number of correspondences.
    pub fn len(&self) -> usize {
        self.correspondences.len()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.correspondences.is_empty()
    }

    /// Iterate over the correspondences.
    pub fn iter(&self) -> std::slice::Iter<'_, Correspondence> {
        self.correspondences.iter()
    }

    /// Points of the first image.
    pub fn points_a(&self) -> Vec<Point2d> {
        self.correspondences.iter().map(|c| c.a).collect()
    }

    /// Points of the second image.
    pub fn points_b(&self) -> Vec<Point2d> {
        self.correspondences.iter().map(|c| c.b).collect()
    }

    /// The same correspondences with the two images swapped.
    pub fn swapped(&self) -> Self {
        Self {
            pair: ImagePair::new(self.pair.b.clone(), self.pair.a.clone()),
            correspondences: self
                .correspondences
                .iter()
                .map(|c| Correspondence::new(c.b, c.a))
                .collect(),
        }
    }
}

pub(crate) fn check_lengths(x1: &[Point2d], x2: &[Point2d]) -> Result<(), TwoViewError> {
    if x1.len() != x2.len() {
        return Err(TwoViewError::MismatchedLengths {
            left: x1.len(),
            right: x2.len(),
        });
    }
    Ok(())
}

/// A planar projective transform from the first image to the second.
///
/// Invertible, scaled so that `H[2][2] = 1` whenever that entry is not zero.
///
/// Deserialization goes through [`Homography::new`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Mat33")]
pub struct Homography(Mat33);

impl Homography {
    /// Wrap a matrix, rejecting zero, non-finite and non-invertible ones.
    ///
    /// The entries of a pixel-space homography mix units, so no relative
    /// conditioning test is applied here; [`crate::homography::homography_dlt`]
    /// tests conditioning on the normalized system instead.
    pub fn new(mut m: Mat33) -> Result<Self, TwoViewError> {
        if !mat33::normalize_mat33_inplace(&mut m) {
            return Err(TwoViewError::DegenerateSample(
                "homography is the zero matrix".to_string(),
            ));
        }
        let det = mat33::det_mat33(&m);
        if det == 0.0 || !det.is_finite() {
            return Err(TwoViewError::DegenerateSample(format!(
                "homography is not invertible (det = {det})"
            )));
        }
        Ok(Self(m))
    }

    /// The row-major matrix.
    pub fn matrix(&self) -> &Mat33 {
        &self.0
    }

    /// Map a point of the first image into the second.
    ///
    /// Returns `None` when the point is mapped to infinity.
    pub fn project(&self, p: &Point2d) -> Option<Point2d> {
        mat33::transform_point2d(&self.0, p)
    }

    /// Map a list of points, keeping `None` for points mapped to infinity.
    pub fn project_points(&self, points: &[Point2d]) -> Vec<Option<Point2d>> {
        points.iter().map(|p| self.project(p)).collect()
    }
}

/// The epipolar relation `pB^T F pA = 0` between two views.
///
/// Rank two, scaled to unit Frobenius norm. Deserialization goes through
/// [`FundamentalMatrix::new`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Mat33")]
pub struct FundamentalMatrix(Mat33);

impl FundamentalMatrix {
    /// Wrap a matrix, projecting it onto rank two and unit norm.
    pub fn new(m: Mat33) -> Result<Self, TwoViewError> {
        let mut f = svd::enforce_rank2(&m);
        let norm = mat33::frobenius_norm_mat33(&f);
        if norm == 0.0 || !norm.is_finite() {
            return Err(TwoViewError::DegenerateSample(
                "fundamental matrix vanishes after rank-2 projection".to_string(),
            ));
        }
        mat33::scale_mat33_inplace(&mut f, 1.0 / norm);
        Ok(Self(f))
    }

    /// The row-major matrix.
    pub fn matrix(&self) -> &Mat33 {
        &self.0
    }

    /// The fundamental matrix with the roles of the images swapped.
    pub fn transpose(&self) -> Self {
        Self(mat33::transpose_mat33(&self.0))
    }

    /// Singular values in nonincreasing order; the last one is zero.
    pub fn singular_values(&self) -> [f64; 3] {
        svd::svd3(&self.0).s
    }

    /// Algebraic epipolar residual `pB^T F pA`.
    pub fn algebraic_error(&self, c: &Correspondence) -> f64 {
        let mut l = [0.0; 3];
        mat33::mat33_mul_vec3(&self.0, &c.a.to_homogeneous(), &mut l);
        mat33::dot_product3(&c.b.to_homogeneous(), &l)
    }
}

impl TryFrom<Mat33> for Homography {
    type Error = TwoViewError;

    fn try_from(m: Mat33) -> Result<Self, Self::Error> {
        Self::new(m)
    }
}

impl TryFrom<Mat33> for FundamentalMatrix {
    type Error = TwoViewError;

    fn try_from(m: Mat33) -> Result<Self, Self::Error> {
        Self::new(m)
    }
}

/// RANSAC consensus membership, one flag per input correspondence.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct InlierMask(Vec<bool>);

impl InlierMask {
    /// Wrap a list of flags.
    pub fn new(mask: Vec<bool>) -> Self {
        Self(mask)
    }

    /// The raw flags.
    pub fn as_slice(&self) -> &[bool] {
        &self.0
    }

    /// Length of the mask, equal to the size of the input set.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the mask is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of inliers.
    pub fn count(&self) -> usize {
        self.0.iter().filter(|&&m| m).count()
    }

    /// Whether the correspondence at `index` is an inlier.
    pub fn is_inlier(&self, index: usize) -> bool {
        self.0.get(index).copied().unwrap_or(false)
    }

    /// Indices of the inliers.
    pub fn indices(&self) -> Vec<usize> {
        self.0
            .iter()
            .enumerate()
            .filter_map(|(i, &m)| m.then_some(i))
            .collect()
    }

    /// Select the inlier items of a slice with the same length.
    pub fn select<T: Copy>(&self, items: &[T]) -> Vec<T> {
        items
            .iter()
            .zip(self.0.iter())
            .filter_map(|(item, &m)| m.then_some(*item))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_from_points_mismatch() {
        let pair = ImagePair::new("a.jpg", "b.jpg");
        let res = CorrespondenceSet::from_points(pair, &[Point2d::new(0.0, 0.0)], &[]);
        assert_eq!(
            res,
            Err(TwoViewError::MismatchedLengths { left: 1, right: 0 })
        );
    }

    #[test]
    fn test_set_accessors() -> Result<(), TwoViewError> {
        let pa = [Point2d::new(0.0, 0.0), Point2d::new(1.0, 2.0)];
        let pb = [Point2d::new(5.0, 5.0), Point2d::new(6.0, 7.0)];
        let set = CorrespondenceSet::from_points(ImagePair::new("a", "b"), &pa, &pb)?;
        assert_eq!(set.len(), 2);
        assert_eq!(set.points_a(), pa.to_vec());
        assert_eq!(set.points_b(), pb.to_vec());
        assert_eq!(set.pair().to_string(), "a|b");

        let swapped = set.swapped();
        assert_eq!(swapped.points_a(), pb.to_vec());
        assert_eq!(swapped.pair(), &ImagePair::new("b", "a"));
        Ok(())
    }

    #[test]
    fn test_homography_normalized() -> Result<(), TwoViewError> {
        let h = Homography::new([[4.0, 0.0, 2.0], [0.0, 4.0, 6.0], [0.0, 0.0, 2.0]])?;
        assert_eq!(h.matrix()[2][2], 1.0);
        assert_eq!(
            h.project(&Point2d::new(1.0, 1.0)),
            Some(Point2d::new(3.0, 5.0))
        );
        Ok(())
    }

    #[test]
    fn test_homography_pixel_scale_translation() -> Result<(), TwoViewError> {
        // large translation with a strong zoom out is still a valid homography
        let m = [[0.1, 0.0, 2000.0], [0.0, 0.1, 1500.0], [0.0, 0.0, 1.0]];
        let h = Homography::new(m)?;
        assert_eq!(h.matrix(), &m);
        assert_eq!(
            h.project(&Point2d::new(4000.0, 0.0)),
            Some(Point2d::new(2400.0, 1500.0))
        );
        Ok(())
    }

    #[test]
    fn test_deserialize_validates() -> Result<(), Box<dyn std::error::Error>> {
        // full rank input is projected onto rank two
        let f: FundamentalMatrix = serde_json::from_str("[[1,0,0],[0,2,0],[0,0,3]]")?;
        let s = f.singular_values();
        assert_relative_eq!(s[2], 0.0, epsilon = 1e-12);
        // the smallest singular direction of diag(1, 2, 3) is the first axis
        assert_relative_eq!(f.matrix()[0][0], 0.0, epsilon = 1e-12);
        assert_relative_eq!(f.matrix()[2][2].abs(), 3.0 / 13f64.sqrt(), epsilon = 1e-12);

        let h: Homography = serde_json::from_str("[[2,0,4],[0,2,6],[0,0,2]]")?;
        assert_eq!(h.matrix()[2][2], 1.0);
        assert_eq!(serde_json::to_string(&h)?, "[[1.0,0.0,2.0],[0.0,1.0,3.0],[0.0,0.0,1.0]]");

        let singular = serde_json::from_str::<Homography>("[[1,2,3],[2,4,6],[0,0,1]]");
        assert!(singular.is_err());
        let zero = serde_json::from_str::<FundamentalMatrix>("[[0,0,0],[0,0,0],[0,0,0]]");
        assert!(zero.is_err());
        Ok(())
    }

    #[test]
    fn test_homography_singular() {
        let res = Homography::new([[1.0, 2.0, 3.0], [2.0, 4.0, 6.0], [0.0, 0.0, 1.0]]);
        assert!(matches!(res, Err(TwoViewError::DegenerateSample(_))));
        let res = Homography::new([[0.0; 3]; 3]);
        assert!(matches!(res, Err(TwoViewError::DegenerateSample(_))));
    }

    #[test]
    fn test_fundamental_rank2() -> Result<(), TwoViewError> {
        let f = FundamentalMatrix::new([[1.0, 2.0, 3.0], [4.0, 5.0, 6.0], [7.0, 8.0, 10.0]])?;
        let s = f.singular_values();
        assert_relative_eq!(s[2], 0.0, epsilon = 1e-12);
        assert_relative_eq!(
            (s[0] * s[0] + s[1] * s[1]).sqrt(),
            1.0,
            epsilon = 1e-12
        );
        assert_eq!(f.transpose().matrix()[0][1], f.matrix()[1][0]);
        Ok(())
    }

    #[test]
    fn test_inlier_mask() {
        let mask = InlierMask::new(vec![true, false, true, false]);
        assert_eq!(mask.len(), 4);
        assert_eq!(mask.count(), 2);
        assert_eq!(mask.indices(), vec![0, 2]);
        assert_eq!(mask.select(&[10, 11, 12, 13]), vec![10, 12]);
        assert!(mask.is_inlier(2));
        assert!(!mask.is_inlier(7));
    }
}
