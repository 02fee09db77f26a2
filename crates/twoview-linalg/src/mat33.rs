use crate::point::Point2d;

/// A row-major 3x3 matrix.
pub type Mat33 = [[f64; 3]; 3];

/// The 3x3 identity matrix.
pub const IDENTITY: Mat33 = [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];

/// Multiply a 3x3 matrix by a 3-vector.
///
/// # Arguments
///
/// * `m` - The matrix with shape (3, 3).
/// * `v` - The vector with shape (3,).
/// * `out` - The output vector with shape (3,).
pub fn mat33_mul_vec3(m: &Mat33, v: &[f64; 3], out: &mut [f64; 3]) {
    for (o, row) in out.iter_mut().zip(m.iter()) {
        *o = row[0] * v[0] + row[1] * v[1] + row[2] * v[2];
    }
}

/// Multiply two 3x3 matrices, `a * b`.
pub fn mat33_mul_mat33(a: &Mat33, b: &Mat33) -> Mat33 {
    let mut out = [[0.0; 3]; 3];
    for (i, row) in out.iter_mut().enumerate() {
        for (j, val) in row.iter_mut().enumerate() {
            *val = a[i][0] * b[0][j] + a[i][1] * b[1][j] + a[i][2] * b[2][j];
        }
    }
    out
}

/// Transpose of a 3x3 matrix.
pub fn transpose_mat33(m: &Mat33) -> Mat33 {
    let mut out = [[0.0; 3]; 3];
    for (i, row) in m.iter().enumerate() {
        for (j, val) in row.iter().enumerate() {
            out[j][i] = *val;
        }
    }
    out
}

/// Determinant of a 3x3 matrix.
pub fn det_mat33(m: &Mat33) -> f64 {
    m[0][0] * (m[1][1] * m[2][2] - m[1][2] * m[2][1])
        - m[0][1] * (m[1][0] * m[2][2] - m[1][2] * m[2][0])
        + m[0][2] * (m[1][0] * m[2][1] - m[1][1] * m[2][0])
}

/// Frobenius norm of a 3x3 matrix.
pub fn frobenius_norm_mat33(m: &Mat33) -> f64 {
    m.iter().flatten().map(|v| v * v).sum::<f64>().sqrt()
}

/// Scale a 3x3 matrix in place.
pub fn scale_mat33_inplace(m: &mut Mat33, s: f64) {
    m.iter_mut().flatten().for_each(|v| *v *= s);
}

/// Resolve the scale ambiguity of a projective 3x3 matrix in place.
///
/// The matrix is divided by its bottom-right entry when that entry is not
/// close to zero, otherwise by its largest-magnitude entry.
///
/// Returns `false` if the matrix is all zeros and cannot be normalized.
pub fn normalize_mat33_inplace(m: &mut Mat33) -> bool {
    let scale = frobenius_norm_mat33(m);
    if scale == 0.0 || !scale.is_finite() {
        return false;
    }

    let pivot = if m[2][2].abs() > 1e-10 * scale {
        m[2][2]
    } else {
        m.iter()
            .flatten()
            .copied()
            .fold(0.0f64, |acc, v| if v.abs() > acc.abs() { v } else { acc })
    };

    scale_mat33_inplace(m, 1.0 / pivot);
    true
}

/// Whether a 3x3 matrix is numerically singular.
///
/// The determinant is compared relative to the cube of the Frobenius norm, so
/// the test does not depend on the arbitrary scale of a projective matrix.
pub fn is_singular_mat33(m: &Mat33, tol: f64) -> bool {
    let norm = frobenius_norm_mat33(m);
    if norm == 0.0 {
        return true;
    }
    det_mat33(m).abs() <= tol * norm.powi(3)
}

/// Cross product of two 3-vectors.
pub fn cross_vec3(a: &[f64; 3], b: &[f64; 3], out: &mut [f64; 3]) {
    out[0] = a[1] * b[2] - a[2] * b[1];
    out[1] = a[2] * b[0] - a[0] * b[2];
    out[2] = a[0] * b[1] - a[1] * b[0];
}

/// Dot product of two 3-vectors.
#[inline]
pub fn dot_product3(a: &[f64; 3], b: &[f64; 3]) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

/// Map a 2d point through a projective 3x3 matrix.
///
/// Returns `None` when the point is mapped to infinity.
pub fn transform_point2d(m: &Mat33, p: &Point2d) -> Option<Point2d> {
    let mut out = [0.0; 3];
    mat33_mul_vec3(m, &p.to_homogeneous(), &mut out);
    Point2d::from_homogeneous(&out)
}

/// Whether three points are collinear.
///
/// Compares the sine of the angle at `p` between `q - p` and `r - p` with
/// `tol`. Coincident points count as collinear.
pub fn are_collinear(p: &Point2d, q: &Point2d, r: &Point2d, tol: f64) -> bool {
    let (ux, uy) = (q.x - p.x, q.y - p.y);
    let (vx, vy) = (r.x - p.x, r.y - p.y);
    let cross = ux * vy - uy * vx;
    cross.abs() <= tol * ux.hypot(uy) * vx.hypot(vy)
}
