/// Solve the 2x2 linear system `a * x = b` with Cramer's rule.
///
/// # Arguments
///
/// * `a` - The row-major coefficient matrix.
/// * `b` - The right-hand side.
/// * `eps` - Systems with `|det(a)| <= eps` are treated as singular.
///
/// # Returns
///
/// `Ok(x)` or `Err(det)` with the offending determinant when singular.
pub fn solve_2x2(a: &[[f64; 2]; 2], b: &[f64; 2], eps: f64) -> Result<[f64; 2], f64> {
    let det = a[0][0] * a[1][1] - a[0][1] * a[1][0];
    if det.abs() <= eps || !det.is_finite() {
        return Err(det);
    }
    Ok([
        (b[0] * a[1][1] - a[0][1] * b[1]) / det,
        (a[0][0] * b[1] - b[0] * a[1][0]) / det,
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_solve_2x2() {
        // 2x + y = 5, x - y = 1 -> (2, 1)
        let x = solve_2x2(&[[2.0, 1.0], [1.0, -1.0]], &[5.0, 1.0], 1e-12).unwrap();
        assert_relative_eq!(x[0], 2.0, epsilon = 1e-12);
        assert_relative_eq!(x[1], 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_solve_2x2_singular() {
        let res = solve_2x2(&[[1.0, 2.0], [2.0, 4.0]], &[1.0, 3.0], 1e-12);
        assert_eq!(res, Err(0.0));
    }
}
