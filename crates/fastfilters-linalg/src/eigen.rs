//! Closed-form eigenvalues of real symmetric 2×2 and 3×3 matrices.
//!
//! Structure tensors and Hessians are symmetric tensor fields: every pixel holds
//! one symmetric matrix, stored as parallel arrays of its upper-triangular
//! entries. This module turns such fields into per-pixel eigenvalues.
//!
//! # Mathematical Background
//!
//! For a 2×2 matrix the eigenvalues are
//!
//! ```text
//! λ = m ± sqrt(((xx - yy) / 2)² + xy²),   m = (xx + yy) / 2
//! ```
//!
//! which is `trace/2 ± sqrt((trace/2)² - det)` written so that the radicand is a
//! sum of squares.
//!
//! For a 3×3 matrix A the trigonometric solution of the characteristic
//! polynomial is used (Smith, 1961):
//!
//! ```text
//! q = trace(A) / 3
//! p = sqrt(‖A - qI‖²_F / 6)
//! B = (A - qI) / p
//! φ = acos(det(B) / 2) / 3
//! λ_max = q + 2p cos(φ)
//! λ_min = q + 2p cos(φ + 2π/3)
//! λ_mid = 3q - λ_max - λ_min
//! ```
//!
//! When `p` vanishes relative to the magnitude of A the matrix is a multiple of
//! the identity and all three eigenvalues equal `q`.
//!
//! # Ordering
//!
//! * 2D: `ev_small <= ev_big`.
//! * 3D: ascending, `ev0 <= ev1 <= ev2`.
//!
//! # Example
//!
//! ```
//! use fastfilters_linalg::eigen::symmetric_eigenvalues3;
//!
//! let [l0, l1, l2] = symmetric_eigenvalues3([3.0f64, 0.0, 0.0, 1.0, 0.0, 2.0]);
//!
//! assert!((l0 - 1.0).abs() < 1e-12);
//! assert!((l1 - 2.0).abs() < 1e-12);
//! assert!((l2 - 3.0).abs() < 1e-12);
//! ```
//!
//! # References
//!
//! * Smith, O. K. (1961). "Eigenvalues of a symmetric 3 × 3 matrix."
//!   Communications of the ACM 4(4), 168.

use num_traits::{Float, FloatConst};

use crate::error::LinalgError;

/// Relative size below which the deviatoric part of a 3×3 matrix is treated as zero.
const DEGENERATE_EPSILON: f64 = 1e-12;

/// Eigenvalues of the symmetric matrix `[[xx, xy], [xy, yy]]`, ascending.
///
/// # Arguments
///
/// * `xx`, `xy`, `yy` - The upper-triangular entries.
///
/// # Returns
///
/// `(small, big)` with `small <= big`.
#[inline]
pub fn symmetric_eigenvalues2<T: Float>(xx: T, xy: T, yy: T) -> (T, T) {
    let two = T::one() + T::one();
    let mean = (xx + yy) / two;
    let half_diff = (xx - yy) / two;
    let radicand = (half_diff * half_diff + xy * xy).max(T::zero());
    let r = radicand.sqrt();
    (mean - r, mean + r)
}

/// Eigenvalues of a symmetric 3×3 matrix, ascending.
///
/// # Arguments
///
/// * `a` - The upper-triangular entries `[a00, a01, a02, a11, a12, a22]`.
///
/// # Returns
///
/// `[l0, l1, l2]` with `l0 <= l1 <= l2` and `l0 + l1 + l2 == a00 + a11 + a22`
/// up to rounding.
pub fn symmetric_eigenvalues3<T: Float + FloatConst>(a: [T; 6]) -> [T; 3] {
    let [a00, a01, a02, a11, a12, a22] = a;
    let one = T::one();
    let two = one + one;
    let three = two + one;
    let six = three + three;

    let q = (a00 + a11 + a22) / three;
    let off = a01 * a01 + a02 * a02 + a12 * a12;
    let (d0, d1, d2) = (a00 - q, a11 - q, a22 - q);
    let p = ((d0 * d0 + d1 * d1 + d2 * d2 + two * off) / six).sqrt();

    let scale = a.iter().fold(T::zero(), |acc, v| acc.max(v.abs()));
    let eps = T::from(DEGENERATE_EPSILON).unwrap_or_else(T::epsilon);
    if p <= eps * scale || p.is_nan() {
        // multiple of the identity (or all zero)
        return [q, q, q];
    }

    let inv_p = one / p;
    let (b00, b11, b22) = (d0 * inv_p, d1 * inv_p, d2 * inv_p);
    let (b01, b02, b12) = (a01 * inv_p, a02 * inv_p, a12 * inv_p);
    let det = b00 * (b11 * b22 - b12 * b12) - b01 * (b01 * b22 - b12 * b02)
        + b02 * (b01 * b12 - b11 * b02);

    let r = (det / two).max(-one).min(one);
    let phi = r.acos() / three;
    let third_turn = two * T::PI() / three;

    let hi = q + two * p * phi.cos();
    let lo = q + two * p * (phi + third_turn).cos();
    let mid = three * q - hi - lo;

    sort3([lo, mid, hi])
}

#[inline]
fn sort3<T: Float>([a, b, c]: [T; 3]) -> [T; 3] {
    let (a, b) = if b < a { (b, a) } else { (a, b) };
    let (b, c) = if c < b { (c, b) } else { (b, c) };
    let (a, b) = if b < a { (b, a) } else { (a, b) };
    [a, b, c]
}

fn check_lengths(len: usize, lens: &[usize]) -> Result<(), LinalgError> {
    match lens.iter().find(|&&l| l != len) {
        Some(&l) => Err(LinalgError::LengthMismatch(len, l)),
        None => Ok(()),
    }
}

/// Eigenvalues of a field of symmetric 2×2 matrices.
///
/// Entry `i` of `xx`, `xy` and `yy` forms one matrix; its eigenvalues are
/// written to `ev_small[i] <= ev_big[i]`.
///
/// # Errors
///
/// If the slices do not all have the same length, a `LengthMismatch` error is
/// returned and nothing is written.
///
/// Example:
/// ```
/// use fastfilters_linalg::eigenvalues2d;
///
/// let (xx, xy, yy) = ([2.0f32, 1.0], [0.0f32, 0.0], [1.0f32, 1.0]);
/// let mut small = [0.0f32; 2];
/// let mut big = [0.0f32; 2];
/// eigenvalues2d(&xx, &xy, &yy, &mut small, &mut big).unwrap();
/// assert_eq!(small, [1.0, 1.0]);
/// assert_eq!(big, [2.0, 1.0]);
/// ```
pub fn eigenvalues2d(
    xx: &[f32],
    xy: &[f32],
    yy: &[f32],
    ev_small: &mut [f32],
    ev_big: &mut [f32],
) -> Result<(), LinalgError> {
    check_lengths(
        xx.len(),
        &[xy.len(), yy.len(), ev_small.len(), ev_big.len()],
    )?;

    for i in 0..xx.len() {
        let (small, big) = symmetric_eigenvalues2(xx[i] as f64, xy[i] as f64, yy[i] as f64);
        ev_small[i] = small as f32;
        ev_big[i] = big as f32;
    }

    Ok(())
}

/// Eigenvalues of a field of symmetric 3×3 matrices.
///
/// Entry `i` of the six input slices forms one matrix; its eigenvalues are
/// written in ascending order to `ev0[i] <= ev1[i] <= ev2[i]`.
///
/// # Errors
///
/// If the slices do not all have the same length, a `LengthMismatch` error is
/// returned and nothing is written.
#[allow(clippy::too_many_arguments)]
pub fn eigenvalues3d(
    a00: &[f32],
    a01: &[f32],
    a02: &[f32],
    a11: &[f32],
    a12: &[f32],
    a22: &[f32],
    ev0: &mut [f32],
    ev1: &mut [f32],
    ev2: &mut [f32],
) -> Result<(), LinalgError> {
    check_lengths(
        a00.len(),
        &[
            a01.len(),
            a02.len(),
            a11.len(),
            a12.len(),
            a22.len(),
            ev0.len(),
            ev1.len(),
            ev2.len(),
        ],
    )?;

    for i in 0..a00.len() {
        let [l0, l1, l2] = symmetric_eigenvalues3([
            a00[i] as f64,
            a01[i] as f64,
            a02[i] as f64,
            a11[i] as f64,
            a12[i] as f64,
            a22[i] as f64,
        ]);
        ev0[i] = l0 as f32;
        ev1[i] = l1 as f32;
        ev2[i] = l2 as f32;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::Rng;

    #[test]
    fn test_eigenvalues2_diagonal() {
        let (small, big) = symmetric_eigenvalues2(-3.0f64, 0.0, 5.0);
        assert_eq!(small, -3.0);
        assert_eq!(big, 5.0);

        // order does not depend on which diagonal entry is larger
        let (small, big) = symmetric_eigenvalues2(5.0f64, 0.0, -3.0);
        assert_eq!(small, -3.0);
        assert_eq!(big, 5.0);
    }

    #[test]
    fn test_eigenvalues2_scaled_identity() {
        let (small, big) = symmetric_eigenvalues2(2.5f32, 0.0, 2.5);
        assert_eq!(small, 2.5);
        assert_eq!(big, 2.5);
    }

    #[test]
    fn test_eigenvalues2_off_diagonal() {
        // [[2, 1], [1, 2]] has eigenvalues 1 and 3
        let (small, big) = symmetric_eigenvalues2(2.0f64, 1.0, 2.0);
        assert_relative_eq!(small, 1.0, epsilon = 1e-12);
        assert_relative_eq!(big, 3.0, epsilon = 1e-12);
    }

    #[test]
    fn test_eigenvalues2d_random_ordered() -> Result<(), LinalgError> {
        let mut rng = rand::rng();
        let n = 1000;
        let xx: Vec<f32> = (0..n).map(|_| rng.random_range(-10.0..10.0)).collect();
        let xy: Vec<f32> = (0..n).map(|_| rng.random_range(-10.0..10.0)).collect();
        let yy: Vec<f32> = (0..n).map(|_| rng.random_range(-10.0..10.0)).collect();
        let mut small = vec![0.0; n];
        let mut big = vec![0.0; n];
        eigenvalues2d(&xx, &xy, &yy, &mut small, &mut big)?;

        for i in 0..n {
            assert!(small[i] <= big[i]);
            assert!(small[i].is_finite() && big[i].is_finite());
            assert_relative_eq!(small[i] + big[i], xx[i] + yy[i], epsilon = 1e-4);
            let det = xx[i] as f64 * yy[i] as f64 - (xy[i] as f64).powi(2);
            assert_relative_eq!(
                small[i] as f64 * big[i] as f64,
                det,
                epsilon = 1e-2,
                max_relative = 1e-4
            );
        }
        Ok(())
    }

    #[test]
    fn test_eigenvalues2d_length_mismatch() {
        let mut small = [0.0; 2];
        let mut big = [0.0; 3];
        let res = eigenvalues2d(&[0.0; 3], &[0.0; 3], &[0.0; 3], &mut small, &mut big);
        assert_eq!(res, Err(LinalgError::LengthMismatch(3, 2)));
    }

    #[test]
    fn test_eigenvalues3_diagonal() {
        let [l0, l1, l2] = symmetric_eigenvalues3([4.0f64, 0.0, 0.0, -1.0, 0.0, 2.0]);
        assert_relative_eq!(l0, -1.0, epsilon = 1e-12);
        assert_relative_eq!(l1, 2.0, epsilon = 1e-12);
        assert_relative_eq!(l2, 4.0, epsilon = 1e-12);
    }

    #[test]
    fn test_eigenvalues3_scaled_identity() {
        for c in [0.0f64, 1.0, -7.5, 1e-20, 3e8] {
            let ev = symmetric_eigenvalues3([c, 0.0, 0.0, c, 0.0, c]);
            for l in ev {
                assert_relative_eq!(l, c, max_relative = 1e-15);
            }
        }
    }

    #[test]
    fn test_eigenvalues3_known_matrix() {
        // [[2, -1, 0], [-1, 2, -1], [0, -1, 2]] has eigenvalues 2 - sqrt(2), 2, 2 + sqrt(2)
        let [l0, l1, l2] = symmetric_eigenvalues3([2.0f64, -1.0, 0.0, 2.0, -1.0, 2.0]);
        let s = 2.0f64.sqrt();
        assert_relative_eq!(l0, 2.0 - s, epsilon = 1e-12);
        assert_relative_eq!(l1, 2.0, epsilon = 1e-12);
        assert_relative_eq!(l2, 2.0 + s, epsilon = 1e-12);
    }

    #[test]
    fn test_eigenvalues3_repeated_eigenvalue() {
        // rank one update of the identity: eigenvalues 1, 1, 4
        let [l0, l1, l2] = symmetric_eigenvalues3([2.0f64, 1.0, 1.0, 2.0, 1.0, 2.0]);
        assert_relative_eq!(l0, 1.0, epsilon = 1e-6);
        assert_relative_eq!(l1, 1.0, epsilon = 1e-6);
        assert_relative_eq!(l2, 4.0, epsilon = 1e-6);
    }

    #[test]
    fn test_eigenvalues3d_random_trace() -> Result<(), LinalgError> {
        let mut rng = rand::rng();
        let n = 1000;
        let mut sample = || -> Vec<f32> { (0..n).map(|_| rng.random_range(-5.0..5.0)).collect() };
        let (a00, a01, a02, a11, a12, a22) = (
            sample(),
            sample(),
            sample(),
            sample(),
            sample(),
            sample(),
        );
        let mut ev0 = vec![0.0; n];
        let mut ev1 = vec![0.0; n];
        let mut ev2 = vec![0.0; n];
        eigenvalues3d(
            &a00, &a01, &a02, &a11, &a12, &a22, &mut ev0, &mut ev1, &mut ev2,
        )?;

        for i in 0..n {
            assert!(ev0[i] <= ev1[i] && ev1[i] <= ev2[i]);
            let trace = a00[i] + a11[i] + a22[i];
            assert_relative_eq!(ev0[i] + ev1[i] + ev2[i], trace, epsilon = 1e-4);
        }
        Ok(())
    }

    #[test]
    fn test_eigenvalues3d_length_mismatch() {
        let a = [0.0f32; 4];
        let mut ev0 = [0.0; 4];
        let mut ev1 = [0.0; 4];
        let mut ev2 = [0.0; 5];
        let res = eigenvalues3d(&a, &a, &a, &a, &a, &a, &mut ev0, &mut ev1, &mut ev2);
        assert_eq!(res, Err(LinalgError::LengthMismatch(4, 5)));
    }
}
