//! AVX realization: eight outputs per step with separate multiply and add.

use std::arch::x86_64::*;

use super::scalar;

const LANES: usize = 8;

/// # Safety
///
/// The processor must support AVX and `padded` must hold at least
/// `out.len() + 2 * radius * tap_stride` samples.
#[target_feature(enable = "avx")]
pub(super) unsafe fn correlate(
    padded: &[f32],
    tap_stride: usize,
    coefs: &[f32],
    symmetric: bool,
    out: &mut [f32],
) {
    let radius = coefs.len() - 1;
    let vectorized = out.len() - out.len() % LANES;
    let src = padded.as_ptr().add(radius * tap_stride);
    let dst = out.as_mut_ptr();

    let mut j = 0;
    while j < vectorized {
        let centre = src.add(j);
        let mut acc = if symmetric {
            _mm256_mul_ps(_mm256_set1_ps(coefs[0]), _mm256_loadu_ps(centre))
        } else {
            _mm256_setzero_ps()
        };
        for (k, &coef) in coefs.iter().enumerate().skip(1) {
            let d = k * tap_stride;
            let right = _mm256_loadu_ps(centre.add(d));
            let left = _mm256_loadu_ps(centre.sub(d));
            let pair = if symmetric {
                _mm256_add_ps(right, left)
            } else {
                _mm256_sub_ps(right, left)
            };
            acc = _mm256_add_ps(acc, _mm256_mul_ps(_mm256_set1_ps(coef), pair));
        }
        _mm256_storeu_ps(dst.add(j), acc);
        j += LANES;
    }

    scalar::correlate(padded, tap_stride, coefs, symmetric, out, vectorized);
}
