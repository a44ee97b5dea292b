//! AVX2 + FMA realization: eight outputs per step, one fused multiply-add per tap pair.

use std::arch::x86_64::*;

use super::scalar;

const LANES: usize = 8;

/// # Safety
///
/// The processor must support AVX, AVX2 and FMA, and `padded` must hold at
/// least `out.len() + 2 * radius * tap_stride` samples.
#[target_feature(enable = "avx,avx2,fma")]
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

    if symmetric {
        let mut j = 0;
        while j < vectorized {
            let centre = src.add(j);
            let mut acc = _mm256_mul_ps(_mm256_set1_ps(coefs[0]), _mm256_loadu_ps(centre));
            for (k, &coef) in coefs.iter().enumerate().skip(1) {
                let d = k * tap_stride;
                let pair = _mm256_add_ps(
                    _mm256_loadu_ps(centre.add(d)),
                    _mm256_loadu_ps(centre.sub(d)),
                );
                acc = _mm256_fmadd_ps(_mm256_set1_ps(coef), pair, acc);
            }
            _mm256_storeu_ps(dst.add(j), acc);
            j += LANES;
        }
    } else {
        let mut j = 0;
        while j < vectorized {
            let centre = src.add(j);
            let mut acc = _mm256_setzero_ps();
            for (k, &coef) in coefs.iter().enumerate().skip(1) {
                let d = k * tap_stride;
                let diff = _mm256_sub_ps(
                    _mm256_loadu_ps(centre.add(d)),
                    _mm256_loadu_ps(centre.sub(d)),
                );
                acc = _mm256_fmadd_ps(_mm256_set1_ps(coef), diff, acc);
            }
            _mm256_storeu_ps(dst.add(j), acc);
            j += LANES;
        }
    }

    scalar::correlate(padded, tap_stride, coefs, symmetric, out, vectorized);
}
