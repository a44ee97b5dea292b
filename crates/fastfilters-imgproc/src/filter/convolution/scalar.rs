/// Portable realization of the correlation, also used for the tails of the SIMD paths.
///
/// Outputs before `start` are left untouched.
pub(super) fn correlate(
    padded: &[f32],
    tap_stride: usize,
    coefs: &[f32],
    symmetric: bool,
    out: &mut [f32],
    start: usize,
) {
    let centre = (coefs.len() - 1) * tap_stride;

    if symmetric {
        for (j, v) in out.iter_mut().enumerate().skip(start) {
            let c = j + centre;
            let mut acc = coefs[0] * padded[c];
            for (k, &coef) in coefs.iter().enumerate().skip(1) {
                let d = k * tap_stride;
                acc += coef * (padded[c + d] + padded[c - d]);
            }
            *v = acc;
        }
    } else {
        for (j, v) in out.iter_mut().enumerate().skip(start) {
            let c = j + centre;
            let mut acc = 0.0;
            for (k, &coef) in coefs.iter().enumerate().skip(1) {
                let d = k * tap_stride;
                acc += coef * (padded[c + d] - padded[c - d]);
            }
            *v = acc;
        }
    }
}
