use std::f64::consts::PI;

use fastfilters_image::ScratchAllocator;

use super::{
    border::LineBorders,
    convolution::{Correlator, LineShape, StridedLines, StridedLinesMut},
    iir::IirKernel,
};
use crate::{
    cpu::{Backend, CpuFeatures},
    error::FilterError,
};

/// Highest derivative order the kernel builders support.
pub const MAX_ORDER: u32 = 2;

/// Largest number of taps on each side of the centre the kernel builders accept.
pub const MAX_RADIUS: usize = 1 << 16;

/// Window ratio used when the caller passes zero or a negative value.
///
/// Higher derivatives decay more slowly, so their support grows with the order.
pub fn default_window_ratio(order: u32) -> f32 {
    3.0 + 0.5 * order as f32
}

/// `ceil(window_ratio * sigma)` for positive finite arguments, bounded by [`MAX_RADIUS`].
pub(crate) fn support_radius(window_ratio: f32, sigma: f64) -> Result<usize, FilterError> {
    let extent = window_ratio as f64 * sigma;
    let radius = extent.ceil();
    if !radius.is_finite() || radius > MAX_RADIUS as f64 {
        return Err(FilterError::KernelTooLarge {
            radius: extent,
            max: MAX_RADIUS,
        });
    }
    Ok(radius as usize)
}

/// A finite impulse response kernel stored as one half of a (anti)symmetric filter.
///
/// `coefs[0]` is the centre tap and `coefs[k]` the tap at distance `k`; the
/// tap at `-k` is `coefs[k]` for symmetric and `-coefs[k]` for antisymmetric
/// kernels. The correlation backend is chosen once, when the kernel is built.
#[derive(Clone, Debug, PartialEq)]
pub struct FirKernel {
    coefs: Vec<f32>,
    symmetric: bool,
    correlator: Correlator,
}

impl FirKernel {
    /// Sample the `order`-th derivative of a Gaussian.
    ///
    /// The taps cover `0..=radius` with `radius = max(1, ceil(window_ratio * sigma))`
    /// and are normalised so that
    ///
    /// - order 0 sums to one over the full support,
    /// - order 1 maps the ramp `f(x) = x` to one,
    /// - order 2 has zero sum and maps `f(x) = x^2` to two.
    ///
    /// # Arguments
    ///
    /// * `order` - Derivative order, `0..=2`.
    /// * `sigma` - Standard deviation of the Gaussian in pixels.
    /// * `window_ratio` - Support in multiples of sigma, `<= 0` for [`default_window_ratio`].
    /// * `features` - Dispatch table that picks the correlation backend.
    ///
    /// # Errors
    ///
    /// Returns `InvalidSigma` if `sigma` is not positive and finite,
    /// `UnsupportedOrder` if `order > 2` and `KernelTooLarge` if the radius
    /// exceeds [`MAX_RADIUS`].
    ///
    /// # Examples
    ///
    /// ```
    /// use fastfilters_imgproc::cpu::CpuFeatures;
    /// use fastfilters_imgproc::filter::FirKernel;
    ///
    /// let kernel = FirKernel::gaussian(0, 1.0, 3.0, &CpuFeatures::detect()).unwrap();
    ///
    /// assert_eq!(kernel.len(), 4);
    /// assert!(kernel.is_symmetric());
    /// ```
    pub fn gaussian(
        order: u32,
        sigma: f64,
        window_ratio: f32,
        features: &CpuFeatures,
    ) -> Result<Self, FilterError> {
        if !sigma.is_finite() || sigma <= 0.0 {
            return Err(FilterError::InvalidSigma(sigma));
        }
        if order > MAX_ORDER {
            return Err(FilterError::UnsupportedOrder(order));
        }

        let ratio = if window_ratio.is_finite() && window_ratio > 0.0 {
            window_ratio
        } else {
            default_window_ratio(order)
        };
        let radius = support_radius(ratio, sigma)?.max(1);
        let coefs = gaussian_coefficients(order, sigma, radius);
        let correlator = Correlator::resolve(features.backend());
        let backend = correlator.backend();

        log::debug!(
            "fir gaussian kernel: order={order} sigma={sigma} radius={radius} backend={backend:?}"
        );

        Ok(Self {
            coefs,
            symmetric: order % 2 == 0,
            correlator,
        })
    }

    /// Build a kernel from caller supplied half coefficients.
    ///
    /// # Errors
    ///
    /// Returns `EmptyKernel` if `coefs` is empty and `KernelTooLarge` if it
    /// holds more than `MAX_RADIUS + 1` taps.
    pub fn from_coefficients(
        coefs: Vec<f32>,
        symmetric: bool,
        features: &CpuFeatures,
    ) -> Result<Self, FilterError> {
        if coefs.is_empty() {
            return Err(FilterError::EmptyKernel);
        }
        if coefs.len() > MAX_RADIUS + 1 {
            return Err(FilterError::KernelTooLarge {
                radius: (coefs.len() - 1) as f64,
                max: MAX_RADIUS,
            });
        }
        Ok(Self {
            coefs,
            symmetric,
            correlator: Correlator::resolve(features.backend()),
        })
    }

    /// One-sided coefficient count, including the centre tap.
    #[doc(alias = "get_length")]
    #[allow(clippy::len_without_is_empty)]
    #[inline]
    pub fn len(&self) -> usize {
        self.coefs.len()
    }

    /// Number of taps on each side of the centre.
    #[inline]
    pub fn radius(&self) -> usize {
        self.coefs.len() - 1
    }

    /// The half coefficients, centre first.
    #[inline]
    pub fn coefs(&self) -> &[f32] {
        &self.coefs
    }

    /// Whether the taps at `+k` and `-k` are equal (otherwise they have opposite sign).
    #[inline]
    pub fn is_symmetric(&self) -> bool {
        self.symmetric
    }

    /// The correlation backend bound at construction.
    #[inline]
    pub fn backend(&self) -> Backend {
        self.correlator.backend()
    }

    #[inline]
    pub(crate) fn correlator(&self) -> Correlator {
        self.correlator
    }
}

fn gaussian_coefficients(order: u32, sigma: f64, radius: usize) -> Vec<f32> {
    let s2 = sigma * sigma;
    let norm = 1.0 / ((2.0 * PI).sqrt() * sigma);
    let g = (0..=radius).map(|k| {
        let x = k as f64;
        norm * (-x * x / (2.0 * s2)).exp()
    });

    let coefs: Vec<f64> = match order {
        0 => {
            let taps: Vec<f64> = g.collect();
            let total = taps[0] + 2.0 * taps[1..].iter().sum::<f64>();
            taps.iter().map(|v| v / total).collect()
        }
        1 => {
            let taps: Vec<f64> = g.enumerate().map(|(k, v)| k as f64 / s2 * v).collect();
            let moment: f64 = taps
                .iter()
                .enumerate()
                .map(|(k, v)| 2.0 * k as f64 * v)
                .sum();
            taps.iter().map(|v| v / moment).collect()
        }
        _ => {
            let taps: Vec<f64> = g
                .enumerate()
                .map(|(k, v)| {
                    let x2 = (k * k) as f64;
                    (x2 / s2 - 1.0) / s2 * v
                })
                .collect();
            let mean = (taps[0] + 2.0 * taps[1..].iter().sum::<f64>()) / (2 * radius + 1) as f64;
            let taps: Vec<f64> = taps.iter().map(|v| v - mean).collect();
            let moment: f64 = taps
                .iter()
                .enumerate()
                .map(|(k, v)| (k * k) as f64 * v)
                .sum();
            taps.iter().map(|v| v / moment).collect()
        }
    };

    coefs.into_iter().map(|v| v as f32).collect()
}

/// A kernel usable along any axis of the orchestrator.
#[derive(Clone, Debug, PartialEq)]
pub enum Kernel {
    /// Finite impulse response, correlated with the bound backend.
    Fir(FirKernel),
    /// Recursive Gaussian, scalar only.
    Iir(IirKernel),
}

impl Kernel {
    /// The finite impulse response kernel, if this is one.
    pub fn as_fir(&self) -> Option<&FirKernel> {
        match self {
            Kernel::Fir(k) => Some(k),
            Kernel::Iir(_) => None,
        }
    }

    /// Number of border samples read on each side of a line.
    pub fn radius(&self) -> usize {
        match self {
            Kernel::Fir(k) => k.radius(),
            Kernel::Iir(k) => k.padding(),
        }
    }

    /// Filter lines along the fastest varying axis.
    ///
    /// See [`FirKernel::convolve_inner`].
    pub fn convolve_inner<A: ScratchAllocator>(
        &self,
        src: StridedLines<'_>,
        dst: StridedLinesMut<'_>,
        shape: LineShape,
        borders: &LineBorders<'_>,
        alloc: &A,
    ) -> Result<(), FilterError> {
        match self {
            Kernel::Fir(k) => k.convolve_inner(src, dst, shape, borders, alloc),
            Kernel::Iir(k) => k.convolve(src, dst, shape, borders, alloc),
        }
    }

    /// Filter lines along a slower axis.
    ///
    /// See [`FirKernel::convolve_outer`].
    pub fn convolve_outer<A: ScratchAllocator>(
        &self,
        src: StridedLines<'_>,
        dst: StridedLinesMut<'_>,
        shape: LineShape,
        borders: &LineBorders<'_>,
        alloc: &A,
    ) -> Result<(), FilterError> {
        match self {
            Kernel::Fir(k) => k.convolve_outer(src, dst, shape, borders, alloc),
            Kernel::Iir(k) => k.convolve(src, dst, shape, borders, alloc),
        }
    }
}

impl From<FirKernel> for Kernel {
    fn from(kernel: FirKernel) -> Self {
        Kernel::Fir(kernel)
    }
}

impl From<IirKernel> for Kernel {
    fn from(kernel: IirKernel) -> Self {
        Kernel::Iir(kernel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn full_sum(kernel: &FirKernel) -> f64 {
        let c = kernel.coefs();
        c[0] as f64 + 2.0 * c[1..].iter().map(|&v| v as f64).sum::<f64>()
    }

    #[test]
    fn test_gaussian_kernel_length() -> Result<(), FilterError> {
        let features = CpuFeatures::scalar();
        assert_eq!(FirKernel::gaussian(0, 2.0, 0.0, &features)?.len(), 7);
        assert_eq!(FirKernel::gaussian(1, 2.0, 0.0, &features)?.len(), 8);
        assert_eq!(FirKernel::gaussian(2, 2.0, 0.0, &features)?.len(), 9);
        assert_eq!(FirKernel::gaussian(0, 2.0, 2.2, &features)?.len(), 6);
        assert_eq!(FirKernel::gaussian(0, 0.1, 0.0, &features)?.len(), 2);
        Ok(())
    }

    #[test]
    fn test_gaussian_order0_normalised() -> Result<(), FilterError> {
        let kernel = FirKernel::gaussian(0, 1.5, 0.0, &CpuFeatures::scalar())?;
        assert!(kernel.is_symmetric());
        assert_relative_eq!(full_sum(&kernel), 1.0, epsilon = 1e-6);
        assert!(kernel.coefs().windows(2).all(|w| w[0] > w[1]));
        Ok(())
    }

    #[test]
    fn test_gaussian_order1_moment() -> Result<(), FilterError> {
        let kernel = FirKernel::gaussian(1, 1.5, 0.0, &CpuFeatures::scalar())?;
        assert!(!kernel.is_symmetric());
        assert_eq!(kernel.coefs()[0], 0.0);
        let moment: f64 = kernel
            .coefs()
            .iter()
            .enumerate()
            .map(|(k, &c)| 2.0 * k as f64 * c as f64)
            .sum();
        assert_relative_eq!(moment, 1.0, epsilon = 1e-6);
        Ok(())
    }

    #[test]
    fn test_gaussian_order2_moments() -> Result<(), FilterError> {
        let kernel = FirKernel::gaussian(2, 1.5, 0.0, &CpuFeatures::scalar())?;
        assert!(kernel.is_symmetric());
        assert_relative_eq!(full_sum(&kernel), 0.0, epsilon = 1e-6);
        let moment: f64 = kernel
            .coefs()
            .iter()
            .enumerate()
            .map(|(k, &c)| (k * k) as f64 * c as f64)
            .sum();
        assert_relative_eq!(moment, 1.0, epsilon = 1e-6);
        assert!(kernel.coefs()[0] < 0.0);
        Ok(())
    }

    #[test]
    fn test_gaussian_rejects_invalid_arguments() {
        let features = CpuFeatures::scalar();
        assert_eq!(
            FirKernel::gaussian(0, 0.0, 0.0, &features),
            Err(FilterError::InvalidSigma(0.0))
        );
        assert_eq!(
            FirKernel::gaussian(0, -1.0, 0.0, &features),
            Err(FilterError::InvalidSigma(-1.0))
        );
        assert!(matches!(
            FirKernel::gaussian(0, f64::NAN, 0.0, &features),
            Err(FilterError::InvalidSigma(_))
        ));
        assert_eq!(
            FirKernel::gaussian(3, 1.0, 0.0, &features),
            Err(FilterError::UnsupportedOrder(3))
        );
        assert_eq!(
            FirKernel::from_coefficients(vec![], true, &features),
            Err(FilterError::EmptyKernel)
        );
    }

    #[test]
    fn test_gaussian_rejects_huge_support() -> Result<(), FilterError> {
        let features = CpuFeatures::scalar();
        assert!(matches!(
            FirKernel::gaussian(0, 1e12, 0.0, &features),
            Err(FilterError::KernelTooLarge { max: MAX_RADIUS, .. })
        ));
        assert!(matches!(
            FirKernel::gaussian(1, 1.0, f32::MAX, &features),
            Err(FilterError::KernelTooLarge { .. })
        ));
        assert!(matches!(
            FirKernel::gaussian(2, f64::MAX, 0.0, &features),
            Err(FilterError::KernelTooLarge { .. })
        ));

        // the bound itself is still accepted
        let kernel = FirKernel::gaussian(0, MAX_RADIUS as f64, 1.0, &features)?;
        assert_eq!(kernel.radius(), MAX_RADIUS);
        Ok(())
    }

    #[test]
    fn test_kernel_binds_backend_of_table() -> Result<(), FilterError> {
        let features = CpuFeatures::detect();
        let kernel = FirKernel::gaussian(0, 1.0, 0.0, &features)?;
        assert_eq!(kernel.backend(), features.backend());

        let kernel = FirKernel::gaussian(0, 1.0, 0.0, &CpuFeatures::scalar())?;
        assert_eq!(kernel.backend(), Backend::Scalar);
        Ok(())
    }
}
