use fastfilters_image::{CpuAllocator, ScratchAllocator};

use crate::{
    cpu::{CpuFeature, CpuFeatures},
    error::FilterError,
    filter::{FirKernel, IirKernel, Kernel},
};

/// The dispatch table and scratch allocator every filter call runs with.
///
/// A context is cheap to create and immutable while filters run; overriding a
/// CPU feature needs `&mut self`, so it can never race with a convolution.
/// Creating a fresh context restores the detected features.
///
/// # Examples
///
/// ```
/// use fastfilters_imgproc::context::Context;
/// use fastfilters_imgproc::cpu::CpuFeature;
///
/// let mut ctx = Context::new();
/// ctx.cpu_enable(CpuFeature::Avx, false);
/// assert!(!ctx.cpu_check(CpuFeature::Avx));
///
/// let kernel = ctx.kernel_fir_gaussian(1, 2.0, 0.0).unwrap();
/// assert_eq!(kernel.radius(), 7);
/// ```
#[derive(Clone, Debug)]
pub struct Context<A: ScratchAllocator = CpuAllocator> {
    features: CpuFeatures,
    allocator: A,
}

impl Context<CpuAllocator> {
    /// Probe the processor and use the system allocator for scratch memory.
    pub fn new() -> Self {
        Self::with_allocator(CpuAllocator)
    }
}

impl Default for Context<CpuAllocator> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: ScratchAllocator> Context<A> {
    /// Probe the processor and take scratch memory from `allocator`.
    pub fn with_allocator(allocator: A) -> Self {
        let features = CpuFeatures::detect();
        log::debug!("filter context backend: {:?}", features.backend());
        Self {
            features,
            allocator,
        }
    }

    /// Use an explicit dispatch table instead of the detected one.
    pub fn with_features(mut self, features: CpuFeatures) -> Self {
        self.features = features;
        self
    }

    /// Whether `feature` is present and enabled.
    pub fn cpu_check(&self, feature: CpuFeature) -> bool {
        self.features.check(feature)
    }

    /// Switch `feature` on or off and return whether it was effective before.
    ///
    /// Kernels built earlier keep the backend they were bound to.
    pub fn cpu_enable(&mut self, feature: CpuFeature, on: bool) -> bool {
        let previous = self.features.enable(feature, on);
        log::debug!(
            "cpu feature {feature} set to {on}, backend now {:?}",
            self.features.backend()
        );
        previous
    }

    /// The dispatch table.
    pub fn features(&self) -> &CpuFeatures {
        &self.features
    }

    /// The scratch allocator.
    pub fn allocator(&self) -> &A {
        &self.allocator
    }

    /// Build a Gaussian derivative FIR kernel bound to the current backend.
    ///
    /// See [`FirKernel::gaussian`].
    pub fn kernel_fir_gaussian(
        &self,
        order: u32,
        sigma: f64,
        window_ratio: f32,
    ) -> Result<Kernel, FilterError> {
        FirKernel::gaussian(order, sigma, window_ratio, &self.features).map(Kernel::Fir)
    }

    /// Build a recursive Gaussian derivative kernel.
    ///
    /// See [`IirKernel::gaussian`].
    pub fn kernel_iir_gaussian(
        &self,
        order: u32,
        sigma: f64,
        window_ratio: f32,
    ) -> Result<Kernel, FilterError> {
        IirKernel::gaussian(order, sigma, window_ratio).map(Kernel::Iir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cpu::Backend;

    #[test]
    fn test_fresh_context_restores_features() {
        let mut ctx = Context::new();
        for feature in CpuFeature::ALL {
            ctx.cpu_enable(feature, false);
        }
        assert_eq!(ctx.features().backend(), Backend::Scalar);

        let fresh = Context::new();
        assert_eq!(fresh.features(), &CpuFeatures::detect());
    }

    #[test]
    fn test_kernels_keep_their_backend() -> Result<(), FilterError> {
        let mut ctx = Context::new();
        let before = ctx.kernel_fir_gaussian(0, 1.0, 0.0)?;
        ctx.cpu_enable(CpuFeature::Avx, false);
        let after = ctx.kernel_fir_gaussian(0, 1.0, 0.0)?;

        assert_eq!(
            before.as_fir().map(|k| k.backend()),
            Some(CpuFeatures::detect().backend())
        );
        assert_eq!(after.as_fir().map(|k| k.backend()), Some(Backend::Scalar));
        Ok(())
    }

    #[test]
    fn test_kernel_builders_propagate_errors() {
        let ctx = Context::new();
        assert_eq!(
            ctx.kernel_fir_gaussian(0, -2.0, 0.0),
            Err(FilterError::InvalidSigma(-2.0))
        );
        assert_eq!(
            ctx.kernel_iir_gaussian(5, 2.0, 0.0),
            Err(FilterError::UnsupportedOrder(5))
        );
    }
}
