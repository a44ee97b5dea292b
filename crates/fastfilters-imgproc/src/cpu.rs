//! Runtime detection of the instruction-set extensions used by the convolution backends.
//!
//! The processor is probed once per process and the result is cached. A
//! [`CpuFeatures`] value starts from that probe and may switch individual
//! extensions off (and back on) to force a slower [`Backend`], which is how the
//! SIMD realizations are compared against the scalar one.

use std::{fmt, sync::OnceLock};

/// An instruction-set extension the convolution backends can use.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CpuFeature {
    /// 256-bit floating point vectors.
    Avx,
    /// Fused multiply-add.
    Fma,
    /// 256-bit integer vectors.
    Avx2,
}

impl CpuFeature {
    /// Every feature known to the dispatch table.
    pub const ALL: [CpuFeature; 3] = [CpuFeature::Avx, CpuFeature::Fma, CpuFeature::Avx2];

    #[inline]
    fn bit(self) -> u8 {
        match self {
            CpuFeature::Avx => 1,
            CpuFeature::Fma => 1 << 1,
            CpuFeature::Avx2 => 1 << 2,
        }
    }
}

impl fmt::Display for CpuFeature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CpuFeature::Avx => "avx",
            CpuFeature::Fma => "fma",
            CpuFeature::Avx2 => "avx2",
        };
        f.write_str(name)
    }
}

/// The realization of the correlation primitive bound to a kernel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Backend {
    /// Portable scalar code.
    Scalar,
    /// 256-bit AVX multiply and add.
    Avx,
    /// 256-bit fused multiply-add, requires AVX, AVX2 and FMA.
    AvxFma,
}

static HARDWARE: OnceLock<u8> = OnceLock::new();

fn hardware() -> u8 {
    *HARDWARE.get_or_init(|| {
        let bits = probe();
        log::debug!(
            "detected cpu features: avx={} fma={} avx2={}",
            bits & CpuFeature::Avx.bit() != 0,
            bits & CpuFeature::Fma.bit() != 0,
            bits & CpuFeature::Avx2.bit() != 0,
        );
        bits
    })
}

#[cfg(target_arch = "x86_64")]
fn probe() -> u8 {
    let mut bits = 0;
    if is_x86_feature_detected!("avx") {
        bits |= CpuFeature::Avx.bit();
    }
    if is_x86_feature_detected!("fma") {
        bits |= CpuFeature::Fma.bit();
    }
    if is_x86_feature_detected!("avx2") {
        bits |= CpuFeature::Avx2.bit();
    }
    bits
}

#[cfg(not(target_arch = "x86_64"))]
fn probe() -> u8 {
    0
}

/// The dispatch table: which extensions the processor has and which are enabled.
///
/// An extension is *effective* when it is both present and enabled. Only
/// effective extensions are ever used by a backend.
///
/// # Examples
///
/// ```
/// use fastfilters_imgproc::cpu::{Backend, CpuFeature, CpuFeatures};
///
/// let mut features = CpuFeatures::detect();
/// features.enable(CpuFeature::Avx, false);
///
/// assert!(!features.check(CpuFeature::Avx));
/// assert_eq!(features.backend(), Backend::Scalar);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CpuFeatures {
    hardware: u8,
    enabled: u8,
}

impl CpuFeatures {
    /// Every extension the processor supports, all enabled.
    pub fn detect() -> Self {
        let hardware = hardware();
        Self {
            hardware,
            enabled: hardware,
        }
    }

    /// No extension enabled; kernels built from this table use the scalar backend.
    pub fn scalar() -> Self {
        Self {
            hardware: hardware(),
            enabled: 0,
        }
    }

    /// Whether `feature` is present and enabled.
    #[inline]
    pub fn check(&self, feature: CpuFeature) -> bool {
        self.hardware & self.enabled & feature.bit() != 0
    }

    /// Whether the processor supports `feature`, regardless of overrides.
    #[inline]
    pub fn is_supported(&self, feature: CpuFeature) -> bool {
        self.hardware & feature.bit() != 0
    }

    /// Switch `feature` on or off and return whether it was effective before.
    ///
    /// Enabling an extension the processor lacks has no effect.
    pub fn enable(&mut self, feature: CpuFeature, on: bool) -> bool {
        let previous = self.check(feature);
        if on {
            self.enabled |= feature.bit() & self.hardware;
        } else {
            self.enabled &= !feature.bit();
        }
        previous
    }

    /// The fastest backend the effective extensions allow.
    pub fn backend(&self) -> Backend {
        let avx = self.check(CpuFeature::Avx);
        if avx && self.check(CpuFeature::Avx2) && self.check(CpuFeature::Fma) {
            Backend::AvxFma
        } else if avx {
            Backend::Avx
        } else {
            Backend::Scalar
        }
    }
}

impl Default for CpuFeatures {
    fn default() -> Self {
        Self::detect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_is_idempotent() {
        assert_eq!(CpuFeatures::detect(), CpuFeatures::detect());
    }

    #[test]
    fn test_enable_returns_previous_state() {
        let mut features = CpuFeatures::detect();
        for feature in CpuFeature::ALL {
            let present = features.is_supported(feature);
            assert_eq!(features.check(feature), present);
            assert_eq!(features.enable(feature, false), present);
            assert!(!features.check(feature));
            assert!(!features.enable(feature, true));
            assert_eq!(features.check(feature), present);
        }
    }

    #[test]
    fn test_enable_never_adds_missing_hardware() {
        let mut features = CpuFeatures {
            hardware: 0,
            enabled: 0,
        };
        for feature in CpuFeature::ALL {
            assert!(!features.enable(feature, true));
            assert!(!features.check(feature));
        }
        assert_eq!(features.backend(), Backend::Scalar);
    }

    #[test]
    fn test_backend_resolution() {
        let all = CpuFeature::Avx.bit() | CpuFeature::Fma.bit() | CpuFeature::Avx2.bit();
        let mut features = CpuFeatures {
            hardware: all,
            enabled: all,
        };
        assert_eq!(features.backend(), Backend::AvxFma);

        features.enable(CpuFeature::Fma, false);
        assert_eq!(features.backend(), Backend::Avx);

        features.enable(CpuFeature::Fma, true);
        features.enable(CpuFeature::Avx2, false);
        assert_eq!(features.backend(), Backend::Avx);

        features.enable(CpuFeature::Avx, false);
        assert_eq!(features.backend(), Backend::Scalar);
    }

    #[test]
    fn test_scalar_table() {
        let features = CpuFeatures::scalar();
        assert_eq!(features.backend(), Backend::Scalar);
        for feature in CpuFeature::ALL {
            assert!(!features.check(feature));
        }
    }
}
