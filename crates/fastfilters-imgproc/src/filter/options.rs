use super::BorderTreatment;

/// Settings shared by the convolution orchestrator and the feature recipes.
///
/// # Examples
///
/// ```
/// use fastfilters_imgproc::filter::{BorderTreatment, FilterOptions};
///
/// let options = FilterOptions {
///     window_ratio: 4.0,
///     ..Default::default()
/// };
/// assert_eq!(options.border, BorderTreatment::Mirror);
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct FilterOptions {
    /// Kernel support in multiples of sigma. Zero or negative selects the
    /// order dependent default `3.0 + 0.5 * order`.
    pub window_ratio: f32,
    /// Border policy applied at both ends of every line.
    pub border: BorderTreatment,
}

impl Default for FilterOptions {
    fn default() -> Self {
        Self {
            window_ratio: 0.0,
            border: BorderTreatment::Mirror,
        }
    }
}
