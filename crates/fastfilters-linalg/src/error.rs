use thiserror::Error;

/// An error type for the linear algebra batch operations.
#[derive(Error, Debug, PartialEq)]
pub enum LinalgError {
    /// Input or output slices of a batch call have different lengths.
    #[error("Length mismatch: expected {0} elements, got {1}")]
    LengthMismatch(usize, usize),
}
