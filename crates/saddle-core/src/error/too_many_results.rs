use super::Error;

/// Error when an operation expects at most one result but finds multiple.
///
/// `select_one` promises: zero rows yield `None`, one row yields the value,
/// and anything more is this error, carrying the actual count.
#[derive(Debug)]
pub(super) struct TooManyResultsError {
    count: usize,
}

impl std::error::Error for TooManyResultsError {}

impl core::fmt::Display for TooManyResultsError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "expected one result (or none) but found: {}", self.count)
    }
}

impl Error {
    /// Creates a too many results error carrying the observed row count.
    pub fn too_many_results(count: usize) -> Error {
        Error::from(super::ErrorKind::TooManyResults(TooManyResultsError {
            count,
        }))
    }

    /// Returns `true` if this error is a too many results error.
    pub fn is_too_many_results(&self) -> bool {
        matches!(self.kind(), super::ErrorKind::TooManyResults(_))
    }
}
