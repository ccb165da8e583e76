use super::Error;

/// Error when an operation is attempted on a closed executor.
///
/// Closing an executor is terminal: the transaction and connection have been
/// released and no further statements can run through it.
#[derive(Debug)]
pub(super) struct ExecutorClosedError;

impl std::error::Error for ExecutorClosedError {}

impl core::fmt::Display for ExecutorClosedError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        f.write_str("executor is closed")
    }
}

impl Error {
    /// Creates an executor closed error.
    pub fn executor_closed() -> Error {
        Error::from(super::ErrorKind::ExecutorClosed(ExecutorClosedError))
    }

    /// Returns `true` if this error is an executor closed error.
    pub fn is_executor_closed(&self) -> bool {
        matches!(self.kind(), super::ErrorKind::ExecutorClosed(_))
    }
}
