use super::Error;

/// Error from the mapper binding layer.
///
/// This occurs when:
/// - A mapper interface is registered twice, or looked up without being registered
/// - A mapper method does not resolve to a known statement
/// - A named parameter is missing from a parameter object
#[derive(Debug)]
pub(super) struct BindingError {
    message: Box<str>,
}

impl std::error::Error for BindingError {}

impl core::fmt::Display for BindingError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "binding error: {}", self.message)
    }
}

impl Error {
    /// Creates a binding error.
    pub fn binding(message: impl Into<String>) -> Error {
        Error::from(super::ErrorKind::Binding(BindingError {
            message: message.into().into(),
        }))
    }

    /// Returns `true` if this error is a binding error.
    pub fn is_binding(&self) -> bool {
        matches!(self.kind(), super::ErrorKind::Binding(_))
    }
}
