use super::Error;

/// Error when a statement identifier is not present in the catalogue.
#[derive(Debug)]
pub(super) struct UnknownStatementError {
    id: Box<str>,
}

impl std::error::Error for UnknownStatementError {}

impl core::fmt::Display for UnknownStatementError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "unknown statement: {}", self.id)
    }
}

impl Error {
    /// Creates an unknown statement error naming the missing identifier.
    pub fn unknown_statement(id: impl Into<String>) -> Error {
        Error::from(super::ErrorKind::UnknownStatement(UnknownStatementError {
            id: id.into().into(),
        }))
    }

    /// Returns `true` if this error is an unknown statement error.
    pub fn is_unknown_statement(&self) -> bool {
        matches!(self.kind(), super::ErrorKind::UnknownStatement(_))
    }
}
