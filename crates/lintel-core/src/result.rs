//! Result type alias for lintel operations

use crate::error::LintelError;

/// Standard Result type for lintel operations
pub type Result<T> = std::result::Result<T, LintelError>;

/// Extension trait for Result to provide additional convenience methods
pub trait ResultExt<T> {
    /// Turn recoverable errors into `Ok(None)`, keep fatal ones
    fn recoverable(self) -> Result<Option<T>>;
}

impl<T> ResultExt<T> for Result<T> {
    fn recoverable(self) -> Result<Option<T>> {
        match self {
            Ok(value) => Ok(Some(value)),
            Err(err) if err.is_recoverable() => {
                tracing::warn!(kind = err.kind().as_str(), "Recoverable error: {}", err);
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }
}
