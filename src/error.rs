//! Error types for docconv.
//!
//! Structural problems abort a conversion. Per-asset and sanitizer problems
//! are recovered where they happen and never surface through this type.

/// Error type for conversion operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The container or one of its required parts is unreadable, or the
    /// document lacks the structure every conversion needs.
    #[error("Unsupported or corrupt document: {0}")]
    FormatError(String),

    /// An attribute that must be numeric carries something else.
    #[error("Invalid value {value:?} for attribute {attribute} on <{element}>")]
    ElementDataError {
        /// Qualified name of the offending element, e.g. `text:h`.
        element: String,
        /// Qualified name of the attribute, e.g. `text:outline-level`.
        attribute: String,
        /// The raw attribute value.
        value: String,
    },

    /// An image store could not persist an asset.
    #[error("Image storage failed: {0}")]
    StorageError(String),

    /// The sanitizer could not complete. Callers of [`crate::sanitize`]
    /// never see this; they get the unsanitized input back instead.
    #[error("Sanitization failed: {0}")]
    SanitizationError(String),
}

/// Result type alias for conversion operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Whether this error aborts the conversion that raised it.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::StorageError(_) | Self::SanitizationError(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_element_data_error_message() {
        let err = Error::ElementDataError {
            element: "text:s".into(),
            attribute: "text:c".into(),
            value: "many".into(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid value \"many\" for attribute text:c on <text:s>"
        );
        assert!(err.is_fatal());
    }

    #[test]
    fn test_storage_error_is_recoverable() {
        assert!(!Error::StorageError("disk full".into()).is_fatal());
        assert!(!Error::SanitizationError("no body".into()).is_fatal());
        assert!(Error::FormatError("no body".into()).is_fatal());
    }
}
