use thiserror::Error;

/// Result type alias for devca operations
pub type Result<T> = std::result::Result<T, CaError>;

/// Errors that can occur while managing the local certificate authority
#[derive(Error, Debug)]
pub enum CaError {
    /// A requested validity duration was zero or negative
    #[error("invalid validity duration: {0}")]
    InvalidDuration(String),

    /// A serial number was out of range or unparseable
    #[error("invalid serial number: {0}")]
    InvalidSerial(String),

    /// The authority files are missing and the operation requires them
    #[error("certificate authority not found: {0}")]
    AuthorityMissing(String),

    /// Reading or writing the persisted authority record failed
    #[error("authority store error: {0}")]
    Store(String),

    /// Certificate generation or signing failed
    #[error("certificate error: {0}")]
    Certificate(String),

    /// PEM decoding of a certificate or key file failed
    #[error("pem decode error in {path}: {reason}")]
    Pem {
        /// File the undecodable PEM came from
        path: String,
        /// Parser diagnostic
        reason: String,
    },

    /// An external command could not be executed
    #[error("command execution failed: {0}")]
    Command(String),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CaError {
    /// Returns true if the error means the caller passed bad input
    #[must_use]
    pub const fn is_input_error(&self) -> bool {
        matches!(self, Self::InvalidDuration(_) | Self::InvalidSerial(_))
    }

    /// Returns true if the error is fatal to the calling operation.
    ///
    /// Persistence failures are always fatal: no certificate may be
    /// returned without a durable, complete authority record.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::Store(_) | Self::Io(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification_predicates() {
        assert!(CaError::InvalidDuration("zero".to_string()).is_input_error());
        assert!(!CaError::InvalidDuration("zero".to_string()).is_fatal());
        assert!(CaError::Store("disk full".to_string()).is_fatal());
        assert!(!CaError::Command("spawn failed".to_string()).is_fatal());
    }

    #[test]
    fn test_io_errors_convert() {
        let e: CaError = std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
        assert!(e.is_fatal());
        assert!(e.to_string().contains("io error"));
    }
}
