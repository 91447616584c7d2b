//! Error types for SVM training, prediction and model I/O

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SVMError {
    /// Configuration rejected before any solve starts
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Empty dataset")]
    EmptyDataset,

    /// Problem file syntax error
    #[error("Parse error at line {line}: {message}")]
    ParseError { line: usize, message: String },

    /// Malformed or incomplete model text
    #[error("Model format error: {0}")]
    ModelFormat(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, SVMError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = SVMError::InvalidParameter("C <= 0".to_string());
        assert_eq!(err.to_string(), "Invalid parameter: C <= 0");

        let err = SVMError::ParseError {
            line: 3,
            message: "bad token".to_string(),
        };
        assert_eq!(err.to_string(), "Parse error at line 3: bad token");
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: SVMError = io.into();
        assert!(matches!(err, SVMError::IoError(_)));
    }
}
