//! Unified error handling for LiteCNN
//!
//! One error type covers the whole crate. Variants are grouped by the
//! category used for handling decisions:
//! - Format errors (weight file parsing)
//! - Model errors (parameters missing from the weight store)
//! - Shape errors (kernel and reshape preconditions)
//! - Decode errors (image collaborator failures)
//! - User errors (bad request or configuration)

use std::fmt;

/// Unified error type for LiteCNN
#[derive(Debug, thiserror::Error)]
pub enum LiteCnnError {
    // ========== Weight File Errors ==========
    /// Magic tag at the start of the weight file did not match
    #[error("Invalid weight file magic: expected {expected:?}, found {found:?}")]
    InvalidMagic { expected: [u8; 4], found: Vec<u8> },

    /// Stream ended before a field could be read completely
    #[error("Truncated weight file while reading {what} at byte {offset}: need {needed} bytes, {available} available")]
    TruncatedWeightFile {
        what: String,
        offset: usize,
        needed: usize,
        available: usize,
    },

    /// Structurally invalid weight file (bad name encoding, overflowing dims, ...)
    #[error("Invalid weight file: {0}")]
    InvalidWeightFile(String),

    // ========== Model Errors ==========
    /// One or more parameters are absent from the weight store
    #[error("Missing parameters: {}", .0.join(", "))]
    MissingParameters(Vec<String>),

    // ========== Shape Errors ==========
    /// Operator precondition violated (channel counts, groups, ranks)
    #[error("Shape mismatch: {0}")]
    ShapeMismatch(String),

    /// Tensor constructed or reshaped with an inconsistent shape
    #[error("Invalid tensor shape: {0}")]
    InvalidTensorShape(String),

    // ========== Decode Errors ==========
    /// The image could not be decoded
    #[error("Image decode failed: {0}")]
    ImageDecodeFailed(String),

    // ========== User Errors ==========
    /// Invalid client request
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Invalid top_k value
    #[error("Invalid top_k: {0}. Must be > 0")]
    InvalidTopK(usize),

    /// Empty score vector handed to response synthesis
    #[error("Empty score vector")]
    EmptyScores,

    /// Invalid engine or server configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Label map file could not be parsed
    #[error("Invalid label map: {0}")]
    LabelMapInvalid(String),

    // ========== Service Errors ==========
    /// No engine has been loaded
    #[error("Inference engine not initialized")]
    EngineNotInitialized,

    // ========== I/O Errors ==========
    /// File I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    // ========== Internal Errors ==========
    /// Internal error (indicates a bug)
    #[error("Internal error: {0}")]
    InternalError(String),
}

impl LiteCnnError {
    /// Categorize the error for handling decisions
    pub fn category(&self) -> ErrorCategory {
        match self {
            LiteCnnError::InvalidMagic { .. }
            | LiteCnnError::TruncatedWeightFile { .. }
            | LiteCnnError::InvalidWeightFile(_)
            | LiteCnnError::IoError(_) => ErrorCategory::Format,

            LiteCnnError::MissingParameters(_) => ErrorCategory::Model,

            LiteCnnError::ShapeMismatch(_) | LiteCnnError::InvalidTensorShape(_) => {
                ErrorCategory::Shape
            }

            LiteCnnError::ImageDecodeFailed(_) => ErrorCategory::Decode,

            LiteCnnError::InvalidRequest(_)
            | LiteCnnError::InvalidTopK(_)
            | LiteCnnError::EmptyScores
            | LiteCnnError::InvalidConfiguration(_)
            | LiteCnnError::LabelMapInvalid(_) => ErrorCategory::User,

            LiteCnnError::EngineNotInitialized => ErrorCategory::Recoverable,

            LiteCnnError::InternalError(_) => ErrorCategory::Internal,
        }
    }

    /// Check if the caller may retry later
    pub fn is_recoverable(&self) -> bool {
        matches!(self.category(), ErrorCategory::Recoverable)
    }

    /// Check if this error was caused by the caller's input
    ///
    /// Undecodable images count as caller input.
    pub fn is_user_error(&self) -> bool {
        matches!(self.category(), ErrorCategory::User | ErrorCategory::Decode)
    }

    /// Names of missing parameters, if this is a missing-parameter error
    pub fn missing_parameters(&self) -> Option<&[String]> {
        match self {
            LiteCnnError::MissingParameters(names) => Some(names),
            _ => None,
        }
    }
}

/// Error category for handling decisions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Weight file is malformed or unreadable
    Format,
    /// Weight store lacks parameters the graph needs
    Model,
    /// Tensor shapes violate an operator precondition
    Shape,
    /// Image decoding failed
    Decode,
    /// Invalid input or configuration
    User,
    /// Temporary condition, retry later
    Recoverable,
    /// Indicates a bug
    Internal,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCategory::Format => write!(f, "Format"),
            ErrorCategory::Model => write!(f, "Model"),
            ErrorCategory::Shape => write!(f, "Shape"),
            ErrorCategory::Decode => write!(f, "Decode"),
            ErrorCategory::User => write!(f, "User"),
            ErrorCategory::Recoverable => write!(f, "Recoverable"),
            ErrorCategory::Internal => write!(f, "Internal"),
        }
    }
}

/// Result alias used throughout the crate
pub type LiteCnnResult<T> = std::result::Result<T, LiteCnnError>;

/// Create a shape-mismatch error with context
///
/// # Examples
/// ```ignore
/// return Err(shape_error!("conv2d: expected 4-D input, got {:?}", shape));
/// ```
#[macro_export]
macro_rules! shape_error {
    ($msg:expr) => {
        $crate::error::LiteCnnError::ShapeMismatch($msg.to_string())
    };
    ($fmt:expr, $($arg:tt)*) => {
        $crate::error::LiteCnnError::ShapeMismatch(format!($fmt, $($arg)*))
    };
}

/// Create an invalid-weight-file error with context
#[macro_export]
macro_rules! format_error {
    ($msg:expr) => {
        $crate::error::LiteCnnError::InvalidWeightFile($msg.to_string())
    };
    ($fmt:expr, $($arg:tt)*) => {
        $crate::error::LiteCnnError::InvalidWeightFile(format!($fmt, $($arg)*))
    };
}

/// Wrap an IO error with context
///
/// # Examples
/// ```ignore
/// let file = File::open(path).map_err(|e| io_context(e, "opening weights"))?;
/// ```
pub fn io_context(err: std::io::Error, msg: &str) -> LiteCnnError {
    LiteCnnError::IoError(std::io::Error::new(
        err.kind(),
        format!("{}: {}", msg, err),
    ))
}
