use thiserror::Error;

/// Why a page-range text was rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PageRangeError {
    #[error("Invalid page range syntax: {0}")]
    Syntax(String),

    #[error("Page {page} is out of range (document has {max_page} pages)")]
    OutOfRange { page: u64, max_page: u32 },

    #[error("Page range is empty")]
    Empty,
}

/// Failure categories surfaced to the user, one message each.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    InvalidInput,
    RangeSyntax,
    RangeOutOfBounds,
    CorruptOrProtected,
    RenderFailure,
    PreconditionViolation,
}

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error(transparent)]
    Range(#[from] PageRangeError),

    #[error("Document is corrupted or password protected: {0}")]
    CorruptOrProtected(String),

    #[error("Rendering failed: {0}")]
    RenderFailure(String),

    #[error("Precondition violated: {0}")]
    PreconditionViolation(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, EngineError>;

impl EngineError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            EngineError::InvalidInput(_) => ErrorCategory::InvalidInput,
            EngineError::Range(PageRangeError::OutOfRange { .. }) => {
                ErrorCategory::RangeOutOfBounds
            }
            EngineError::Range(_) => ErrorCategory::RangeSyntax,
            EngineError::CorruptOrProtected(_) => ErrorCategory::CorruptOrProtected,
            EngineError::RenderFailure(_) => ErrorCategory::RenderFailure,
            EngineError::PreconditionViolation(_) | EngineError::Serialization(_) => {
                ErrorCategory::PreconditionViolation
            }
        }
    }

    /// The single message shown to the user for this failure.
    pub fn user_message(&self) -> String {
        match self {
            EngineError::InvalidInput(detail) => {
                format!("This file type is not supported by this tool ({})", detail)
            }
            EngineError::Range(PageRangeError::Empty) => {
                "Please enter the pages to use, e.g. 1-3, 5".to_string()
            }
            EngineError::Range(PageRangeError::Syntax(_)) => {
                "Invalid page range. Use numbers and ranges like 1-3, 5, 8-10".to_string()
            }
            EngineError::Range(PageRangeError::OutOfRange { max_page, .. }) => {
                format!("Page numbers must be between 1 and {}", max_page)
            }
            EngineError::CorruptOrProtected(_) => {
                "The document could not be opened. It may be corrupted or password protected"
                    .to_string()
            }
            EngineError::RenderFailure(_) => {
                "The conversion failed. The document may contain unsupported content".to_string()
            }
            EngineError::PreconditionViolation(_) | EngineError::Serialization(_) => {
                "The conversion failed due to an internal error".to_string()
            }
        }
    }
}

impl From<lopdf::Error> for EngineError {
    fn from(err: lopdf::Error) -> Self {
        EngineError::CorruptOrProtected(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = EngineError::from(PageRangeError::OutOfRange {
            page: 10,
            max_page: 5,
        });
        assert_eq!(
            err.to_string(),
            "Page 10 is out of range (document has 5 pages)"
        );
    }

    #[test]
    fn test_range_categories() {
        let syntax = EngineError::from(PageRangeError::Syntax("x".into()));
        let empty = EngineError::from(PageRangeError::Empty);
        let bounds = EngineError::from(PageRangeError::OutOfRange {
            page: 0,
            max_page: 3,
        });
        assert_eq!(syntax.category(), ErrorCategory::RangeSyntax);
        assert_eq!(empty.category(), ErrorCategory::RangeSyntax);
        assert_eq!(bounds.category(), ErrorCategory::RangeOutOfBounds);
    }

    #[test]
    fn test_user_message_mentions_page_count() {
        let err = EngineError::from(PageRangeError::OutOfRange {
            page: 9,
            max_page: 4,
        });
        assert!(err.user_message().contains('4'));
    }

    #[test]
    fn test_precondition_message_is_generic() {
        let err = EngineError::PreconditionViolation("raster width is 0".into());
        assert_eq!(err.category(), ErrorCategory::PreconditionViolation);
        assert!(!err.user_message().contains("raster"));
    }
}
