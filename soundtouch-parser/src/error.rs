//! Error types for codec operations

use thiserror::Error;

/// Errors that can occur while encoding or decoding protocol XML
#[derive(Error, Debug)]
pub enum ParseError {
    /// XML deserialization failed
    #[error("XML deserialization failed: {0}")]
    XmlDeserializationFailed(String),

    /// The document contains no root element
    #[error("document has no root element")]
    MissingRootElement,

    /// A required element was absent from an otherwise valid document
    #[error("missing required element: {0}")]
    MissingRequiredElement(String),
}

/// Result type alias for codec operations
pub type ParseResult<T> = Result<T, ParseError>;
