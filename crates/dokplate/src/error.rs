//! Error types for template operations

use thiserror::Error;

/// Errors that can occur while processing a DOCX template
#[derive(Error, Debug)]
pub enum TemplateError {
    /// Error reading or writing the ZIP archive
    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    /// Error reading or writing files
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Error parsing XML content
    #[error("XML parsing error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// Required file not found in archive
    #[error("Required file not found: {0}")]
    MissingFile(String),

    /// Placeholder not present in the main document part
    #[error("Template variable not found or variable contains markup: {0}")]
    VariableNotFound(String),

    /// Paragraph or manifest boundaries could not be located
    #[error("Invalid document structure: {0}")]
    InvalidStructure(String),

    /// Image with an unknown extension or undecodable content
    #[error("Unsupported or unreadable image {path}: {reason}")]
    UnsupportedImage {
        /// Source file of the image
        path: String,
        /// Why the image was rejected
        reason: String,
    },

    /// Every generated identifier collided with the buffer
    #[error("Could not generate a free identifier with prefix {prefix} after {attempts} attempts")]
    IdentifiersExhausted {
        /// Identifier prefix, e.g. `rId`
        prefix: String,
        /// Number of candidates tried
        attempts: u32,
    },

    /// Configuration could not be parsed
    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// Configuration parsed but is not usable
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for template operations
pub type Result<T> = std::result::Result<T, TemplateError>;
