use thiserror::Error;
use crate::types::RecordId;

/// Input validation errors, reported per row or per field
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Invalid URL format: {url}")]
    InvalidUrl { url: String },

    /// Form-level rejection of an unparsable link
    #[error("Please enter a valid URL")]
    MalformedLink { link: String },

    #[error("{field} is required")]
    MissingField { field: String },

    #[error("This link already exists in your models list")]
    DuplicateLink { link: String },

    #[error("This link exists in your blacklist")]
    BlacklistedLink { link: String },

    #[error("CSV file must have at least a header row and one data row")]
    CsvTooShort,

    #[error("Please select a CSV file: {path}")]
    NotCsvFile { path: String },

    #[error("Please map at least one column to 'Profile Link'")]
    LinkColumnNotMapped,

    #[error("Only one column may map to 'Profile Link', found {count}")]
    LinkColumnAmbiguous { count: usize },

    #[error("No valid records to import")]
    NothingToCommit,
}

/// Record store errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("{entity} not found: {id}")]
    RecordNotFound { entity: &'static str, id: RecordId },

    #[error("Storage backend failure: {details}")]
    Backend { details: String },
}

/// Cross-entity move failures
#[derive(Debug, Error)]
pub enum RelocationError {
    #[error("Move failed, destination copy {destination_id} was rolled back: {reason}")]
    RolledBack { destination_id: RecordId, reason: String },

    #[error("Move left record in both sets (source {source_id}, destination {destination_id}): {reason}")]
    Inconsistent {
        source_id: RecordId,
        destination_id: RecordId,
        reason: String,
    },
}

/// General system errors
#[derive(Debug, Error)]
pub enum SystemError {
    #[error("Configuration error: {details}")]
    Configuration { details: String },

    #[error("IO error: {source}")]
    IO {
        #[from]
        source: std::io::Error,
    },

    #[error("Serialization error: {source}")]
    Serialization {
        #[from]
        source: serde_json::Error,
    },

    #[error("Export failed: {details}")]
    Export { details: String },

    #[error("Unknown error: {details}")]
    Unknown { details: String },
}

/// Main error type for the outreach tracker
#[derive(Debug, Error)]
pub enum OutreachError {
    #[error("Validation error: {source}")]
    Validation {
        #[from]
        source: ValidationError,
    },

    #[error("Storage error: {source}")]
    Storage {
        #[from]
        source: StorageError,
    },

    #[error("Relocation error: {source}")]
    Relocation {
        #[from]
        source: RelocationError,
    },

    #[error("System error: {source}")]
    System {
        #[from]
        source: SystemError,
    },
}

impl OutreachError {
    /// Shorthand for a backend failure with context
    pub fn backend(details: impl Into<String>) -> Self {
        StorageError::Backend { details: details.into() }.into()
    }

    pub fn not_found(entity: &'static str, id: RecordId) -> Self {
        StorageError::RecordNotFound { entity, id }.into()
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, OutreachError::Validation { .. })
    }
}

impl From<std::io::Error> for OutreachError {
    fn from(source: std::io::Error) -> Self {
        SystemError::IO { source }.into()
    }
}

impl From<serde_json::Error> for OutreachError {
    fn from(source: serde_json::Error) -> Self {
        SystemError::Serialization { source }.into()
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, OutreachError>;
