use thiserror::Error;

/// Custom Result type for this crate.
pub type Result<T> = std::result::Result<T, WnEditError>;

/// Enum representing all possible errors in the wn_edit library.
#[derive(Error, Debug)]
pub enum WnEditError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("XML parsing error: {0}")]
    XmlParse(#[from] quick_xml::DeError),

    #[error("XML writing error: {0}")]
    XmlWrite(String),

    #[error("Data directory not found or could not be determined")]
    DataDirNotFound,

    /// The relational store lacks tables or columns the bulk reader needs.
    #[error("Incompatible database schema: {0}")]
    SchemaIncompatible(String),

    #[error("Lexicon not found: {0}")]
    LexiconNotFound(String),

    #[error("Lexicon already exists: {0}")]
    LexiconExists(String),

    #[error("Synset not found: {0}")]
    SynsetNotFound(String),

    #[error("Lexical entry not found: {0}")]
    LexicalEntryNotFound(String),

    #[error("Sense not found: {0}")]
    SenseNotFound(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Internal error: {0}")]
    Internal(String), // For unexpected situations
}

impl WnEditError {
    /// True for the errors raised when an identifier is absent from the document.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            WnEditError::SynsetNotFound(_)
                | WnEditError::LexicalEntryNotFound(_)
                | WnEditError::SenseNotFound(_)
        )
    }
}

