use thiserror::Error;

/// Result type alias using CaseWatchError
pub type Result<T> = std::result::Result<T, CaseWatchError>;

// ========== Error Facility ==========

/// Canonical error kind taxonomy
///
/// Each kind maps to a stable error code that can be used for programmatic
/// error handling, testing, and the machine-readable run output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExErrorKind {
    // Structural/Validation
    InvalidInput,
    NotFound,
    /// A section's text cannot be compared (e.g. binary content)
    MalformedSection,
    /// A previous summary lacks the data needed for a comparison
    MissingBaseline,
    InvariantViolation,

    // Collaborators
    /// The fetched document does not have the expected structure
    Extraction,
    /// Network retrieval failed after retries
    Fetch,
    Timeout,

    // Integration/IO
    Io,
    Serialization,
    Persistence,
    /// The state file exists but cannot be decoded
    StateCorrupt,
    Config,

    // Internal
    Internal,
}

impl ExErrorKind {
    /// Get the stable error code for this kind
    pub fn code(&self) -> &'static str {
        match self {
            ExErrorKind::InvalidInput => "ERR_INVALID_INPUT",
            ExErrorKind::NotFound => "ERR_NOT_FOUND",
            ExErrorKind::MalformedSection => "ERR_MALFORMED_SECTION",
            ExErrorKind::MissingBaseline => "ERR_MISSING_BASELINE",
            ExErrorKind::InvariantViolation => "ERR_INVARIANT_VIOLATION",
            ExErrorKind::Extraction => "ERR_EXTRACTION",
            ExErrorKind::Fetch => "ERR_FETCH",
            ExErrorKind::Timeout => "ERR_TIMEOUT",
            ExErrorKind::Io => "ERR_IO",
            ExErrorKind::Serialization => "ERR_SERIALIZATION",
            ExErrorKind::Persistence => "ERR_PERSISTENCE",
            ExErrorKind::StateCorrupt => "ERR_STATE_CORRUPT",
            ExErrorKind::Config => "ERR_CONFIG",
            ExErrorKind::Internal => "ERR_INTERNAL",
        }
    }
}

/// Canonical structured error type
///
/// Carries a classification for programmatic handling plus optional context
/// (operation, record, section) for diagnostics.
#[derive(Debug, Clone)]
pub struct ExError {
    kind: ExErrorKind,
    op: Option<String>,
    record_id: Option<String>,
    section_id: Option<String>,
    message: String,
    source: Option<Box<ExError>>,
}

impl ExError {
    /// Create a new error with the specified kind
    pub fn new(kind: ExErrorKind) -> Self {
        Self {
            kind,
            op: None,
            record_id: None,
            section_id: None,
            message: String::new(),
            source: None,
        }
    }

    /// Add operation context
    pub fn with_op(mut self, op: impl Into<String>) -> Self {
        self.op = Some(op.into());
        self
    }

    /// Add record identity context
    pub fn with_record_id(mut self, id: impl Into<String>) -> Self {
        self.record_id = Some(id.into());
        self
    }

    /// Add section identifier context
    pub fn with_section(mut self, id: impl Into<String>) -> Self {
        self.section_id = Some(id.into());
        self
    }

    /// Add custom message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Add source error
    pub fn with_source(mut self, source: ExError) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Get the error kind
    pub fn kind(&self) -> ExErrorKind {
        self.kind
    }

    /// Get the stable error code
    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    /// Get the operation context, if any
    pub fn op(&self) -> Option<&str> {
        self.op.as_deref()
    }

    /// Get the record identity context, if any
    pub fn record_id(&self) -> Option<&str> {
        self.record_id.as_deref()
    }

    /// Get the section identifier context, if any
    pub fn section_id(&self) -> Option<&str> {
        self.section_id.as_deref()
    }

    /// Get the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Get the source error, if any
    pub fn source_error(&self) -> Option<&ExError> {
        self.source.as_deref()
    }
}

impl std::fmt::Display for ExError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.code())?;
        if let Some(op) = &self.op {
            write!(f, " in operation '{}'", op)?;
        }
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        if let Some(record_id) = &self.record_id {
            write!(f, " (record_id: {})", record_id)?;
        }
        if let Some(section_id) = &self.section_id {
            write!(f, " (section: {})", section_id)?;
        }
        if let Some(source) = &self.source {
            write!(f, " caused by {}", source)?;
        }
        Ok(())
    }
}

impl std::error::Error for ExError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_deref()
            .map(|s| s as &(dyn std::error::Error + 'static))
    }
}

// ========== End Error Facility ==========

/// Model-level errors raised while building snapshots, summaries and events
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CaseWatchError {
    /// Record identity is empty after trimming
    #[error("Record identity must not be empty")]
    EmptyRecordId,

    /// Section identifier is empty after trimming
    #[error("Section identifier must not be empty")]
    EmptySectionId,

    /// A change event was about to be built without any detail line
    #[error("Change event for {record_id} has no detail lines")]
    EmptyDetails { record_id: String },

    /// Summary section maps disagree on their key sets
    #[error("Summary for {record_id} has orphan section keys: {keys:?}")]
    SectionKeyMismatch {
        record_id: String,
        keys: Vec<String>,
    },

    /// Serialization error (JSON encoding/decoding)
    #[error("Serialization error: {message}")]
    Serialization { message: String },
}

/// Conversion from CaseWatchError to ExError
impl From<CaseWatchError> for ExError {
    fn from(err: CaseWatchError) -> Self {
        match err {
            CaseWatchError::EmptyRecordId => ExError::new(ExErrorKind::InvalidInput)
                .with_op("record_id")
                .with_message("Record identity must not be empty"),

            CaseWatchError::EmptySectionId => ExError::new(ExErrorKind::InvalidInput)
                .with_op("section_id")
                .with_message("Section identifier must not be empty"),

            CaseWatchError::EmptyDetails { record_id } => {
                ExError::new(ExErrorKind::InvariantViolation)
                    .with_record_id(record_id)
                    .with_message("Change event has no detail lines")
            }

            CaseWatchError::SectionKeyMismatch { record_id, keys } => {
                ExError::new(ExErrorKind::InvariantViolation)
                    .with_record_id(record_id)
                    .with_message(format!("Orphan section keys: {}", keys.join(", ")))
            }

            CaseWatchError::Serialization { message } => {
                ExError::new(ExErrorKind::Serialization).with_message(message)
            }
        }
    }
}

/// Conversion from serde_json::Error to CaseWatchError
impl From<serde_json::Error> for CaseWatchError {
    fn from(err: serde_json::Error) -> Self {
        CaseWatchError::Serialization {
            message: err.to_string(),
        }
    }
}
