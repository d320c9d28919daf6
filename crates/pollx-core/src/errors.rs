use pollx_core_types::RequestId;
use thiserror::Error;
use uuid::Uuid;

/// Result type alias using PollError
pub type Result<T> = std::result::Result<T, PollError>;

// ========== Error Facility ==========

/// Canonical error kind taxonomy
///
/// Each kind maps to a stable error code and to the response status an
/// external transport should use for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExErrorKind {
    /// A lookup by identifier found nothing
    NotFound,
    /// The input tree is malformed
    Validation,
    /// The storage engine rejected an operation
    Persistence,
    Serialization,
    Io,
    Concurrency,
    Internal,
}

impl ExErrorKind {
    /// Get the stable error code for this kind
    pub fn code(&self) -> &'static str {
        match self {
            ExErrorKind::NotFound => "ERR_NOT_FOUND",
            ExErrorKind::Validation => "ERR_VALIDATION",
            ExErrorKind::Persistence => "ERR_PERSISTENCE",
            ExErrorKind::Serialization => "ERR_SERIALIZATION",
            ExErrorKind::Io => "ERR_IO",
            ExErrorKind::Concurrency => "ERR_CONCURRENCY",
            ExErrorKind::Internal => "ERR_INTERNAL",
        }
    }

    /// HTTP status a transport layer should answer with for this kind
    pub fn http_status(&self) -> u16 {
        match self {
            ExErrorKind::NotFound => 404,
            ExErrorKind::Validation => 422,
            ExErrorKind::Serialization => 400,
            ExErrorKind::Concurrency => 409,
            ExErrorKind::Persistence | ExErrorKind::Io | ExErrorKind::Internal => 500,
        }
    }
}

/// Canonical structured error type
#[derive(Debug, Clone)]
pub struct ExError {
    kind: ExErrorKind,
    op: Option<String>,
    entity_id: Option<String>,
    request_id: Option<RequestId>,
    message: String,
}

impl ExError {
    pub fn new(kind: ExErrorKind) -> Self {
        Self {
            kind,
            op: None,
            entity_id: None,
            request_id: None,
            message: String::new(),
        }
    }

    /// Add operation context
    pub fn with_op(mut self, op: impl Into<String>) -> Self {
        self.op = Some(op.into());
        self
    }

    /// Add entity ID context
    pub fn with_entity_id(mut self, id: impl Into<String>) -> Self {
        self.entity_id = Some(id.into());
        self
    }

    pub fn with_request_id(mut self, request_id: RequestId) -> Self {
        self.request_id = Some(request_id);
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub fn kind(&self) -> ExErrorKind {
        self.kind
    }

    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    pub fn op(&self) -> Option<&str> {
        self.op.as_deref()
    }

    pub fn entity_id(&self) -> Option<&str> {
        self.entity_id.as_deref()
    }

    pub fn request_id(&self) -> Option<&RequestId> {
        self.request_id.as_ref()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn is_not_found(&self) -> bool {
        self.kind == ExErrorKind::NotFound
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
        if let Some(entity_id) = &self.entity_id {
            write!(f, " (entity_id: {})", entity_id)?;
        }
        if let Some(request_id) = &self.request_id {
            write!(f, " (request_id: {})", request_id)?;
        }
        Ok(())
    }
}

impl std::error::Error for ExError {}

// ========== End Error Facility ==========

/// Domain failures raised by the poll model, validation and directory
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PollError {
    #[error("Poll not found: {poll_id}")]
    PollNotFound { poll_id: Uuid },

    #[error("SubPoll not found: {sub_poll_id}")]
    SubPollNotFound { sub_poll_id: Uuid },

    #[error("Option not found: {option_id}")]
    OptionNotFound { option_id: Uuid },

    #[error("User not found: {user_id}")]
    UserNotFound { user_id: Uuid },

    /// The token itself is never echoed back
    #[error("Access grant not found")]
    AccessNotFound,

    /// An entity in the tree carries the nil UUID
    #[error("{entity} has a nil identifier")]
    NilIdentifier { entity: String },

    /// The same identifier appears twice in one poll tree
    #[error("Identifier {id} appears more than once in the poll tree")]
    DuplicateIdentifier { id: Uuid },

    #[error("User {user_id} votes more than once on option {option_id}")]
    DuplicateVote { option_id: Uuid, user_id: Uuid },

    #[error("Serialization error: {message}")]
    Serialization { message: String },

    #[error("Lock poisoned: {resource}")]
    LockPoisoned { resource: String },

    /// The user directory could not answer
    #[error("User directory unavailable: {message}")]
    DirectoryUnavailable { message: String },
}

impl PollError {
    pub fn kind(&self) -> ExErrorKind {
        match self {
            PollError::PollNotFound { .. }
            | PollError::SubPollNotFound { .. }
            | PollError::OptionNotFound { .. }
            | PollError::UserNotFound { .. }
            | PollError::AccessNotFound => ExErrorKind::NotFound,
            PollError::NilIdentifier { .. }
            | PollError::DuplicateIdentifier { .. }
            | PollError::DuplicateVote { .. } => ExErrorKind::Validation,
            PollError::Serialization { .. } => ExErrorKind::Serialization,
            PollError::LockPoisoned { .. } => ExErrorKind::Concurrency,
            PollError::DirectoryUnavailable { .. } => ExErrorKind::Persistence,
        }
    }

    fn entity_id(&self) -> Option<String> {
        match self {
            PollError::PollNotFound { poll_id } => Some(poll_id.to_string()),
            PollError::SubPollNotFound { sub_poll_id } => Some(sub_poll_id.to_string()),
            PollError::OptionNotFound { option_id } => Some(option_id.to_string()),
            PollError::UserNotFound { user_id } => Some(user_id.to_string()),
            PollError::DuplicateIdentifier { id } => Some(id.to_string()),
            PollError::DuplicateVote { option_id, .. } => Some(option_id.to_string()),
            _ => None,
        }
    }
}

impl From<PollError> for ExError {
    fn from(err: PollError) -> Self {
        let mut ex = ExError::new(err.kind()).with_message(err.to_string());
        if let Some(id) = err.entity_id() {
            ex = ex.with_entity_id(id);
        }
        ex
    }
}

impl From<serde_json::Error> for PollError {
    fn from(err: serde_json::Error) -> Self {
        PollError::Serialization {
            message: err.to_string(),
        }
    }
}
