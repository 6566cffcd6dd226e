use thiserror::Error;

use crate::model::EntityKind;

/// Result type alias using FrolfError
pub type Result<T> = std::result::Result<T, FrolfError>;

// ========== Error Facility ==========

/// Canonical error kind taxonomy
///
/// Each kind maps to a stable error code that can be used for programmatic
/// error handling and testing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExErrorKind {
    // Construction/Tracking
    Validation,
    NotFound,
    Removed,
    AlreadyTracked,

    // Storage
    Schema,
    Persistence,

    // Configuration
    InvalidConfig,
}

impl ExErrorKind {
    /// Get the stable error code for this kind
    pub fn code(&self) -> &'static str {
        match self {
            ExErrorKind::Validation => "ERR_VALIDATION",
            ExErrorKind::NotFound => "ERR_NOT_FOUND",
            ExErrorKind::Removed => "ERR_REMOVED",
            ExErrorKind::AlreadyTracked => "ERR_ALREADY_TRACKED",
            ExErrorKind::Schema => "ERR_SCHEMA",
            ExErrorKind::Persistence => "ERR_PERSISTENCE",
            ExErrorKind::InvalidConfig => "ERR_INVALID_CONFIG",
        }
    }
}

/// Canonical structured error type
///
/// Carries a classification kind for programmatic handling plus optional
/// context (operation, entity) for debugging.
#[derive(Debug, Clone)]
pub struct ExError {
    kind: ExErrorKind,
    op: Option<String>,
    entity_kind: Option<EntityKind>,
    entity_id: Option<String>,
    message: String,
    source: Option<Box<ExError>>,
}

impl ExError {
    /// Create a new error with the specified kind
    pub fn new(kind: ExErrorKind) -> Self {
        Self {
            kind,
            op: None,
            entity_kind: None,
            entity_id: None,
            message: String::new(),
            source: None,
        }
    }

    /// Add operation context
    pub fn with_op(mut self, op: impl Into<String>) -> Self {
        self.op = Some(op.into());
        self
    }

    /// Add entity kind context
    pub fn with_entity_kind(mut self, kind: EntityKind) -> Self {
        self.entity_kind = Some(kind);
        self
    }

    /// Add entity ID context (stored id or arena key)
    pub fn with_entity_id(mut self, id: impl ToString) -> Self {
        self.entity_id = Some(id.to_string());
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

    /// Get the entity kind context, if any
    pub fn entity_kind(&self) -> Option<EntityKind> {
        self.entity_kind
    }

    /// Get the entity ID context, if any
    pub fn entity_id(&self) -> Option<&str> {
        self.entity_id.as_deref()
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
        if let Some(kind) = self.entity_kind {
            write!(f, " (entity: {})", kind)?;
        }
        if let Some(entity_id) = &self.entity_id {
            write!(f, " (entity_id: {})", entity_id)?;
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
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

// ========== End Error Facility ==========

/// Domain error taxonomy for entity construction and change tracking
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FrolfError {
    // ===== Validation Errors =====
    /// Required name is empty or whitespace-only
    #[error("Invalid {kind} name: {reason}")]
    InvalidName { kind: EntityKind, reason: String },

    /// Hole score without any player
    #[error("Hole score must be attributed to at least one player")]
    EmptyPlayerSet,

    /// Two related entities disagree on their course
    #[error("{kind} expected course {expected} but found course {actual}")]
    CourseMismatch {
        kind: EntityKind,
        expected: String,
        actual: String,
    },

    // ===== Tracking Errors =====
    /// Key does not point into the tracker
    #[error("{kind} key {index} is not tracked by this context")]
    KeyNotFound { kind: EntityKind, index: usize },

    /// Key points at an entity that was removed
    #[error("{kind} key {index} refers to a removed entity")]
    EntityRemoved { kind: EntityKind, index: usize },

    /// Entity already carries a stored identifier
    #[error("{kind} {id} is already stored and cannot be tracked as new")]
    AlreadyTracked { kind: EntityKind, id: i64 },

    /// No stored entity with the given identifier
    #[error("{kind} not found: {id}")]
    EntityNotFound { kind: EntityKind, id: i64 },

    /// Owned child is already listed by a different owner
    #[error("{kind} key {index} already belongs to another {owner}")]
    AlreadyOwned {
        kind: EntityKind,
        index: usize,
        owner: EntityKind,
    },
}

/// Conversion from FrolfError to ExError
impl From<FrolfError> for ExError {
    fn from(err: FrolfError) -> Self {
        let message = err.to_string();
        match err {
            FrolfError::InvalidName { kind, .. } => ExError::new(ExErrorKind::Validation)
                .with_op("construct")
                .with_entity_kind(kind)
                .with_message(message),

            FrolfError::EmptyPlayerSet => ExError::new(ExErrorKind::Validation)
                .with_op("construct")
                .with_entity_kind(EntityKind::HoleScore)
                .with_message(message),

            FrolfError::CourseMismatch { kind, .. } => ExError::new(ExErrorKind::Validation)
                .with_op("track")
                .with_entity_kind(kind)
                .with_message(message),

            FrolfError::KeyNotFound { kind, index } => ExError::new(ExErrorKind::NotFound)
                .with_entity_kind(kind)
                .with_entity_id(format!("key:{}", index))
                .with_message(message),

            FrolfError::EntityRemoved { kind, index } => ExError::new(ExErrorKind::Removed)
                .with_entity_kind(kind)
                .with_entity_id(format!("key:{}", index))
                .with_message(message),

            FrolfError::AlreadyTracked { kind, id } => ExError::new(ExErrorKind::AlreadyTracked)
                .with_op("track")
                .with_entity_kind(kind)
                .with_entity_id(id)
                .with_message(message),

            FrolfError::EntityNotFound { kind, id } => ExError::new(ExErrorKind::NotFound)
                .with_op("find")
                .with_entity_kind(kind)
                .with_entity_id(id)
                .with_message(message),

            FrolfError::AlreadyOwned { kind, index, .. } => ExError::new(ExErrorKind::Validation)
                .with_op("link")
                .with_entity_kind(kind)
                .with_entity_id(format!("key:{}", index))
                .with_message(message),
        }
    }
}
