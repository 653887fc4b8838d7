//! Error types for the knowledge base.
//!
//! Every failure is a strongly typed `thiserror` enum so callers can match
//! on the exact condition. Structural inconsistencies are kept apart from
//! malformed input and persistence failures because they are expected
//! outcomes of reasoning, not faults.

use thiserror::Error;

/// A mutation contradicts the ontology and was rejected without any change.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Inconsistency {
    #[error("'{subject}' is in a class disjoint with the domain of '{property}'")]
    Domain {
        subject: String,
        property: String,
    },

    #[error("'{object}' is in a class disjoint with the range of '{property}'")]
    Range {
        object: String,
        property: String,
    },

    #[error("'{property}' is irreflexive and cannot link '{subject}' to itself")]
    Irreflexive {
        subject: String,
        property: String,
    },

    #[error("'{property}' is asymmetric and '{object}' already relates to '{subject}'")]
    Asymmetric {
        subject: String,
        property: String,
        object: String,
    },

    #[error("literal type '{literal_type}' is outside the range of '{property}'")]
    LiteralRange {
        property: String,
        literal_type: String,
    },
}

impl Inconsistency {
    /// Short tag naming the violated constraint.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Domain { .. } => "domain",
            Self::Range { .. } | Self::LiteralRange { .. } => "range",
            Self::Irreflexive { .. } => "irreflexive",
            Self::Asymmetric { .. } => "asymmetric",
        }
    }
}

/// Failures raised by graph mutations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    #[error("structural inconsistency: {0}")]
    Inconsistency(#[from] Inconsistency),

    #[error("unknown entity '{name}'")]
    UnknownEntity {
        name: String,
    },

    #[error("'{name}' is not {expected}")]
    KindMismatch {
        name: String,
        expected: &'static str,
    },

    #[error("neither '{first}' nor '{second}' exists")]
    MissingOperands {
        first: String,
        second: String,
    },

    #[error("malformed class expression: {reason}")]
    MalformedExpression {
        reason: String,
    },
}

/// An update statement that cannot be parsed or applied.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StatementError {
    #[error("statement is empty")]
    Empty,

    #[error("unknown operation '{op}' in '{statement}'")]
    UnknownOperation {
        op: String,
        statement: String,
    },

    #[error("statement '{statement}' is missing its {field}")]
    MissingField {
        statement: String,
        field: &'static str,
    },

    #[error("invalid weight '{weight}' in '{statement}'")]
    InvalidWeight {
        weight: String,
        statement: String,
    },

    #[error("predicate '{predicate}' cannot be used with [{op}]")]
    UnsupportedPredicate {
        predicate: String,
        op: &'static str,
    },
}

/// Snapshot loading and saving failures.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("I/O error on '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("snapshot '{path}' failed its integrity check")]
    Corrupted {
        path: String,
    },

    #[error("snapshot format error: {0}")]
    Format(#[from] serde_json::Error),

    #[error("unsupported uri '{uri}'")]
    UnsupportedUri {
        uri: String,
    },
}

/// Event stream receive failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StreamError {
    #[error("no event within {duration_ms}ms")]
    Timeout {
        duration_ms: u64,
    },

    #[error("event stream disconnected")]
    Disconnected,
}

/// Top-level error type.
#[derive(Debug, Error)]
pub enum OntoError {
    #[error("graph error: {0}")]
    Graph(#[from] GraphError),

    #[error("malformed statement: {0}")]
    Statement(#[from] StatementError),

    #[error("persistence error: {0}")]
    Persistence(#[from] PersistenceError),

    #[error("stream error: {0}")]
    Stream(#[from] StreamError),

    #[error("configuration error: {message}")]
    Config {
        message: String,
    },

    #[error("internal error: {message}")]
    Internal {
        message: String,
    },
}

impl From<Inconsistency> for OntoError {
    fn from(err: Inconsistency) -> Self {
        Self::Graph(GraphError::Inconsistency(err))
    }
}

impl OntoError {
    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Creates a configuration error.
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Returns true if a mutation was rejected as structurally inconsistent.
    #[must_use]
    pub const fn is_inconsistency(&self) -> bool {
        matches!(self, Self::Graph(GraphError::Inconsistency(_)))
    }

    /// Returns true if this is a malformed statement.
    #[must_use]
    pub const fn is_statement(&self) -> bool {
        matches!(self, Self::Statement(_))
    }

    /// Returns true if this is a persistence error.
    #[must_use]
    pub const fn is_persistence(&self) -> bool {
        matches!(self, Self::Persistence(_))
    }

    /// Returns true if this is an internal error.
    #[must_use]
    pub const fn is_internal(&self) -> bool {
        matches!(self, Self::Internal { .. })
    }

    /// The inconsistency behind this error, if any.
    #[must_use]
    pub const fn inconsistency(&self) -> Option<&Inconsistency> {
        match self {
            Self::Graph(GraphError::Inconsistency(err)) => Some(err),
            _ => None,
        }
    }
}

/// Result type for knowledge base operations.
pub type OntoResult<T> = Result<T, OntoError>;
