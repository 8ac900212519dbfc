//! Unified error types and result handling.
//!
//! Remote failures are converted into these variants at the `api` boundary so
//! nothing above it ever sees a raw transport error.

use std::fmt;
use thiserror::Error;

/// Which reference a new variant is missing before it can be created.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingReference {
    /// No color selected
    Color,
    /// No size selected (required by categories such as rings)
    Size,
}

impl fmt::Display for MissingReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Color => f.write_str("color"),
            Self::Size => f.write_str("size"),
        }
    }
}

/// A single new variant that failed pre-dispatch validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationFailure {
    /// Local identifier of the offending variant
    pub variant_id: String,
    /// Display identity: the color name when known, otherwise the identifier
    pub label: String,
    /// The reference that is missing
    pub missing: MissingReference,
}

impl fmt::Display for ValidationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Select a {} for variant {}", self.missing, self.label)
    }
}

/// Every validation failure found in one submission.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationFailures(pub Vec<ValidationFailure>);

impl ValidationFailures {
    /// Number of offending variants.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when nothing failed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over the individual failures.
    pub fn iter(&self) -> impl Iterator<Item = &ValidationFailure> {
        self.0.iter()
    }
}

impl fmt::Display for ValidationFailures {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let lines: Vec<String> = self.0.iter().map(ToString::to_string).collect();
        f.write_str(&lines.join("\n"))
    }
}

/// Kind of request a variant failure belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariantOperation {
    /// `POST` of a new variant
    Create,
    /// `PATCH` of a persisted variant
    Update,
}

impl fmt::Display for VariantOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Create => f.write_str("create"),
            Self::Update => f.write_str("update"),
        }
    }
}

/// One dispatched request that did not succeed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantFailure {
    /// Identifier of the variant the request was for
    pub variant_id: String,
    /// Whether it was a create or an update
    pub operation: VariantOperation,
    /// Captured reason
    pub reason: String,
}

impl fmt::Display for VariantFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} variant {}: {}",
            self.operation, self.variant_id, self.reason
        )
    }
}

/// Aggregate of a batch where some requests failed and others succeeded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchFailure {
    /// Requests that were dispatched
    pub attempted: usize,
    /// The ones that failed
    pub failures: Vec<VariantFailure>,
}

impl BatchFailure {
    /// Failed creations.
    #[must_use]
    pub fn failed_creates(&self) -> usize {
        self.count(VariantOperation::Create)
    }

    /// Failed updates.
    #[must_use]
    pub fn failed_updates(&self) -> usize {
        self.count(VariantOperation::Update)
    }

    fn count(&self, operation: VariantOperation) -> usize {
        self.failures
            .iter()
            .filter(|f| f.operation == operation)
            .count()
    }
}

impl fmt::Display for BatchFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} of {} variant operations failed ({} create, {} update)",
            self.failures.len(),
            self.attempted,
            self.failed_creates(),
            self.failed_updates()
        )?;
        for failure in &self.failures {
            write!(f, "\n - {failure}")?;
        }
        Ok(())
    }
}

/// Which reference list failed to load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceKind {
    /// `GET /colores`
    Colors,
    /// `GET /tallas`
    Sizes,
}

impl fmt::Display for ReferenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Colors => f.write_str("colors"),
            Self::Sizes => f.write_str("sizes"),
        }
    }
}

/// Crate-wide error type.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),

    #[error("Network error during {operation}: {message}")]
    Network { operation: String, message: String },

    #[error("{operation} failed with HTTP {status}: {body}")]
    Api {
        operation: String,
        status: u16,
        body: String,
    },

    #[error("Could not decode response of {operation}: {message}")]
    Decode { operation: String, message: String },

    #[error("{operation} timed out after {seconds}s")]
    Timeout { operation: String, seconds: u64 },

    #[error("{0}")]
    Validation(ValidationFailures),

    #[error("{0}")]
    PartialBatch(BatchFailure),

    #[error("Could not update group {group_id}: {reason}")]
    GroupUpdate { group_id: String, reason: String },

    #[error("Could not load {kind}: {message}")]
    ReferenceData { kind: ReferenceKind, message: String },

    #[error("Product group already in catalog: {id}")]
    DuplicateGroup { id: String },

    #[error("Product group not found: {id}")]
    GroupNotFound { id: String },

    #[error("Variant not found: {id}")]
    VariantNotFound { id: String },

    #[error("Invalid session state: {message}")]
    InvalidSession { message: String },

    #[error("A product group must keep at least one variant")]
    LastVariant,

    #[error("Creating new product groups is not supported by the catalog API")]
    GroupCreationUnsupported,
}

impl Error {
    /// True for failures that only affected a single remote request.
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::Network { .. } | Self::Api { .. } | Self::Decode { .. } | Self::Timeout { .. }
        )
    }
}

// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
