use crate::primitives::form::FormError;

/// Errors that can occur during migration operations
#[crate::migrator_error]
pub enum MigrationError {
    /// An invalid operation was attempted
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    /// A version string is not a valid semantic version
    #[error("Invalid version {version:?}: {message}")]
    InvalidVersion {
        /// The rejected input
        version: String,
        /// Why it was rejected
        message: String,
    },

    /// A step does not move the version forward (`from >= to`)
    #[error("Invalid migration step {from} -> {to}: target must be greater than source")]
    InvalidStep {
        /// Source version of the rejected step
        from: String,
        /// Target version of the rejected step
        to: String,
    },

    /// A step's transform failed
    #[error("Migration {from} -> {to} failed: {message}")]
    TransformFailed {
        /// Source version of the failing step
        from: String,
        /// Target version of the failing step
        to: String,
        /// The underlying error
        message: String,
    },

    /// The user dismissed a form an interactive step was waiting on
    #[error("Migration {from} -> {to} was cancelled by the user")]
    UserCancelled {
        /// Source version of the interrupted step
        from: String,
        /// Target version of the interrupted step
        to: String,
    },

    /// The host cancelled the run
    #[error("Migration run starting at version {version} was cancelled")]
    Cancelled {
        /// Version the run started from. No migrated settings are returned, so the host's
        /// stored settings remain at this version
        version: String,
    },

    /// An applicable step would not advance the version
    #[error("Migration step to {to} does not advance past current version {current}")]
    NonMonotonicStep {
        /// The version the run was at
        current: String,
        /// The target of the offending step
        to: String,
    },

    /// The run applied more steps than the configured limit
    #[error("Migration chain exceeded {limit} steps")]
    ChainTooLong {
        /// The configured limit
        limit: u32,
    },

    /// Settings store operation failed
    #[error(transparent)]
    SettingsStore(#[from] crate::primitives::settings_store::SettingsStoreError),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {message}")]
    JsonError {
        /// The error message from serde_json
        message: String,
    },
}

impl From<serde_json::Error> for MigrationError {
    fn from(e: serde_json::Error) -> Self {
        Self::JsonError {
            message: e.to_string(),
        }
    }
}

/// Result type for migration operations
pub type MigrationResult<T> = std::result::Result<T, MigrationError>;

/// Errors a step's transform may return.
///
/// The runner turns these into [`MigrationError`]s carrying the failing step's versions:
/// a cancelled form becomes `UserCancelled`, everything else `TransformFailed`.
#[derive(Debug, thiserror::Error)]
pub enum StepError {
    /// The user dismissed a form without submitting it
    #[error("cancelled by the user")]
    Cancelled,

    /// The step needs a form but no presenter was supplied to the run
    #[error("no form presenter is available")]
    NoFormPresenter,

    /// The form subsystem failed
    #[error(transparent)]
    Form(#[from] FormError),

    /// The step found the settings in a shape it cannot migrate
    #[error("{0}")]
    Invalid(String),

    /// JSON serialization/deserialization failed
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// Any other failure
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl StepError {
    /// Whether the failure is the user dismissing a form.
    #[must_use]
    pub fn is_cancellation(&self) -> bool {
        matches!(self, Self::Cancelled | Self::Form(FormError::Cancelled))
    }
}
