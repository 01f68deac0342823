use async_trait::async_trait;

use crate::migration::{MigrationContext, MigrationResult, StepError};
use crate::primitives::settings::SettingsBlob;
use crate::primitives::version::{Version, VersionRange};

/// A single upgrade rule covering the version range `[from, to)`.
///
/// Steps are registered once in a [`MigrationRegistry`](crate::migration::MigrationRegistry) and
/// never mutated. The runner applies a step to any blob whose current version falls inside its
/// range, then considers the blob to be at `to`.
#[async_trait]
pub trait MigrationStep: Send + Sync {
    /// The versions this step migrates between.
    fn range(&self) -> &VersionRange;

    /// Produces the next settings blob from `settings`.
    ///
    /// The transform owns `settings` and returns the migrated blob. By convention it also records
    /// the target version in the blob (see
    /// [`stamp_version`](crate::primitives::settings::stamp_version)); the runner tracks the
    /// version on its own either way. Interactive steps call
    /// [`MigrationContext::open_form`] and the whole run waits for the user.
    ///
    /// # Errors
    /// Any [`StepError`] aborts the run.
    async fn transform(
        &self,
        settings: SettingsBlob,
        context: &MigrationContext,
    ) -> Result<SettingsBlob, StepError>;

    /// Inclusive lower bound of the range.
    fn from_version(&self) -> &Version {
        self.range().from()
    }

    /// The version a blob reaches after this step.
    fn to_version(&self) -> &Version {
        self.range().to()
    }
}

/// A synchronous step backed by a closure.
///
/// # Examples
///
/// ```rust
/// use serde_json::json;
/// use settings_migrator::migration::FnStep;
///
/// let step = FnStep::new("1.4.2", "1.4.3", |mut settings| {
///     settings.insert("field_from_1_4_2".to_string(), json!("migrated"));
///     Ok(settings)
/// })
/// .unwrap();
/// ```
pub struct FnStep<F> {
    range: VersionRange,
    transform: F,
}

impl<F> FnStep<F>
where
    F: Fn(SettingsBlob) -> Result<SettingsBlob, StepError> + Send + Sync,
{
    /// Creates a step from version strings and a transform.
    ///
    /// # Errors
    /// - `MigrationError::InvalidVersion` if either version fails to parse
    /// - `MigrationError::InvalidStep` if `from >= to`
    pub fn new(from: &str, to: &str, transform: F) -> MigrationResult<Self> {
        Ok(Self::with_range(VersionRange::parse(from, to)?, transform))
    }

    /// Creates a step from an already validated range.
    pub fn with_range(range: VersionRange, transform: F) -> Self {
        Self { range, transform }
    }
}

#[async_trait]
impl<F> MigrationStep for FnStep<F>
where
    F: Fn(SettingsBlob) -> Result<SettingsBlob, StepError> + Send + Sync,
{
    fn range(&self) -> &VersionRange {
        &self.range
    }

    async fn transform(
        &self,
        settings: SettingsBlob,
        _context: &MigrationContext,
    ) -> Result<SettingsBlob, StepError> {
        (self.transform)(settings)
    }
}

impl<F> std::fmt::Debug for FnStep<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnStep").field("range", &self.range).finish()
    }
}
