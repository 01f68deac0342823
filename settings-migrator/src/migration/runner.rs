use std::future::Future;
use std::pin::pin;
use std::sync::Arc;

use chrono::Utc;
use futures::future::{select, Either};

use crate::migration::{
    MigrationContext, MigrationError, MigrationRegistry, MigrationResult, MigrationStep,
};
use crate::primitives::config::{current_config, MigratorConfig};
use crate::primitives::settings::{parse_settings, SettingsBlob};
use crate::primitives::version::Version;

/// A step the runner applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedStep {
    /// Version the blob was at before the step
    pub from: Version,
    /// Version the blob reached
    pub to: Version,
    /// Time spent in the transform, including time waiting on forms
    pub duration_ms: i64,
}

/// Result of a completed run.
#[derive(Debug, Clone, PartialEq)]
pub struct MigrationOutcome {
    /// The migrated settings. Unchanged (apart from re-parsing) if no step applied.
    pub settings: SettingsBlob,
    /// The version the settings are now at: the `to` of the last applied step, or the starting
    /// version if nothing applied
    pub version: Version,
    /// Applied steps in application order
    pub applied: Vec<AppliedStep>,
}

impl MigrationOutcome {
    /// Whether any step ran.
    #[must_use]
    pub fn migrated(&self) -> bool {
        !self.applied.is_empty()
    }
}

/// Drives a settings blob through the registry's steps until none applies.
///
/// ## Algorithm
///
/// Starting at the blob's version, the runner asks the registry for the step covering the current
/// version, awaits its transform, replaces the blob with the result and moves the current
/// version to the step's `to`. It stops when no step covers the current version; that is the
/// only successful exit.
///
/// Steps run strictly one after another: a step starts only after the previous transform has
/// completed, and a transform waiting on a form suspends the whole run.
///
/// ## Failures
///
/// The first failing step aborts the run and no blob is returned, so the host keeps whatever it
/// persisted before. The error names the failing step's versions.
///
/// Every iteration asserts that the chosen step moves the version strictly forward, and a run
/// applies at most [`MigratorConfig::max_chain_length`] steps, so a misconfigured registry
/// surfaces as an error instead of a hang.
///
/// ## Concurrency
///
/// A runner holds no per-run state. Concurrent runs for different entities can share one runner
/// (or one registry) freely.
pub struct MigrationRunner {
    registry: Arc<MigrationRegistry>,
    config: MigratorConfig,
}

impl MigrationRunner {
    /// Create a runner using the process-wide configuration
    #[must_use]
    pub fn new(registry: Arc<MigrationRegistry>) -> Self {
        Self::with_config(registry, current_config())
    }

    /// Create a runner with an explicit configuration
    #[must_use]
    pub const fn with_config(registry: Arc<MigrationRegistry>, config: MigratorConfig) -> Self {
        Self { registry, config }
    }

    /// The registry this runner walks.
    #[must_use]
    pub fn registry(&self) -> &MigrationRegistry {
        &self.registry
    }

    /// Migrates serialized settings stored at `previous_version`.
    ///
    /// Absent or malformed settings start from an empty blob.
    ///
    /// # Errors
    /// - `MigrationError::TransformFailed` if a step fails
    /// - `MigrationError::UserCancelled` if the user dismisses a step's form
    /// - `MigrationError::NonMonotonicStep` / `MigrationError::ChainTooLong` for a misconfigured registry
    pub async fn run(
        &self,
        previous_version: &Version,
        previous_settings: Option<&str>,
        context: &MigrationContext,
    ) -> MigrationResult<MigrationOutcome> {
        self.run_blob(previous_version, parse_settings(previous_settings), context)
            .await
    }

    /// Migrates an already deserialized blob stored at `version`.
    ///
    /// # Errors
    /// See [`run`](Self::run).
    pub async fn run_blob(
        &self,
        version: &Version,
        settings: SettingsBlob,
        context: &MigrationContext,
    ) -> MigrationResult<MigrationOutcome> {
        let run_start_time = Utc::now();
        crate::info!(
            "migration_run.started version={} registered_steps={} interactive={} timestamp={}",
            version,
            self.registry.len(),
            context.is_interactive(),
            run_start_time.to_rfc3339()
        );

        let mut settings = settings;
        let mut current = version.clone();
        let mut applied = Vec::new();

        while let Some(step) = self.registry.find_applicable(&current) {
            self.check_step(&current, step.as_ref(), applied.len())?;

            let (next, record) = Self::apply_step(step.as_ref(), &current, settings, context).await?;
            settings = next;
            current = record.to.clone();
            applied.push(record);

            if self.config.log_settings_payloads() {
                crate::debug!(
                    "migration_step.payload version={} settings={}",
                    current,
                    serde_json::Value::Object(settings.clone())
                );
            }
        }

        crate::info!(
            "migration_run.completed from={} to={} applied={} duration_ms={} timestamp={}",
            version,
            current,
            applied.len(),
            (Utc::now() - run_start_time).num_milliseconds(),
            Utc::now().to_rfc3339()
        );

        Ok(MigrationOutcome {
            settings,
            version: current,
            applied,
        })
    }

    /// Like [`run`](Self::run), but gives up as soon as `cancel` resolves.
    ///
    /// Use this when the host can abandon the operation, e.g. the user navigates away while a
    /// step's form is open. The pending step is dropped and nothing is returned.
    ///
    /// # Errors
    /// - `MigrationError::Cancelled` if `cancel` resolves first
    /// - Any error from [`run`](Self::run)
    pub async fn run_cancellable<C>(
        &self,
        previous_version: &Version,
        previous_settings: Option<&str>,
        context: &MigrationContext,
        cancel: C,
    ) -> MigrationResult<MigrationOutcome>
    where
        C: Future<Output = ()> + Send,
    {
        let run = pin!(self.run(previous_version, previous_settings, context));
        let cancel = pin!(cancel);

        match select(run, cancel).await {
            Either::Left((outcome, _)) => outcome,
            Either::Right(((), _)) => {
                crate::warn!(
                    "migration_run.cancelled from={} timestamp={}",
                    previous_version,
                    Utc::now().to_rfc3339()
                );
                Err(MigrationError::Cancelled {
                    version: previous_version.to_string(),
                })
            }
        }
    }

    /// Guards against registries that would never terminate.
    fn check_step(
        &self,
        current: &Version,
        step: &dyn MigrationStep,
        applied_count: usize,
    ) -> MigrationResult<()> {
        if step.to_version() <= current {
            crate::error!(
                "migration_run.non_monotonic current={} step={}",
                current,
                step.range()
            );
            return Err(MigrationError::NonMonotonicStep {
                current: current.to_string(),
                to: step.to_version().to_string(),
            });
        }

        let limit = self.config.max_chain_length();
        if u32::try_from(applied_count).unwrap_or(u32::MAX) >= limit {
            crate::error!("migration_run.chain_too_long limit={} current={}", limit, current);
            return Err(MigrationError::ChainTooLong { limit });
        }

        Ok(())
    }

    /// Applies one step, timing it and mapping its failure to a `MigrationError`.
    async fn apply_step(
        step: &dyn MigrationStep,
        current: &Version,
        settings: SettingsBlob,
        context: &MigrationContext,
    ) -> MigrationResult<(SettingsBlob, AppliedStep)> {
        let from = step.from_version();
        let to = step.to_version();
        let step_start = Utc::now();

        crate::info!(
            "migration_step.started from={} to={} current={} timestamp={}",
            from,
            to,
            current,
            step_start.to_rfc3339()
        );

        match step.transform(settings, context).await {
            Ok(next) => {
                let duration_ms = (Utc::now() - step_start).num_milliseconds();
                crate::info!(
                    "migration_step.succeeded from={} to={} duration_ms={} timestamp={}",
                    from,
                    to,
                    duration_ms,
                    Utc::now().to_rfc3339()
                );
                Ok((
                    next,
                    AppliedStep {
                        from: current.clone(),
                        to: to.clone(),
                        duration_ms,
                    },
                ))
            }
            Err(e) => {
                let duration_ms = (Utc::now() - step_start).num_milliseconds();
                crate::error!(
                    "migration_step.failed from={} to={} duration_ms={} cancelled={} error={} timestamp={}",
                    from,
                    to,
                    duration_ms,
                    e.is_cancellation(),
                    e,
                    Utc::now().to_rfc3339()
                );
                if e.is_cancellation() {
                    Err(MigrationError::UserCancelled {
                        from: from.to_string(),
                        to: to.to_string(),
                    })
                } else {
                    Err(MigrationError::TransformFailed {
                        from: from.to_string(),
                        to: to.to_string(),
                        message: e.to_string(),
                    })
                }
            }
        }
    }
}
