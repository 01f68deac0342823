use std::sync::Arc;

use crate::migration::{FnStep, MigrationResult, MigrationStep, StepError};
use crate::primitives::settings::SettingsBlob;
use crate::primitives::version::Version;

/// An ordered, immutable list of migration steps.
///
/// Built once (typically at plugin load) and shared by reference or `Arc` between runs. There
/// is no way to add or remove steps after construction.
///
/// # Lookup
///
/// [`find_applicable`](Self::find_applicable) returns the step whose `[from, to)` range contains
/// the given version. Ranges are compared with semver precedence, so a step covers every
/// version in its range, including ones that were never released.
///
/// A well-formed registry has at most one step covering any version. When ranges overlap, the
/// step registered **first** wins. The scan is a stable linear pass in registration order, so the
/// same registry always picks the same step for the same version. Overlaps are reported with a
/// warning when the registry is built.
pub struct MigrationRegistry {
    steps: Vec<Arc<dyn MigrationStep>>,
}

impl MigrationRegistry {
    /// Creates a registry from steps in registration order.
    #[must_use]
    pub fn new(steps: Vec<Arc<dyn MigrationStep>>) -> Self {
        let registry = Self { steps };
        for (first, second) in registry.overlapping_steps() {
            crate::warn!(
                "migration_registry.overlapping_steps first={} second={} winner={}",
                registry.steps[first].range(),
                registry.steps[second].range(),
                registry.steps[first].range()
            );
        }
        registry
    }

    /// Starts building a registry.
    #[must_use]
    pub fn builder() -> MigrationRegistryBuilder {
        MigrationRegistryBuilder::default()
    }

    /// Returns the first step, in registration order, whose range contains `current`.
    #[must_use]
    pub fn find_applicable(&self, current: &Version) -> Option<&Arc<dyn MigrationStep>> {
        self.steps
            .iter()
            .find(|step| step.range().contains(current))
    }

    /// Steps in registration order.
    #[must_use]
    pub fn steps(&self) -> &[Arc<dyn MigrationStep>] {
        &self.steps
    }

    /// Number of registered steps.
    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Whether no steps are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// The highest `to` across all steps: the schema version a fully migrated blob ends up at.
    #[must_use]
    pub fn latest_version(&self) -> Option<&Version> {
        self.steps.iter().map(|step| step.to_version()).max()
    }

    /// Index pairs `(earlier, later)` of steps whose ranges overlap.
    #[must_use]
    pub fn overlapping_steps(&self) -> Vec<(usize, usize)> {
        let mut overlaps = Vec::new();
        for (i, a) in self.steps.iter().enumerate() {
            for (j, b) in self.steps.iter().enumerate().skip(i + 1) {
                let (a, b) = (a.range(), b.range());
                if a.from() < b.to() && b.from() < a.to() {
                    overlaps.push((i, j));
                }
            }
        }
        overlaps
    }
}

impl std::fmt::Debug for MigrationRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.steps.iter().map(|step| step.range().to_string()))
            .finish()
    }
}

/// Builder for [`MigrationRegistry`]. Steps keep the order in which they are added.
#[derive(Default)]
pub struct MigrationRegistryBuilder {
    steps: Vec<Arc<dyn MigrationStep>>,
}

impl MigrationRegistryBuilder {
    /// Appends a step.
    #[must_use]
    pub fn step<S: MigrationStep + 'static>(mut self, step: S) -> Self {
        self.steps.push(Arc::new(step));
        self
    }

    /// Appends an already shared step.
    #[must_use]
    pub fn shared_step(mut self, step: Arc<dyn MigrationStep>) -> Self {
        self.steps.push(step);
        self
    }

    /// Appends a synchronous closure step.
    ///
    /// # Errors
    /// - `MigrationError::InvalidVersion` if either version fails to parse
    /// - `MigrationError::InvalidStep` if `from >= to`
    pub fn fn_step<F>(self, from: &str, to: &str, transform: F) -> MigrationResult<Self>
    where
        F: Fn(SettingsBlob) -> Result<SettingsBlob, StepError> + Send + Sync + 'static,
    {
        Ok(self.step(FnStep::new(from, to, transform)?))
    }

    /// Finishes the registry.
    #[must_use]
    pub fn build(self) -> MigrationRegistry {
        MigrationRegistry::new(self.steps)
    }
}
