use std::sync::Arc;

use tokio::sync::{Mutex, MutexGuard};

use crate::migration::{
    MigrationContext, MigrationError, MigrationOutcome, MigrationRegistry, MigrationResult,
    MigrationRunner,
};
use crate::migrator_export;
use crate::primitives::form::FormPresenter;
use crate::primitives::settings::serialize_settings;
use crate::primitives::settings_store::{SettingsStore, SettingsStoreError};
use crate::primitives::version::parse_version;

/// The settings migrations shipped with the plugin.
pub mod migrations;

/// The plugin's settings form descriptor.
pub mod schema;

pub use migrations::default_registry;
pub use schema::{settings_schema, SettingsDescriptor};

/// A step applied during an upgrade, as reported to the host.
#[derive(Debug, Clone, PartialEq, Eq, uniffi::Record)]
pub struct AppliedStepRecord {
    /// Version the settings were at before the step
    pub from: String,
    /// Version the settings reached
    pub to: String,
    /// Time spent in the step in milliseconds
    pub duration_ms: i64,
}

/// Result of a successful settings upgrade.
#[derive(Debug, Clone, PartialEq, Eq, uniffi::Record)]
pub struct SettingsUpgrade {
    /// The migrated settings, serialized as a JSON object
    pub settings_json: String,
    /// The version the settings are now at
    pub version: String,
    /// Steps that ran, in order. Empty if the settings were already current.
    pub applied_steps: Vec<AppliedStepRecord>,
}

impl TryFrom<MigrationOutcome> for SettingsUpgrade {
    type Error = MigrationError;

    fn try_from(outcome: MigrationOutcome) -> Result<Self, Self::Error> {
        Ok(Self {
            settings_json: serialize_settings(&outcome.settings)?,
            version: outcome.version.to_string(),
            applied_steps: outcome
                .applied
                .into_iter()
                .map(|step| AppliedStepRecord {
                    from: step.from.to_string(),
                    to: step.to.to_string(),
                    duration_ms: step.duration_ms,
                })
                .collect(),
        })
    }
}

/// Upgrades a plugin's persisted settings when the plugin itself is updated.
///
/// One instance serves one plugin installation. Runs on the same instance never overlap: a
/// second upgrade requested while one is still in progress (for example while a migration form
/// is open) fails with `MigrationError::InvalidOperation`.
///
/// # Examples
///
/// ## Kotlin
///
/// ```kotlin
/// val migrator = PluginSettingsMigrator("my-plugin", formPresenter)
/// val upgrade = migrator.handleUpdate(previousVersion = "1.4.2", settings = storedJson)
/// save(upgrade.settingsJson)
/// ```
#[derive(uniffi::Object)]
pub struct PluginSettingsMigrator {
    plugin_id: String,
    runner: MigrationRunner,
    context: MigrationContext,
    run_guard: Mutex<()>,
}

#[migrator_export]
impl PluginSettingsMigrator {
    /// Creates a migrator with the plugin's built-in migrations.
    ///
    /// # Arguments
    /// * `plugin_id` - Identifier reported in the settings form descriptor
    /// * `form_presenter` - Renders forms for interactive steps. Without one, interactive steps
    ///   fail the upgrade.
    ///
    /// # Errors
    /// - `MigrationError::InvalidStep` / `MigrationError::InvalidVersion` if a built-in migration
    ///   is declared with a malformed range
    #[uniffi::constructor]
    #[allow(clippy::needless_pass_by_value)]
    pub fn new(
        plugin_id: String,
        form_presenter: Option<Arc<dyn FormPresenter>>,
    ) -> Result<Self, MigrationError> {
        Ok(Self::with_registry(
            &plugin_id,
            default_registry()?,
            form_presenter,
        ))
    }

    /// Migrates settings persisted by `previous_version` of the plugin.
    ///
    /// # Arguments
    /// * `previous_version` - The plugin version that wrote `settings`
    /// * `settings` - The persisted settings JSON, if any. Malformed settings are treated as empty.
    ///
    /// # Errors
    /// - `MigrationError::InvalidOperation` if another upgrade is in progress on this instance
    /// - `MigrationError::InvalidVersion` if `previous_version` is not a semantic version
    /// - `MigrationError::TransformFailed` / `MigrationError::UserCancelled` if a step fails
    #[allow(clippy::needless_pass_by_value)]
    pub async fn handle_update(
        &self,
        previous_version: &str,
        settings: Option<String>,
    ) -> Result<SettingsUpgrade, MigrationError> {
        let _guard = self.acquire_run()?;
        self.migrate(previous_version, settings.as_deref())
            .await?
            .try_into()
    }

    /// Migrates the settings stored under `key` in `store` and writes the result back.
    ///
    /// A missing key is treated as absent settings. The store is written once, after every step
    /// succeeded, and only if at least one step applied; a failed upgrade leaves the stored value
    /// untouched.
    ///
    /// # Errors
    /// - Any error from [`handle_update`](Self::handle_update)
    /// - `MigrationError::SettingsStore` if the store cannot be read or written
    #[allow(clippy::needless_pass_by_value)]
    pub async fn upgrade_stored(
        &self,
        store: Arc<dyn SettingsStore>,
        key: &str,
        previous_version: &str,
    ) -> Result<SettingsUpgrade, MigrationError> {
        let _guard = self.acquire_run()?;

        let stored = match store.get(key.to_string()) {
            Ok(value) => Some(value),
            Err(SettingsStoreError::KeyNotFound) => None,
            Err(e) => return Err(e.into()),
        };

        let outcome = self.migrate(previous_version, stored.as_deref()).await?;
        let migrated = outcome.migrated();
        let upgrade = SettingsUpgrade::try_from(outcome)?;

        if migrated {
            store.set(key.to_string(), upgrade.settings_json.clone())?;
            crate::info!(
                "settings_store.updated key={} version={}",
                key,
                upgrade.version
            );
        }

        Ok(upgrade)
    }

    /// The settings form descriptor the host registers for this plugin, as JSON.
    ///
    /// # Errors
    /// - `MigrationError::JsonError` if the descriptor fails to serialize
    pub fn settings_form_schema(&self) -> Result<String, MigrationError> {
        Ok(serde_json::to_string(&SettingsDescriptor::new(
            &self.plugin_id,
        ))?)
    }

    /// The version fully migrated settings end up at, if any migration is registered.
    #[must_use]
    pub fn latest_settings_version(&self) -> Option<String> {
        self.runner
            .registry()
            .latest_version()
            .map(ToString::to_string)
    }
}

impl PluginSettingsMigrator {
    /// Creates a migrator over a custom registry.
    #[must_use]
    pub fn with_registry(
        plugin_id: &str,
        registry: MigrationRegistry,
        form_presenter: Option<Arc<dyn FormPresenter>>,
    ) -> Self {
        let context = form_presenter.map_or_else(
            MigrationContext::new,
            MigrationContext::with_form_presenter,
        );
        Self {
            plugin_id: plugin_id.to_string(),
            runner: MigrationRunner::new(Arc::new(registry)),
            context,
            run_guard: Mutex::new(()),
        }
    }

    fn acquire_run(&self) -> MigrationResult<MutexGuard<'_, ()>> {
        self.run_guard.try_lock().map_err(|_| {
            crate::warn!("migration_run.rejected plugin={} reason=in_progress", self.plugin_id);
            MigrationError::InvalidOperation(
                "a settings upgrade is already in progress".to_string(),
            )
        })
    }

    async fn migrate(
        &self,
        previous_version: &str,
        settings: Option<&str>,
    ) -> MigrationResult<MigrationOutcome> {
        let previous_version = parse_version(previous_version)?;
        self.runner
            .run(&previous_version, settings, &self.context)
            .await
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Value};
    use tokio_test::{assert_pending, assert_ready};

    use super::*;
    use crate::migration::steps::PromptStep;
    use crate::primitives::form::{FieldDefinition, FormSchema, FormSpec};
    use crate::primitives::settings_store::InMemorySettingsStore;
    use crate::primitives::version::VersionRange;
    use crate::test_utils::{PendingFormPresenter, ScriptedFormPresenter};

    fn migrator() -> PluginSettingsMigrator {
        PluginSettingsMigrator::new("plugin.example".to_string(), None).unwrap()
    }

    fn interactive_registry() -> MigrationRegistry {
        let schema = FormSchema::builder()
            .field("text", FieldDefinition::text("Text").min_length(1).required())
            .build();
        MigrationRegistry::builder()
            .step(PromptStep::new(
                VersionRange::parse("1.5.1", "1.6.0").unwrap(),
                FormSpec::new("Fill in the new text field", schema),
            ))
            .build()
    }

    fn settings(upgrade: &SettingsUpgrade) -> Value {
        serde_json::from_str(&upgrade.settings_json).unwrap()
    }

    #[tokio::test]
    async fn test_handle_update() {
        let upgrade = migrator()
            .handle_update("1.4.2", Some("{}".to_string()))
            .await
            .unwrap();

        assert_eq!(upgrade.version, "1.5.1");
        assert_eq!(
            settings(&upgrade),
            json!({
                "version": "1.5.1",
                "field_from_1_4_2": "migrated",
                "field_from_1_5": "migrated 2",
                "somefield": 123,
            })
        );
        assert_eq!(
            upgrade
                .applied_steps
                .iter()
                .map(|step| step.to.as_str())
                .collect::<Vec<_>>(),
            vec!["1.4.3", "1.5.0", "1.5.1"]
        );
    }

    #[tokio::test]
    async fn test_handle_update_rejects_bad_version() {
        let err = migrator()
            .handle_update("one point four", None)
            .await
            .unwrap_err();

        assert!(matches!(err, MigrationError::InvalidVersion { .. }));
    }

    #[tokio::test]
    async fn test_interactive_upgrade() {
        let presenter = Arc::new(ScriptedFormPresenter::new(vec![Ok(
            r#"{"text":"from the form"}"#.to_string(),
        )]));
        let migrator = PluginSettingsMigrator::with_registry(
            "plugin.example",
            interactive_registry(),
            Some(presenter.clone()),
        );

        let upgrade = migrator.handle_update("1.5.1", None).await.unwrap();

        assert_eq!(
            settings(&upgrade),
            json!({ "text": "from the form", "version": "1.6.0" })
        );
        assert_eq!(presenter.requests()[0].title, "Fill in the new text field");
    }

    #[tokio::test]
    async fn test_overlapping_upgrade_is_rejected() {
        let (presenter, reply) = PendingFormPresenter::new();
        let migrator = PluginSettingsMigrator::with_registry(
            "plugin.example",
            interactive_registry(),
            Some(Arc::new(presenter)),
        );

        let mut first = tokio_test::task::spawn(migrator.handle_update("1.5.1", None));
        assert_pending!(first.poll());

        let err = migrator.handle_update("1.5.1", None).await.unwrap_err();
        assert!(matches!(err, MigrationError::InvalidOperation(_)));

        reply.send(Ok(r#"{"text":"done"}"#.to_string())).unwrap();
        assert!(first.is_woken());
        let upgrade = assert_ready!(first.poll()).unwrap();
        assert_eq!(upgrade.version, "1.6.0");

        // The guard is released once the first run finishes
        assert!(migrator.handle_update("1.6.0", None).await.is_ok());
    }

    #[tokio::test]
    async fn test_upgrade_stored_writes_result() {
        let store = Arc::new(InMemorySettingsStore::new());
        store
            .set("settings".to_string(), r#"{"text":"kept"}"#.to_string())
            .unwrap();

        let upgrade = migrator()
            .upgrade_stored(store.clone(), "settings", "1.5.0")
            .await
            .unwrap();

        assert_eq!(store.write_count(), 2);
        assert_eq!(store.peek("settings"), Some(upgrade.settings_json.clone()));
        assert_eq!(
            settings(&upgrade),
            json!({ "text": "kept", "version": "1.5.1", "field_from_1_5": "migrated 2" })
        );
    }

    #[tokio::test]
    async fn test_upgrade_stored_missing_key() {
        let store = Arc::new(InMemorySettingsStore::new());

        let upgrade = migrator()
            .upgrade_stored(store.clone(), "settings", "1.5.0")
            .await
            .unwrap();

        assert_eq!(upgrade.version, "1.5.1");
        assert_eq!(store.write_count(), 1);
    }

    #[tokio::test]
    async fn test_upgrade_stored_skips_write_when_current() {
        let store = Arc::new(InMemorySettingsStore::new());
        store
            .set("settings".to_string(), r#"{"version":"1.5.1"}"#.to_string())
            .unwrap();

        let upgrade = migrator()
            .upgrade_stored(store.clone(), "settings", "1.5.1")
            .await
            .unwrap();

        assert!(upgrade.applied_steps.is_empty());
        assert_eq!(store.write_count(), 1);
    }

    #[tokio::test]
    async fn test_upgrade_stored_keeps_value_on_failure() {
        let store = Arc::new(InMemorySettingsStore::new());
        store
            .set("settings".to_string(), r#"{"text":"old"}"#.to_string())
            .unwrap();
        let presenter = Arc::new(ScriptedFormPresenter::new(Vec::new()));
        let migrator = PluginSettingsMigrator::with_registry(
            "plugin.example",
            interactive_registry(),
            Some(presenter),
        );

        let err = migrator
            .upgrade_stored(store.clone(), "settings", "1.5.1")
            .await
            .unwrap_err();

        assert!(matches!(err, MigrationError::UserCancelled { .. }));
        assert_eq!(store.write_count(), 1);
        assert_eq!(store.peek("settings"), Some(r#"{"text":"old"}"#.to_string()));
    }

    #[test]
    fn test_settings_form_schema() {
        let descriptor: Value =
            serde_json::from_str(&migrator().settings_form_schema().unwrap()).unwrap();

        assert_eq!(descriptor["id"], json!("plugin.example"));
        assert_eq!(descriptor["schemaDefinition"]["required"], json!(["text"]));
        assert_eq!(descriptor["metaDefinition"]["order"], json!(["text"]));
    }

    #[test]
    fn test_latest_settings_version() {
        assert_eq!(migrator().latest_settings_version(), Some("1.5.1".to_string()));

        let empty = PluginSettingsMigrator::with_registry(
            "plugin.example",
            MigrationRegistry::builder().build(),
            None,
        );
        assert_eq!(empty.latest_settings_version(), None);
    }
}
