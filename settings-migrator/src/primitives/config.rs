use std::sync::{Arc, OnceLock};

use crate::migrator_export;

/// Global configuration for the migrator
static CONFIG_INSTANCE: OnceLock<MigratorConfig> = OnceLock::new();

/// Default upper bound on the number of steps applied in a single run.
pub const DEFAULT_MAX_CHAIN_LENGTH: u32 = 64;

/// Runtime knobs for migration runs.
#[derive(Debug, Clone, PartialEq, Eq, uniffi::Object)]
pub struct MigratorConfig {
    max_chain_length: u32,
    log_settings_payloads: bool,
}

#[migrator_export]
impl MigratorConfig {
    /// Creates a new `MigratorConfig`
    ///
    /// # Arguments
    /// * `max_chain_length` - Maximum number of steps a single run may apply before it is aborted
    ///   with `MigrationError::ChainTooLong`. Zero is treated as the default.
    /// * `log_settings_payloads` - Log the full settings blob at debug level after every step.
    ///   Settings may contain secrets; keep this off outside development builds.
    ///
    /// # Examples
    ///
    /// ## Kotlin
    ///
    /// ```kotlin
    /// val config = MigratorConfig(maxChainLength = 32u, logSettingsPayloads = false)
    /// ```
    #[uniffi::constructor]
    #[must_use]
    pub fn new(max_chain_length: u32, log_settings_payloads: bool) -> Self {
        let max_chain_length = if max_chain_length == 0 {
            DEFAULT_MAX_CHAIN_LENGTH
        } else {
            max_chain_length
        };
        Self {
            max_chain_length,
            log_settings_payloads,
        }
    }

    /// Gets the maximum number of steps per run
    #[must_use]
    pub fn max_chain_length(&self) -> u32 {
        self.max_chain_length
    }

    /// Whether settings payloads are logged after every step
    #[must_use]
    pub fn log_settings_payloads(&self) -> bool {
        self.log_settings_payloads
    }
}

impl Default for MigratorConfig {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CHAIN_LENGTH, false)
    }
}

/// Initializes the global migrator configuration.
///
/// This function should be called once at plugin load, before any migration runs.
/// Subsequent calls are ignored and log a warning.
///
/// # Examples
///
/// ## Swift
///
/// ```swift
/// SettingsMigrator.initMigratorConfig(config: MigratorConfig(maxChainLength: 32, logSettingsPayloads: false))
/// ```
#[uniffi::export]
#[allow(clippy::needless_pass_by_value)]
pub fn init_migrator_config(config: Arc<MigratorConfig>) {
    match CONFIG_INSTANCE.set(config.as_ref().clone()) {
        Ok(()) => {
            crate::info!(
                "Migrator config initialized max_chain_length={} log_settings_payloads={}",
                config.max_chain_length,
                config.log_settings_payloads
            );
        }
        Err(_) => {
            crate::warn!("Migrator config already initialized, ignoring");
        }
    }
}

/// Gets the installed migrator configuration, or the defaults if none was installed.
#[must_use]
pub fn current_config() -> MigratorConfig {
    CONFIG_INSTANCE.get().cloned().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_chain_length_uses_default() {
        let config = MigratorConfig::new(0, true);
        assert_eq!(config.max_chain_length(), DEFAULT_MAX_CHAIN_LENGTH);
        assert!(config.log_settings_payloads());
    }

    #[test]
    fn test_default_config() {
        let config = MigratorConfig::default();
        assert_eq!(config.max_chain_length(), DEFAULT_MAX_CHAIN_LENGTH);
        assert!(!config.log_settings_payloads());
    }

    #[test]
    fn test_current_config_falls_back_to_defaults() {
        // No test installs a global config, so the defaults are always visible here
        assert_eq!(current_config(), MigratorConfig::default());
    }
}
