use serde_json::json;

use crate::migration::{MigrationRegistry, MigrationResult};
use crate::primitives::settings::stamp_version;
use crate::primitives::version::Version;

/// Builds the registry of every settings migration the plugin has shipped.
///
/// | from    | to      | changes                                                  |
/// |---------|---------|----------------------------------------------------------|
/// | `1.4.2` | `1.4.3` | `field_from_1_4_2 = "migrated"`                          |
/// | `1.4.3` | `1.5.0` | `field_from_1_5 = "migrated"`, `somefield = 123`         |
/// | `1.5.0` | `1.5.1` | `field_from_1_5 = "migrated 2"`                          |
///
/// Every step also stamps its target version into the blob.
///
/// # Errors
/// - `MigrationError::InvalidVersion` / `MigrationError::InvalidStep` if a step is declared with
///   a malformed range. The ranges are fixed, so this only fails if the table above is edited
///   incorrectly.
pub fn default_registry() -> MigrationResult<MigrationRegistry> {
    Ok(MigrationRegistry::builder()
        .fn_step("1.4.2", "1.4.3", |mut settings| {
            stamp_version(&mut settings, &Version::new(1, 4, 3));
            settings.insert("field_from_1_4_2".to_string(), json!("migrated"));
            Ok(settings)
        })?
        .fn_step("1.4.3", "1.5.0", |mut settings| {
            stamp_version(&mut settings, &Version::new(1, 5, 0));
            settings.insert("field_from_1_5".to_string(), json!("migrated"));
            settings.insert("somefield".to_string(), json!(123));
            Ok(settings)
        })?
        .fn_step("1.5.0", "1.5.1", |mut settings| {
            stamp_version(&mut settings, &Version::new(1, 5, 1));
            settings.insert("field_from_1_5".to_string(), json!("migrated 2"));
            Ok(settings)
        })?
        .build())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::Value;

    use super::*;
    use crate::migration::{MigrationContext, MigrationRunner};
    use crate::primitives::version::parse_version;

    fn runner() -> MigrationRunner {
        MigrationRunner::new(Arc::new(default_registry().unwrap()))
    }

    #[test]
    fn test_registry_shape() {
        let registry = default_registry().unwrap();

        assert_eq!(registry.len(), 3);
        assert!(registry.overlapping_steps().is_empty());
        assert_eq!(registry.latest_version(), Some(&Version::new(1, 5, 1)));
    }

    #[tokio::test]
    async fn test_full_chain_from_oldest_version() {
        let outcome = runner()
            .run(
                &parse_version("1.4.2").unwrap(),
                Some(r#"{"text":"hello"}"#),
                &MigrationContext::new(),
            )
            .await
            .unwrap();

        assert_eq!(
            Value::Object(outcome.settings),
            json!({
                "text": "hello",
                "version": "1.5.1",
                "field_from_1_4_2": "migrated",
                "field_from_1_5": "migrated 2",
                "somefield": 123,
            })
        );
        assert_eq!(outcome.version, Version::new(1, 5, 1));
        assert_eq!(outcome.applied.len(), 3);
    }

    #[tokio::test]
    async fn test_partial_chain() {
        let outcome = runner()
            .run(
                &parse_version("1.5.0").unwrap(),
                None,
                &MigrationContext::new(),
            )
            .await
            .unwrap();

        assert_eq!(
            Value::Object(outcome.settings),
            json!({ "version": "1.5.1", "field_from_1_5": "migrated 2" })
        );
    }

    #[tokio::test]
    async fn test_current_version_is_untouched() {
        let outcome = runner()
            .run(
                &parse_version("1.5.1").unwrap(),
                Some(r#"{"version":"1.5.1","text":"hi"}"#),
                &MigrationContext::new(),
            )
            .await
            .unwrap();

        assert!(!outcome.migrated());
        assert_eq!(
            Value::Object(outcome.settings),
            json!({ "version": "1.5.1", "text": "hi" })
        );
    }
}
