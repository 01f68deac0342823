use serde_json::{Map, Value};

use crate::migration::MigrationResult;
use crate::primitives::version::Version;

/// A plugin's settings: string keys mapped to JSON values.
///
/// The host owns the persisted form; the engine only ever works on a deserialized copy.
pub type SettingsBlob = Map<String, Value>;

/// Conventional field in which migration steps record the last version they migrated to.
pub const VERSION_FIELD: &str = "version";

/// Deserializes persisted settings into a [`SettingsBlob`].
///
/// Absent settings yield an empty blob. So do settings that are not a JSON object, since a plugin
/// that cannot read its settings is better served by its defaults than by a failed upgrade. The
/// malformed payload is logged and otherwise dropped.
#[must_use]
pub fn parse_settings(serialized: Option<&str>) -> SettingsBlob {
    let Some(serialized) = serialized else {
        return SettingsBlob::new();
    };

    match serde_json::from_str::<Value>(serialized) {
        Ok(Value::Object(settings)) => settings,
        Ok(Value::Null) => SettingsBlob::new(),
        Ok(other) => {
            crate::warn!(
                "settings.malformed reason=not_an_object kind={} len={}",
                json_kind(&other),
                serialized.len()
            );
            SettingsBlob::new()
        }
        Err(e) => {
            crate::warn!(
                "settings.malformed reason=invalid_json error={} len={}",
                e,
                serialized.len()
            );
            SettingsBlob::new()
        }
    }
}

/// Serializes a settings blob for the host to persist.
///
/// # Errors
/// - `MigrationError::JsonError` if serialization fails.
pub fn serialize_settings(settings: &SettingsBlob) -> MigrationResult<String> {
    Ok(serde_json::to_string(settings)?)
}

/// Records `version` in the blob's [`VERSION_FIELD`].
pub fn stamp_version(settings: &mut SettingsBlob, version: &Version) {
    settings.insert(
        VERSION_FIELD.to_string(),
        Value::String(version.to_string()),
    );
}

const fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
