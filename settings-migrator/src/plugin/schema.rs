use serde::Serialize;

use crate::primitives::form::{FieldDefinition, FormSchema};

/// The plugin's settings form: a single required, non-empty `text` field.
#[must_use]
pub fn settings_schema() -> FormSchema {
    FormSchema::builder()
        .field("text", FieldDefinition::text("Text").min_length(1).required())
        .build()
}

/// The content-type descriptor the host registers for the plugin's settings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SettingsDescriptor {
    /// Plugin identifier
    pub id: String,
    /// Schema and UI metadata
    #[serde(flatten)]
    pub schema: FormSchema,
}

impl SettingsDescriptor {
    /// Describes the settings of the plugin `plugin_id`.
    #[must_use]
    pub fn new(plugin_id: &str) -> Self {
        Self {
            id: plugin_id.to_string(),
            schema: settings_schema(),
        }
    }
}
