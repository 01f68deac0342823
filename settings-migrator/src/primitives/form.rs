use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::primitives::settings::SettingsBlob;

/// Base content-type definition every plugin schema composes with through `allOf`.
pub const BASE_SCHEMA_REF: &str = "#/components/schemas/AbstractContentTypeSchemaDefinition";

/// Interactive form interface that the host must implement so migrations can ask the user for input.
///
/// The host renders `request.schema_json` (a `{ "schemaDefinition": .., "metaDefinition": .. }`
/// document) as a modal and resolves once the user submits or dismisses it. The call may stay
/// pending for as long as the form is open; the migration run waits with it.
///
/// Native implementations should map a dismissed modal to [`FormError::Cancelled`].
#[uniffi::export(with_foreign)]
#[async_trait::async_trait]
pub trait FormPresenter: Send + Sync {
    /// Opens a form and waits for the user.
    ///
    /// # Arguments
    /// * `request` - Title, size hint and the schema describing the fields to render
    ///
    /// # Returns
    /// The submitted values as a JSON object mapping field name to value.
    ///
    /// # Errors
    /// * `FormError::Cancelled` - The user dismissed the form
    /// * `FormError::InvalidSubmission` - The form could not produce a submission
    async fn open_form(&self, request: FormRequest) -> Result<String, FormError>;
}

/// Size hint for the rendered modal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, uniffi::Enum)]
#[serde(rename_all = "lowercase")]
pub enum FormSize {
    /// Small modal
    Sm,
    /// Medium modal
    Md,
    /// Large modal
    Lg,
}

/// A form request handed to the host's [`FormPresenter`].
#[derive(Debug, Clone, PartialEq, Eq, uniffi::Record)]
pub struct FormRequest {
    /// Modal title
    pub title: String,
    /// Optional size hint
    pub size: Option<FormSize>,
    /// Serialized [`FormSchema`]
    pub schema_json: String,
}

/// Errors reported by the host's form subsystem.
#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum FormError {
    /// The user dismissed the form without submitting it
    #[error("form was cancelled by the user")]
    Cancelled,
    /// The form produced something that is not a field mapping
    #[error("invalid form submission: {message}")]
    InvalidSubmission {
        /// What was wrong with the submission
        message: String,
    },
    /// An unexpected error occurred in the foreign callback
    #[error("unexpected error in foreign callback: {message}")]
    UnexpectedUniFFICallbackError {
        /// The reason reported by UniFFI
        message: String,
    },
}

impl From<uniffi::UnexpectedUniFFICallbackError> for FormError {
    fn from(e: uniffi::UnexpectedUniFFICallbackError) -> Self {
        Self::UnexpectedUniFFICallbackError { message: e.reason }
    }
}

/// Widget used to render a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputType {
    /// Single-line text input
    Text,
    /// Multi-line text input
    Textarea,
    /// Numeric input
    Number,
    /// Boolean checkbox
    Checkbox,
}

/// UI hints for a single field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyConfig {
    /// Label displayed next to the input
    pub label: String,
    /// Whether values must be unique across content objects
    pub unique: bool,
    /// Help text displayed under the input
    pub help_text: String,
    /// Widget used to render the field
    pub input_type: InputType,
}

/// UI metadata running parallel to the JSON schema.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetaDefinition {
    /// Field display order
    pub order: Vec<String>,
    /// Per-field UI hints
    pub properties_config: BTreeMap<String, PropertyConfig>,
}

/// A content-type shaped form description: JSON schema plus UI metadata.
///
/// Both the plugin's own settings form and ad-hoc forms opened mid-migration use this shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormSchema {
    /// JSON schema: an `allOf` of [`BASE_SCHEMA_REF`] and the field properties
    pub schema_definition: Value,
    /// UI metadata
    pub meta_definition: MetaDefinition,
}

impl FormSchema {
    /// Starts building a schema.
    #[must_use]
    pub fn builder() -> FormSchemaBuilder {
        FormSchemaBuilder::default()
    }

    /// Field names in display order.
    #[must_use]
    pub fn field_names(&self) -> &[String] {
        &self.meta_definition.order
    }

    /// Names listed in the schema's `required` array.
    #[must_use]
    pub fn required_fields(&self) -> Vec<&str> {
        self.schema_definition
            .get("required")
            .and_then(Value::as_array)
            .map(|required| required.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }
}

/// A single field: its JSON schema property and UI hints.
#[derive(Debug, Clone)]
pub struct FieldDefinition {
    property: Map<String, Value>,
    config: PropertyConfig,
    required: bool,
}

impl FieldDefinition {
    fn new(json_type: &str, label: &str, input_type: InputType) -> Self {
        let mut property = Map::new();
        property.insert("type".to_string(), Value::String(json_type.to_string()));
        Self {
            property,
            config: PropertyConfig {
                label: label.to_string(),
                unique: false,
                help_text: String::new(),
                input_type,
            },
            required: false,
        }
    }

    /// A single-line string field.
    #[must_use]
    pub fn text(label: &str) -> Self {
        Self::new("string", label, InputType::Text)
    }

    /// A multi-line string field.
    #[must_use]
    pub fn textarea(label: &str) -> Self {
        Self::new("string", label, InputType::Textarea)
    }

    /// A numeric field.
    #[must_use]
    pub fn number(label: &str) -> Self {
        Self::new("number", label, InputType::Number)
    }

    /// A boolean field.
    #[must_use]
    pub fn checkbox(label: &str) -> Self {
        Self::new("boolean", label, InputType::Checkbox)
    }

    /// Sets the minimum string length.
    #[must_use]
    pub fn min_length(mut self, min_length: u32) -> Self {
        self.property
            .insert("minLength".to_string(), Value::from(min_length));
        self
    }

    /// Sets the help text.
    #[must_use]
    pub fn help_text(mut self, help_text: &str) -> Self {
        self.config.help_text = help_text.to_string();
        self
    }

    /// Marks values as unique across content objects.
    #[must_use]
    pub const fn unique(mut self) -> Self {
        self.config.unique = true;
        self
    }

    /// Adds the field to the schema's `required` list.
    #[must_use]
    pub const fn required(mut self) -> Self {
        self.required = true;
        self
    }
}

/// Builder for [`FormSchema`].
#[derive(Debug, Clone, Default)]
pub struct FormSchemaBuilder {
    fields: Vec<(String, FieldDefinition)>,
}

impl FormSchemaBuilder {
    /// Appends a field. Fields are displayed in the order they are added; adding a name twice
    /// replaces the earlier definition in place.
    #[must_use]
    pub fn field(mut self, name: &str, definition: FieldDefinition) -> Self {
        if let Some(existing) = self.fields.iter_mut().find(|(n, _)| n == name) {
            existing.1 = definition;
        } else {
            self.fields.push((name.to_string(), definition));
        }
        self
    }

    /// Builds the schema.
    #[must_use]
    pub fn build(self) -> FormSchema {
        let mut properties = Map::new();
        let mut required = Vec::new();
        let mut meta = MetaDefinition::default();

        for (name, definition) in self.fields {
            if definition.required {
                required.push(Value::String(name.clone()));
            }
            properties.insert(name.clone(), Value::Object(definition.property));
            meta.properties_config.insert(name.clone(), definition.config);
            meta.order.push(name);
        }

        FormSchema {
            schema_definition: json!({
                "type": "object",
                "allOf": [
                    { "$ref": BASE_SCHEMA_REF },
                    { "type": "object", "properties": properties },
                ],
                "required": required,
                "additionalProperties": false,
            }),
            meta_definition: meta,
        }
    }
}

/// A form a migration step wants to show.
#[derive(Debug, Clone, PartialEq)]
pub struct FormSpec {
    /// Modal title
    pub title: String,
    /// Optional size hint
    pub size: Option<FormSize>,
    /// Fields to render
    pub schema: FormSchema,
}

impl FormSpec {
    /// Creates a form spec without a size hint.
    #[must_use]
    pub fn new(title: &str, schema: FormSchema) -> Self {
        Self {
            title: title.to_string(),
            size: None,
            schema,
        }
    }

    /// Sets the size hint.
    #[must_use]
    pub const fn with_size(mut self, size: FormSize) -> Self {
        self.size = Some(size);
        self
    }

    /// Converts the form into the request shape handed across FFI.
    ///
    /// # Errors
    /// - `serde_json::Error` if the schema fails to serialize.
    pub fn to_request(&self) -> Result<FormRequest, serde_json::Error> {
        Ok(FormRequest {
            title: self.title.clone(),
            size: self.size,
            schema_json: serde_json::to_string(&self.schema)?,
        })
    }
}

/// Parses the host's reply into a field mapping.
///
/// # Errors
/// - `FormError::InvalidSubmission` if the reply is not a JSON object.
pub fn parse_form_response(response: &str) -> Result<SettingsBlob, FormError> {
    match serde_json::from_str::<Value>(response) {
        Ok(Value::Object(values)) => Ok(values),
        Ok(_) => Err(FormError::InvalidSubmission {
            message: "expected a JSON object of field values".to_string(),
        }),
        Err(e) => Err(FormError::InvalidSubmission {
            message: e.to_string(),
        }),
    }
}
