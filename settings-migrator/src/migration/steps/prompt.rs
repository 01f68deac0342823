use async_trait::async_trait;
use serde_json::Value;

use crate::migration::{MigrationContext, MigrationStep, StepError};
use crate::primitives::form::FormSpec;
use crate::primitives::settings::{stamp_version, SettingsBlob};
use crate::primitives::version::VersionRange;

/// An interactive step that asks the user for new settings values.
///
/// The step opens its form through the run's [`MigrationContext`], waits for the submission,
/// checks that every required field came back, merges the values into the blob and stamps the
/// target version. Dismissing the form aborts the run with `MigrationError::UserCancelled`.
///
/// # Examples
///
/// ```rust
/// use settings_migrator::migration::steps::PromptStep;
/// use settings_migrator::primitives::form::{FieldDefinition, FormSchema, FormSpec};
/// use settings_migrator::primitives::version::VersionRange;
///
/// let schema = FormSchema::builder()
///     .field("api_key", FieldDefinition::text("API key").min_length(1).required())
///     .build();
/// let step = PromptStep::new(
///     VersionRange::parse("1.5.1", "1.6.0").unwrap(),
///     FormSpec::new("Connect your account", schema),
/// )
/// .nested_under("credentials");
/// ```
#[derive(Debug)]
pub struct PromptStep {
    range: VersionRange,
    form: FormSpec,
    nested_under: Option<String>,
    skip_when_present: bool,
}

impl PromptStep {
    /// Creates a step that merges the submitted values at the top level of the blob.
    #[must_use]
    pub const fn new(range: VersionRange, form: FormSpec) -> Self {
        Self {
            range,
            form,
            nested_under: None,
            skip_when_present: false,
        }
    }

    /// Merge the submitted values into the object stored under `key` instead, creating it if
    /// needed.
    #[must_use]
    pub fn nested_under(mut self, key: &str) -> Self {
        self.nested_under = Some(key.to_string());
        self
    }

    /// Don't open the form when every field of the form already has a value.
    #[must_use]
    pub const fn skip_when_present(mut self) -> Self {
        self.skip_when_present = true;
        self
    }

    fn target<'a>(&self, settings: &'a SettingsBlob) -> Option<&'a SettingsBlob> {
        match &self.nested_under {
            None => Some(settings),
            Some(key) => settings.get(key).and_then(Value::as_object),
        }
    }

    fn already_answered(&self, settings: &SettingsBlob) -> bool {
        self.target(settings).is_some_and(|target| {
            self.form
                .schema
                .field_names()
                .iter()
                .all(|field| target.get(field).is_some_and(|value| !value.is_null()))
        })
    }

    fn merge(&self, settings: &mut SettingsBlob, values: SettingsBlob) -> Result<(), StepError> {
        let target = match &self.nested_under {
            None => settings,
            Some(key) => {
                let entry = settings
                    .entry(key.clone())
                    .or_insert_with(|| Value::Object(SettingsBlob::new()));
                if entry.is_null() {
                    *entry = Value::Object(SettingsBlob::new());
                }
                entry.as_object_mut().ok_or_else(|| {
                    StepError::Invalid(format!("settings field {key:?} is not an object"))
                })?
            }
        };
        target.extend(values);
        Ok(())
    }
}

#[async_trait]
impl MigrationStep for PromptStep {
    fn range(&self) -> &VersionRange {
        &self.range
    }

    async fn transform(
        &self,
        mut settings: SettingsBlob,
        context: &MigrationContext,
    ) -> Result<SettingsBlob, StepError> {
        if self.skip_when_present && self.already_answered(&settings) {
            crate::info!(
                "migration_prompt.skipped step={} reason=already_answered",
                self.range
            );
        } else {
            let values = context.open_form(&self.form).await?;

            let missing: Vec<&str> = self
                .form
                .schema
                .required_fields()
                .into_iter()
                .filter(|field| values.get(*field).map_or(true, Value::is_null))
                .collect();
            if !missing.is_empty() {
                return Err(StepError::Invalid(format!(
                    "form submission is missing required fields: {}",
                    missing.join(", ")
                )));
            }

            self.merge(&mut settings, values)?;
        }

        stamp_version(&mut settings, self.range.to());
        Ok(settings)
    }
}
