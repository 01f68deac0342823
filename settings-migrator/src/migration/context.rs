use std::sync::Arc;

use crate::migration::StepError;
use crate::primitives::form::{parse_form_response, FormPresenter, FormSpec};
use crate::primitives::settings::SettingsBlob;

/// Capabilities handed to every step's transform.
///
/// A context is created by the host for one run and borrowed by each step in turn; it holds no
/// per-step state.
#[derive(Clone, Default)]
pub struct MigrationContext {
    form_presenter: Option<Arc<dyn FormPresenter>>,
}

impl MigrationContext {
    /// A context without interactive capabilities. Steps that open a form fail with
    /// [`StepError::NoFormPresenter`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A context whose steps may open forms through `form_presenter`.
    #[must_use]
    pub fn with_form_presenter(form_presenter: Arc<dyn FormPresenter>) -> Self {
        Self {
            form_presenter: Some(form_presenter),
        }
    }

    /// Whether steps can open forms.
    #[must_use]
    pub const fn is_interactive(&self) -> bool {
        self.form_presenter.is_some()
    }

    /// Opens a form and waits until the user submits or dismisses it.
    ///
    /// # Errors
    /// - `StepError::NoFormPresenter` if the context is not interactive
    /// - `StepError::Form` with `FormError::Cancelled` if the user dismissed the form
    /// - `StepError::Form` with `FormError::InvalidSubmission` if the reply is not a field mapping
    pub async fn open_form(&self, spec: &FormSpec) -> Result<SettingsBlob, StepError> {
        let presenter = self
            .form_presenter
            .as_ref()
            .ok_or(StepError::NoFormPresenter)?;

        let request = spec.to_request()?;
        crate::debug!(
            "migration_form.opened title={:?} fields={}",
            request.title,
            spec.schema.field_names().len()
        );

        let response = presenter.open_form(request).await?;
        let values = parse_form_response(&response)?;

        crate::debug!(
            "migration_form.submitted title={:?} fields={}",
            spec.title,
            values.len()
        );
        Ok(values)
    }
}

impl std::fmt::Debug for MigrationContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MigrationContext")
            .field("interactive", &self.is_interactive())
            .finish()
    }
}
