#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use settings_migrator::primitives::form::{FormError, FormPresenter, FormRequest};
use settings_migrator::primitives::settings_store::{SettingsStore, SettingsStoreError};

/// Host-side form presenter answering every form with the same submission.
pub struct AutoSubmitPresenter {
    submission: Option<String>,
    opened: Mutex<Vec<FormRequest>>,
}

impl AutoSubmitPresenter {
    pub fn submitting(submission: &str) -> Arc<Self> {
        Arc::new(Self {
            submission: Some(submission.to_string()),
            opened: Mutex::new(Vec::new()),
        })
    }

    /// A presenter whose user dismisses every form.
    pub fn dismissing() -> Arc<Self> {
        Arc::new(Self {
            submission: None,
            opened: Mutex::new(Vec::new()),
        })
    }

    pub fn opened(&self) -> Vec<FormRequest> {
        self.opened.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl FormPresenter for AutoSubmitPresenter {
    async fn open_form(&self, request: FormRequest) -> Result<String, FormError> {
        self.opened.lock().unwrap().push(request);
        self.submission.clone().ok_or(FormError::Cancelled)
    }
}

/// Host-side settings store backed by a `HashMap`.
#[derive(Default)]
pub struct HostSettingsStore {
    values: Mutex<HashMap<String, String>>,
    fail_writes: bool,
}

impl HostSettingsStore {
    pub fn with_value(key: &str, value: &str) -> Arc<Self> {
        let store = Self::default();
        store
            .values
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        Arc::new(store)
    }

    pub fn read_only(key: &str, value: &str) -> Arc<Self> {
        let store = Self {
            fail_writes: true,
            ..Self::default()
        };
        store
            .values
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        Arc::new(store)
    }

    pub fn value(&self, key: &str) -> Option<String> {
        self.values.lock().unwrap().get(key).cloned()
    }
}

impl SettingsStore for HostSettingsStore {
    fn get(&self, key: String) -> Result<String, SettingsStoreError> {
        self.value(&key).ok_or(SettingsStoreError::KeyNotFound)
    }

    fn set(&self, key: String, value: String) -> Result<(), SettingsStoreError> {
        if self.fail_writes {
            return Err(SettingsStoreError::UpdateFailure);
        }
        self.values.lock().unwrap().insert(key, value);
        Ok(())
    }
}
