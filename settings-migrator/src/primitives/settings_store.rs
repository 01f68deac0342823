use thiserror::Error;

/// Errors that can occur when interacting with the host's settings store
#[allow(clippy::module_name_repetitions)]
#[derive(Debug, Error, uniffi::Error)]
pub enum SettingsStoreError {
    /// The requested key was not found in the store
    #[error("key not found")]
    KeyNotFound,
    /// Failed to read the value from the store
    #[error("failed to read value")]
    ReadFailure,
    /// Failed to update the value in the store
    #[error("failed to update value")]
    UpdateFailure,
    /// An unexpected error occurred in the foreign callback
    #[error("unexpected error in foreign callback: {message}")]
    UnexpectedUniFFICallbackError {
        /// The reason reported by UniFFI
        message: String,
    },
}

impl From<uniffi::UnexpectedUniFFICallbackError> for SettingsStoreError {
    fn from(e: uniffi::UnexpectedUniFFICallbackError) -> Self {
        Self::UnexpectedUniFFICallbackError { message: e.reason }
    }
}

/// A trait implemented by the host to persist plugin settings strings.
///
/// Values are the serialized settings blobs exactly as the host stores them. The migrator reads a
/// value once at the start of a persisted upgrade and writes it once, after the whole migration
/// chain has completed; a failed chain leaves the stored value untouched.
#[uniffi::export(with_foreign)]
pub trait SettingsStore: Send + Sync {
    /// Get a value from the store
    ///
    /// # Errors
    /// - `SettingsStoreError::KeyNotFound` if the key is not found
    /// - `SettingsStoreError::ReadFailure` if the value cannot be read
    fn get(&self, key: String) -> Result<String, SettingsStoreError>;

    /// Set a value in the store
    ///
    /// # Errors
    /// - `SettingsStoreError::UpdateFailure` if something goes wrong while updating the value
    fn set(&self, key: String, value: String) -> Result<(), SettingsStoreError>;
}

#[cfg(test)]
/// In-memory implementation of `SettingsStore` for testing purposes
#[derive(Default)]
pub struct InMemorySettingsStore {
    store: std::sync::Mutex<std::collections::HashMap<String, String>>,
    writes: std::sync::atomic::AtomicU32,
}

#[cfg(test)]
impl InMemorySettingsStore {
    /// Creates a new empty in-memory store
    #[must_use]
    pub fn new() -> Self {
        Self {
            store: std::sync::Mutex::new(std::collections::HashMap::new()),
            writes: std::sync::atomic::AtomicU32::new(0),
        }
    }

    /// Number of successful `set` calls
    pub fn write_count(&self) -> u32 {
        self.writes.load(std::sync::atomic::Ordering::SeqCst)
    }

    /// Reads a value without going through the trait
    pub fn peek(&self, key: &str) -> Option<String> {
        self.store.lock().unwrap().get(key).cloned()
    }
}

#[cfg(test)]
impl SettingsStore for InMemorySettingsStore {
    fn get(&self, key: String) -> Result<String, SettingsStoreError> {
        let value = self.store.lock().unwrap().get(&key).cloned();
        value.ok_or(SettingsStoreError::KeyNotFound)
    }

    fn set(&self, key: String, value: String) -> Result<(), SettingsStoreError> {
        self.store.lock().unwrap().insert(key, value);
        self.writes.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        Ok(())
    }
}
