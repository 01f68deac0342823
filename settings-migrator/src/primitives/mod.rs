/// Semantic versions and the half-open ranges migration steps cover.
pub mod version;

/// The settings blob exchanged with the host and its (de)serialization.
pub mod settings;

/// Interactive forms rendered by the host (foreign `FormPresenter`) and the schema shape they share.
pub mod form;

/// Foreign settings persistence used by the persisted upgrade path.
pub mod settings_store;

/// Process-wide migrator configuration.
pub mod config;

/// Logging that forwards to a host-provided logger.
pub mod logger;
