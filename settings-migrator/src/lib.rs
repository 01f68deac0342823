#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    dead_code
)]

//! `settings_migrator` upgrades a plugin's persisted settings blob across plugin versions.
//!
//! A [`migration::MigrationRegistry`] holds the ordered version-to-version steps, and a
//! [`migration::MigrationRunner`] walks the chain of applicable steps until the blob is
//! at the latest schema. Steps may pause the chain to collect input through a
//! host-rendered form ([`primitives::form::FormPresenter`]).
//!
//! Hosts that talk to the engine over FFI use [`plugin::PluginSettingsMigrator`].

/// Error handling utilities shared by every FFI-facing error enum.
pub mod migrator_error;

/// Low level primitives: versions, settings blobs, forms, configuration, logging and storage.
pub mod primitives;

/// The migration engine: steps, registry, context and runner.
pub mod migration;

/// Host-facing plugin surface: built-in migrations, settings schema and the exported migrator.
pub mod plugin;

#[cfg(test)]
mod test_utils;

pub use migrator_error::migrator_error;
pub use settings_migrator_macros::migrator_export;

uniffi::setup_scaffolding!("settings_migrator");
