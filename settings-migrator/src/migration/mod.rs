//! Settings Migration
//!
//! Upgrades a plugin's settings blob from the version it was persisted at to the latest schema
//! by walking a linear chain of version-to-version steps.
//!
//! # Overview
//!
//! - [`MigrationStep`]: Trait for a single upgrade rule covering `[from, to)`
//! - [`MigrationRegistry`]: Ordered, immutable list of steps with first-match lookup
//! - [`MigrationRunner`]: Applies applicable steps one after another until none applies
//! - [`MigrationContext`]: Capabilities a step may use, such as opening a form
//!
//! # Usage
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use serde_json::json;
//! use settings_migrator::migration::{MigrationContext, MigrationRegistry, MigrationRunner};
//! use settings_migrator::primitives::version::parse_version;
//!
//! # async fn example() -> Result<(), settings_migrator::migration::MigrationError> {
//! let registry = MigrationRegistry::builder()
//!     .fn_step("1.4.2", "1.4.3", |mut settings| {
//!         settings.insert("field_from_1_4_2".to_string(), json!("migrated"));
//!         Ok(settings)
//!     })?
//!     .build();
//!
//! let runner = MigrationRunner::new(Arc::new(registry));
//! let outcome = runner
//!     .run(&parse_version("1.4.2")?, Some("{}"), &MigrationContext::new())
//!     .await?;
//!
//! assert_eq!(outcome.version.to_string(), "1.4.3");
//! # Ok(())
//! # }
//! ```
//!
//! ## Adding New Migrations
//!
//! 1. Write the step: a closure through [`MigrationRegistryBuilder::fn_step`] for plain data
//!    rewrites, or a type implementing [`MigrationStep`] when it needs the context (see
//!    [`steps::PromptStep`])
//! 2. Append it to the plugin's registry (`plugin::migrations::default_registry`). Order matters
//!    only when ranges overlap: the earlier step wins
//! 3. Stamp the target version into the blob with
//!    [`stamp_version`](crate::primitives::settings::stamp_version)
//!
//! Never edit a released step; add a new one covering the next range instead.

mod context;
mod error;
mod registry;
mod runner;
mod step;

/// Reusable step implementations
pub mod steps;

pub use context::MigrationContext;
pub use error::{MigrationError, MigrationResult, StepError};
pub use registry::{MigrationRegistry, MigrationRegistryBuilder};
pub use runner::{AppliedStep, MigrationOutcome, MigrationRunner};
pub use step::{FnStep, MigrationStep};
