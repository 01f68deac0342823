//! Migrator error handling utilities
//!
//! Error enums that cross the FFI boundary are declared with `#[migrator_error]`,
//! which combines strongly typed variants for known failure cases with a
//! `Generic` variant that absorbs `anyhow` error chains.

pub use settings_migrator_macros::migrator_error;

/// Helper trait for flattening anyhow errors into a single message
pub trait AnyhowErrorExt {
    /// Convert an anyhow error to a string, preserving the error chain
    fn to_generic_message(self) -> String;

    /// Convert an anyhow error to a string with a custom prefix
    fn to_generic_message_with_prefix(self, prefix: &str) -> String;
}

impl AnyhowErrorExt for anyhow::Error {
    fn to_generic_message(self) -> String {
        let mut message = self.to_string();

        let chain: Vec<String> = self.chain().skip(1).map(ToString::to_string).collect();
        if !chain.is_empty() {
            message.push_str(" (caused by: ");
            message.push_str(&chain.join(" -> "));
            message.push(')');
        }

        message
    }

    fn to_generic_message_with_prefix(self, prefix: &str) -> String {
        format!("{}: {}", prefix, self.to_generic_message())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migration::MigrationError;

    #[test]
    fn test_anyhow_error_ext() {
        let error = anyhow::anyhow!("unexpected token")
            .context("parsing stored settings")
            .context("loading plugin settings");

        let message = error.to_generic_message();
        assert!(message.starts_with("loading plugin settings"));
        assert!(message.contains("caused by"));
        assert!(message.contains("parsing stored settings -> unexpected token"));
    }

    #[test]
    fn test_anyhow_error_ext_with_prefix() {
        let error = anyhow::anyhow!("form presenter went away");
        let message = error.to_generic_message_with_prefix("Migration failed");
        assert_eq!(message, "Migration failed: form presenter went away");
    }

    #[test]
    fn test_generated_from_anyhow() {
        use anyhow::Context;

        let result: anyhow::Result<()> = Err(anyhow::anyhow!("disk full")).context("persisting");
        let error = MigrationError::from_anyhow_result(result).unwrap_err();
        match error {
            MigrationError::Generic { message } => {
                assert_eq!(message, "persisting (caused by: disk full)");
            }
            e => panic!("Expected Generic error, got: {e:?}"),
        }
    }
}
