use std::cell::RefCell;

thread_local! {
    static LOG_CONTEXT: RefCell<Option<String>> = const { RefCell::new(None) };
}

/// A scope guard that sets a logging context and restores the previous one when dropped.
///
/// # Examples
///
/// ```rust
/// use settings_migrator::primitives::logger::LogContext;
///
/// {
///     let _ctx = LogContext::new("MigrationRunner");
///     settings_migrator::info!("This will be prefixed with [MigrationRunner]");
/// } // Context restored here
/// ```
pub struct LogContext {
    previous: Option<String>,
}

impl LogContext {
    /// Creates a new logging context scope.
    ///
    /// The context will be active until this `LogContext` is dropped.
    #[must_use]
    pub fn new(module: &str) -> Self {
        let previous = LOG_CONTEXT.with(|ctx| {
            let mut ctx = ctx.borrow_mut();
            let prev = ctx.clone();
            *ctx = Some(format!("[{module}]"));
            prev
        });

        Self { previous }
    }
}

impl Drop for LogContext {
    fn drop(&mut self) {
        LOG_CONTEXT.with(|ctx| {
            (*ctx.borrow_mut()).clone_from(&self.previous);
        });
    }
}

/// Gets the current logging context, if any.
#[must_use]
pub fn get_context() -> Option<String> {
    LOG_CONTEXT.with(|ctx| ctx.borrow().clone())
}

/// Macro to create a scoped logging context.
///
/// # Examples
///
/// ```rust
/// use settings_migrator::with_log_context;
///
/// with_log_context!("PromptStep" => {
///     settings_migrator::info!("This will be prefixed with [PromptStep]");
/// });
/// ```
#[macro_export]
macro_rules! with_log_context {
    ($module:expr => $block:block) => {{
        let _ctx = $crate::primitives::logger::LogContext::new($module);
        $block
    }};
}

/// Sets a logging context for the current scope.
///
/// # Examples
///
/// ```rust
/// use settings_migrator::set_log_context;
///
/// let _ctx = set_log_context!("MigrationRegistry");
/// settings_migrator::info!("This will be prefixed with [MigrationRegistry]");
/// ```
#[macro_export]
macro_rules! set_log_context {
    ($module:expr) => {
        $crate::primitives::logger::LogContext::new($module)
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_is_scoped_and_nested() {
        assert_eq!(get_context(), None);
        {
            let _outer = LogContext::new("MigrationRunner");
            assert_eq!(get_context().as_deref(), Some("[MigrationRunner]"));
            {
                let _inner = crate::set_log_context!("PromptStep");
                assert_eq!(get_context().as_deref(), Some("[PromptStep]"));
            }
            assert_eq!(get_context().as_deref(), Some("[MigrationRunner]"));
        }
        assert_eq!(get_context(), None);
    }

    #[test]
    fn test_with_log_context_returns_block_value() {
        let value = crate::with_log_context!("MigrationRegistry" => {
            get_context()
        });
        assert_eq!(value.as_deref(), Some("[MigrationRegistry]"));
        assert_eq!(get_context(), None);
    }
}
