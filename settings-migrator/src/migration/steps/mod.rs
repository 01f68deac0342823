/// Interactive step that collects new settings values through a form.
pub mod prompt;

pub use prompt::PromptStep;
