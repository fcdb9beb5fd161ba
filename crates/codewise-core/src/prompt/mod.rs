//! Prompt templates and rendering.
//!
//! - `spec`: the immutable [`PromptSpec`] and the [`PromptRenderer`]
//! - `templates`: the built-in prompts for analysis, test generation,
//!   test explanation and chat

mod spec;
pub mod templates;

pub use spec::{
    MissingVariable, PromptRenderer, PromptSpec, PromptVariables, RenderError, prompt_vars,
};
