//! Application layer for codewise.
//!
//! [`AssistantUseCase`] is the boundary every front end goes through: it
//! verifies the caller, runs the requested stage and maps failures to
//! [`AssistantError`].

pub mod assistant_usecase;
pub mod dto;
pub mod error;

pub use assistant_usecase::AssistantUseCase;
pub use error::{AssistantError, FailureOrigin};
