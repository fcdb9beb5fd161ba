pub mod chat;
pub mod config;
pub mod error;
pub mod identity;
pub mod model;
pub mod pipeline;
pub mod prompt;
pub mod session;
pub mod stage;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

// Re-export common error type
pub use error::CodewiseError;

pub use chat::ChatStage;
pub use model::{ModelClient, ModelError};
pub use pipeline::{PipelineOrchestrator, PipelineOutcome, PipelineResult};
pub use session::SessionStore;
pub use stage::{FailureKind, StageFailure, StageOutcome};
