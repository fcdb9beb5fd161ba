//! Structured generation stages.
//!
//! # Module Structure
//!
//! - `outcome`: [`StageOutcome`], [`StageFailure`] and the [`FailureKind`] taxonomy
//! - `schema`: the three result shapes and the strict [`StructuredOutput`] validator
//! - `structured`: [`StructuredStage`], one render → invoke → validate unit

mod outcome;
mod schema;
mod structured;

pub use outcome::{FailureKind, StageFailure, StageOutcome};
pub use schema::{
    CodeAnalysisResult, FieldSchema, FieldType, SchemaKind, StructuredOutput,
    TestExplanationResult, TestGenerationResult, parse_strict,
};
pub(crate) use structured::invoke_model;
pub use structured::{FORMAT_INSTRUCTIONS_SLOT, StructuredStage};
