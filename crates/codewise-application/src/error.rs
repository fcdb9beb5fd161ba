//! Boundary error for assistant operations.

use codewise_core::identity::IdentityError;
use codewise_core::pipeline::PipelineResult;
use codewise_core::stage::{FailureKind, StageFailure};
use serde::Serialize;
use thiserror::Error;

/// Which collaborator a failure came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureOrigin {
    Identity,
    Stage,
}

/// Failure of an assistant operation.
///
/// A failed pipeline run that got past analysis carries its partial result.
#[derive(Error, Debug, Clone, PartialEq, Serialize)]
#[error("{kind}: {message}")]
pub struct AssistantError {
    pub kind: FailureKind,
    pub message: String,
    pub origin: FailureOrigin,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub partial: Option<Box<PipelineResult>>,
}

impl AssistantError {
    pub fn with_partial(mut self, partial: PipelineResult) -> Self {
        self.partial = Some(Box::new(partial));
        self
    }

    /// HTTP-style status for front ends that speak HTTP.
    pub fn status_code(&self) -> u16 {
        match (self.kind, self.origin) {
            (FailureKind::Unauthorized, _) => 401,
            (FailureKind::UpstreamError, FailureOrigin::Identity) => 503,
            (FailureKind::UpstreamError, FailureOrigin::Stage) => 502,
            (FailureKind::ParseError, _) => 502,
            (FailureKind::MissingVariable, _) => 500,
        }
    }
}

impl From<StageFailure> for AssistantError {
    fn from(failure: StageFailure) -> Self {
        Self {
            kind: failure.kind,
            message: failure.message,
            origin: FailureOrigin::Stage,
            partial: None,
        }
    }
}

impl From<IdentityError> for AssistantError {
    fn from(err: IdentityError) -> Self {
        let failure = StageFailure::from(err);
        Self {
            kind: failure.kind,
            message: failure.message,
            origin: FailureOrigin::Identity,
            partial: None,
        }
    }
}
