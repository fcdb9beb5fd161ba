//! Tagged stage results.

use crate::identity::IdentityError;
use crate::model::ModelError;
use crate::prompt::RenderError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why a stage (or the boundary around it) failed.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::AsRefStr,
)]
pub enum FailureKind {
    /// A prompt slot was unbound or a template was malformed. A programmer
    /// error; should never reach production callers.
    MissingVariable,
    /// The model's text did not conform to the target schema.
    ParseError,
    /// The model or the identity verifier was unreachable or timed out.
    UpstreamError,
    /// Identity verification rejected the caller.
    Unauthorized,
}

/// A typed failure carried by [`StageOutcome::Failure`].
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("{kind}: {message}")]
pub struct StageFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl StageFailure {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn parse_error(message: impl Into<String>) -> Self {
        Self::new(FailureKind::ParseError, message)
    }

    pub fn upstream(message: impl Into<String>) -> Self {
        Self::new(FailureKind::UpstreamError, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Unauthorized, message)
    }

    pub fn missing_variable(message: impl Into<String>) -> Self {
        Self::new(FailureKind::MissingVariable, message)
    }
}

impl From<RenderError> for StageFailure {
    fn from(err: RenderError) -> Self {
        Self::missing_variable(err.to_string())
    }
}

impl From<ModelError> for StageFailure {
    fn from(err: ModelError) -> Self {
        Self::upstream(err.to_string())
    }
}

impl From<IdentityError> for StageFailure {
    fn from(err: IdentityError) -> Self {
        match err {
            IdentityError::Unauthorized(message) => Self::unauthorized(message),
            IdentityError::Unavailable(message) => Self::upstream(message),
        }
    }
}

/// The result of running one stage: a value or a typed failure, never both.
#[must_use]
#[derive(Debug, Clone, PartialEq)]
pub enum StageOutcome<T> {
    Success(T),
    Failure(StageFailure),
}

impl<T> StageOutcome<T> {
    pub fn failure(kind: FailureKind, message: impl Into<String>) -> Self {
        Self::Failure(StageFailure::new(kind, message))
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// The failure kind, if this outcome failed.
    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            Self::Success(_) => None,
            Self::Failure(failure) => Some(failure.kind),
        }
    }

    pub fn ok(self) -> Option<T> {
        match self {
            Self::Success(value) => Some(value),
            Self::Failure(_) => None,
        }
    }

    pub fn into_result(self) -> Result<T, StageFailure> {
        match self {
            Self::Success(value) => Ok(value),
            Self::Failure(failure) => Err(failure),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> StageOutcome<U> {
        match self {
            Self::Success(value) => StageOutcome::Success(f(value)),
            Self::Failure(failure) => StageOutcome::Failure(failure),
        }
    }
}

impl<T> From<Result<T, StageFailure>> for StageOutcome<T> {
    fn from(result: Result<T, StageFailure>) -> Self {
        match result {
            Ok(value) => Self::Success(value),
            Err(failure) => Self::Failure(failure),
        }
    }
}
