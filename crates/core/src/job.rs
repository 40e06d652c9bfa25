//! Generation job state tag and transition rules.
//!
//! A job lives only for the duration of one generation request. Its state is
//! exposed to logs (and to callers that poll) but never persisted.

use std::fmt;

use serde::Serialize;

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

/// Where a generation request currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    /// The input image is being written to the asset store.
    Uploading,
    /// Waiting on the external inference service.
    Processing,
    /// Re-hosting the result and recording the scene.
    Generating,
    Complete,
    Failed,
}

impl JobState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Uploading => "uploading",
            Self::Processing => "processing",
            Self::Generating => "generating",
            Self::Complete => "complete",
            Self::Failed => "failed",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Complete | Self::Failed)
    }

    /// States reachable from `self`.
    ///
    /// - `uploading`  -> `processing`, `failed`
    /// - `processing` -> `generating`, `failed`
    /// - `generating` -> `complete`, `failed`
    /// - terminal states go nowhere
    pub fn valid_transitions(self) -> &'static [JobState] {
        match self {
            Self::Uploading => &[Self::Processing, Self::Failed],
            Self::Processing => &[Self::Generating, Self::Failed],
            Self::Generating => &[Self::Complete, Self::Failed],
            Self::Complete | Self::Failed => &[],
        }
    }

    pub fn can_transition(self, next: JobState) -> bool {
        self.valid_transitions().contains(&next)
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Job
// ---------------------------------------------------------------------------

/// A single in-flight generation.
#[derive(Debug, Clone)]
pub struct GenerationJob {
    state: JobState,
    failure: Option<String>,
}

impl Default for GenerationJob {
    fn default() -> Self {
        Self::new()
    }
}

impl GenerationJob {
    pub fn new() -> Self {
        Self {
            state: JobState::Uploading,
            failure: None,
        }
    }

    pub fn state(&self) -> JobState {
        self.state
    }

    /// Failure message, set only once the job has moved to `failed`.
    pub fn failure(&self) -> Option<&str> {
        self.failure.as_deref()
    }

    /// Move to `next`, returning the previous state.
    pub fn advance(&mut self, next: JobState) -> Result<JobState, CoreError> {
        if !self.state.can_transition(next) {
            return Err(CoreError::Validation(format!(
                "Cannot move generation job from '{}' to '{}'",
                self.state, next
            )));
        }
        let previous = self.state;
        self.state = next;
        Ok(previous)
    }

    /// Mark the job failed from any non-terminal state.
    pub fn fail(&mut self, message: impl Into<String>) -> Result<JobState, CoreError> {
        let previous = self.advance(JobState::Failed)?;
        self.failure = Some(message.into());
        Ok(previous)
    }
}
