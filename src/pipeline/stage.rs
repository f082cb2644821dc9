//! Per-run state machine.

use crate::core::cancel::CancellationFlag;
use crate::core::errors::{OCRError, OcrResult, ProcessingStage};
use std::fmt;

/// Progress of a single recognition run.
///
/// A run moves forward one state per completed stage and ends in either
/// `Done` or `Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStage {
    Idle,
    Resolved,
    Preprocessed,
    ModelLoaded,
    Inferred,
    Decoded,
    Done,
    Failed,
}

impl RunStage {
    /// The stage that runs next, or `None` once the run has ended.
    pub fn pending(&self) -> Option<ProcessingStage> {
        match self {
            RunStage::Idle => Some(ProcessingStage::Resolve),
            RunStage::Resolved => Some(ProcessingStage::Preprocess),
            RunStage::Preprocessed => Some(ProcessingStage::ModelLoad),
            RunStage::ModelLoaded => Some(ProcessingStage::Inference),
            RunStage::Inferred => Some(ProcessingStage::Decode),
            RunStage::Decoded => Some(ProcessingStage::LabelMapping),
            RunStage::Done | RunStage::Failed => None,
        }
    }

    /// The state reached once the pending stage completes.
    pub fn advance(self) -> Self {
        match self {
            RunStage::Idle => RunStage::Resolved,
            RunStage::Resolved => RunStage::Preprocessed,
            RunStage::Preprocessed => RunStage::ModelLoaded,
            RunStage::ModelLoaded => RunStage::Inferred,
            RunStage::Inferred => RunStage::Decoded,
            RunStage::Decoded => RunStage::Done,
            RunStage::Done => RunStage::Done,
            RunStage::Failed => RunStage::Failed,
        }
    }

    /// Returns true for `Done` and `Failed`.
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunStage::Done | RunStage::Failed)
    }
}

impl fmt::Display for RunStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RunStage::Idle => "idle",
            RunStage::Resolved => "resolved",
            RunStage::Preprocessed => "preprocessed",
            RunStage::ModelLoaded => "model loaded",
            RunStage::Inferred => "inferred",
            RunStage::Decoded => "decoded",
            RunStage::Done => "done",
            RunStage::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Drives a [`RunStage`] and polls cancellation at every stage boundary.
#[derive(Debug)]
pub struct StageTracker<'a> {
    stage: RunStage,
    cancel: &'a CancellationFlag,
}

impl<'a> StageTracker<'a> {
    pub fn new(cancel: &'a CancellationFlag) -> Self {
        Self {
            stage: RunStage::Idle,
            cancel,
        }
    }

    /// Current state.
    pub fn stage(&self) -> RunStage {
        self.stage
    }

    /// Enters the pending stage, failing if cancellation was requested.
    pub fn begin(&self) -> OcrResult<ProcessingStage> {
        let pending = self.stage.pending().ok_or_else(|| {
            OCRError::invalid_argument(format!("run already {}", self.stage))
        })?;
        self.cancel.check(pending)?;
        Ok(pending)
    }

    /// Marks the pending stage as completed.
    pub fn complete(&mut self) {
        self.stage = self.stage.advance();
        tracing::trace!("Run stage: {}", self.stage);
    }

    /// Marks the run as failed and returns the stage that was interrupted.
    pub fn fail(&mut self) -> Option<ProcessingStage> {
        let interrupted = self.stage.pending();
        self.stage = RunStage::Failed;
        interrupted
    }
}
