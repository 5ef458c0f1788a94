use std::fmt;

use crate::batch::{Batch, PrintMode};

/// Where a single submission currently is in the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Stage {
    #[default]
    Idle,
    Archiving,
    Persisting,
    Generating,
    Ready,
    Failed(FailureKind),
}

impl Stage {
    pub fn is_terminal(self) -> bool {
        matches!(self, Stage::Ready | Stage::Failed(_))
    }

    pub fn is_busy(self) -> bool {
        matches!(
            self,
            Stage::Archiving | Stage::Persisting | Stage::Generating
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    EmptyBatch,
    Persistence,
    Generation,
    GenerationTimeout,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::EmptyBatch => write!(f, "empty batch"),
            FailureKind::Persistence => write!(f, "persistence failure"),
            FailureKind::Generation => write!(f, "generation failure"),
            FailureKind::GenerationTimeout => write!(f, "generation timeout"),
        }
    }
}

/// State of one submission as it moves through archive, persist and generate.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SubmissionState {
    stage: Stage,
    batch: Option<Batch>,
    archived_previous: bool,
}

impl SubmissionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn print_mode(&self) -> Option<PrintMode> {
        self.batch.as_ref().map(|b| b.print_mode)
    }

    /// True once a prior batch file was moved into the archive by this submission.
    pub fn archived_previous(&self) -> bool {
        self.archived_previous
    }

    pub(crate) fn begin(&mut self, batch: Batch, stage: Stage) {
        self.batch = Some(batch);
        self.archived_previous = false;
        self.stage = stage;
    }

    pub(crate) fn set_stage(&mut self, stage: Stage) {
        self.stage = stage;
    }

    pub(crate) fn mark_archived(&mut self) {
        self.archived_previous = true;
    }

    pub(crate) fn batch(&self) -> Option<&Batch> {
        self.batch.as_ref()
    }
}
