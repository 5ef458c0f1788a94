use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::{SecondsFormat, Utc};
use dinoqode_core::{
    update, Batch, BatchSummary, Effect, FailureKind, Msg, Stage, SubmissionState,
};
use dinoqode_logging::{dq_error, dq_info, dq_warn};
use thiserror::Error;
use tokio::sync::Mutex;

use crate::generator::{GenerationError, GenerationReport, Generator};
use crate::persist::{BatchStore, PersistError};

/// Produces the timestamp used in archive names.
pub type Clock = Arc<dyn Fn() -> String + Send + Sync>;

pub fn utc_clock() -> Clock {
    Arc::new(|| Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionOutcome {
    pub summary: BatchSummary,
    pub archived: Option<PathBuf>,
    pub input_path: PathBuf,
    pub report: GenerationReport,
}

#[derive(Debug, Error)]
pub enum SubmissionError {
    #[error("batch contains no commands")]
    EmptyBatch,
    #[error(transparent)]
    Persistence(#[from] PersistError),
    #[error(transparent)]
    Generation(#[from] GenerationError),
}

impl SubmissionError {
    pub fn kind(&self) -> FailureKind {
        match self {
            SubmissionError::EmptyBatch => FailureKind::EmptyBatch,
            SubmissionError::Persistence(_) => FailureKind::Persistence,
            SubmissionError::Generation(err) if err.is_timeout() => FailureKind::GenerationTimeout,
            SubmissionError::Generation(_) => FailureKind::Generation,
        }
    }
}

/// Runs batch submissions one at a time: archive, persist, generate.
///
/// The batch file and the archive are shared by every submission, so the
/// whole sequence runs under one lock; later submissions wait their turn.
/// An in-flight generation cannot be cancelled, only timed out.
pub struct Orchestrator {
    store: BatchStore,
    generator: Arc<dyn Generator>,
    clock: Clock,
    gate: Mutex<()>,
}

impl Orchestrator {
    pub fn new(store: BatchStore, generator: Arc<dyn Generator>) -> Self {
        Self::with_clock(store, generator, utc_clock())
    }

    pub fn with_clock(store: BatchStore, generator: Arc<dyn Generator>, clock: Clock) -> Self {
        Self {
            store,
            generator,
            clock,
            gate: Mutex::new(()),
        }
    }

    pub fn store(&self) -> &BatchStore {
        &self.store
    }

    pub async fn submit(&self, batch: Batch) -> Result<SubmissionOutcome, SubmissionError> {
        let _turn = self.gate.lock().await;

        let summary = batch.summary();
        dq_info!(
            "Batch received: {} cards, {} other lines, {}",
            summary.cards,
            summary.other,
            batch.print_mode
        );

        let previous_batch_exists = self.store.has_batch();
        let (mut state, effects) = update(
            SubmissionState::new(),
            Msg::Submit {
                batch,
                previous_batch_exists,
            },
        );

        let mut run = RunRecord::default();
        let mut queue: VecDeque<Effect> = effects.into();
        while let Some(effect) = queue.pop_front() {
            let Some(msg) = self.execute(effect, &mut run).await else {
                continue;
            };
            let (next, effects) = update(state, msg);
            state = next;
            queue.extend(effects);
        }

        match (state.stage(), run.report) {
            (Stage::Ready, Some(report)) => Ok(SubmissionOutcome {
                summary,
                archived: run.archived,
                input_path: self.store.input_path().to_path_buf(),
                report,
            }),
            (stage, _) => {
                let err = run.failure.unwrap_or(SubmissionError::EmptyBatch);
                dq_warn!("Submission ended in {:?}: {}", stage, err);
                Err(err)
            }
        }
    }

    async fn execute(&self, effect: Effect, run: &mut RunRecord) -> Option<Msg> {
        match effect {
            Effect::ArchivePrevious => match self.store.archive_previous(&(self.clock)()) {
                Ok(path) => {
                    run.archived = path;
                    Some(Msg::Archived)
                }
                Err(err) => Some(run.fail(err.into())),
            },
            Effect::PersistBatch { commands } => match self.store.persist(&commands) {
                Ok(_) => Some(Msg::Persisted),
                Err(err) => Some(run.fail(err.into())),
            },
            Effect::RunGenerator { print_mode } => {
                match self
                    .generator
                    .generate(self.store.input_path(), print_mode)
                    .await
                {
                    Ok(report) => {
                        run.report = Some(report);
                        Some(Msg::Generated)
                    }
                    Err(err) => Some(run.fail(err.into())),
                }
            }
            Effect::ShowResult => None,
            Effect::ReportFailure(FailureKind::EmptyBatch) => {
                dq_warn!("Batch submission rejected: no card lines");
                None
            }
            Effect::ReportFailure(kind) => {
                dq_error!("Batch submission failed: {}", kind);
                None
            }
        }
    }
}

#[derive(Default)]
struct RunRecord {
    archived: Option<PathBuf>,
    report: Option<GenerationReport>,
    failure: Option<SubmissionError>,
}

impl RunRecord {
    fn fail(&mut self, err: SubmissionError) -> Msg {
        let kind = err.kind();
        self.failure = Some(err);
        Msg::StepFailed(kind)
    }
}
