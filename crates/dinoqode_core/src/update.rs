use crate::{Effect, FailureKind, Msg, Stage, SubmissionState};

/// Pure update function: applies a message to state and returns any effects.
///
/// Messages that do not fit the current stage are ignored.
pub fn update(mut state: SubmissionState, msg: Msg) -> (SubmissionState, Vec<Effect>) {
    let effects = match (state.stage(), msg) {
        (
            Stage::Idle | Stage::Ready | Stage::Failed(_),
            Msg::Submit {
                batch,
                previous_batch_exists,
            },
        ) => {
            if batch.is_blank() {
                state.begin(batch, Stage::Failed(FailureKind::EmptyBatch));
                vec![Effect::ReportFailure(FailureKind::EmptyBatch)]
            } else if previous_batch_exists {
                state.begin(batch, Stage::Archiving);
                vec![Effect::ArchivePrevious]
            } else {
                let commands = batch.commands.clone();
                state.begin(batch, Stage::Persisting);
                vec![Effect::PersistBatch { commands }]
            }
        }
        (Stage::Archiving, Msg::Archived) => {
            state.mark_archived();
            state.set_stage(Stage::Persisting);
            match state.batch() {
                Some(batch) => vec![Effect::PersistBatch {
                    commands: batch.commands.clone(),
                }],
                None => Vec::new(),
            }
        }
        (Stage::Persisting, Msg::Persisted) => {
            state.set_stage(Stage::Generating);
            match state.print_mode() {
                Some(print_mode) => vec![Effect::RunGenerator { print_mode }],
                None => Vec::new(),
            }
        }
        (Stage::Generating, Msg::Generated) => {
            state.set_stage(Stage::Ready);
            vec![Effect::ShowResult]
        }
        (stage, Msg::StepFailed(kind)) if stage.is_busy() => {
            state.set_stage(Stage::Failed(kind));
            vec![Effect::ReportFailure(kind)]
        }
        _ => Vec::new(),
    };

    (state, effects)
}
