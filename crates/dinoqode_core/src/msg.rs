use crate::batch::Batch;
use crate::state::FailureKind;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// A new batch arrived; `previous_batch_exists` reflects the input file on disk.
    Submit {
        batch: Batch,
        previous_batch_exists: bool,
    },
    /// The previous batch file was moved into the archive.
    Archived,
    /// The new batch was written to the input path.
    Persisted,
    /// The generator exited successfully and produced its output.
    Generated,
    /// The step in progress failed.
    StepFailed(FailureKind),
}
