use crate::batch::PrintMode;
use crate::state::FailureKind;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    ArchivePrevious,
    PersistBatch { commands: String },
    RunGenerator { print_mode: PrintMode },
    ShowResult,
    ReportFailure(FailureKind),
}
