//! Dinoqode core: card line model, field validation and the pure submission state machine.
mod batch;
mod command;
mod effect;
mod msg;
mod record;
mod state;
mod title;
mod update;

pub use batch::{Batch, BatchSummary, PrintMode, COMMENT_MARKER};
pub use command::{CommandParseError, EncodedCommand, ItemKind, FIELD_SEPARATOR, HEADER_SEPARATOR};
pub use effect::Effect;
pub use msg::Msg;
pub use record::{validate, ExtractedRecord, Field, PartialRecord, ValidationError};
pub use state::{FailureKind, Stage, SubmissionState};
pub use title::normalize_title;
pub use update::update;
