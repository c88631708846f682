mod drop_zone;
mod file;
mod file_intake;
mod outcome;
#[cfg(test)]
mod tests;

pub use drop_zone::{DragEvent, DropZone};
pub use file::{FileSource, IncomingFile};
pub use file_intake::FileIntake;
pub use outcome::{IntakeOutcome, RejectedKind};
