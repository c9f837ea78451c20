pub mod lifecycle;

pub use lifecycle::{claim, record_failure, record_success, FailureOutcome, FATAL_ERROR_THRESHOLD};
