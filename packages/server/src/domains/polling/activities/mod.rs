pub mod process_job;
pub mod run_sweep;

pub use process_job::{process_comment, process_job, CommentOutcome, JobReport, JobRun};
pub use run_sweep::{run_sweep, select_due_jobs, SweepSummary};
