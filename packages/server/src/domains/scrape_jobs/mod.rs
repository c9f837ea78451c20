pub mod activities;
pub mod models;

pub use models::{ClaimOutcome, DueJob, ErrorTally, JobMetrics, ScrapeJob, ScrapeJobStatus, ValidationGap};
