pub mod scrape_job;

pub use scrape_job::{ClaimOutcome, DueJob, ErrorTally, JobMetrics, ScrapeJob, ScrapeJobStatus, ValidationGap};
