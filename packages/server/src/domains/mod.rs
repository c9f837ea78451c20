pub mod comments;
pub mod leads;
pub mod polling;
pub mod scrape_jobs;
