pub mod capture_lead;
pub mod templates;

pub use capture_lead::{capture_lead, CaptureOutcome};
