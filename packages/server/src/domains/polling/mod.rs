pub mod activities;

pub use activities::{run_sweep, SweepSummary};
