pub mod activities;
pub mod models;

pub use models::{Lead, LeadStatus, NewLead, PendingConnection, PendingConnectionStatus};
