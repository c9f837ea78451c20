pub mod lead;
pub mod pending_connection;

pub use lead::{Lead, LeadStatus, NewLead};
pub use pending_connection::{PendingConnection, PendingConnectionStatus};
