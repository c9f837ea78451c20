//! Kernel module - server infrastructure and dependencies.

pub mod deps;
pub mod email_extractor;
pub mod gateway_error;
pub mod postgres_store;
pub mod scheduled_tasks;
pub mod test_dependencies;
pub mod traits;

pub use deps::{ServerDeps, UnipileAdapter};
pub use email_extractor::RegexEmailExtractor;
pub use gateway_error::{bounded, classify, FailureKind, GatewayError};
pub use postgres_store::PostgresEngagementStore;
pub use test_dependencies::TestDependencies;
pub use traits::*;
