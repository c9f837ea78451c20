pub mod ledger;
pub mod models;
pub mod trigger;

pub use ledger::DedupLedger;
pub use models::{Comment, CommentAuthor, ProcessedComment};
pub use trigger::match_trigger;
