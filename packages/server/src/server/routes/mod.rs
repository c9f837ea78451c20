// HTTP routes
pub mod health;
pub mod poll_comments;

pub use health::*;
pub use poll_comments::*;
