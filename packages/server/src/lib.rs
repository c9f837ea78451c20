// Comment-Trigger Engagement Engine - Core
//
// Polls monitored social posts for comments that contain a campaign's trigger
// word and drives per-commenter outreach (email acknowledgement, direct
// message, or connection request).
//
// Activities are organized per-domain in domains/*/activities/

pub mod common;
pub mod config;
pub mod domains;
pub mod kernel;
pub mod server;

pub use config::*;
