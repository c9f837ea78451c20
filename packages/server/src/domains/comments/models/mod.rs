pub mod comment;
pub mod processed_comment;

pub use comment::{Comment, CommentAuthor};
pub use processed_comment::ProcessedComment;
