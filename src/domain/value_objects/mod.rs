pub mod action;
pub mod comment_id;
pub mod post_id;
pub mod user_ref;

pub use action::{ActionId, ActionKind, ActionStatus};
pub use comment_id::CommentId;
pub use post_id::PostId;
pub use user_ref::UserRef;
