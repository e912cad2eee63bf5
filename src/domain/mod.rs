pub mod comment_tree;
pub mod entities;
pub mod value_objects;

pub use entities::{
    Comment, CommentNode, CommentThread, EntityState, PendingAction, Post, PostPatch,
    SessionContext,
};
pub use value_objects::{ActionId, ActionKind, ActionStatus, CommentId, PostId, UserRef};
