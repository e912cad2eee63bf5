pub mod cache;
pub mod social_api;

pub use cache::{EntityCache, StateChange};
pub use social_api::{CommentThreadSnapshot, LikeState, SaveState, SocialApi};
