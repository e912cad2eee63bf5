pub mod payloads;

pub use payloads::{
    decode, decode_comments, decode_posts, AddCommentRequest, CommentPayload, CommentsPayload, LikePayload, PostPayload,
    SavePayload, UpdateCaptionRequest, WireId,
};
