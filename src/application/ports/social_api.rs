use crate::domain::entities::{Comment, Post};
use crate::domain::value_objects::{CommentId, PostId};
use crate::shared::error::AppError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// `toggleLike` の応答
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LikeState {
    pub is_liked: bool,
    pub like_count: u32,
}

/// `toggleSave` の応答
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveState {
    pub is_saved: bool,
}

/// サーバーから返ってきたスレッド全体（フラット）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentThreadSnapshot {
    pub comments: Vec<Comment>,
    pub comment_count: u32,
}

/// REST API を介したリモート操作。トランスポートの失敗は `AppError::Network` で返す
#[async_trait]
pub trait SocialApi: Send + Sync {
    async fn fetch_post(&self, id: &PostId) -> Result<Post, AppError>;

    async fn fetch_feed(&self) -> Result<Vec<Post>, AppError>;

    async fn fetch_saved_posts(&self) -> Result<Vec<Post>, AppError>;

    async fn fetch_user_posts(&self, username: &str) -> Result<Vec<Post>, AppError>;

    async fn toggle_like(&self, post_id: &PostId) -> Result<LikeState, AppError>;

    async fn toggle_save(&self, post_id: &PostId) -> Result<SaveState, AppError>;

    async fn add_comment(
        &self,
        post_id: &PostId,
        text: &str,
        reply_to: Option<CommentId>,
    ) -> Result<CommentThreadSnapshot, AppError>;

    async fn fetch_comments(&self, post_id: &PostId) -> Result<CommentThreadSnapshot, AppError>;

    async fn delete_comment(
        &self,
        post_id: &PostId,
        comment_id: &CommentId,
    ) -> Result<CommentThreadSnapshot, AppError>;

    async fn update_caption(&self, post_id: &PostId, caption: &str) -> Result<Post, AppError>;

    async fn delete_post(&self, post_id: &PostId) -> Result<(), AppError>;
}
