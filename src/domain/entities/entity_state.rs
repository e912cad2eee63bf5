use super::{CommentThread, Post};
use serde::{Deserialize, Serialize};

/// 1 投稿分のキャッシュ状態（投稿本体とコメントスレッド）
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityState {
    pub post: Option<Post>,
    pub thread: Option<CommentThread>,
}

impl EntityState {
    pub fn new(post: Option<Post>, thread: Option<CommentThread>) -> Self {
        Self { post, thread }
    }

    pub fn is_absent(&self) -> bool {
        self.post.is_none() && self.thread.is_none()
    }

    /// スレッドが読み込まれていれば `comment_count` をノード数に揃える
    pub fn sync_comment_count(&mut self) {
        if let (Some(post), Some(thread)) = (self.post.as_mut(), self.thread.as_ref()) {
            post.comment_count = u32::try_from(thread.len()).unwrap_or(u32::MAX);
        }
    }
}
