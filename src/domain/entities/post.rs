use crate::domain::value_objects::{PostId, UserRef};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: PostId,
    pub author: UserRef,
    pub image_ref: String,
    pub caption: String,
    pub like_count: u32,
    pub comment_count: u32,
    pub is_liked: bool,
    pub is_saved: bool,
    pub created_at: DateTime<Utc>,
}

impl Post {
    pub fn new(id: PostId, author: UserRef, image_ref: String, caption: String) -> Self {
        Self {
            id,
            author,
            image_ref,
            caption,
            like_count: 0,
            comment_count: 0,
            is_liked: false,
            is_saved: false,
            created_at: Utc::now(),
        }
    }

    /// いいね状態を反転し、件数を推測で増減させる
    pub fn toggle_like(&mut self) {
        self.is_liked = !self.is_liked;
        if self.is_liked {
            self.like_count = self.like_count.saturating_add(1);
        } else {
            self.like_count = self.like_count.saturating_sub(1);
        }
    }

    pub fn toggle_save(&mut self) {
        self.is_saved = !self.is_saved;
    }

    pub fn is_authored_by(&self, user: &UserRef) -> bool {
        &self.author == user
    }
}

/// 指定したフィールドだけを書き換える部分更新
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostPatch {
    pub caption: Option<String>,
    pub like_count: Option<u32>,
    pub comment_count: Option<u32>,
    pub is_liked: Option<bool>,
    pub is_saved: Option<bool>,
}

impl PostPatch {
    pub fn is_empty(&self) -> bool {
        self == &PostPatch::default()
    }

    pub fn apply_to(&self, post: &mut Post) {
        if let Some(caption) = &self.caption {
            post.caption = caption.clone();
        }
        if let Some(like_count) = self.like_count {
            post.like_count = like_count;
        }
        if let Some(comment_count) = self.comment_count {
            post.comment_count = comment_count;
        }
        if let Some(is_liked) = self.is_liked {
            post.is_liked = is_liked;
        }
        if let Some(is_saved) = self.is_saved {
            post.is_saved = is_saved;
        }
    }
}
