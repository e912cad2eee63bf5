//! REST API のペイロード定義と、ドメイン型への変換。
//!
//! ID は数値でも文字列でも受け付け、文字列の newtype に正規化する。
//! 入れ子のコメント（`replies`）は前順でフラットなレコードに展開する。

use crate::application::ports::social_api::{CommentThreadSnapshot, LikeState, SaveState};
use crate::domain::entities::{Comment, Post};
use crate::domain::value_objects::{CommentId, PostId, UserRef};
use crate::shared::error::AppError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 数値または文字列の ID
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WireId {
    Number(u64),
    Text(String),
}

impl WireId {
    /// 数値として読める ID は数値のまま送る
    pub fn from_id(id: &str) -> Self {
        id.parse::<u64>()
            .map(WireId::Number)
            .unwrap_or_else(|_| WireId::Text(id.to_string()))
    }

    pub fn into_string(self) -> String {
        match self {
            WireId::Number(value) => value.to_string(),
            WireId::Text(value) => value,
        }
    }
}

fn post_id(id: WireId) -> Result<PostId, AppError> {
    PostId::new(id.into_string()).map_err(AppError::Payload)
}

fn comment_id(id: WireId) -> Result<CommentId, AppError> {
    CommentId::new(id.into_string()).map_err(AppError::Payload)
}

fn count(field: &str, value: i64) -> Result<u32, AppError> {
    u32::try_from(value)
        .map_err(|_| AppError::Payload(format!("{field} must be a non-negative count, got {value}")))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostPayload {
    pub id: WireId,
    #[serde(alias = "author")]
    pub username: String,
    #[serde(default, alias = "imageRef")]
    pub img: String,
    #[serde(default)]
    pub caption: String,
    #[serde(default)]
    pub like_count: i64,
    #[serde(default)]
    pub comment_count: i64,
    #[serde(default)]
    pub is_liked: bool,
    #[serde(default)]
    pub is_saved: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl TryFrom<PostPayload> for Post {
    type Error = AppError;

    fn try_from(payload: PostPayload) -> Result<Self, Self::Error> {
        let author = UserRef::new(payload.username).map_err(AppError::Payload)?;
        let mut post = Post::new(post_id(payload.id)?, author, payload.img, payload.caption);
        post.like_count = count("likeCount", payload.like_count)?;
        post.comment_count = count("commentCount", payload.comment_count)?;
        post.is_liked = payload.is_liked;
        post.is_saved = payload.is_saved;
        // 作成日時を返さない API では受信時刻になる
        if let Some(created_at) = payload.created_at {
            post.created_at = created_at;
        }
        Ok(post)
    }
}

/// `toggleLike` の応答
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LikePayload {
    #[serde(alias = "isLiked")]
    pub is_now_liked: bool,
    pub like_count: i64,
}

impl TryFrom<LikePayload> for LikeState {
    type Error = AppError;

    fn try_from(payload: LikePayload) -> Result<Self, Self::Error> {
        Ok(LikeState {
            is_liked: payload.is_now_liked,
            like_count: count("likeCount", payload.like_count)?,
        })
    }
}

/// `toggleSave` の応答
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavePayload {
    #[serde(alias = "isSaved")]
    pub is_now_saved: bool,
}

impl From<SavePayload> for SaveState {
    fn from(payload: SavePayload) -> Self {
        SaveState {
            is_saved: payload.is_now_saved,
        }
    }
}

/// フラット形式（`parentId`）と入れ子形式（`replies`）のどちらも表せるコメント
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentPayload {
    pub id: WireId,
    #[serde(alias = "comment", alias = "content")]
    pub text: String,
    #[serde(default)]
    pub post_id: Option<WireId>,
    #[serde(default, alias = "replyTo")]
    pub parent_id: Option<WireId>,
    #[serde(default, alias = "username")]
    pub author: Option<String>,
    #[serde(default)]
    pub replies: Vec<CommentPayload>,
}

/// コメント一覧の応答。`{comments, commentCount}` と素の配列の両方を受け付ける
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CommentsPayload {
    Envelope {
        comments: Vec<CommentPayload>,
        #[serde(default, rename = "commentCount")]
        comment_count: Option<i64>,
    },
    Bare(Vec<CommentPayload>),
}

impl CommentsPayload {
    /// 前順に展開してスナップショットにする。件数が無ければ展開後の件数を使う
    pub fn into_snapshot(self, post: &PostId) -> Result<CommentThreadSnapshot, AppError> {
        let (roots, reported) = match self {
            CommentsPayload::Envelope {
                comments,
                comment_count,
            } => (comments, comment_count),
            CommentsPayload::Bare(comments) => (comments, None),
        };

        let mut comments = Vec::new();
        let mut stack: Vec<(CommentPayload, Option<CommentId>)> =
            roots.into_iter().rev().map(|root| (root, None)).collect();
        while let Some((payload, nesting_parent)) = stack.pop() {
            let id = comment_id(payload.id)?;
            let owner = match payload.post_id {
                Some(owner) => post_id(owner)?,
                None => post.clone(),
            };
            let parent = match payload.parent_id {
                Some(parent) => Some(comment_id(parent)?),
                None => nesting_parent,
            };
            let author = payload
                .author
                .map(UserRef::new)
                .transpose()
                .map_err(AppError::Payload)?;
            stack.extend(
                payload
                    .replies
                    .into_iter()
                    .rev()
                    .map(|reply| (reply, Some(id.clone()))),
            );
            comments.push(
                Comment::new(id, owner, payload.text)
                    .with_author(author)
                    .replying_to(parent),
            );
        }

        let comment_count = match reported {
            Some(value) => count("commentCount", value)?,
            None => u32::try_from(comments.len()).unwrap_or(u32::MAX),
        };
        Ok(CommentThreadSnapshot {
            comments,
            comment_count,
        })
    }
}

/// `addComment` のリクエストボディ
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddCommentRequest {
    pub comment: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<WireId>,
}

impl AddCommentRequest {
    pub fn new(text: &str, reply_to: Option<&CommentId>) -> Self {
        Self {
            comment: text.to_string(),
            reply_to: reply_to.map(|id| WireId::from_id(id.as_str())),
        }
    }
}

/// `updateCaption` のリクエストボディ
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateCaptionRequest {
    pub caption: String,
}

/// JSON 文字列をペイロード型として読み、ドメイン型へ変換する
pub fn decode<P, T>(json: &str) -> Result<T, AppError>
where
    P: for<'de> Deserialize<'de>,
    T: TryFrom<P, Error = AppError>,
{
    let payload: P = serde_json::from_str(json)?;
    T::try_from(payload)
}

/// `fetchFeed`・保存済み・ユーザー別の投稿一覧を読む。1 件でも不正なら全体を失敗とする
pub fn decode_posts(json: &str) -> Result<Vec<Post>, AppError> {
    let payloads: Vec<PostPayload> = serde_json::from_str(json)?;
    payloads.into_iter().map(Post::try_from).collect()
}

/// コメント一覧を `post` のスレッドとして読む
pub fn decode_comments(json: &str, post: &PostId) -> Result<CommentThreadSnapshot, AppError> {
    let payload: CommentsPayload = serde_json::from_str(json)?;
    payload.into_snapshot(post)
}
