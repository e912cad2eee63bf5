use super::config::ValidationConfig;
use super::error::AppError;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// 楽観的更新の前に弾かれる入力・状態エラーの理由。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ValidationFailureKind {
    /// 汎用的なバリデーションエラー。
    Generic,
    /// コメント本文が空白のみ。
    EmptyComment,
    /// コメント本文が上限を超過。
    CommentTooLong,
    /// キャプションが現在の値から変わっていない。
    CaptionUnchanged,
    /// キャプションが上限を超過。
    CaptionTooLong,
    /// 返信先のコメントがスレッドに存在しない。
    UnknownReplyTarget,
    /// 対象のエンティティがキャッシュに読み込まれていない。
    NotLoaded,
    /// 自分の投稿ではない。
    NotOwner,
}

impl ValidationFailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValidationFailureKind::Generic => "generic",
            ValidationFailureKind::EmptyComment => "empty_comment",
            ValidationFailureKind::CommentTooLong => "comment_too_long",
            ValidationFailureKind::CaptionUnchanged => "caption_unchanged",
            ValidationFailureKind::CaptionTooLong => "caption_too_long",
            ValidationFailureKind::UnknownReplyTarget => "unknown_reply_target",
            ValidationFailureKind::NotLoaded => "not_loaded",
            ValidationFailureKind::NotOwner => "not_owner",
        }
    }
}

impl fmt::Display for ValidationFailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ValidationFailureKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "generic" => Ok(ValidationFailureKind::Generic),
            "empty_comment" => Ok(ValidationFailureKind::EmptyComment),
            "comment_too_long" => Ok(ValidationFailureKind::CommentTooLong),
            "caption_unchanged" => Ok(ValidationFailureKind::CaptionUnchanged),
            "caption_too_long" => Ok(ValidationFailureKind::CaptionTooLong),
            "unknown_reply_target" => Ok(ValidationFailureKind::UnknownReplyTarget),
            "not_loaded" => Ok(ValidationFailureKind::NotLoaded),
            "not_owner" => Ok(ValidationFailureKind::NotOwner),
            _ => Err(()),
        }
    }
}

/// コメント本文を検証し、前後の空白を除いた本文を返す
pub fn validate_comment_text(text: &str, limits: &ValidationConfig) -> Result<String, AppError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(AppError::validation(
            ValidationFailureKind::EmptyComment,
            "Comment text cannot be empty",
        ));
    }
    let chars = trimmed.chars().count();
    if chars > limits.max_comment_chars {
        return Err(AppError::validation(
            ValidationFailureKind::CommentTooLong,
            format!(
                "Comment is {chars} characters, limit is {}",
                limits.max_comment_chars
            ),
        ));
    }
    Ok(trimmed.to_string())
}

/// キャプションを検証する。変更がない場合はエラー
pub fn validate_caption(
    caption: &str,
    current: &str,
    limits: &ValidationConfig,
) -> Result<String, AppError> {
    let trimmed = caption.trim();
    if trimmed == current.trim() {
        return Err(AppError::validation(
            ValidationFailureKind::CaptionUnchanged,
            "Caption is unchanged",
        ));
    }
    let chars = trimmed.chars().count();
    if chars > limits.max_caption_chars {
        return Err(AppError::validation(
            ValidationFailureKind::CaptionTooLong,
            format!(
                "Caption is {chars} characters, limit is {}",
                limits.max_caption_chars
            ),
        ));
    }
    Ok(trimmed.to_string())
}
