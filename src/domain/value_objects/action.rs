use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActionId(uuid::Uuid);

impl ActionId {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl fmt::Display for ActionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// ユーザー操作の種類。同じエンティティ・同じ種類の操作は直列に実行される。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ActionKind {
    Like,
    Save,
    Comment,
    Reply,
    EditCaption,
    Delete,
    DeleteComment,
}

impl ActionKind {
    pub const ALL: [ActionKind; 7] = [
        ActionKind::Like,
        ActionKind::Save,
        ActionKind::Comment,
        ActionKind::Reply,
        ActionKind::EditCaption,
        ActionKind::Delete,
        ActionKind::DeleteComment,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::Like => "like",
            ActionKind::Save => "save",
            ActionKind::Comment => "comment",
            ActionKind::Reply => "reply",
            ActionKind::EditCaption => "editCaption",
            ActionKind::Delete => "delete",
            ActionKind::DeleteComment => "deleteComment",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ActionKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| format!("Unknown action kind: {s}"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ActionStatus {
    Pending,
    Committed,
    RolledBack,
}
