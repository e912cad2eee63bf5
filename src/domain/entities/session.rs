use crate::domain::value_objects::UserRef;
use serde::{Deserialize, Serialize};

/// ログイン中のユーザー情報。グローバルストアではなく明示的に渡す
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionContext {
    pub current_user: Option<UserRef>,
}

impl SessionContext {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn signed_in(user: UserRef) -> Self {
        Self {
            current_user: Some(user),
        }
    }
}
