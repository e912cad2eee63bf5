use super::EntityState;
use crate::domain::value_objects::{ActionId, ActionKind, ActionStatus, PostId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 楽観的更新 1 件分の記録
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingAction {
    pub id: ActionId,
    pub entity_id: PostId,
    pub kind: ActionKind,
    pub previous: EntityState,
    pub status: ActionStatus,
    pub started_at: DateTime<Utc>,
    pub settled_at: Option<DateTime<Utc>>,
}

impl PendingAction {
    pub fn begin(entity_id: PostId, kind: ActionKind, previous: EntityState) -> Self {
        Self {
            id: ActionId::generate(),
            entity_id,
            kind,
            previous,
            status: ActionStatus::Pending,
            started_at: Utc::now(),
            settled_at: None,
        }
    }

    pub fn commit(&mut self) {
        self.settle(ActionStatus::Committed);
    }

    pub fn roll_back(&mut self) {
        self.settle(ActionStatus::RolledBack);
    }

    fn settle(&mut self, status: ActionStatus) {
        self.status = status;
        self.settled_at = Some(Utc::now());
    }
}
