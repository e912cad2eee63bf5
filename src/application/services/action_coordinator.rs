use crate::domain::value_objects::ActionKind;
use crate::shared::error::AppError;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::oneshot;
use tracing::debug;

/// 直列化の単位（エンティティ ID と操作種別の組）
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ActionKey {
    pub entity_id: String,
    pub kind: ActionKind,
}

impl ActionKey {
    pub fn new(entity_id: impl Into<String>, kind: ActionKind) -> Self {
        Self {
            entity_id: entity_id.into(),
            kind,
        }
    }
}

impl fmt::Display for ActionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.entity_id, self.kind)
    }
}

#[derive(Default)]
struct Lane {
    /// 最後に投入された操作の完了通知
    tail: Option<oneshot::Receiver<()>>,
    /// 実行中と待機中の操作数
    depth: usize,
}

type Lanes = Arc<Mutex<HashMap<ActionKey, Lane>>>;

fn lock_lanes(lanes: &Mutex<HashMap<ActionKey, Lane>>) -> MutexGuard<'_, HashMap<ActionKey, Lane>> {
    lanes.lock().unwrap_or_else(PoisonError::into_inner)
}

/// 操作の終了（成功・失敗・パニック）時にレーンを片付け、後続へ通知する
struct LaneGuard {
    lanes: Lanes,
    key: ActionKey,
    done: Option<oneshot::Sender<()>>,
}

impl Drop for LaneGuard {
    fn drop(&mut self) {
        {
            let mut lanes = lock_lanes(&self.lanes);
            if let Some(lane) = lanes.get_mut(&self.key) {
                lane.depth = lane.depth.saturating_sub(1);
                if lane.depth == 0 {
                    lanes.remove(&self.key);
                }
            }
        }
        if let Some(done) = self.done.take() {
            let _ = done.send(());
        }
    }
}

/// 同じ (エンティティ, 操作種別) の操作を投入順に 1 つずつ実行する
///
/// 異なるキーの操作は互いを待たない。操作は tokio ランタイム上のタスクとして走るため、
/// 呼び出し側が結果を待たずに future を捨てても途中で打ち切られることはない。
#[derive(Clone, Default)]
pub struct ActionCoordinator {
    lanes: Lanes,
}

impl ActionCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// 操作を投入する。順番はこの関数を呼んだ時点で確定する
    pub fn run<F, Fut, T>(
        &self,
        entity_id: impl Into<String>,
        kind: ActionKind,
        operation: F,
    ) -> impl Future<Output = Result<T, AppError>> + Send + 'static
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, AppError>> + Send + 'static,
        T: Send + 'static,
    {
        let key = ActionKey::new(entity_id, kind);
        let (done_tx, done_rx) = oneshot::channel();

        let previous = {
            let mut lanes = lock_lanes(&self.lanes);
            let lane = lanes.entry(key.clone()).or_default();
            lane.depth += 1;
            lane.tail.replace(done_rx)
        };

        let guard = LaneGuard {
            lanes: Arc::clone(&self.lanes),
            key: key.clone(),
            done: Some(done_tx),
        };

        let task = async move {
            let _guard = guard;
            if let Some(previous) = previous {
                debug!(action = %key, "waiting for in-flight action to settle");
                // 先行操作が異常終了して送信側が破棄された場合も待機は解ける
                let _ = previous.await;
            }
            operation().await
        };

        let spawned = tokio::runtime::Handle::try_current()
            .map(|handle| handle.spawn(task))
            .map_err(|err| AppError::Internal(format!("No async runtime available: {err}")));

        async move {
            match spawned {
                Ok(handle) => match handle.await {
                    Ok(result) => result,
                    Err(err) => Err(err.into()),
                },
                Err(err) => Err(err),
            }
        }
    }

    /// キーごとの実行中＋待機中の件数
    pub fn in_flight(&self, entity_id: &str, kind: ActionKind) -> usize {
        let lanes = lock_lanes(&self.lanes);
        lanes
            .get(&ActionKey::new(entity_id, kind))
            .map(|lane| lane.depth)
            .unwrap_or(0)
    }

    pub fn active_lanes(&self) -> usize {
        lock_lanes(&self.lanes).len()
    }
}
