use crate::application::ports::cache::EntityCache;
use crate::application::ports::social_api::{CommentThreadSnapshot, LikeState, SaveState};
use crate::domain::entities::{Comment, CommentThread, EntityState, PendingAction, Post};
use crate::domain::value_objects::{ActionId, ActionKind, CommentId, PostId};
use crate::shared::config::LedgerConfig;
use crate::shared::error::AppError;
use crate::shared::validation::ValidationFailureKind;
use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// リモート呼び出しの前にキャッシュへ書き込む推測上の変更
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Speculation {
    ToggleLike,
    ToggleSave,
    SetCaption(String),
    AppendComment(Comment),
    RemoveComment(CommentId),
    RemovePost,
}

impl Speculation {
    /// 変更を適用する。前提が満たされない場合はキャッシュに触れる前に失敗する
    pub fn apply(&self, state: &mut EntityState) -> Result<(), AppError> {
        match self {
            Speculation::ToggleLike => loaded_post(state)?.toggle_like(),
            Speculation::ToggleSave => loaded_post(state)?.toggle_save(),
            Speculation::SetCaption(caption) => loaded_post(state)?.caption = caption.clone(),
            Speculation::AppendComment(comment) => {
                if let (Some(parent_id), Some(thread)) = (&comment.parent_id, &state.thread) {
                    if !thread.contains(parent_id) {
                        return Err(AppError::validation(
                            ValidationFailureKind::UnknownReplyTarget,
                            format!("Reply target {parent_id} is not in the thread"),
                        ));
                    }
                }
                let post = loaded_post(state)?;
                post.comment_count = post.comment_count.saturating_add(1);
                let post_id = post.id.clone();
                state
                    .thread
                    .get_or_insert_with(|| CommentThread::empty(post_id))
                    .push(comment.clone());
            }
            Speculation::RemoveComment(comment_id) => {
                let removed = state
                    .thread
                    .as_mut()
                    .map(|thread| thread.remove_subtree(comment_id))
                    .unwrap_or(0);
                if removed == 0 {
                    return Err(AppError::validation(
                        ValidationFailureKind::NotLoaded,
                        format!("Comment {comment_id} is not loaded"),
                    ));
                }
                state.sync_comment_count();
            }
            Speculation::RemovePost => *state = EntityState::default(),
        }
        Ok(())
    }
}

fn loaded_post(state: &mut EntityState) -> Result<&mut Post, AppError> {
    state.post.as_mut().ok_or_else(|| {
        AppError::validation(ValidationFailureKind::NotLoaded, "Post is not loaded")
    })
}

/// サーバーの正式な応答。ローカルの推測値より常に優先される
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reconciliation {
    Like(LikeState),
    Save(SaveState),
    Post(Post),
    Thread(CommentThreadSnapshot),
    Removed,
}

impl From<LikeState> for Reconciliation {
    fn from(value: LikeState) -> Self {
        Reconciliation::Like(value)
    }
}

impl From<SaveState> for Reconciliation {
    fn from(value: SaveState) -> Self {
        Reconciliation::Save(value)
    }
}

impl From<Post> for Reconciliation {
    fn from(value: Post) -> Self {
        Reconciliation::Post(value)
    }
}

impl From<CommentThreadSnapshot> for Reconciliation {
    fn from(value: CommentThreadSnapshot) -> Self {
        Reconciliation::Thread(value)
    }
}

impl From<()> for Reconciliation {
    fn from(_: ()) -> Self {
        Reconciliation::Removed
    }
}

impl Reconciliation {
    /// 応答が対象エンティティと食い違っていないか
    pub fn check(&self, entity_id: &PostId) -> Result<(), AppError> {
        match self {
            Reconciliation::Post(post) if &post.id != entity_id => Err(AppError::Conflict(
                format!("Server returned post {} for {entity_id}", post.id),
            )),
            Reconciliation::Thread(snapshot) => {
                match snapshot
                    .comments
                    .iter()
                    .find(|comment| &comment.post_id != entity_id)
                {
                    Some(stray) => Err(AppError::Conflict(format!(
                        "Comment {} belongs to post {}, not {entity_id}",
                        stray.id, stray.post_id
                    ))),
                    None => Ok(()),
                }
            }
            _ => Ok(()),
        }
    }

    /// 応答を状態に反映する。エンティティが既に消えている場合は復活させない
    pub fn apply(self, entity_id: &PostId, state: &mut EntityState) {
        if state.is_absent() {
            return;
        }
        match self {
            Reconciliation::Like(like) => {
                if let Some(post) = state.post.as_mut() {
                    post.is_liked = like.is_liked;
                    post.like_count = like.like_count;
                }
            }
            Reconciliation::Save(save) => {
                if let Some(post) = state.post.as_mut() {
                    post.is_saved = save.is_saved;
                }
            }
            Reconciliation::Post(fresh) => {
                if state.post.is_some() {
                    state.post = Some(fresh);
                    state.sync_comment_count();
                }
            }
            Reconciliation::Thread(snapshot) => {
                let thread = CommentThread::new(entity_id.clone(), snapshot.comments);
                if let Some(post) = state.post.as_mut() {
                    let count = u32::try_from(thread.len()).unwrap_or(u32::MAX);
                    if count != snapshot.comment_count {
                        warn!(
                            post_id = %entity_id,
                            reported = snapshot.comment_count,
                            counted = count,
                            "server comment count disagrees with returned thread"
                        );
                    }
                    post.comment_count = count;
                }
                state.thread = Some(thread);
            }
            Reconciliation::Removed => *state = EntityState::default(),
        }
    }
}

/// 保留中の操作があるエンティティについて、サーバーが認めた状態と未確定の変更を持つ
struct Tracked {
    confirmed: EntityState,
    pending: Vec<(ActionId, Speculation)>,
}

impl Tracked {
    /// 確定状態に未確定の変更を開始順に重ねる。前提が崩れた変更は飛ばす
    fn replay(&self) -> EntityState {
        let mut state = self.confirmed.clone();
        for (action_id, speculation) in &self.pending {
            let mut next = state.clone();
            match speculation.apply(&mut next) {
                Ok(()) => state = next,
                Err(err) => debug!(%action_id, error = %err, "pending change no longer applies"),
            }
        }
        state
    }
}

struct Ledger {
    pending: HashMap<ActionId, PendingAction>,
    tracked: HashMap<PostId, Tracked>,
    history: VecDeque<PendingAction>,
    history_limit: usize,
}

/// 楽観的更新の適用・確定・巻き戻しを一元的に扱う
///
/// 保留中の操作があるエンティティでは、キャッシュは常に確定状態へ未確定の変更を
/// 開始順に重ねたものになる。
#[derive(Clone)]
pub struct OptimisticMutator {
    cache: Arc<dyn EntityCache>,
    ledger: Arc<RwLock<Ledger>>,
}

impl OptimisticMutator {
    pub fn new(cache: Arc<dyn EntityCache>, config: &LedgerConfig) -> Self {
        Self {
            cache,
            ledger: Arc::new(RwLock::new(Ledger {
                pending: HashMap::new(),
                tracked: HashMap::new(),
                history: VecDeque::new(),
                history_limit: config.history_limit.max(1),
            })),
        }
    }

    pub fn cache(&self) -> &Arc<dyn EntityCache> {
        &self.cache
    }

    /// 推測の変更を即座に書き込み、リモート操作の結果で確定または巻き戻す
    pub async fn apply<Fut, R>(
        &self,
        entity_id: &PostId,
        kind: ActionKind,
        speculation: Speculation,
        remote: Fut,
    ) -> Result<EntityState, AppError>
    where
        Fut: Future<Output = Result<R, AppError>> + Send,
        R: Into<Reconciliation>,
    {
        let action_id = self.begin(entity_id, kind, speculation).await?;
        debug!(post_id = %entity_id, action = %kind, %action_id, "applied speculative change");

        let outcome = match remote.await {
            Ok(response) => {
                let reconciliation: Reconciliation = response.into();
                reconciliation.check(entity_id).map(|_| reconciliation)
            }
            Err(err) => Err(err),
        };

        match outcome {
            Ok(reconciliation) => {
                let state = self.settle(entity_id, action_id, Some(reconciliation)).await;
                info!(post_id = %entity_id, action = %kind, "action committed");
                Ok(state)
            }
            Err(err) => {
                self.settle(entity_id, action_id, None).await;
                warn!(
                    post_id = %entity_id,
                    action = %kind,
                    failure = %err.failure_kind(),
                    error = %err,
                    "action rolled back"
                );
                Err(err)
            }
        }
    }

    /// 取得した投稿を確定状態として取り込む。保留中の操作はその上に重ね直す
    pub async fn absorb_post(&self, post: Post) -> EntityState {
        let id = post.id.clone();
        self.absorb(&id, move |state: &mut EntityState| {
            state.post = Some(post);
            state.sync_comment_count();
        })
        .await
    }

    /// 取得したスレッドを取り込み、コメント数をノード数に揃える
    pub async fn absorb_thread(&self, thread: CommentThread) -> EntityState {
        let id = thread.post_id.clone();
        self.absorb(&id, move |state: &mut EntityState| {
            state.thread = Some(thread);
            state.sync_comment_count();
        })
        .await
    }

    pub async fn pending_actions(&self) -> Vec<PendingAction> {
        let ledger = self.ledger.read().await;
        let mut pending: Vec<PendingAction> = ledger.pending.values().cloned().collect();
        pending.sort_by_key(|action| action.started_at);
        pending
    }

    /// 確定・巻き戻し済みの直近の記録（古い順）
    pub async fn recent_actions(&self) -> Vec<PendingAction> {
        let ledger = self.ledger.read().await;
        ledger.history.iter().cloned().collect()
    }

    pub async fn is_pending(&self, entity_id: &PostId, kind: ActionKind) -> bool {
        let ledger = self.ledger.read().await;
        ledger
            .pending
            .values()
            .any(|action| &action.entity_id == entity_id && action.kind == kind)
    }

    async fn begin(
        &self,
        entity_id: &PostId,
        kind: ActionKind,
        speculation: Speculation,
    ) -> Result<ActionId, AppError> {
        let mut ledger = self.ledger.write().await;
        let snapshot = self.cache.snapshot(entity_id).await;
        let mut speculative = snapshot.clone();
        speculation.apply(&mut speculative)?;

        if ledger
            .pending
            .values()
            .any(|action| &action.entity_id == entity_id && action.kind == kind)
        {
            return Err(AppError::Conflict(format!(
                "A {kind} action is already pending for post {entity_id}"
            )));
        }

        let action = PendingAction::begin(entity_id.clone(), kind, snapshot.clone());
        let action_id = action.id;
        ledger.pending.insert(action_id, action);
        ledger
            .tracked
            .entry(entity_id.clone())
            .or_insert_with(|| Tracked {
                confirmed: snapshot,
                pending: Vec::new(),
            })
            .pending
            .push((action_id, speculation));

        self.cache
            .update(
                entity_id,
                Box::new(move |state: &mut EntityState| *state = speculative),
            )
            .await;
        Ok(action_id)
    }

    /// 操作を台帳から外し、応答があれば確定状態へ反映してからキャッシュを組み直す
    async fn settle(
        &self,
        entity_id: &PostId,
        action_id: ActionId,
        reconciliation: Option<Reconciliation>,
    ) -> EntityState {
        let mut ledger = self.ledger.write().await;
        let committed = reconciliation.is_some();

        if let Some(mut action) = ledger.pending.remove(&action_id) {
            if committed {
                action.commit();
            } else {
                action.roll_back();
            }
            ledger.history.push_back(action);
            while ledger.history.len() > ledger.history_limit {
                ledger.history.pop_front();
            }
        }

        let current = self.cache.snapshot(entity_id).await;
        let Some(tracked) = ledger.tracked.get_mut(entity_id) else {
            return current;
        };
        if current.is_absent() && !tracked.replay().is_absent() {
            debug!(post_id = %entity_id, "entry vanished while actions were pending");
            tracked.confirmed = EntityState::default();
        }
        tracked.pending.retain(|(id, _)| *id != action_id);
        if let Some(reconciliation) = reconciliation {
            reconciliation.apply(entity_id, &mut tracked.confirmed);
        }
        let state = tracked.replay();
        if tracked.pending.is_empty() {
            ledger.tracked.remove(entity_id);
        }

        self.cache
            .update(
                entity_id,
                Box::new(move |cached: &mut EntityState| *cached = state),
            )
            .await
    }

    async fn absorb<F>(&self, entity_id: &PostId, merge: F) -> EntityState
    where
        F: FnOnce(&mut EntityState) + Send + 'static,
    {
        let mut ledger = self.ledger.write().await;
        let Some(tracked) = ledger.tracked.get_mut(entity_id) else {
            return self.cache.update(entity_id, Box::new(merge)).await;
        };
        merge(&mut tracked.confirmed);
        let state = tracked.replay();
        self.cache
            .update(
                entity_id,
                Box::new(move |cached: &mut EntityState| *cached = state),
            )
            .await
    }
}
