use crate::application::ports::social_api::SocialApi;
use crate::application::services::action_coordinator::ActionCoordinator;
use crate::application::services::optimistic_mutator::{OptimisticMutator, Speculation};
use crate::domain::entities::{Comment, CommentThread, EntityState, Post, SessionContext};
use crate::domain::value_objects::{ActionKind, CommentId, PostId};
use crate::shared::config::ValidationConfig;
use crate::shared::error::AppError;
use crate::shared::validation::{validate_caption, validate_comment_text, ValidationFailureKind};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, warn};

/// UI の各操作を ActionCoordinator → OptimisticMutator → キャッシュの順に流す
pub struct InteractionService {
    api: Arc<dyn SocialApi>,
    mutator: OptimisticMutator,
    coordinator: ActionCoordinator,
    session: Arc<RwLock<SessionContext>>,
    validation: ValidationConfig,
}

impl InteractionService {
    pub fn new(
        api: Arc<dyn SocialApi>,
        mutator: OptimisticMutator,
        coordinator: ActionCoordinator,
        session: SessionContext,
        validation: ValidationConfig,
    ) -> Self {
        Self {
            api,
            mutator,
            coordinator,
            session: Arc::new(RwLock::new(session)),
            validation,
        }
    }

    pub async fn session(&self) -> SessionContext {
        self.session.read().await.clone()
    }

    pub async fn set_session(&self, session: SessionContext) {
        *self.session.write().await = session;
    }

    pub async fn toggle_like(&self, post_id: &PostId) -> Result<EntityState, AppError> {
        let api = Arc::clone(&self.api);
        let mutator = self.mutator.clone();
        let id = post_id.clone();
        self.coordinator
            .run(post_id.as_str(), ActionKind::Like, move || async move {
                let remote = api.toggle_like(&id);
                mutator
                    .apply(&id, ActionKind::Like, Speculation::ToggleLike, remote)
                    .await
            })
            .await
    }

    pub async fn toggle_save(&self, post_id: &PostId) -> Result<EntityState, AppError> {
        let api = Arc::clone(&self.api);
        let mutator = self.mutator.clone();
        let id = post_id.clone();
        self.coordinator
            .run(post_id.as_str(), ActionKind::Save, move || async move {
                let remote = api.toggle_save(&id);
                mutator
                    .apply(&id, ActionKind::Save, Speculation::ToggleSave, remote)
                    .await
            })
            .await
    }

    /// コメントまたは返信を追加する。`reply_to` があれば返信として扱う
    pub async fn add_comment(
        &self,
        post_id: &PostId,
        text: &str,
        reply_to: Option<CommentId>,
    ) -> Result<EntityState, AppError> {
        let text = validate_comment_text(text, &self.validation)?;
        let kind = if reply_to.is_some() {
            ActionKind::Reply
        } else {
            ActionKind::Comment
        };
        let author = self.session.read().await.current_user.clone();
        let provisional = Comment::new(CommentId::provisional(), post_id.clone(), text.clone())
            .with_author(author)
            .replying_to(reply_to.clone());

        let api = Arc::clone(&self.api);
        let mutator = self.mutator.clone();
        let id = post_id.clone();
        self.coordinator
            .run(post_id.as_str(), kind, move || async move {
                let remote = api.add_comment(&id, &text, reply_to);
                mutator
                    .apply(&id, kind, Speculation::AppendComment(provisional), remote)
                    .await
            })
            .await
    }

    pub async fn edit_caption(
        &self,
        post_id: &PostId,
        caption: &str,
    ) -> Result<EntityState, AppError> {
        let api = Arc::clone(&self.api);
        let mutator = self.mutator.clone();
        let limits = self.validation.clone();
        let id = post_id.clone();
        let requested = caption.to_string();
        self.coordinator
            .run(post_id.as_str(), ActionKind::EditCaption, move || async move {
                let current = mutator.cache().get_post(&id).await.ok_or_else(|| {
                    AppError::validation(ValidationFailureKind::NotLoaded, "Post is not loaded")
                })?;
                let caption = validate_caption(&requested, &current.caption, &limits)?;
                let remote = api.update_caption(&id, &caption);
                mutator
                    .apply(
                        &id,
                        ActionKind::EditCaption,
                        Speculation::SetCaption(caption.clone()),
                        remote,
                    )
                    .await
            })
            .await
    }

    /// 投稿を削除する。ログイン中なら投稿者本人であることを確認する
    pub async fn delete_post(&self, post_id: &PostId) -> Result<EntityState, AppError> {
        let api = Arc::clone(&self.api);
        let mutator = self.mutator.clone();
        let session = self.session.read().await.clone();
        let id = post_id.clone();
        self.coordinator
            .run(post_id.as_str(), ActionKind::Delete, move || async move {
                if let (Some(user), Some(post)) = (
                    session.current_user.as_ref(),
                    mutator.cache().get_post(&id).await,
                ) {
                    if !post.is_authored_by(user) {
                        return Err(AppError::validation(
                            ValidationFailureKind::NotOwner,
                            format!("Post {id} belongs to {}", post.author),
                        ));
                    }
                }
                let remote = api.delete_post(&id);
                mutator
                    .apply(&id, ActionKind::Delete, Speculation::RemovePost, remote)
                    .await
            })
            .await
    }

    /// コメントとその返信をまとめて削除する
    pub async fn delete_comment(
        &self,
        post_id: &PostId,
        comment_id: &CommentId,
    ) -> Result<EntityState, AppError> {
        let api = Arc::clone(&self.api);
        let mutator = self.mutator.clone();
        let id = post_id.clone();
        let target = comment_id.clone();
        self.coordinator
            .run(post_id.as_str(), ActionKind::DeleteComment, move || async move {
                let remote = api.delete_comment(&id, &target);
                mutator
                    .apply(
                        &id,
                        ActionKind::DeleteComment,
                        Speculation::RemoveComment(target.clone()),
                        remote,
                    )
                    .await
            })
            .await
    }

    pub async fn fetch_post(&self, post_id: &PostId) -> Result<Post, AppError> {
        let post = self.api.fetch_post(post_id).await?;
        if &post.id != post_id {
            return Err(AppError::Conflict(format!(
                "Requested post {post_id} but received {}",
                post.id
            )));
        }
        self.absorb_posts(vec![post.clone()]).await;
        Ok(self
            .mutator
            .cache()
            .get_post(post_id)
            .await
            .unwrap_or(post))
    }

    pub async fn fetch_feed(&self) -> Result<Vec<Post>, AppError> {
        let posts = self.api.fetch_feed().await?;
        Ok(self.absorb_posts(posts).await)
    }

    pub async fn fetch_saved_posts(&self) -> Result<Vec<Post>, AppError> {
        let posts = self.api.fetch_saved_posts().await?;
        Ok(self.absorb_posts(posts).await)
    }

    pub async fn fetch_user_posts(&self, username: &str) -> Result<Vec<Post>, AppError> {
        let username = username.trim();
        if username.is_empty() {
            return Err(AppError::validation(
                ValidationFailureKind::Generic,
                "username is required",
            ));
        }
        let posts = self.api.fetch_user_posts(username).await?;
        Ok(self.absorb_posts(posts).await)
    }

    /// スレッドを取得してキャッシュへ書き込む。返り値は保留中の操作を反映した状態
    pub async fn fetch_comments(&self, post_id: &PostId) -> Result<CommentThread, AppError> {
        let snapshot = self.api.fetch_comments(post_id).await?;
        if let Some(stray) = snapshot
            .comments
            .iter()
            .find(|comment| &comment.post_id != post_id)
        {
            return Err(AppError::Conflict(format!(
                "Comment {} belongs to post {}, not {post_id}",
                stray.id, stray.post_id
            )));
        }
        let thread = CommentThread::new(post_id.clone(), snapshot.comments);
        if thread.len() != snapshot.comment_count as usize {
            warn!(
                post_id = %post_id,
                reported = snapshot.comment_count,
                counted = thread.len(),
                "server comment count disagrees with returned thread"
            );
        }
        let fallback = thread.clone();
        let state = self.mutator.absorb_thread(thread).await;
        Ok(state.thread.unwrap_or(fallback))
    }

    /// 画面遷移などで不要になった投稿をキャッシュから外す
    pub async fn evict(&self, post_id: &PostId) {
        self.mutator.cache().evict(post_id).await;
    }

    pub fn coordinator(&self) -> &ActionCoordinator {
        &self.coordinator
    }

    pub fn mutator(&self) -> &OptimisticMutator {
        &self.mutator
    }

    async fn absorb_posts(&self, posts: Vec<Post>) -> Vec<Post> {
        let mut merged = Vec::with_capacity(posts.len());
        for post in posts {
            let fallback = post.clone();
            let state = self.mutator.absorb_post(post).await;
            match state.post {
                Some(post) => merged.push(post),
                None => {
                    debug!(post_id = %fallback.id, "fetched post hidden by pending delete");
                }
            }
        }
        merged
    }
}
