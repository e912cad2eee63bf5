use crate::application::ports::cache::{EntityCache, StateChange};
use crate::domain::entities::{CommentThread, EntityState, Post, PostPatch};
use crate::domain::value_objects::PostId;
use crate::shared::config::CacheConfig;
use async_trait::async_trait;
use lru::LruCache;
use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

struct CacheInner {
    posts: LruCache<PostId, Post>,
    threads: HashMap<PostId, CommentThread>,
}

impl CacheInner {
    fn state(&self, id: &PostId) -> EntityState {
        EntityState::new(self.posts.peek(id).cloned(), self.threads.get(id).cloned())
    }

    fn store_post(&mut self, post: Post) {
        let id = post.id.clone();
        if let Some((evicted, _)) = self.posts.push(id.clone(), post) {
            if evicted != id {
                debug!(post_id = %evicted, "evicting least recently written post");
                self.threads.remove(&evicted);
            }
        }
    }

    fn store_state(&mut self, id: &PostId, state: EntityState) {
        match state.post {
            Some(post) => self.store_post(post),
            None => {
                self.posts.pop(id);
            }
        }
        match state.thread {
            Some(thread) => {
                self.threads.insert(id.clone(), thread);
            }
            None => {
                self.threads.remove(id);
            }
        }
    }
}

/// 投稿・コメントスレッドのインメモリキャッシュ
///
/// 投稿数は LRU で上限を設ける。読み取りは順位を変えず、書き込みのたびに最新扱いになる。
#[derive(Clone)]
pub struct EntityCacheService {
    inner: Arc<RwLock<CacheInner>>,
}

impl EntityCacheService {
    pub fn new(max_posts: usize) -> Self {
        let capacity = NonZeroUsize::new(max_posts).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner: Arc::new(RwLock::new(CacheInner {
                posts: LruCache::new(capacity),
                threads: HashMap::new(),
            })),
        }
    }

    pub fn with_config(config: &CacheConfig) -> Self {
        Self::new(config.max_posts)
    }

    /// キャッシュ済みの投稿 ID（新しく書き込まれた順）
    pub async fn post_ids(&self) -> Vec<PostId> {
        let inner = self.inner.read().await;
        inner.posts.iter().map(|(id, _)| id.clone()).collect()
    }
}

impl Default for EntityCacheService {
    fn default() -> Self {
        Self::with_config(&CacheConfig::default())
    }
}

#[async_trait]
impl EntityCache for EntityCacheService {
    async fn get_post(&self, id: &PostId) -> Option<Post> {
        let inner = self.inner.read().await;
        inner.posts.peek(id).cloned()
    }

    async fn put_post(&self, post: Post) {
        let mut inner = self.inner.write().await;
        inner.store_post(post);
    }

    async fn put_posts(&self, posts: Vec<Post>) {
        let mut inner = self.inner.write().await;
        for post in posts {
            inner.store_post(post);
        }
    }

    async fn patch_post(&self, id: &PostId, patch: PostPatch) -> Option<Post> {
        let mut inner = self.inner.write().await;
        let post = inner.posts.get_mut(id)?;
        patch.apply_to(post);
        Some(post.clone())
    }

    async fn remove_post(&self, id: &PostId) -> Option<Post> {
        let mut inner = self.inner.write().await;
        inner.threads.remove(id);
        inner.posts.pop(id)
    }

    async fn get_thread(&self, post_id: &PostId) -> Option<CommentThread> {
        let inner = self.inner.read().await;
        inner.threads.get(post_id).cloned()
    }

    async fn put_thread(&self, thread: CommentThread) {
        let mut inner = self.inner.write().await;
        inner.threads.insert(thread.post_id.clone(), thread);
    }

    async fn snapshot(&self, id: &PostId) -> EntityState {
        let inner = self.inner.read().await;
        inner.state(id)
    }

    async fn update(&self, id: &PostId, change: StateChange) -> EntityState {
        let mut inner = self.inner.write().await;
        let mut state = inner.state(id);
        change(&mut state);
        inner.store_state(id, state.clone());
        state
    }

    async fn evict(&self, id: &PostId) {
        let mut inner = self.inner.write().await;
        inner.posts.pop(id);
        inner.threads.remove(id);
        debug!(post_id = %id, "evicted post from cache");
    }

    async fn clear(&self) {
        let mut inner = self.inner.write().await;
        inner.posts.clear();
        inner.threads.clear();
    }

    async fn len(&self) -> usize {
        let inner = self.inner.read().await;
        inner.posts.len()
    }
}
