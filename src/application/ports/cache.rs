use crate::domain::entities::{CommentThread, EntityState, Post, PostPatch};
use crate::domain::value_objects::PostId;
use async_trait::async_trait;

/// キャッシュ上の 1 エンティティに対する原子的な変更
pub type StateChange = Box<dyn FnOnce(&mut EntityState) + Send>;

/// 投稿とコメントスレッドの正本を保持するキャッシュポート
#[async_trait]
pub trait EntityCache: Send + Sync {
    /// 投稿を取得（存在しなければ `None`）
    async fn get_post(&self, id: &PostId) -> Option<Post>;

    async fn put_post(&self, post: Post);

    async fn put_posts(&self, posts: Vec<Post>);

    /// 指定フィールドのみ更新。投稿がなければ何もせず `None`
    async fn patch_post(&self, id: &PostId, patch: PostPatch) -> Option<Post>;

    /// 投稿と紐づくスレッドを削除
    async fn remove_post(&self, id: &PostId) -> Option<Post>;

    async fn get_thread(&self, post_id: &PostId) -> Option<CommentThread>;

    async fn put_thread(&self, thread: CommentThread);

    /// 投稿とスレッドをまとめて読む
    async fn snapshot(&self, id: &PostId) -> EntityState;

    /// 変更を 1 回の書き込みとして適用し、適用後の状態を返す
    async fn update(&self, id: &PostId, change: StateChange) -> EntityState;

    /// 画面遷移などでキャッシュから外す
    async fn evict(&self, id: &PostId);

    async fn clear(&self);

    async fn len(&self) -> usize;
}
