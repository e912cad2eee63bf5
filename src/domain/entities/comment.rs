use crate::domain::comment_tree;
use crate::domain::value_objects::{CommentId, PostId, UserRef};
use serde::{Deserialize, Serialize};

/// フラットなコメントレコード。`parent_id` が `None` ならトップレベル
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: CommentId,
    pub post_id: PostId,
    pub author: Option<UserRef>,
    pub text: String,
    pub parent_id: Option<CommentId>,
}

impl Comment {
    pub fn new(id: CommentId, post_id: PostId, text: String) -> Self {
        Self {
            id,
            post_id,
            author: None,
            text,
            parent_id: None,
        }
    }

    pub fn with_author(mut self, author: Option<UserRef>) -> Self {
        self.author = author;
        self
    }

    pub fn replying_to(mut self, parent_id: Option<CommentId>) -> Self {
        self.parent_id = parent_id;
        self
    }
}

/// ツリー上のコメント。親が見つからない返信は `orphaned` としてトップレベルに置かれる
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentNode {
    pub comment: Comment,
    pub children: Vec<CommentNode>,
    pub orphaned: bool,
}

impl CommentNode {
    /// 自身を含む部分木のノード数
    pub fn subtree_len(&self) -> usize {
        let mut count = 0;
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            count += 1;
            stack.extend(node.children.iter());
        }
        count
    }
}

/// 投稿に紐づくコメントスレッド。フラットな並びが正で、ツリーは常にそこから再構築する
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentThread {
    pub post_id: PostId,
    comments: Vec<Comment>,
    forest: Vec<CommentNode>,
}

impl CommentThread {
    pub fn new(post_id: PostId, comments: Vec<Comment>) -> Self {
        let forest = comment_tree::build(&comments);
        Self {
            post_id,
            comments,
            forest,
        }
    }

    pub fn empty(post_id: PostId) -> Self {
        Self::new(post_id, Vec::new())
    }

    pub fn comments(&self) -> &[Comment] {
        &self.comments
    }

    pub fn forest(&self) -> &[CommentNode] {
        &self.forest
    }

    pub fn len(&self) -> usize {
        self.comments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.comments.is_empty()
    }

    pub fn contains(&self, id: &CommentId) -> bool {
        self.comments.iter().any(|comment| &comment.id == id)
    }

    pub fn orphans(&self) -> Vec<&Comment> {
        self.forest
            .iter()
            .filter(|node| node.orphaned)
            .map(|node| &node.comment)
            .collect()
    }

    /// コメントを末尾に追加してツリーを再構築
    pub fn push(&mut self, comment: Comment) {
        self.comments.push(comment);
        self.rebuild();
    }

    /// コメントとその返信すべてを取り除き、削除件数を返す
    pub fn remove_subtree(&mut self, id: &CommentId) -> usize {
        let doomed = comment_tree::subtree_ids(&self.forest, id);
        if doomed.is_empty() {
            return 0;
        }
        let before = self.comments.len();
        self.comments.retain(|comment| !doomed.contains(&comment.id));
        self.rebuild();
        before - self.comments.len()
    }

    fn rebuild(&mut self) {
        self.forest = comment_tree::build(&self.comments);
    }
}
