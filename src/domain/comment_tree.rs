//! フラットなコメント列から返信ツリーを組み立てる。
//!
//! - 子は入力の並び順のまま親にぶら下げる（並べ替えない）
//! - 親が見つからない返信、自分自身や循環を親に持つ返信は `orphaned` としてトップレベルに置く
//! - 入力のコメントは一件も捨てない
//!
//! 深さに上限はないので、構築は明示的なスタックで行う。

use super::entities::{Comment, CommentNode};
use super::value_objects::CommentId;
use std::collections::{HashMap, HashSet};

pub fn build(comments: &[Comment]) -> Vec<CommentNode> {
    let len = comments.len();
    if len == 0 {
        return Vec::new();
    }

    // 同じ ID が重複した場合は最初の出現を親として扱う
    let mut index_by_id: HashMap<&CommentId, usize> = HashMap::with_capacity(len);
    for (index, comment) in comments.iter().enumerate() {
        index_by_id.entry(&comment.id).or_insert(index);
    }

    let mut children: Vec<Vec<usize>> = vec![Vec::new(); len];
    let mut orphaned = vec![false; len];
    let mut roots: Vec<usize> = Vec::new();

    for (index, comment) in comments.iter().enumerate() {
        match &comment.parent_id {
            None => roots.push(index),
            Some(parent_id) => match index_by_id.get(parent_id) {
                Some(&parent) if parent != index => children[parent].push(index),
                _ => {
                    orphaned[index] = true;
                    roots.push(index);
                }
            },
        }
    }

    let mut visited = vec![false; len];
    let mut tree_children: Vec<Vec<usize>> = vec![Vec::new(); len];
    let mut preorder: Vec<usize> = Vec::with_capacity(len);

    for &root in &roots {
        walk(root, &children, &mut visited, &mut tree_children, &mut preorder);
    }

    // ルートから辿れないノードは循環の中にいる。最も早く現れたものを孤児として切り出す
    let mut cursor = 0;
    while preorder.len() < len {
        while visited[cursor] {
            cursor += 1;
        }
        orphaned[cursor] = true;
        roots.push(cursor);
        walk(cursor, &children, &mut visited, &mut tree_children, &mut preorder);
    }
    roots.sort_unstable();

    let mut built: Vec<Option<CommentNode>> = vec![None; len];
    for &index in preorder.iter().rev() {
        let node_children = tree_children[index]
            .iter()
            .filter_map(|child| built[*child].take())
            .collect();
        built[index] = Some(CommentNode {
            comment: comments[index].clone(),
            children: node_children,
            orphaned: orphaned[index],
        });
    }

    roots
        .into_iter()
        .filter_map(|root| built[root].take())
        .collect()
}

fn walk(
    start: usize,
    children: &[Vec<usize>],
    visited: &mut [bool],
    tree_children: &mut [Vec<usize>],
    preorder: &mut Vec<usize>,
) {
    if visited[start] {
        return;
    }
    visited[start] = true;
    let mut stack = vec![start];
    while let Some(index) = stack.pop() {
        preorder.push(index);
        let mut fresh = Vec::with_capacity(children[index].len());
        for &child in &children[index] {
            if !visited[child] {
                visited[child] = true;
                fresh.push(child);
            }
        }
        // 先頭の子から処理されるよう逆順に積む
        stack.extend(fresh.iter().rev());
        tree_children[index] = fresh;
    }
}

/// ツリーを深さ優先の前順でフラットな列に戻す
pub fn flatten(forest: &[CommentNode]) -> Vec<Comment> {
    let mut flat = Vec::new();
    let mut stack: Vec<&CommentNode> = forest.iter().rev().collect();
    while let Some(node) = stack.pop() {
        flat.push(node.comment.clone());
        stack.extend(node.children.iter().rev());
    }
    flat
}

pub fn count_nodes(forest: &[CommentNode]) -> usize {
    forest.iter().map(CommentNode::subtree_len).sum()
}

/// `id` を根とする部分木に含まれる ID。見つからなければ空
pub fn subtree_ids(forest: &[CommentNode], id: &CommentId) -> HashSet<CommentId> {
    let mut stack: Vec<&CommentNode> = forest.iter().rev().collect();
    while let Some(node) = stack.pop() {
        if &node.comment.id == id {
            return flatten(std::slice::from_ref(node))
                .into_iter()
                .map(|comment| comment.id)
                .collect();
        }
        stack.extend(node.children.iter().rev());
    }
    HashSet::new()
}
