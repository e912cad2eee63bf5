use crate::common::fixtures::*;
use crate::common::mocks::ScriptedApi;
use std::sync::Arc;
use surge_core::application::ports::cache::EntityCache;
use surge_core::application::ports::social_api::{LikeState, SaveState};
use surge_core::domain::value_objects::{ActionKind, ActionStatus};
use surge_core::shared::error::{AppError, FailureKind};

#[tokio::test]
async fn like_shows_instantly_then_commits_server_values() {
    let api = Arc::new(ScriptedApi::new());
    let core = Arc::new(build_core(api.clone(), None));
    core.cache()
        .put_post(create_test_post("10", "alice", 10, false))
        .await;
    let respond = api.gate_like();

    let worker = Arc::clone(&core);
    let pending =
        tokio::spawn(async move { worker.interactions().toggle_like(&post_id("10")).await });
    settle().await;

    let shown = core.cache().get_post(&post_id("10")).await.unwrap();
    assert_eq!((shown.like_count, shown.is_liked), (11, true));

    respond
        .send(Ok(LikeState {
            is_liked: true,
            like_count: 11,
        }))
        .unwrap();
    let state = pending.await.unwrap().unwrap();

    let post = state.post.unwrap();
    assert_eq!((post.like_count, post.is_liked), (11, true));
    let cached = core.cache().get_post(&post_id("10")).await.unwrap();
    assert_eq!((cached.like_count, cached.is_liked), (11, true));
}

#[tokio::test]
async fn failed_like_reverts_byte_for_byte() {
    let api = Arc::new(ScriptedApi::new());
    let core = build_core(api.clone(), None);
    core.cache()
        .put_post(create_test_post("10", "alice", 10, false))
        .await;
    let before = serde_json::to_vec(&core.cache().snapshot(&post_id("10")).await).unwrap();
    api.push_like(Err(AppError::Network("HTTP 500".to_string())));

    let err = core
        .interactions()
        .toggle_like(&post_id("10"))
        .await
        .unwrap_err();

    assert_eq!(err.failure_kind(), FailureKind::NetworkFailure);
    let after = serde_json::to_vec(&core.cache().snapshot(&post_id("10")).await).unwrap();
    assert_eq!(before, after);
    let post = core.cache().get_post(&post_id("10")).await.unwrap();
    assert_eq!((post.like_count, post.is_liked), (10, false));
}

#[tokio::test]
async fn sequential_toggles_follow_parity_and_last_server_count() {
    let api = Arc::new(ScriptedApi::new());
    let core = build_core(api.clone(), None);
    core.cache()
        .put_post(create_test_post("7", "alice", 3, false))
        .await;

    let toggles = 5u32;
    for i in 0..toggles {
        api.push_like(Ok(LikeState {
            is_liked: i % 2 == 0,
            like_count: 100 + i,
        }));
        core.interactions().toggle_like(&post_id("7")).await.unwrap();
    }

    let post = core.cache().get_post(&post_id("7")).await.unwrap();
    assert_eq!(post.is_liked, toggles % 2 == 1);
    assert_eq!(post.like_count, 100 + toggles - 1);
}

#[tokio::test]
async fn rapid_toggles_are_queued_and_settle_on_parity() {
    let api = Arc::new(ScriptedApi::new());
    let core = Arc::new(build_core(api.clone(), None));
    core.cache()
        .put_post(create_test_post("7", "alice", 20, true))
        .await;

    let toggles = 4u32;
    for i in 0..toggles {
        api.push_like(Ok(LikeState {
            is_liked: i % 2 == 1,
            like_count: 50 + i,
        }));
    }

    let mut handles = Vec::new();
    for _ in 0..toggles {
        let worker = Arc::clone(&core);
        handles.push(tokio::spawn(async move {
            worker.interactions().toggle_like(&post_id("7")).await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let post = core.cache().get_post(&post_id("7")).await.unwrap();
    assert!(post.is_liked);
    assert_eq!(post.like_count, 50 + toggles - 1);
    assert_eq!(api.call_count("toggle_like"), toggles as usize);
}

#[tokio::test]
async fn save_commit_and_rollback_are_recorded() {
    let api = Arc::new(ScriptedApi::new());
    let core = build_core(api.clone(), None);
    core.cache()
        .put_post(create_test_post("3", "bob", 0, false))
        .await;

    api.push_save(Ok(SaveState { is_saved: true }));
    api.push_save(Err(AppError::Conflict("post was deleted".to_string())));

    core.interactions().toggle_save(&post_id("3")).await.unwrap();
    let err = core
        .interactions()
        .toggle_save(&post_id("3"))
        .await
        .unwrap_err();

    assert_eq!(err.failure_kind(), FailureKind::ConflictFailure);
    assert!(core.cache().get_post(&post_id("3")).await.unwrap().is_saved);

    let history = core.interactions().mutator().recent_actions().await;
    let statuses: Vec<(ActionKind, ActionStatus)> = history
        .iter()
        .map(|action| (action.kind, action.status))
        .collect();
    assert_eq!(
        statuses,
        vec![
            (ActionKind::Save, ActionStatus::Committed),
            (ActionKind::Save, ActionStatus::RolledBack),
        ]
    );
    assert!(core.interactions().mutator().pending_actions().await.is_empty());
}

#[tokio::test]
async fn caption_edit_failure_restores_caption() {
    let api = Arc::new(ScriptedApi::new());
    let core = build_core(api.clone(), None);
    core.cache()
        .put_post(create_test_post("5", "carol", 0, false))
        .await;
    api.push_caption(Err(AppError::Network("timeout".to_string())));

    assert!(core
        .interactions()
        .edit_caption(&post_id("5"), "golden hour")
        .await
        .is_err());
    assert_eq!(
        core.cache().get_post(&post_id("5")).await.unwrap().caption,
        "Test caption 5"
    );

    let mut updated = create_test_post("5", "carol", 4, false);
    updated.caption = "golden hour".to_string();
    api.push_caption(Ok(updated));
    core.interactions()
        .edit_caption(&post_id("5"), "  golden hour ")
        .await
        .unwrap();

    let post = core.cache().get_post(&post_id("5")).await.unwrap();
    assert_eq!(post.caption, "golden hour");
    assert_eq!(post.like_count, 4);
}

#[tokio::test]
async fn delete_hides_post_until_the_server_refuses() {
    let api = Arc::new(ScriptedApi::new());
    let core = Arc::new(build_core(api.clone(), Some("alice")));
    core.cache()
        .put_post(create_test_post("8", "alice", 2, false))
        .await;
    let respond = api.gate_delete();

    let worker = Arc::clone(&core);
    let pending =
        tokio::spawn(async move { worker.interactions().delete_post(&post_id("8")).await });
    settle().await;
    assert!(core.cache().get_post(&post_id("8")).await.is_none());

    respond
        .send(Err(AppError::Network("HTTP 403".to_string())))
        .unwrap();
    assert!(pending.await.unwrap().is_err());
    assert_eq!(
        core.cache().get_post(&post_id("8")).await.unwrap().like_count,
        2
    );

    api.push_delete(Ok(()));
    let state = core.interactions().delete_post(&post_id("8")).await.unwrap();
    assert!(state.is_absent());
    assert_eq!(core.cache().len().await, 0);
}
