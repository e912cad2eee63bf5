use crate::common::fixtures::*;
use crate::common::mocks::ScriptedApi;
use std::sync::Arc;
use surge_core::application::ports::cache::EntityCache;
use surge_core::application::ports::social_api::{LikeState, SaveState};
use surge_core::domain::value_objects::{ActionKind, ActionStatus};
use surge_core::shared::error::AppError;

#[tokio::test]
async fn second_like_waits_for_the_first_to_settle() {
    let api = Arc::new(ScriptedApi::new());
    let core = Arc::new(build_core(api.clone(), None));
    core.cache()
        .put_post(create_test_post("1", "alice", 10, false))
        .await;
    let first_response = api.gate_like();
    api.push_like(Ok(LikeState {
        is_liked: false,
        like_count: 10,
    }));

    let worker = Arc::clone(&core);
    let first =
        tokio::spawn(async move { worker.interactions().toggle_like(&post_id("1")).await });
    settle().await;
    let worker = Arc::clone(&core);
    let second =
        tokio::spawn(async move { worker.interactions().toggle_like(&post_id("1")).await });
    settle().await;

    assert_eq!(api.call_count("toggle_like"), 1);
    assert_eq!(
        core.interactions()
            .coordinator()
            .in_flight("1", ActionKind::Like),
        2
    );

    first_response
        .send(Ok(LikeState {
            is_liked: true,
            like_count: 11,
        }))
        .unwrap();
    first.await.unwrap().unwrap();
    second.await.unwrap().unwrap();

    assert_eq!(api.call_count("toggle_like"), 2);
    let post = core.cache().get_post(&post_id("1")).await.unwrap();
    assert_eq!((post.like_count, post.is_liked), (10, false));
    assert_eq!(core.interactions().coordinator().active_lanes(), 0);
}

#[tokio::test]
async fn save_proceeds_while_like_is_in_flight() {
    let api = Arc::new(ScriptedApi::new());
    let core = Arc::new(build_core(api.clone(), None));
    core.cache()
        .put_post(create_test_post("2", "alice", 5, false))
        .await;
    let like_response = api.gate_like();
    api.push_save(Ok(SaveState { is_saved: true }));

    let worker = Arc::clone(&core);
    let like =
        tokio::spawn(async move { worker.interactions().toggle_like(&post_id("2")).await });
    settle().await;

    core.interactions().toggle_save(&post_id("2")).await.unwrap();

    like_response
        .send(Err(AppError::Network("offline".to_string())))
        .unwrap();
    assert!(like.await.unwrap().is_err());

    let post = core.cache().get_post(&post_id("2")).await.unwrap();
    assert!(post.is_saved);
    assert_eq!((post.like_count, post.is_liked), (5, false));
}

#[tokio::test]
async fn abandoned_caller_still_gets_its_mutation_applied() {
    let api = Arc::new(ScriptedApi::new());
    let core = Arc::new(build_core(api.clone(), None));
    core.cache()
        .put_post(create_test_post("3", "alice", 1, false))
        .await;
    let respond = api.gate_like();

    let worker = Arc::clone(&core);
    let view = tokio::spawn(async move { worker.interactions().toggle_like(&post_id("3")).await });
    settle().await;
    view.abort();
    let _ = view.await;

    respond
        .send(Ok(LikeState {
            is_liked: true,
            like_count: 9,
        }))
        .unwrap();
    for _ in 0..20 {
        if core
            .interactions()
            .mutator()
            .pending_actions()
            .await
            .is_empty()
        {
            break;
        }
        settle().await;
    }

    let post = core.cache().get_post(&post_id("3")).await.unwrap();
    assert_eq!((post.like_count, post.is_liked), (9, true));
    let history = core.interactions().mutator().recent_actions().await;
    assert_eq!(history.last().unwrap().status, ActionStatus::Committed);
}

#[tokio::test]
async fn failure_leaves_coordinator_usable() {
    let api = Arc::new(ScriptedApi::new());
    let core = build_core(api.clone(), None);
    core.cache()
        .put_post(create_test_post("4", "alice", 0, false))
        .await;
    api.push_like(Err(AppError::Network("HTTP 503".to_string())));
    api.push_like(Ok(LikeState {
        is_liked: true,
        like_count: 1,
    }));

    assert!(core.interactions().toggle_like(&post_id("4")).await.is_err());
    core.interactions().toggle_like(&post_id("4")).await.unwrap();

    let post = core.cache().get_post(&post_id("4")).await.unwrap();
    assert_eq!((post.like_count, post.is_liked), (1, true));
}

#[tokio::test]
async fn like_and_delete_that_both_fail_leave_the_original_post() {
    let api = Arc::new(ScriptedApi::new());
    let core = Arc::new(build_core(api.clone(), Some("alice")));
    core.cache()
        .put_post(create_test_post("6", "alice", 10, false))
        .await;
    let before = core.cache().snapshot(&post_id("6")).await;
    let like_response = api.gate_like();
    let delete_response = api.gate_delete();

    let worker = Arc::clone(&core);
    let like =
        tokio::spawn(async move { worker.interactions().toggle_like(&post_id("6")).await });
    settle().await;
    let worker = Arc::clone(&core);
    let delete =
        tokio::spawn(async move { worker.interactions().delete_post(&post_id("6")).await });
    settle().await;
    assert!(core.cache().get_post(&post_id("6")).await.is_none());

    like_response
        .send(Err(AppError::Network("offline".to_string())))
        .unwrap();
    assert!(like.await.unwrap().is_err());
    delete_response
        .send(Err(AppError::Network("offline".to_string())))
        .unwrap();
    assert!(delete.await.unwrap().is_err());

    let after = core.cache().snapshot(&post_id("6")).await;
    assert_eq!(after, before);
    let post = after.post.unwrap();
    assert_eq!((post.like_count, post.is_liked), (10, false));
}

#[tokio::test]
async fn comment_and_reply_that_both_fail_leave_the_original_thread() {
    let api = Arc::new(ScriptedApi::new());
    let core = Arc::new(build_core(api.clone(), None));
    core.cache()
        .put_post(create_test_post("7", "alice", 0, false))
        .await;
    api.serve_thread(
        post_id("7"),
        thread_snapshot(vec![create_test_comment("1", "7", None)]),
    );
    core.interactions()
        .fetch_comments(&post_id("7"))
        .await
        .unwrap();
    let before = core.cache().snapshot(&post_id("7")).await;
    let comment_response = api.gate_add_comment();
    let reply_response = api.gate_add_comment();

    let worker = Arc::clone(&core);
    let comment = tokio::spawn(async move {
        worker
            .interactions()
            .add_comment(&post_id("7"), "A", None)
            .await
    });
    settle().await;
    let worker = Arc::clone(&core);
    let reply = tokio::spawn(async move {
        worker
            .interactions()
            .add_comment(&post_id("7"), "B", Some(comment_id("1")))
            .await
    });
    settle().await;
    assert_eq!(
        core.cache()
            .get_thread(&post_id("7"))
            .await
            .unwrap()
            .len(),
        3
    );

    comment_response
        .send(Err(AppError::Network("offline".to_string())))
        .unwrap();
    assert!(comment.await.unwrap().is_err());
    reply_response
        .send(Err(AppError::Network("offline".to_string())))
        .unwrap();
    assert!(reply.await.unwrap().is_err());

    let after = core.cache().snapshot(&post_id("7")).await;
    assert_eq!(after, before);
    assert_eq!(after.thread.unwrap().len(), 1);
    assert_eq!(after.post.unwrap().comment_count, 1);
}
