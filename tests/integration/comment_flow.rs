use crate::common::fixtures::*;
use crate::common::mocks::ScriptedApi;
use std::sync::Arc;
use surge_core::application::ports::cache::EntityCache;
use surge_core::domain::comment_tree;
use surge_core::shared::error::AppError;

async fn core_with_thread(api: &Arc<ScriptedApi>) -> surge_core::SurgeCore {
    let core = build_core(api.clone(), Some("dana"));
    core.cache()
        .put_post(create_test_post("1", "alice", 0, false))
        .await;
    api.serve_thread(
        post_id("1"),
        thread_snapshot(vec![
            create_test_comment("1", "1", None),
            create_test_comment("2", "1", Some("1")),
        ]),
    );
    core.interactions()
        .fetch_comments(&post_id("1"))
        .await
        .unwrap();
    core
}

#[tokio::test]
async fn reply_attaches_under_its_target() {
    let api = Arc::new(ScriptedApi::new());
    let core = core_with_thread(&api).await;

    let thread = core.cache().get_thread(&post_id("1")).await.unwrap();
    assert_eq!(thread.forest().len(), 1);
    assert_eq!(thread.forest()[0].comment.id, comment_id("1"));
    assert_eq!(thread.forest()[0].children.len(), 1);
    assert_eq!(thread.forest()[0].children[0].comment.id, comment_id("2"));
    assert_eq!(
        core.cache().get_post(&post_id("1")).await.unwrap().comment_count,
        2
    );

    api.push_add_comment(Ok(thread_snapshot(vec![
        create_test_comment("1", "1", None),
        create_test_comment("2", "1", Some("1")),
        create_test_comment("3", "1", Some("1")),
    ])));
    let state = core
        .interactions()
        .add_comment(&post_id("1"), "nice shot", Some(comment_id("1")))
        .await
        .unwrap();

    let thread = state.thread.unwrap();
    assert_eq!(thread.len(), 3);
    assert_eq!(thread.forest().len(), 1);
    let children: Vec<&str> = thread.forest()[0]
        .children
        .iter()
        .map(|node| node.comment.id.as_str())
        .collect();
    assert_eq!(children, vec!["2", "3"]);
    assert_eq!(state.post.unwrap().comment_count, 3);
}

#[tokio::test]
async fn provisional_reply_is_visible_while_pending() {
    let api = Arc::new(ScriptedApi::new());
    let core = Arc::new(core_with_thread(&api).await);
    let respond = api.gate_add_comment();

    let worker = Arc::clone(&core);
    let pending = tokio::spawn(async move {
        worker
            .interactions()
            .add_comment(&post_id("1"), "  on it  ", Some(comment_id("2")))
            .await
    });
    settle().await;

    let thread = core.cache().get_thread(&post_id("1")).await.unwrap();
    let provisional = &thread.forest()[0].children[0].children[0].comment;
    assert!(provisional.id.is_provisional());
    assert_eq!(provisional.text, "on it");
    assert_eq!(provisional.author.as_ref().unwrap().as_str(), "dana");
    assert_eq!(
        core.cache().get_post(&post_id("1")).await.unwrap().comment_count,
        3
    );

    respond
        .send(Err(AppError::Network("connection reset".to_string())))
        .unwrap();
    assert!(pending.await.unwrap().is_err());

    let thread = core.cache().get_thread(&post_id("1")).await.unwrap();
    assert_eq!(thread.len(), 2);
    assert!(thread.comments().iter().all(|c| !c.id.is_provisional()));
    assert_eq!(
        core.cache().get_post(&post_id("1")).await.unwrap().comment_count,
        2
    );
}

#[tokio::test]
async fn orphans_survive_fetch_and_are_flagged() {
    let api = Arc::new(ScriptedApi::new());
    let core = build_core(api.clone(), None);
    core.cache()
        .put_post(create_test_post("4", "erin", 0, false))
        .await;
    let input = vec![
        create_test_comment("10", "4", None),
        create_test_comment("11", "4", Some("deleted")),
        create_test_comment("12", "4", Some("11")),
        create_test_comment("13", "4", Some("13")),
    ];
    api.serve_thread(post_id("4"), thread_snapshot(input.clone()));

    let thread = core
        .interactions()
        .fetch_comments(&post_id("4"))
        .await
        .unwrap();

    assert_eq!(comment_tree::count_nodes(thread.forest()), input.len());
    let orphans: Vec<&str> = thread.orphans().iter().map(|c| c.id.as_str()).collect();
    assert_eq!(orphans, vec!["11", "13"]);
    assert_eq!(
        comment_tree::build(&comment_tree::flatten(thread.forest())),
        thread.forest().to_vec()
    );
    assert_eq!(
        core.cache().get_post(&post_id("4")).await.unwrap().comment_count,
        4
    );
}

#[tokio::test]
async fn deleting_a_comment_removes_its_replies() {
    let api = Arc::new(ScriptedApi::new());
    let core = build_core(api.clone(), None);
    core.cache()
        .put_post(create_test_post("6", "frank", 0, false))
        .await;
    api.serve_thread(
        post_id("6"),
        thread_snapshot(vec![
            create_test_comment("1", "6", None),
            create_test_comment("2", "6", Some("1")),
            create_test_comment("3", "6", Some("2")),
            create_test_comment("4", "6", None),
        ]),
    );
    core.interactions()
        .fetch_comments(&post_id("6"))
        .await
        .unwrap();
    let before = core.cache().snapshot(&post_id("6")).await;

    api.push_delete_comment(Err(AppError::Network("HTTP 502".to_string())));
    assert!(core
        .interactions()
        .delete_comment(&post_id("6"), &comment_id("1"))
        .await
        .is_err());
    assert_eq!(core.cache().snapshot(&post_id("6")).await, before);

    api.push_delete_comment(Ok(thread_snapshot(vec![create_test_comment(
        "4", "6", None,
    )])));
    let state = core
        .interactions()
        .delete_comment(&post_id("6"), &comment_id("1"))
        .await
        .unwrap();

    assert_eq!(state.thread.unwrap().len(), 1);
    assert_eq!(state.post.unwrap().comment_count, 1);
}

#[tokio::test]
async fn comment_on_unloaded_post_is_rejected_without_a_call() {
    let api = Arc::new(ScriptedApi::new());
    let core = build_core(api.clone(), None);

    let err = core
        .interactions()
        .add_comment(&post_id("404"), "hello", None)
        .await
        .unwrap_err();

    assert!(err.validation_kind().is_some());
    assert_eq!(api.call_count("add_comment"), 0);
    assert!(core.cache().snapshot(&post_id("404")).await.is_absent());
}
