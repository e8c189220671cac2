//! Integration tests for the post/comment core.

use post_comments::{
    CommentId, InMemoryStorage, JournalConfig, JournalStorage, PostId, PostService, StoreError,
};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

fn memory_service() -> PostService {
    PostService::new(Arc::new(InMemoryStorage::new()))
}

fn journal_service(dir: &TempDir) -> PostService {
    let storage = JournalStorage::create(JournalConfig {
        path: dir.path().join("journal"),
        create_if_missing: true,
        sync_interval: 1,
    })
    .unwrap();
    PostService::new(Arc::new(storage))
}

/// The same scenario must hold on every backend.
fn run_disable_scenario(service: &PostService) {
    let post = service.create_post("T", "B").unwrap();
    assert_eq!(post.id, PostId(1));
    assert!(!post.comments_disabled);

    let comment = service.create_comment(post.id, None, "hi").unwrap();
    assert_eq!(comment.id, CommentId(1));
    assert_eq!(comment.post_id, PostId(1));

    service.set_comments_disabled(post.id, true).unwrap();

    let result = service.create_comment(post.id, None, "again");
    assert!(matches!(result, Err(StoreError::CommentsDisabled(PostId(1)))));

    let post = service.post(post.id).unwrap();
    assert_eq!(post.comments.len(), 1);
    assert_eq!(post.comments[0].body, "hi");
}

// --- Realistic Workflow Tests ---

#[test]
fn test_disable_scenario_in_memory() {
    run_disable_scenario(&memory_service());
}

#[test]
fn test_disable_scenario_journal() {
    let dir = TempDir::new().unwrap();
    run_disable_scenario(&journal_service(&dir));
}

#[test]
fn test_threaded_discussion() {
    let service = memory_service();
    let post = service.create_post("Rust 2024", "What changed?").unwrap();

    let question = service
        .create_comment(post.id, None, "Anyone tried the new edition?")
        .unwrap();
    let answer = service
        .create_comment(post.id, Some(question.id), "Yes, migration was painless")
        .unwrap();
    let follow_up = service
        .create_comment(post.id, Some(answer.id), "Good to hear")
        .unwrap();

    let post = service.post(post.id).unwrap();
    let parents: Vec<Option<CommentId>> = post.comments.iter().map(|c| c.parent_id).collect();
    assert_eq!(parents, vec![None, Some(question.id), Some(answer.id)]);
    assert_eq!(post.comments[2].id, follow_up.id);
}

#[test]
fn test_comment_ids_are_global_across_posts() {
    let service = memory_service();
    let first = service.create_post("first", "").unwrap();
    let second = service.create_post("second", "").unwrap();

    let a = service.create_comment(first.id, None, "a").unwrap();
    let b = service.create_comment(second.id, None, "b").unwrap();
    let c = service.create_comment(first.id, None, "c").unwrap();

    assert_eq!((a.id, b.id, c.id), (CommentId(1), CommentId(2), CommentId(3)));
    assert_eq!(service.post(first.id).unwrap().comments.len(), 2);
    assert_eq!(service.post(second.id).unwrap().comments.len(), 1);
}

#[test]
fn test_posts_listing_includes_comments() {
    let service = memory_service();
    let post = service.create_post("T", "B").unwrap();
    service.create_comment(post.id, None, "one").unwrap();
    service.create_post("empty", "").unwrap();

    let posts = service.posts().unwrap();
    assert_eq!(posts.len(), 2);
    assert_eq!(posts[0].comments.len(), 1);
    assert!(posts[1].comments.is_empty());
}

// --- Live Subscriptions ---

#[test]
fn test_fan_out_then_unsubscribe() {
    let service = memory_service();
    let post = service.create_post("T", "B").unwrap();

    let a = service.subscribe_to_comments(post.id).unwrap();
    let b = service.subscribe_to_comments(post.id).unwrap();

    service.create_comment(post.id, None, "x").unwrap();
    assert_eq!(a.recv_timeout(Duration::from_secs(1)).unwrap().body, "x");
    assert_eq!(b.recv_timeout(Duration::from_secs(1)).unwrap().body, "x");

    service.unsubscribe(post.id, a.id);
    service.create_comment(post.id, None, "y").unwrap();

    assert_eq!(b.recv_timeout(Duration::from_secs(1)).unwrap().body, "y");
    assert!(a.recv_timeout(Duration::from_millis(50)).is_err());
}

#[test]
fn test_subscription_as_iterator_on_consumer_thread() {
    let service = memory_service();
    let post = service.create_post("T", "B").unwrap();
    let subscription = service.subscribe_to_comments(post.id).unwrap();
    let subscription_id = subscription.id;

    let consumer = std::thread::spawn(move || {
        subscription.take(3).map(|c| c.body).collect::<Vec<_>>()
    });

    for body in ["one", "two", "three"] {
        service.create_comment(post.id, None, body).unwrap();
    }

    assert_eq!(consumer.join().unwrap(), vec!["one", "two", "three"]);
    service.unsubscribe(post.id, subscription_id);
}

#[test]
fn test_subscriptions_on_journal_are_unsupported() {
    let dir = TempDir::new().unwrap();
    let service = journal_service(&dir);
    let post = service.create_post("T", "B").unwrap();

    assert!(!service.supports_subscriptions());
    let result = service.subscribe_to_comments(post.id);
    assert!(matches!(result, Err(StoreError::Unsupported(_))));

    // Writes keep working without a notifier
    service.create_comment(post.id, None, "hi").unwrap();
}

// --- Serialized Shape ---

#[test]
fn test_serialized_field_names() {
    let service = memory_service();
    let post = service.create_post("T", "B").unwrap();
    let top = service.create_comment(post.id, None, "top").unwrap();
    let reply = service.create_comment(post.id, Some(top.id), "reply").unwrap();

    let value = serde_json::to_value(service.post(post.id).unwrap()).unwrap();
    assert_eq!(value["id"], 1);
    assert_eq!(value["commentsDisabled"], false);
    assert!(value["createdAt"].is_i64());
    assert!(value["updatedAt"].is_i64());

    let comments = value["comments"].as_array().unwrap();
    assert_eq!(comments[0]["postId"], 1);
    assert!(comments[0].get("parentId").is_none());
    assert_eq!(comments[1]["parentId"], top.id.0);

    let decoded: post_comments::Comment = serde_json::from_value(comments[1].clone()).unwrap();
    assert_eq!(decoded, reply);
}
