//! Property tests over random operation sequences.

use post_comments::{
    CommentId, InMemoryStorage, NewComment, NewPost, PostId, Storage, StoreError,
    SubscriptionCapable,
};
use proptest::prelude::*;
use std::collections::{HashMap, HashSet};

#[derive(Clone, Debug)]
enum Op {
    CreatePost,
    /// Comment on the n-th post (modulo post count), optionally replying to
    /// the m-th comment (modulo comment count).
    CreateComment { post: usize, reply_to: Option<usize> },
    Toggle { post: usize, disabled: bool },
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        1 => Just(Op::CreatePost),
        4 => (any::<usize>(), proptest::option::of(any::<usize>()))
            .prop_map(|(post, reply_to)| Op::CreateComment { post, reply_to }),
        1 => (any::<usize>(), any::<bool>()).prop_map(|(post, disabled)| Op::Toggle { post, disabled }),
    ]
}

proptest! {
    #[test]
    fn ids_unique_and_state_consistent(ops in proptest::collection::vec(op_strategy(), 1..80)) {
        let store = InMemoryStorage::new();
        let mut disabled: HashMap<PostId, bool> = HashMap::new();
        let mut comments: Vec<(CommentId, PostId)> = Vec::new();
        let mut post_ids = HashSet::new();
        let mut comment_ids = HashSet::new();

        for op in ops {
            match op {
                Op::CreatePost => {
                    let post = store.create_post(NewPost::new("t", "b")).unwrap();
                    prop_assert!(post_ids.insert(post.id));
                    disabled.insert(post.id, false);
                }
                Op::CreateComment { post, reply_to } => {
                    if disabled.is_empty() {
                        continue;
                    }
                    let post_id = PostId((post % disabled.len()) as u64 + 1);
                    let parent = match reply_to {
                        Some(n) if !comments.is_empty() => Some(comments[n % comments.len()]),
                        _ => None,
                    };
                    let mut input = NewComment::new(post_id, "c");
                    if let Some((parent_id, _)) = parent {
                        input = input.reply_to(parent_id);
                    }

                    let result = store.create_comment(input);
                    if disabled[&post_id] {
                        prop_assert!(matches!(result, Err(StoreError::CommentsDisabled(_))));
                    } else if matches!(parent, Some((_, parent_post)) if parent_post != post_id) {
                        prop_assert!(matches!(result, Err(StoreError::CommentNotFound(_))));
                    } else {
                        let comment = result.unwrap();
                        prop_assert!(comment_ids.insert(comment.id));
                        prop_assert_eq!(comment.post_id, post_id);
                        comments.push((comment.id, post_id));
                    }
                }
                Op::Toggle { post, disabled: flag } => {
                    if disabled.is_empty() {
                        continue;
                    }
                    let post_id = PostId((post % disabled.len()) as u64 + 1);
                    let updated = store.set_comments_disabled(post_id, flag).unwrap();
                    prop_assert_eq!(updated.comments_disabled, flag);
                    disabled.insert(post_id, flag);
                }
            }
        }

        // The post lists and the global comment collection agree
        let posts = store.get_posts().unwrap();
        let listed: usize = posts.iter().map(|p| p.comments.len()).sum();
        prop_assert_eq!(listed, comments.len());
        prop_assert_eq!(store.comment_count(), comments.len());
        for post in posts {
            prop_assert_eq!(post.comments_disabled, disabled[&post.id]);
        }
    }

    #[test]
    fn subscriber_sees_exactly_its_posts_comments_in_order(
        targets in proptest::collection::vec(0usize..3, 1..40)
    ) {
        let store = InMemoryStorage::new();
        for _ in 0..3 {
            store.create_post(NewPost::new("t", "b")).unwrap();
        }
        let watched = PostId(2);
        let subscription = store.subscribe(watched);

        let mut expected = Vec::new();
        for target in targets {
            let post_id = PostId(target as u64 + 1);
            let comment = store.create_comment(NewComment::new(post_id, "c")).unwrap();
            if post_id == watched {
                expected.push(comment.id);
            }
        }
        store.unsubscribe(watched, subscription.id);

        let received: Vec<CommentId> = subscription.map(|c| c.id).collect();
        prop_assert_eq!(received, expected);
    }
}
