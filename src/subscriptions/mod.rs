//! Live comment subscriptions.
//!
//! Each post has its own set of subscribers. Creating a comment pushes it
//! to every subscriber of that post:
//! - Delivery is non-blocking; a full subscriber buffer skips the comment
//! - Each subscriber sees comments in creation order
//! - Unsubscribing closes the subscriber's channel
//!
//! # Example
//!
//! ```ignore
//! let notifier = CommentNotifier::new();
//! let subscription = notifier.subscribe(PostId(1));
//!
//! // elsewhere: notifier.notify(&comment);
//!
//! for comment in subscription {
//!     println!("new comment: {}", comment.body);
//! }
//! ```

mod manager;
mod types;

pub use manager::CommentNotifier;
pub use types::{CommentSubscription, NotifierConfig, SubscriptionId, DEFAULT_BUFFER_SIZE};
