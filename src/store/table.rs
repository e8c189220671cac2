//! Canonical post and comment collections.
//!
//! The table itself is not synchronized; backends keep it behind a single
//! `RwLock` and run each check-then-mutate sequence under the write guard.

use crate::error::{Result, StoreError};
use crate::types::{Comment, CommentId, NewComment, NewPost, Post, PostId, Timestamp};
use std::collections::HashMap;

/// Stored form of a post. Comments are referenced by id; the comment
/// collection is the source of truth.
#[derive(Clone, Debug)]
struct PostRow {
    id: PostId,
    title: String,
    body: String,
    comment_ids: Vec<CommentId>,
    comments_disabled: bool,
    created_at: Timestamp,
    updated_at: Timestamp,
}

/// Posts and comments in creation order, indexed by id.
#[derive(Debug, Default)]
pub struct EntityTable {
    posts: Vec<PostRow>,
    comments: Vec<Comment>,
    post_index: HashMap<PostId, usize>,
    comment_index: HashMap<CommentId, usize>,
}

impl EntityTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Id the next created post will get.
    pub fn next_post_id(&self) -> PostId {
        PostId(self.posts.len() as u64 + 1)
    }

    /// Id the next created comment will get.
    pub fn next_comment_id(&self) -> CommentId {
        CommentId(self.comments.len() as u64 + 1)
    }

    pub fn post_count(&self) -> usize {
        self.posts.len()
    }

    pub fn comment_count(&self) -> usize {
        self.comments.len()
    }

    // --- Reads ---

    /// All posts with their comments, oldest first.
    pub fn posts(&self) -> Vec<Post> {
        self.posts.iter().map(|row| self.materialize(row)).collect()
    }

    pub fn post(&self, id: PostId) -> Result<Post> {
        self.post_row(id)
            .map(|row| self.materialize(row))
            .ok_or(StoreError::PostNotFound(id))
    }

    pub fn comment(&self, id: CommentId) -> Option<&Comment> {
        self.comment_index.get(&id).map(|&i| &self.comments[i])
    }

    pub fn contains_post(&self, id: PostId) -> bool {
        self.post_index.contains_key(&id)
    }

    // --- Writes ---

    /// Append a new post with the next id.
    pub fn create_post(&mut self, input: NewPost, now: Timestamp) -> Post {
        let row = PostRow {
            id: self.next_post_id(),
            title: input.title,
            body: input.body,
            comment_ids: Vec::new(),
            comments_disabled: false,
            created_at: now,
            updated_at: now,
        };
        let post = self.materialize(&row);
        self.push_post_row(row);
        post
    }

    /// Check that `input` may be appended right now.
    ///
    /// The post must exist with comments enabled, and a parent, if given,
    /// must be a comment on the same post.
    pub fn check_comment(&self, input: &NewComment) -> Result<()> {
        let post = self
            .post_row(input.post_id)
            .ok_or(StoreError::PostNotFound(input.post_id))?;

        if post.comments_disabled {
            return Err(StoreError::CommentsDisabled(input.post_id));
        }

        if let Some(parent) = input.parent_id {
            match self.comment(parent) {
                Some(c) if c.post_id == input.post_id => {}
                _ => return Err(StoreError::CommentNotFound(parent)),
            }
        }

        Ok(())
    }

    /// Check and append a new comment with the next id.
    pub fn create_comment(&mut self, input: NewComment, now: Timestamp) -> Result<Comment> {
        self.check_comment(&input)?;

        let comment = Comment {
            id: self.next_comment_id(),
            post_id: input.post_id,
            parent_id: input.parent_id,
            body: input.body,
            created_at: now,
            updated_at: now,
        };
        self.push_comment(comment.clone())?;
        Ok(comment)
    }

    /// Set the comments-disabled flag and refresh the update timestamp.
    pub fn set_comments_disabled(
        &mut self,
        post_id: PostId,
        disabled: bool,
        now: Timestamp,
    ) -> Result<Post> {
        let idx = *self
            .post_index
            .get(&post_id)
            .ok_or(StoreError::PostNotFound(post_id))?;

        let row = &mut self.posts[idx];
        row.comments_disabled = disabled;
        row.updated_at = now;

        Ok(self.materialize(&self.posts[idx]))
    }

    // --- Insert with known ids (journal) ---

    /// Insert a post whose id was assigned up front. It must be the next id.
    pub fn insert_post(
        &mut self,
        id: PostId,
        title: String,
        body: String,
        created_at: Timestamp,
    ) -> Result<()> {
        if id != self.next_post_id() {
            return Err(StoreError::Corruption(format!(
                "post {} out of order (expected {})",
                id,
                self.next_post_id()
            )));
        }
        self.push_post_row(PostRow {
            id,
            title,
            body,
            comment_ids: Vec::new(),
            comments_disabled: false,
            created_at,
            updated_at: created_at,
        });
        Ok(())
    }

    /// Insert a checked comment whose id was assigned up front. It must be the next id.
    pub fn insert_comment(&mut self, comment: Comment) -> Result<()> {
        if comment.id != self.next_comment_id() {
            return Err(StoreError::Corruption(format!(
                "comment {} out of order (expected {})",
                comment.id,
                self.next_comment_id()
            )));
        }
        self.push_comment(comment)
    }

    // --- Private Helpers ---

    fn post_row(&self, id: PostId) -> Option<&PostRow> {
        self.post_index.get(&id).map(|&i| &self.posts[i])
    }

    fn push_post_row(&mut self, row: PostRow) {
        self.post_index.insert(row.id, self.posts.len());
        self.posts.push(row);
    }

    fn push_comment(&mut self, comment: Comment) -> Result<()> {
        let post_idx = *self
            .post_index
            .get(&comment.post_id)
            .ok_or(StoreError::PostNotFound(comment.post_id))?;

        self.posts[post_idx].comment_ids.push(comment.id);
        self.comment_index.insert(comment.id, self.comments.len());
        self.comments.push(comment);
        Ok(())
    }

    fn materialize(&self, row: &PostRow) -> Post {
        Post {
            id: row.id,
            title: row.title.clone(),
            body: row.body.clone(),
            comments: row
                .comment_ids
                .iter()
                .filter_map(|id| self.comment(*id).cloned())
                .collect(),
            comments_disabled: row.comments_disabled,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}
