//! Durable storage backend replaying an append-only journal.

use crate::error::{Result, StoreError};
use crate::storage::Storage;
use crate::store::EntityTable;
use crate::types::{Comment, NewComment, NewPost, Post, PostId, Timestamp};
use fs2::FileExt;
use parking_lot::RwLock;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use tracing::info;

use super::log::{Journal, JournalEntry};

/// Name of the journal file inside the storage directory.
pub const JOURNAL_FILE: &str = "journal.log";

/// Name of the lock file inside the storage directory.
const LOCK_FILE: &str = "LOCK";

/// Journal storage configuration.
#[derive(Clone, Debug)]
pub struct JournalConfig {
    /// Directory holding the journal and its lock file.
    pub path: PathBuf,

    /// Whether to create the journal if it doesn't exist.
    pub create_if_missing: bool,

    /// fsync every N writes (0 or 1 = every write).
    pub sync_interval: u64,
}

impl Default for JournalConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("./post-comments"),
            create_if_missing: true,
            sync_interval: 1,
        }
    }
}

/// Post/comment storage that survives restarts.
///
/// Every write is journaled under the table's write lock before it is applied
/// in memory, so a failed append leaves both the file and the table as they
/// were. Reads are served from memory. This backend has no live
/// subscriptions.
pub struct JournalStorage {
    config: JournalConfig,

    /// Lock file for exclusive access.
    _lock_file: File,

    entities: RwLock<EntityTable>,

    journal: Journal,
}

impl JournalStorage {
    /// Open an existing journal or create a new one.
    pub fn open_or_create(config: JournalConfig) -> Result<Self> {
        if config.path.join(JOURNAL_FILE).exists() {
            Self::open(config)
        } else if config.create_if_missing {
            Self::create(config)
        } else {
            Err(StoreError::NotInitialized)
        }
    }

    /// Create a new, empty journal.
    pub fn create(config: JournalConfig) -> Result<Self> {
        fs::create_dir_all(&config.path)?;
        let lock_file = Self::acquire_lock(&config.path)?;

        let journal = Journal::create(config.path.join(JOURNAL_FILE), config.sync_interval)?;
        info!(path = %config.path.display(), "created post journal");

        Ok(Self {
            config,
            _lock_file: lock_file,
            entities: RwLock::new(EntityTable::new()),
            journal,
        })
    }

    /// Open an existing journal and rebuild the tables from it.
    pub fn open(config: JournalConfig) -> Result<Self> {
        let journal_path = config.path.join(JOURNAL_FILE);
        if !journal_path.exists() {
            return Err(StoreError::NotInitialized);
        }

        let lock_file = Self::acquire_lock(&config.path)?;
        let (journal, entries) = Journal::open(&journal_path, config.sync_interval)?;

        let mut table = EntityTable::new();
        let entry_count = entries.len();
        for entry in entries {
            Self::apply(&mut table, entry)?;
        }

        info!(
            path = %config.path.display(),
            entries = entry_count,
            posts = table.post_count(),
            comments = table.comment_count(),
            "replayed post journal"
        );

        Ok(Self {
            config,
            _lock_file: lock_file,
            entities: RwLock::new(table),
            journal,
        })
    }

    /// Force all journaled writes to disk.
    pub fn sync(&self) -> Result<()> {
        self.journal.sync()
    }

    /// Get the storage directory.
    pub fn path(&self) -> &Path {
        &self.config.path
    }

    /// Total number of comments across all posts.
    pub fn comment_count(&self) -> usize {
        self.entities.read().comment_count()
    }

    // --- Private Helpers ---

    fn apply(table: &mut EntityTable, entry: JournalEntry) -> Result<()> {
        match entry {
            JournalEntry::PostCreated {
                id,
                title,
                body,
                created_at,
            } => table.insert_post(id, title, body, created_at),
            JournalEntry::CommentCreated { comment } => table.insert_comment(comment),
            JournalEntry::CommentsToggled {
                post_id,
                disabled,
                updated_at,
            } => table
                .set_comments_disabled(post_id, disabled, updated_at)
                .map(|_| ()),
        }
    }

    fn acquire_lock(path: &Path) -> Result<File> {
        let lock_file = File::create(path.join(LOCK_FILE))?;

        lock_file
            .try_lock_exclusive()
            .map_err(|_| StoreError::Locked)?;

        Ok(lock_file)
    }
}

impl Storage for JournalStorage {
    /// Fails with `EntryTooLarge` when the post cannot fit in one journal
    /// entry; nothing is journaled or applied in that case.
    fn create_post(&self, input: NewPost) -> Result<Post> {
        let mut entities = self.entities.write();

        let id = entities.next_post_id();
        let now = Timestamp::now();
        self.journal.append(&JournalEntry::PostCreated {
            id,
            title: input.title.clone(),
            body: input.body.clone(),
            created_at: now,
        })?;

        Ok(entities.create_post(input, now))
    }

    fn get_posts(&self) -> Result<Vec<Post>> {
        Ok(self.entities.read().posts())
    }

    fn get_post(&self, id: PostId) -> Result<Post> {
        self.entities.read().post(id)
    }

    fn create_comment(&self, input: NewComment) -> Result<Comment> {
        input.validate()?;

        let mut entities = self.entities.write();
        entities.check_comment(&input)?;

        let now = Timestamp::now();
        let comment = Comment {
            id: entities.next_comment_id(),
            post_id: input.post_id,
            parent_id: input.parent_id,
            body: input.body,
            created_at: now,
            updated_at: now,
        };

        self.journal.append(&JournalEntry::CommentCreated {
            comment: comment.clone(),
        })?;
        entities.insert_comment(comment.clone())?;

        Ok(comment)
    }

    fn set_comments_disabled(&self, post_id: PostId, disabled: bool) -> Result<Post> {
        let mut entities = self.entities.write();
        if !entities.contains_post(post_id) {
            return Err(StoreError::PostNotFound(post_id));
        }

        let now = Timestamp::now();
        self.journal.append(&JournalEntry::CommentsToggled {
            post_id,
            disabled,
            updated_at: now,
        })?;

        entities.set_comments_disabled(post_id, disabled, now)
    }
}

impl Drop for JournalStorage {
    fn drop(&mut self) {
        // Best-effort sync on drop
        let _ = self.sync();
    }
}
