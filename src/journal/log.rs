//! Append-only journal file.
//!
//! Layout: a 5-byte header (magic + version) followed by entries framed as
//! `len: u32 LE | MessagePack body | crc32: u32 LE`.

use crate::error::{Result, StoreError};
use crate::types::{Comment, PostId, Timestamp};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{self, BufRead, BufReader, ErrorKind, Read, Write};
use std::path::Path;
use tracing::warn;

/// Magic bytes for the journal file.
const JOURNAL_MAGIC: &[u8; 4] = b"PCJ\0";

/// Current journal format version.
const JOURNAL_VERSION: u8 = 1;

const HEADER_SIZE: u64 = 5;

/// Upper bound on a single encoded entry, enforced on both append and read.
pub const MAX_ENTRY_SIZE: usize = 16 * 1024 * 1024;

/// A single state change, in the order it was applied.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum JournalEntry {
    PostCreated {
        id: PostId,
        title: String,
        body: String,
        created_at: Timestamp,
    },
    CommentCreated {
        comment: Comment,
    },
    CommentsToggled {
        post_id: PostId,
        disabled: bool,
        updated_at: Timestamp,
    },
}

/// Where frames end up. Opened in append mode, so truncating moves the
/// write position back as well.
trait Sink: Write + Send {
    fn truncate(&mut self, len: u64) -> io::Result<()>;
    fn sync(&mut self) -> io::Result<()>;
}

impl Sink for File {
    fn truncate(&mut self, len: u64) -> io::Result<()> {
        self.set_len(len)
    }

    fn sync(&mut self) -> io::Result<()> {
        self.sync_all()
    }
}

struct Writer {
    sink: Box<dyn Sink>,
    /// End of the last complete frame.
    end: u64,
    writes_since_sync: u64,
    /// Set when a failed append could not be rolled back.
    poisoned: Option<String>,
}

impl Writer {
    fn write_frame(&mut self, frame: &[u8], sync_interval: u64) -> io::Result<()> {
        self.sink.write_all(frame)?;
        self.sink.flush()?;

        if self.writes_since_sync + 1 >= sync_interval {
            self.sink.sync()?;
            self.writes_since_sync = 0;
        } else {
            self.writes_since_sync += 1;
        }

        self.end += frame.len() as u64;
        Ok(())
    }
}

/// Journal writer.
///
/// An append either lands as a whole frame or leaves the file as it was:
/// on any write or sync error the file is cut back to the end of the last
/// complete frame. If even that fails, the journal refuses further appends.
pub struct Journal {
    writer: Mutex<Writer>,
    /// Sync every N appends.
    sync_interval: u64,
}

impl Journal {
    /// Create a new, empty journal. Fails if the file already exists.
    pub fn create(path: impl AsRef<Path>, sync_interval: u64) -> Result<Self> {
        let mut file = OpenOptions::new()
            .append(true)
            .create_new(true)
            .open(path.as_ref())?;

        file.write_all(JOURNAL_MAGIC)?;
        file.write_all(&[JOURNAL_VERSION])?;
        file.sync_all()?;

        Ok(Self::with_sink(Box::new(file), HEADER_SIZE, sync_interval))
    }

    /// Open an existing journal and read back every entry.
    ///
    /// An incomplete entry at the end of the file (a write cut short by a
    /// crash) is truncated away. Damage anywhere else is an error.
    pub fn open(path: impl AsRef<Path>, sync_interval: u64) -> Result<(Self, Vec<JournalEntry>)> {
        let path = path.as_ref();

        let file = OpenOptions::new().read(true).write(true).open(path)?;
        let mut reader = BufReader::new(file);

        let mut magic = [0u8; 4];
        reader.read_exact(&mut magic)?;
        if &magic != JOURNAL_MAGIC {
            return Err(StoreError::InvalidFormat("Invalid journal magic".into()));
        }

        let mut version = [0u8; 1];
        reader.read_exact(&mut version)?;
        if version[0] != JOURNAL_VERSION {
            return Err(StoreError::InvalidFormat(format!(
                "Unsupported journal version: {}",
                version[0]
            )));
        }

        let mut entries = Vec::new();
        let mut good_offset = HEADER_SIZE;
        let mut torn = false;

        loop {
            match Self::read_entry(&mut reader) {
                Ok(Some((entry, size))) => {
                    entries.push(entry);
                    good_offset += size;
                }
                Ok(None) => break,
                Err(StoreError::Io(e)) if e.kind() == ErrorKind::UnexpectedEof => {
                    torn = true;
                    break;
                }
                Err(e) => return Err(e),
            }
        }

        let file = reader.into_inner();
        if torn {
            warn!(
                path = %path.display(),
                offset = good_offset,
                "truncating incomplete journal entry"
            );
            file.set_len(good_offset)?;
            file.sync_all()?;
        }
        drop(file);

        let file = OpenOptions::new().append(true).open(path)?;
        Ok((
            Self::with_sink(Box::new(file), good_offset, sync_interval),
            entries,
        ))
    }

    fn with_sink(sink: Box<dyn Sink>, end: u64, sync_interval: u64) -> Self {
        Self {
            writer: Mutex::new(Writer {
                sink,
                end,
                writes_since_sync: 0,
                poisoned: None,
            }),
            sync_interval: sync_interval.max(1),
        }
    }

    /// Append an entry. Returns once the bytes reach the OS; an fsync
    /// follows every `sync_interval` appends.
    ///
    /// Entries larger than [`MAX_ENTRY_SIZE`] are rejected before anything
    /// is written.
    pub fn append(&self, entry: &JournalEntry) -> Result<()> {
        let frame = Self::encode_frame(entry)?;

        let mut writer = self.writer.lock();
        if let Some(reason) = &writer.poisoned {
            return Err(StoreError::Poisoned(reason.clone()));
        }

        let start = writer.end;
        if let Err(e) = writer.write_frame(&frame, self.sync_interval) {
            match writer.sink.truncate(start) {
                Ok(()) => warn!(offset = start, error = %e, "rolled back failed journal append"),
                Err(rollback) => {
                    warn!(offset = start, error = %rollback, "journal rollback failed");
                    writer.poisoned = Some(rollback.to_string());
                }
            }
            return Err(e.into());
        }

        Ok(())
    }

    /// Force pending writes to disk.
    pub fn sync(&self) -> Result<()> {
        let mut writer = self.writer.lock();
        writer.sink.flush()?;
        writer.sink.sync()?;
        writer.writes_since_sync = 0;
        Ok(())
    }

    /// Frame an entry as `len | body | crc32`.
    fn encode_frame(entry: &JournalEntry) -> Result<Vec<u8>> {
        // Named encoding: `Comment` skips an absent parent id.
        let encoded = rmp_serde::to_vec_named(entry)?;

        let too_large = || StoreError::EntryTooLarge {
            size: encoded.len(),
            max: MAX_ENTRY_SIZE,
        };
        if encoded.len() > MAX_ENTRY_SIZE {
            return Err(too_large());
        }
        let len = u32::try_from(encoded.len()).map_err(|_| too_large())?;

        let mut frame = Vec::with_capacity(encoded.len() + 8);
        frame.extend_from_slice(&len.to_le_bytes());
        frame.extend_from_slice(&encoded);
        frame.extend_from_slice(&crc32fast::hash(&encoded).to_le_bytes());
        Ok(frame)
    }

    /// Read one entry. `Ok(None)` at a clean end of file.
    fn read_entry(reader: &mut BufReader<File>) -> Result<Option<(JournalEntry, u64)>> {
        if reader.fill_buf()?.is_empty() {
            return Ok(None);
        }

        let mut len_bytes = [0u8; 4];
        reader.read_exact(&mut len_bytes)?;
        let len = u32::from_le_bytes(len_bytes) as usize;

        if len > MAX_ENTRY_SIZE {
            return Err(StoreError::Corruption(format!(
                "journal entry too large: {} bytes",
                len
            )));
        }

        let mut encoded = vec![0u8; len];
        reader.read_exact(&mut encoded)?;

        let mut checksum_bytes = [0u8; 4];
        reader.read_exact(&mut checksum_bytes)?;
        let stored_checksum = u32::from_le_bytes(checksum_bytes);
        let computed_checksum = crc32fast::hash(&encoded);

        if stored_checksum != computed_checksum {
            return Err(StoreError::ChecksumMismatch {
                expected: stored_checksum,
                got: computed_checksum,
            });
        }

        let entry = rmp_serde::from_slice(&encoded)?;
        Ok(Some((entry, 4 + len as u64 + 4)))
    }
}
