#![forbid(unsafe_code)]

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use gemlikes_kernel_contracts::comment::CommentRecord;
use gemlikes_kernel_contracts::document::{DocId, COMMENT_LOG_NAME};
use gemlikes_kernel_contracts::identity::ClientKey;
use thiserror::Error;

use crate::lock::LedgerLock;
use crate::reverse_scan::ReverseLines;

const LIKES_DIR: &str = "likes";
const COMMENTS_DIR: &str = "comments";
const TMP_DIR: &str = "tmp";
const LOCKS_DIR: &str = "locks";
const SALT_FILE: &str = "ip_salt";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("{context} '{}': {source}", .path.display())]
    Io {
        context: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl StorageError {
    fn io(context: &'static str, path: &Path, source: io::Error) -> Self {
        StorageError::Io {
            context,
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Filesystem-backed ledger rooted at one data directory.
///
/// Every path the ledger uses is derived here; callers hand in typed keys and
/// never build paths themselves. No state is cached between calls.
#[derive(Debug, Clone)]
pub struct LedgerStore {
    data_root: PathBuf,
    content_dirs: Vec<PathBuf>,
}

impl LedgerStore {
    pub fn new(data_root: impl Into<PathBuf>, content_dirs: Vec<PathBuf>) -> Self {
        Self {
            data_root: data_root.into(),
            content_dirs,
        }
    }

    pub fn data_root(&self) -> &Path {
        &self.data_root
    }

    /// Creates the record-family directories. Safe to call on every request.
    pub fn bootstrap(&self) -> Result<(), StorageError> {
        let locks = self.data_root.join(LOCKS_DIR);
        let dirs = [
            self.data_root.join(LIKES_DIR),
            self.data_root.join(COMMENTS_DIR),
            self.data_root.join(TMP_DIR),
            locks.join(LIKES_DIR),
            locks.join(COMMENTS_DIR),
        ];
        for path in dirs {
            fs::create_dir_all(&path)
                .map_err(|e| StorageError::io("failed to create ledger directory", &path, e))?;
        }
        Ok(())
    }

    /// Shape-checks `raw` and confirms it names exactly one content file.
    ///
    /// Zero matches and several matches both resolve to `None`.
    pub fn resolve_document(&self, raw: &str) -> Option<DocId> {
        let doc = DocId::new(raw).ok()?;
        let found = self
            .content_dirs
            .iter()
            .filter(|dir| dir.join(doc.as_str()).exists())
            .count();
        (found == 1).then_some(doc)
    }

    pub fn document_exists(&self, raw: &str) -> bool {
        self.resolve_document(raw).is_some()
    }

    pub fn salt_path(&self) -> PathBuf {
        self.data_root.join(SALT_FILE)
    }

    pub fn likes_path(&self, doc: &DocId) -> PathBuf {
        self.data_root.join(LIKES_DIR).join(doc.as_str())
    }

    pub fn comment_dir(&self, doc: &DocId) -> PathBuf {
        self.data_root.join(COMMENTS_DIR).join(doc.as_str())
    }

    pub fn comment_log_path(&self, doc: &DocId) -> PathBuf {
        self.comment_dir(doc).join(COMMENT_LOG_NAME)
    }

    pub fn usernames_path(&self, doc: &DocId, key: &ClientKey) -> PathBuf {
        self.comment_dir(doc).join(key.as_str())
    }

    pub fn session_path(&self, key: &ClientKey) -> PathBuf {
        self.data_root.join(TMP_DIR).join(key.as_str())
    }

    /// `locks/<family>/<doc>`. The lock file carries the bare document name so
    /// any name the content directories can hold is lockable.
    fn lock_path(&self, family: &str, doc: &DocId) -> PathBuf {
        self.data_root.join(LOCKS_DIR).join(family).join(doc.as_str())
    }

    // ---- likes ----

    pub fn has_like(&self, doc: &DocId, key: &ClientKey) -> Result<bool, StorageError> {
        lines_contain(&self.likes_path(doc), key.as_str())
    }

    pub fn append_like(&self, doc: &DocId, key: &ClientKey) -> Result<(), StorageError> {
        append_line(&self.likes_path(doc), key.as_str())
    }

    pub fn count_likes(&self, doc: &DocId) -> Result<u64, StorageError> {
        count_lines(&self.likes_path(doc))
    }

    pub fn lock_likes(&self, doc: &DocId) -> Result<LedgerLock, StorageError> {
        let path = self.lock_path(LIKES_DIR, doc);
        LedgerLock::acquire(&path).map_err(|e| StorageError::io("failed to lock likes", &path, e))
    }

    // ---- username claims and comment log ----

    pub fn count_username_claims(
        &self,
        doc: &DocId,
        key: &ClientKey,
    ) -> Result<u64, StorageError> {
        count_lines(&self.usernames_path(doc, key))
    }

    /// True if any identity other than `key` has claimed `username` on `doc`.
    ///
    /// The comment log shares the directory and is skipped, as is anything
    /// that is not a regular file.
    pub fn username_claimed_by_other(
        &self,
        doc: &DocId,
        key: &ClientKey,
        username: &str,
    ) -> Result<bool, StorageError> {
        let dir = self.comment_dir(doc);
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(false),
            Err(e) => return Err(StorageError::io("failed to list comment directory", &dir, e)),
        };
        for entry in entries {
            let entry =
                entry.map_err(|e| StorageError::io("failed to list comment directory", &dir, e))?;
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            if name == key.as_str() || name == COMMENT_LOG_NAME {
                continue;
            }
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            if lines_contain(&path, username)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    pub fn append_username_claim(
        &self,
        doc: &DocId,
        key: &ClientKey,
        username: &str,
    ) -> Result<(), StorageError> {
        self.ensure_comment_dir(doc)?;
        append_line(&self.usernames_path(doc, key), username)
    }

    /// Writes the record's four lines with a single append.
    pub fn append_comment_record(
        &self,
        doc: &DocId,
        record: &CommentRecord,
    ) -> Result<(), StorageError> {
        self.ensure_comment_dir(doc)?;
        let mut block = String::new();
        for line in record.log_lines() {
            block.push_str(line);
            block.push('\n');
        }
        let path = self.comment_log_path(doc);
        append_raw(&path, block.as_bytes())
    }

    /// Reverse scanner over the comment log, or `None` if nobody has commented yet.
    pub fn scan_comment_log_reverse(
        &self,
        doc: &DocId,
    ) -> Result<Option<ReverseLines<File>>, StorageError> {
        let path = self.comment_log_path(doc);
        let file = match File::open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StorageError::io("failed to open comment log", &path, e)),
        };
        ReverseLines::new(file)
            .map(Some)
            .map_err(|e| StorageError::io("failed to scan comment log", &path, e))
    }

    pub fn lock_comments(&self, doc: &DocId) -> Result<LedgerLock, StorageError> {
        let path = self.lock_path(COMMENTS_DIR, doc);
        LedgerLock::acquire(&path)
            .map_err(|e| StorageError::io("failed to lock comments", &path, e))
    }

    fn ensure_comment_dir(&self, doc: &DocId) -> Result<(), StorageError> {
        let dir = self.comment_dir(doc);
        fs::create_dir_all(&dir)
            .map_err(|e| StorageError::io("failed to create comment directory", &dir, e))
    }

    // ---- pending sessions ----

    /// Records that `key` intends to comment on `doc`, replacing any earlier intent.
    pub fn put_pending_session(&self, key: &ClientKey, doc: &DocId) -> Result<(), StorageError> {
        let path = self.session_path(key);
        fs::write(&path, doc.as_str())
            .map_err(|e| StorageError::io("failed to store pending session", &path, e))
    }

    pub fn has_pending_session(&self, key: &ClientKey) -> bool {
        self.session_path(key).is_file()
    }

    /// Removes and returns the pending session for `key`.
    ///
    /// The slot is renamed away before it is read, so once this returns (or
    /// the process dies after the rename) the session can never be seen again.
    /// The returned text is raw and must be re-validated by the caller.
    pub fn take_pending_session(&self, key: &ClientKey) -> Result<Option<String>, StorageError> {
        let path = self.session_path(key);
        let claimed = self
            .data_root
            .join(TMP_DIR)
            .join(format!(".taken-{}-{}", key.as_str(), std::process::id()));
        match fs::rename(&path, &claimed) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(StorageError::io("failed to claim pending session", &path, e));
            }
        }
        let read = fs::read(&claimed);
        if let Err(e) = fs::remove_file(&claimed) {
            tracing::warn!(path = %claimed.display(), "failed to remove taken session: {e}");
        }
        let bytes =
            read.map_err(|e| StorageError::io("failed to read pending session", &claimed, e))?;
        Ok(Some(String::from_utf8_lossy(&bytes).into_owned()))
    }
}

/// Appends `line` plus a newline, creating the file if needed.
pub fn append_line(path: &Path, line: &str) -> Result<(), StorageError> {
    let mut buf = Vec::with_capacity(line.len() + 1);
    buf.extend_from_slice(line.as_bytes());
    buf.push(b'\n');
    append_raw(path, &buf)
}

fn append_raw(path: &Path, bytes: &[u8]) -> Result<(), StorageError> {
    let mut file = OpenOptions::new()
        .append(true)
        .create(true)
        .open(path)
        .map_err(|e| StorageError::io("failed to open ledger file for append", path, e))?;
    file.write_all(bytes)
        .map_err(|e| StorageError::io("failed to append to ledger file", path, e))
}

/// Number of lines in `path`; a final line without a newline still counts.
/// A missing file has zero lines.
pub fn count_lines(path: &Path) -> Result<u64, StorageError> {
    let Some(mut reader) = open_for_scan(path)? else {
        return Ok(0);
    };
    let mut count = 0u64;
    let mut buf = Vec::new();
    loop {
        buf.clear();
        let n = reader
            .read_until(b'\n', &mut buf)
            .map_err(|e| StorageError::io("failed to read ledger file", path, e))?;
        if n == 0 {
            return Ok(count);
        }
        count += 1;
    }
}

/// True if any line of `path`, trimmed, equals `value`. A missing file contains nothing.
pub fn lines_contain(path: &Path, value: &str) -> Result<bool, StorageError> {
    let Some(mut reader) = open_for_scan(path)? else {
        return Ok(false);
    };
    let mut buf = Vec::new();
    loop {
        buf.clear();
        let n = reader
            .read_until(b'\n', &mut buf)
            .map_err(|e| StorageError::io("failed to read ledger file", path, e))?;
        if n == 0 {
            return Ok(false);
        }
        if String::from_utf8_lossy(&buf).trim() == value {
            return Ok(true);
        }
    }
}

fn open_for_scan(path: &Path) -> Result<Option<BufReader<File>>, StorageError> {
    match File::open(path) {
        Ok(file) => Ok(Some(BufReader::new(file))),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(StorageError::io("failed to open ledger file", path, e)),
    }
}
