#![forbid(unsafe_code)]

use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use fs2::FileExt;

/// Exclusive advisory lock on a lock file, held until drop.
///
/// Only serializes cooperating gemlikes processes; ledger files stay readable
/// and appendable by anything else.
#[derive(Debug)]
pub struct LedgerLock {
    path: PathBuf,
    file: File,
}

impl LedgerLock {
    /// Blocks until the lock is granted.
    pub fn acquire(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(path)?;
        file.lock_exclusive()?;
        tracing::trace!(path = %path.display(), "ledger lock acquired");
        Ok(Self {
            path: path.to_path_buf(),
            file,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for LedgerLock {
    fn drop(&mut self) {
        if let Err(err) = FileExt::unlock(&self.file) {
            tracing::warn!(path = %self.path.display(), "failed to release ledger lock: {err}");
        }
    }
}
