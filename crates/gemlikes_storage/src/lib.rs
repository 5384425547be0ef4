#![forbid(unsafe_code)]

pub mod ledger;
pub mod lock;
pub mod reverse_scan;

pub use ledger::{LedgerStore, StorageError};
pub use lock::LedgerLock;
pub use reverse_scan::ReverseLines;
