#![forbid(unsafe_code)]

pub mod anonymizer;
pub mod comments;
pub mod likes;
pub mod render;

use gemlikes_kernel_contracts::ContractViolation;
use gemlikes_storage::StorageError;
use thiserror::Error;

/// Failures that end a request. User-facing refusals are outcomes, not errors.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Anonymizer(#[from] anonymizer::AnonymizerError),
    #[error("contract violation: {0}")]
    Contract(#[from] ContractViolation),
    #[error("failed reading comment log: {0}")]
    CommentLog(#[from] std::io::Error),
}
