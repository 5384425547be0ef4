#![forbid(unsafe_code)]

use crate::ReasonCodeId;

/// Exactly one of these is produced per request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerResponse {
    Success(String),
    /// The caller must re-invoke with user-supplied text.
    InputRequested(String),
    Refuse(LedgerRefuse),
}

impl LedgerResponse {
    pub fn refuse(reason_code: ReasonCodeId, message: impl Into<String>) -> Self {
        LedgerResponse::Refuse(LedgerRefuse {
            reason_code,
            message: message.into(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerRefuse {
    pub reason_code: ReasonCodeId,
    pub message: String,
}
