#![forbid(unsafe_code)]

use std::fmt;

use crate::common::validate_path_segment;
use crate::{ContractViolation, Validate};

/// Name of the per-document comment log. No client key may take this name.
pub const COMMENT_LOG_NAME: &str = "comments";

/// A document name as it appears in a request.
///
/// Shape only: a `DocId` is a bare filename. Whether it names exactly one file
/// under the content directories is the ledger store's call.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DocId(String);

impl DocId {
    pub fn new(id: impl Into<String>) -> Result<Self, ContractViolation> {
        let id = Self(id.into());
        id.validate()?;
        Ok(id)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Validate for DocId {
    fn validate(&self) -> Result<(), ContractViolation> {
        validate_path_segment("doc_id", &self.0)?;
        if self.0.contains('?') {
            return Err(ContractViolation::InvalidValue {
                field: "doc_id",
                reason: "must not contain a question mark",
            });
        }
        Ok(())
    }
}

impl fmt::Display for DocId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
