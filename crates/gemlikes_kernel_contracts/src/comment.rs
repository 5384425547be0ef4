#![forbid(unsafe_code)]

use crate::identity::PseudoId;
use crate::{ContractViolation, Validate};

/// Shortest accepted submission: one-char name, a space, one-char body.
pub const MIN_SUBMISSION_CHARS: usize = 3;
pub const MAX_USERNAME_CHARS: usize = 40;
pub const MAX_BODY_BYTES: usize = 2000;
/// Lines per comment record in the comment log.
pub const COMMENT_RECORD_LINES: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Username(String);

impl Username {
    pub fn new(name: impl Into<String>) -> Result<Self, ContractViolation> {
        let name = Self(name.into());
        name.validate()?;
        Ok(name)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Validate for Username {
    fn validate(&self) -> Result<(), ContractViolation> {
        let chars = self.0.chars().count();
        if chars == 0 {
            return Err(ContractViolation::InvalidValue {
                field: "username",
                reason: "must not be empty",
            });
        }
        if chars > MAX_USERNAME_CHARS {
            return Err(ContractViolation::TooLong {
                field: "username",
                max: MAX_USERNAME_CHARS,
                got: chars,
            });
        }
        if self.0.contains(['?', '%', ' ']) {
            return Err(ContractViolation::InvalidValue {
                field: "username",
                reason: "must not contain '?', '%' or spaces",
            });
        }
        if self.0.contains(['\r', '\n']) {
            return Err(ContractViolation::InvalidValue {
                field: "username",
                reason: "must not contain line breaks",
            });
        }
        Ok(())
    }
}

/// Comment text, already trimmed and flattened onto one line.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CommentBody(String);

impl CommentBody {
    /// Flattens line breaks to single spaces, then validates.
    pub fn from_submitted(text: &str) -> Result<Self, ContractViolation> {
        let flattened = text.replace("\r\n", " ").replace('\n', " ");
        let body = Self(flattened);
        body.validate()?;
        Ok(body)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Validate for CommentBody {
    fn validate(&self) -> Result<(), ContractViolation> {
        if self.0.trim().is_empty() {
            return Err(ContractViolation::InvalidValue {
                field: "comment_body",
                reason: "must not be empty",
            });
        }
        if self.0.len() > MAX_BODY_BYTES {
            return Err(ContractViolation::TooLong {
                field: "comment_body",
                max: MAX_BODY_BYTES,
                got: self.0.len(),
            });
        }
        if self.0.contains('\n') {
            return Err(ContractViolation::InvalidValue {
                field: "comment_body",
                reason: "must not contain line feeds",
            });
        }
        Ok(())
    }
}

/// One entry of a document's comment log, in on-disk field order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentRecord {
    pub username: String,
    pub pseudo_id: String,
    pub timestamp: String,
    pub body: String,
}

impl CommentRecord {
    pub fn v1(
        username: &Username,
        pseudo_id: &PseudoId,
        timestamp: String,
        body: &CommentBody,
    ) -> Result<Self, ContractViolation> {
        let record = Self {
            username: username.as_str().to_string(),
            pseudo_id: pseudo_id.as_str().to_string(),
            timestamp,
            body: body.as_str().to_string(),
        };
        record.validate()?;
        Ok(record)
    }

    /// The four log lines, oldest field first.
    pub fn log_lines(&self) -> [&str; COMMENT_RECORD_LINES] {
        [
            self.username.as_str(),
            self.pseudo_id.as_str(),
            self.timestamp.as_str(),
            self.body.as_str(),
        ]
    }
}

impl Validate for CommentRecord {
    fn validate(&self) -> Result<(), ContractViolation> {
        if self.timestamp.trim().is_empty() {
            return Err(ContractViolation::InvalidValue {
                field: "comment_record.timestamp",
                reason: "must not be empty",
            });
        }
        for line in self.log_lines() {
            if line.contains('\n') {
                return Err(ContractViolation::InvalidValue {
                    field: "comment_record",
                    reason: "fields must be single-line",
                });
            }
        }
        Ok(())
    }
}
