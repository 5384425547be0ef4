#![forbid(unsafe_code)]

use chrono::{DateTime, SubsecRound, Utc};
use gemlikes_kernel_contracts::comment::{
    CommentBody, CommentRecord, Username, MAX_BODY_BYTES, MAX_USERNAME_CHARS,
    MIN_SUBMISSION_CHARS,
};
use gemlikes_kernel_contracts::document::DocId;
use gemlikes_kernel_contracts::identity::{ClientAddress, ClientKey};
use gemlikes_kernel_contracts::ReasonCodeId;
use gemlikes_storage::LedgerStore;
use thiserror::Error;

use crate::anonymizer::Anonymizer;
use crate::EngineError;

pub mod reason_codes {
    use gemlikes_kernel_contracts::ReasonCodeId;

    pub const COMMENT_OK_INPUT_REQUESTED: ReasonCodeId = ReasonCodeId(0x434D_0001);
    pub const COMMENT_OK_ADDED: ReasonCodeId = ReasonCodeId(0x434D_0002);

    pub const COMMENT_FAIL_DOCUMENT_INVALID: ReasonCodeId = ReasonCodeId(0x434D_00F1);
    pub const COMMENT_FAIL_QUOTA_EXCEEDED: ReasonCodeId = ReasonCodeId(0x434D_00F2);
    pub const COMMENT_FAIL_NAME_TAKEN: ReasonCodeId = ReasonCodeId(0x434D_00F3);
    pub const COMMENT_FAIL_INPUT_MALFORMED: ReasonCodeId = ReasonCodeId(0x434D_00F4);
    pub const COMMENT_FAIL_SESSION_MISSING: ReasonCodeId = ReasonCodeId(0x434D_00F5);
}

pub const INPUT_PROMPT: &str = "Enter your username, a space, and your comment:";

/// RFC 1123 layout with a literal `UTC` zone.
const TIMESTAMP_FORMAT: &str = "%a, %d %b %Y %H:%M:%S UTC";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommentConfig {
    /// Comments one identity may leave per document. Zero disables comments.
    pub max_comments: u32,
}

impl CommentConfig {
    pub fn mvp_v1() -> Self {
        Self { max_comments: 5 }
    }

    pub fn comments_enabled(&self) -> bool {
        self.max_comments > 0
    }
}

/// Why a comment request was turned away. The display text is shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommentRefusal {
    #[error("File not valid for commenting.")]
    DocumentInvalid,
    #[error("Comments have been disabled.")]
    CommentsDisabled,
    #[error("You have already commented {max} times on this file.")]
    QuotaExceeded { max: u32 },
    #[error("File not known")]
    SessionMissing,
    #[error("Stored filename is invalid")]
    StoredDocumentInvalid,
    #[error("Your input was too short.")]
    TooShort,
    #[error("No username found. Your username should be the first part of your input, followed by a space, and then your comment text.")]
    NoUsername,
    #[error("Your username is invalid. It must be <= 40 characters and > 0.")]
    UsernameLength,
    #[error("Your username must not contain a question mark, a percent sign, or any spaces.")]
    UsernameChars,
    #[error("Comment must be under 2000 bytes.")]
    BodyTooLong,
    #[error("Your comment was empty, it was not added.")]
    BodyEmpty,
    #[error("A different IP address has already used that username on this article.")]
    NameTaken,
}

impl CommentRefusal {
    pub fn reason_code(&self) -> ReasonCodeId {
        match self {
            CommentRefusal::DocumentInvalid => reason_codes::COMMENT_FAIL_DOCUMENT_INVALID,
            CommentRefusal::CommentsDisabled | CommentRefusal::QuotaExceeded { .. } => {
                reason_codes::COMMENT_FAIL_QUOTA_EXCEEDED
            }
            CommentRefusal::SessionMissing | CommentRefusal::StoredDocumentInvalid => {
                reason_codes::COMMENT_FAIL_SESSION_MISSING
            }
            CommentRefusal::NameTaken => reason_codes::COMMENT_FAIL_NAME_TAKEN,
            CommentRefusal::TooShort
            | CommentRefusal::NoUsername
            | CommentRefusal::UsernameLength
            | CommentRefusal::UsernameChars
            | CommentRefusal::BodyTooLong
            | CommentRefusal::BodyEmpty => reason_codes::COMMENT_FAIL_INPUT_MALFORMED,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommentOutcome {
    /// A session is open for `doc`; the caller must prompt for input.
    AwaitingInput { doc: DocId, remaining: u64 },
    Added { doc: DocId, record: CommentRecord },
    Refused(CommentRefusal),
}

impl CommentOutcome {
    pub fn reason_code(&self) -> ReasonCodeId {
        match self {
            CommentOutcome::AwaitingInput { .. } => reason_codes::COMMENT_OK_INPUT_REQUESTED,
            CommentOutcome::Added { .. } => reason_codes::COMMENT_OK_ADDED,
            CommentOutcome::Refused(r) => r.reason_code(),
        }
    }
}

/// Splits a trimmed submission into username and raw body.
///
/// The body is returned trimmed but not yet flattened.
pub fn parse_submission(input: &str) -> Result<(Username, &str), CommentRefusal> {
    let input = input.trim();
    if input.chars().count() < MIN_SUBMISSION_CHARS {
        return Err(CommentRefusal::TooShort);
    }
    let Some((name, rest)) = input.split_once(' ') else {
        return Err(CommentRefusal::NoUsername);
    };
    let name = name.trim();
    let name_chars = name.chars().count();
    if name_chars == 0 || name_chars > MAX_USERNAME_CHARS {
        return Err(CommentRefusal::UsernameLength);
    }
    let username = Username::new(name).map_err(|_| CommentRefusal::UsernameChars)?;
    let body = rest.trim();
    if body.len() > MAX_BODY_BYTES {
        return Err(CommentRefusal::BodyTooLong);
    }
    if body.is_empty() {
        return Err(CommentRefusal::BodyEmpty);
    }
    Ok((username, body))
}

pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.round_subsecs(0).format(TIMESTAMP_FORMAT).to_string()
}

/// Two-request comment protocol: open a session on a document, then submit
/// `username body` text against it.
#[derive(Debug, Clone)]
pub struct CommentSessionRuntime<'a> {
    store: &'a LedgerStore,
    anonymizer: &'a Anonymizer,
    config: CommentConfig,
}

impl<'a> CommentSessionRuntime<'a> {
    pub fn new(store: &'a LedgerStore, anonymizer: &'a Anonymizer, config: CommentConfig) -> Self {
        Self {
            store,
            anonymizer,
            config,
        }
    }

    /// Single-payload entry point used over CGI.
    ///
    /// A payload naming an existing document always opens a new session, even
    /// while another is pending. Anything else is treated as a submission.
    pub fn handle(&self, payload: &str, addr: &ClientAddress) -> Result<CommentOutcome, EngineError> {
        if self.store.document_exists(payload) {
            self.begin(payload, addr)
        } else {
            self.submit(payload, addr)
        }
    }

    /// Opens (or replaces) the caller's pending session on `raw_doc`.
    pub fn begin(&self, raw_doc: &str, addr: &ClientAddress) -> Result<CommentOutcome, EngineError> {
        let Some(doc) = self.store.resolve_document(raw_doc) else {
            return Ok(refused(CommentRefusal::DocumentInvalid));
        };
        let key = self.anonymizer.client_key(addr);
        let remaining = match self.remaining(&doc, &key)? {
            Ok(n) => n,
            Err(refusal) => return Ok(refused(refusal)),
        };
        self.store.put_pending_session(&key, &doc)?;
        tracing::debug!(doc = %doc, remaining, "comment session opened");
        Ok(CommentOutcome::AwaitingInput { doc, remaining })
    }

    pub fn submit(&self, input: &str, addr: &ClientAddress) -> Result<CommentOutcome, EngineError> {
        self.submit_at(input, addr, Utc::now())
    }

    /// Consumes the pending session and, if the input passes every check,
    /// records the comment stamped with `now`.
    pub fn submit_at(
        &self,
        input: &str,
        addr: &ClientAddress,
        now: DateTime<Utc>,
    ) -> Result<CommentOutcome, EngineError> {
        let key = self.anonymizer.client_key(addr);
        let Some(stored) = self.store.take_pending_session(&key)? else {
            return Ok(refused(CommentRefusal::SessionMissing));
        };
        let Some(doc) = self.store.resolve_document(&stored) else {
            return Ok(refused(CommentRefusal::StoredDocumentInvalid));
        };
        tracing::debug!(doc = %doc, "comment session taken");

        let (username, raw_body) = match parse_submission(input) {
            Ok(parsed) => parsed,
            Err(refusal) => return Ok(refused(refusal)),
        };
        let body = CommentBody::from_submitted(raw_body)?;

        let _guard = self.store.lock_comments(&doc)?;
        if let Err(refusal) = self.remaining(&doc, &key)? {
            return Ok(refused(refusal));
        }
        if self
            .store
            .username_claimed_by_other(&doc, &key, username.as_str())?
        {
            return Ok(refused(CommentRefusal::NameTaken));
        }

        let pseudo_id = self.anonymizer.pseudo_id(addr)?;
        let record = CommentRecord::v1(&username, &pseudo_id, format_timestamp(now), &body)?;
        self.store
            .append_username_claim(&doc, &key, username.as_str())?;
        self.store.append_comment_record(&doc, &record)?;
        tracing::info!(doc = %doc, pseudo_id = %pseudo_id, "comment added");
        Ok(CommentOutcome::Added { doc, record })
    }

    fn remaining(
        &self,
        doc: &DocId,
        key: &ClientKey,
    ) -> Result<Result<u64, CommentRefusal>, EngineError> {
        if !self.config.comments_enabled() {
            return Ok(Err(CommentRefusal::CommentsDisabled));
        }
        let max = u64::from(self.config.max_comments);
        let used = self.store.count_username_claims(doc, key)?;
        if used >= max {
            return Ok(Err(CommentRefusal::QuotaExceeded {
                max: self.config.max_comments,
            }));
        }
        Ok(Ok(max - used))
    }
}

fn refused(refusal: CommentRefusal) -> CommentOutcome {
    tracing::debug!(reason = %refusal, "comment refused");
    CommentOutcome::Refused(refusal)
}
