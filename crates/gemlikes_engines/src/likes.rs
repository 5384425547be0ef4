#![forbid(unsafe_code)]

use gemlikes_kernel_contracts::document::DocId;
use gemlikes_kernel_contracts::identity::ClientKey;
use gemlikes_kernel_contracts::ReasonCodeId;
use gemlikes_storage::LedgerStore;

use crate::EngineError;

pub mod reason_codes {
    use gemlikes_kernel_contracts::ReasonCodeId;

    pub const LIKE_OK_ADDED: ReasonCodeId = ReasonCodeId(0x4C4B_0001);
    pub const LIKE_OK_ALREADY_LIKED: ReasonCodeId = ReasonCodeId(0x4C4B_0002);

    pub const LIKE_FAIL_DOCUMENT_INVALID: ReasonCodeId = ReasonCodeId(0x4C4B_00F1);
    pub const LIKE_FAIL_DISABLED: ReasonCodeId = ReasonCodeId(0x4C4B_00F2);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LikeConfig {
    pub likes_enabled: bool,
}

impl LikeConfig {
    pub fn mvp_v1() -> Self {
        Self {
            likes_enabled: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LikeOutcome {
    Added { doc: DocId },
    AlreadyLiked { doc: DocId },
    Disabled,
    DocumentInvalid,
}

impl LikeOutcome {
    pub fn reason_code(&self) -> ReasonCodeId {
        match self {
            LikeOutcome::Added { .. } => reason_codes::LIKE_OK_ADDED,
            LikeOutcome::AlreadyLiked { .. } => reason_codes::LIKE_OK_ALREADY_LIKED,
            LikeOutcome::Disabled => reason_codes::LIKE_FAIL_DISABLED,
            LikeOutcome::DocumentInvalid => reason_codes::LIKE_FAIL_DOCUMENT_INVALID,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LikeRuntime<'a> {
    store: &'a LedgerStore,
    config: LikeConfig,
}

impl<'a> LikeRuntime<'a> {
    pub fn new(store: &'a LedgerStore, config: LikeConfig) -> Self {
        Self { store, config }
    }

    pub fn has_liked(&self, doc: &DocId, key: &ClientKey) -> Result<bool, EngineError> {
        Ok(self.store.has_like(doc, key)?)
    }

    pub fn count_likes(&self, doc: &DocId) -> Result<u64, EngineError> {
        Ok(self.store.count_likes(doc)?)
    }

    /// Records one like for `key` on `raw_doc`.
    ///
    /// The document check comes first, so a bad document is reported as such
    /// even when likes are disabled. The already-liked check and the append
    /// share one lock, so one identity never ends up with two lines.
    pub fn add_like(&self, raw_doc: &str, key: &ClientKey) -> Result<LikeOutcome, EngineError> {
        let Some(doc) = self.store.resolve_document(raw_doc) else {
            tracing::debug!("like refused: document not valid");
            return Ok(LikeOutcome::DocumentInvalid);
        };
        if !self.config.likes_enabled {
            tracing::debug!(doc = %doc, "like refused: likes disabled");
            return Ok(LikeOutcome::Disabled);
        }

        let _guard = self.store.lock_likes(&doc)?;
        if self.store.has_like(&doc, key)? {
            tracing::debug!(doc = %doc, "like skipped: already liked");
            return Ok(LikeOutcome::AlreadyLiked { doc });
        }
        self.store.append_like(&doc, key)?;
        tracing::info!(doc = %doc, "like added");
        Ok(LikeOutcome::Added { doc })
    }
}
