#![forbid(unsafe_code)]

use gemlikes_engines::anonymizer::{Anonymizer, AnonymizerError, IpSalt};
use gemlikes_engines::comments::{CommentOutcome, CommentSessionRuntime, INPUT_PROMPT};
use gemlikes_engines::likes::{LikeOutcome, LikeRuntime};
use gemlikes_engines::render::{render_view_page, CommentFeed};
use gemlikes_engines::EngineError;
use gemlikes_kernel_contracts::identity::ClientAddress;
use gemlikes_kernel_contracts::response::LedgerResponse;
use gemlikes_storage::{LedgerStore, StorageError};
use thiserror::Error;

use crate::config::GemlikesConfig;
use crate::links::escape_doc_link;

pub mod reason_codes {
    use gemlikes_kernel_contracts::ReasonCodeId;

    pub const VIEW_FAIL_DOCUMENT_INVALID: ReasonCodeId = ReasonCodeId(0x5657_00F1);
}

#[derive(Debug, Error)]
pub enum IngressError {
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Anonymizer(#[from] AnonymizerError),
    #[error(transparent)]
    Engine(#[from] EngineError),
}

/// One opened ledger plus the settings and salt it runs with.
///
/// Each entry point maps one request onto exactly one `LedgerResponse`.
/// User-facing refusals come back as `Ok(LedgerResponse::Refuse(..))`; only
/// I/O trouble is an `Err`.
#[derive(Debug)]
pub struct LedgerIngress {
    config: GemlikesConfig,
    store: LedgerStore,
    anonymizer: Anonymizer,
}

impl LedgerIngress {
    /// Creates the ledger directories and loads the salt.
    pub fn open(config: GemlikesConfig) -> Result<Self, IngressError> {
        let store = LedgerStore::new(config.data_dir.clone(), config.content_dirs.clone());
        store.bootstrap()?;
        let salt = IpSalt::load(&config.salt_mode, &store.salt_path())?;
        if salt.is_empty() {
            tracing::debug!("ip salt disabled");
        }
        Ok(Self {
            config,
            store,
            anonymizer: Anonymizer::new(salt),
        })
    }

    pub fn store(&self) -> &LedgerStore {
        &self.store
    }

    fn likes(&self) -> LikeRuntime<'_> {
        LikeRuntime::new(&self.store, self.config.likes)
    }

    fn comments(&self) -> CommentSessionRuntime<'_> {
        CommentSessionRuntime::new(&self.store, &self.anonymizer, self.config.comments)
    }

    pub fn view(&self, query: &str) -> Result<LedgerResponse, IngressError> {
        let Some(doc) = self.store.resolve_document(query) else {
            return Ok(LedgerResponse::refuse(
                reason_codes::VIEW_FAIL_DOCUMENT_INVALID,
                "File not valid, nothing can be shown. Sorry!",
            ));
        };
        let likes = self.likes().count_likes(&doc)?;
        let feed = self.store.scan_comment_log_reverse(&doc)?.map(CommentFeed::new);
        let page = render_view_page(&doc, &escape_doc_link(&doc), likes, feed)
            .map_err(EngineError::CommentLog)?;
        Ok(LedgerResponse::Success(page))
    }

    pub fn like(&self, query: &str, addr: &ClientAddress) -> Result<LedgerResponse, IngressError> {
        let outcome = self.likes().add_like(query, &self.anonymizer.client_key(addr))?;
        let reason_code = outcome.reason_code();
        Ok(match outcome {
            LikeOutcome::Added { .. } => LedgerResponse::Success("# 💖 Like Added 💖".to_string()),
            LikeOutcome::AlreadyLiked { .. } => LedgerResponse::Success(
                "Back so soon? You (or your IP) has already liked this file.".to_string(),
            ),
            LikeOutcome::Disabled => {
                LedgerResponse::refuse(reason_code, "Likes have been disabled.")
            }
            LikeOutcome::DocumentInvalid => {
                LedgerResponse::refuse(reason_code, "File not valid for liking.")
            }
        })
    }

    pub fn add_comment(
        &self,
        query: &str,
        addr: &ClientAddress,
    ) -> Result<LedgerResponse, IngressError> {
        Ok(match self.comments().handle(query, addr)? {
            CommentOutcome::AwaitingInput { .. } => {
                LedgerResponse::InputRequested(INPUT_PROMPT.to_string())
            }
            CommentOutcome::Added { doc, record } => LedgerResponse::Success(format!(
                "Comment by '{}' on '{}' added!\n=> view?{} View all comments",
                record.username,
                doc,
                escape_doc_link(&doc)
            )),
            CommentOutcome::Refused(refusal) => {
                LedgerResponse::refuse(refusal.reason_code(), refusal.to_string())
            }
        })
    }
}
