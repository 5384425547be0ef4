#![forbid(unsafe_code)]

use gemlikes_kernel_contracts::identity::ClientAddress;
use gemlikes_kernel_contracts::response::LedgerResponse;
use gemlikes_kernel_contracts::ContractViolation;
use gemlikes_os::app_ingress::IngressError;
use gemlikes_os::config::ConfigError;
use gemlikes_os::links::{decode_query, QueryDecodeError};
use thiserror::Error;

pub const QUERY_STRING_VAR: &str = "QUERY_STRING";
pub const REMOTE_ADDR_VAR: &str = "REMOTE_ADDR";

#[derive(Debug, Error)]
pub enum CgiError {
    #[error("no file specified")]
    MissingQuery,
    #[error("no REMOTE_ADDR specified, server CGI error")]
    MissingRemoteAddr,
    #[error(transparent)]
    Query(#[from] QueryDecodeError),
    #[error("REMOTE_ADDR is not usable: {0}")]
    RemoteAddr(#[source] ContractViolation),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Ingress(#[from] IngressError),
}

/// Text sent to the client in place of server-side failures. The detailed
/// error only goes to the log.
pub const INTERNAL_ERROR_MESSAGE: &str = "internal error, try again later.";

impl CgiError {
    /// What the client is told. Request problems are described as-is; config
    /// trouble names at most the offending key; ledger I/O is generic. No
    /// server path or OS error reaches the client.
    pub fn client_message(&self) -> String {
        match self {
            CgiError::MissingQuery
            | CgiError::MissingRemoteAddr
            | CgiError::Query(_)
            | CgiError::RemoteAddr(_) => self.to_string(),
            CgiError::Config(ConfigError::Invalid { key, .. }) => {
                format!("config '{key}' invalid or not set")
            }
            CgiError::Config(_) => "server config could not be loaded".to_string(),
            CgiError::Ingress(_) => INTERNAL_ERROR_MESSAGE.to_string(),
        }
    }
}

/// The two CGI variables every program needs, decoded and validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CgiRequest {
    pub query: String,
    pub client: ClientAddress,
}

impl CgiRequest {
    /// Builds a request from any variable source; both variables must be
    /// present and non-blank before decoding.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, CgiError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let raw_query = lookup(QUERY_STRING_VAR)
            .filter(|q| !q.trim().is_empty())
            .ok_or(CgiError::MissingQuery)?;
        let remote = lookup(REMOTE_ADDR_VAR)
            .filter(|a| !a.trim().is_empty())
            .ok_or(CgiError::MissingRemoteAddr)?;
        let query = decode_query(&raw_query)?;
        let client = ClientAddress::new(remote).map_err(CgiError::RemoteAddr)?;
        Ok(Self { query, client })
    }
}

pub fn status_line(resp: &LedgerResponse) -> String {
    match resp {
        LedgerResponse::Success(body) => format!("20 text/gemini\r\n{body}\r\n"),
        LedgerResponse::InputRequested(prompt) => format!("10 {}\r\n", prompt.trim()),
        LedgerResponse::Refuse(refuse) => error_line(&refuse.message),
    }
}

/// A `40` line with the reason's first letter capitalized.
pub fn error_line(reason: &str) -> String {
    let reason = reason.trim();
    let mut chars = reason.chars();
    let capitalized = match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
        None => String::new(),
    };
    format!("40 {capitalized}\r\n")
}
