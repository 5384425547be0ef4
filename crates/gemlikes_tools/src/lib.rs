#![forbid(unsafe_code)]

pub mod cgi;
pub mod logging;

use std::path::Path;

use gemlikes_kernel_contracts::response::LedgerResponse;
use gemlikes_os::app_ingress::{IngressError, LedgerIngress};
use gemlikes_os::config::{self, load_config};

use crate::cgi::{error_line, status_line, CgiError, CgiRequest};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Program {
    View,
    Like,
    AddComment,
}

impl Program {
    pub fn name(self) -> &'static str {
        match self {
            Program::View => "view",
            Program::Like => "like",
            Program::AddComment => "add-comment",
        }
    }
}

pub fn run_program(
    program: Program,
    ingress: &LedgerIngress,
    request: &CgiRequest,
) -> Result<LedgerResponse, IngressError> {
    match program {
        Program::View => ingress.view(&request.query),
        Program::Like => ingress.like(&request.query, &request.client),
        Program::AddComment => ingress.add_comment(&request.query, &request.client),
    }
}

/// Full request path: config, ledger bootstrap and salt, CGI variables, dispatch.
pub fn serve<F>(program: Program, config_path: &Path, lookup: F) -> Result<LedgerResponse, CgiError>
where
    F: Fn(&str) -> Option<String>,
{
    let config = load_config(config_path)?;
    let ingress = LedgerIngress::open(config)?;
    let request = CgiRequest::from_lookup(lookup)?;
    Ok(run_program(program, &ingress, &request)?)
}

/// Serves one request from the process environment and returns the exact
/// bytes to write to stdout. Never fails: errors become `40` lines.
pub fn respond(program: Program) -> String {
    let result = config::config_path()
        .map_err(CgiError::from)
        .and_then(|path| serve(program, &path, |name| std::env::var(name).ok()));
    match result {
        Ok(resp) => status_line(&resp),
        Err(err) => {
            tracing::warn!(program = program.name(), "request failed: {err}");
            error_line(&err.client_message())
        }
    }
}
