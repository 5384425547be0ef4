#![forbid(unsafe_code)]

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ReasonCodeId(pub u32);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContractViolation {
    #[error("{field}: {reason}")]
    InvalidValue {
        field: &'static str,
        reason: &'static str,
    },
    #[error("{field}: length {got} exceeds {max}")]
    TooLong {
        field: &'static str,
        max: usize,
        got: usize,
    },
}

pub trait Validate {
    fn validate(&self) -> Result<(), ContractViolation>;
}

/// Rejects values that cannot be used as a single path segment under a ledger directory.
pub(crate) fn validate_path_segment(
    field: &'static str,
    value: &str,
) -> Result<(), ContractViolation> {
    if value.trim().is_empty() {
        return Err(ContractViolation::InvalidValue {
            field,
            reason: "must not be blank",
        });
    }
    if value == "." || value == ".." {
        return Err(ContractViolation::InvalidValue {
            field,
            reason: "must not be a relative path component",
        });
    }
    if value.contains('/') || value.contains('\\') {
        return Err(ContractViolation::InvalidValue {
            field,
            reason: "must not contain path separators",
        });
    }
    if value.contains('\0') {
        return Err(ContractViolation::InvalidValue {
            field,
            reason: "must not contain NUL",
        });
    }
    Ok(())
}
