#![forbid(unsafe_code)]

pub mod comment;
pub mod common;
pub mod document;
pub mod identity;
pub mod response;

pub use common::{ContractViolation, ReasonCodeId, Validate};
