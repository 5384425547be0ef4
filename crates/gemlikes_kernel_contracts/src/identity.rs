#![forbid(unsafe_code)]

use std::fmt;

use crate::common::validate_path_segment;
use crate::document::COMMENT_LOG_NAME;
use crate::{ContractViolation, Validate};

pub const CLIENT_ADDRESS_MAX_LEN: usize = 128;
pub const PSEUDO_ID_LEN: usize = 8;

/// Raw network address of a caller, exactly as the front end reported it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClientAddress(String);

impl ClientAddress {
    pub fn new(addr: impl Into<String>) -> Result<Self, ContractViolation> {
        let addr = Self(addr.into());
        addr.validate()?;
        Ok(addr)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Filesystem-safe form of the address. IPv6 colons become underscores.
    pub fn client_key(&self) -> ClientKey {
        ClientKey(self.0.replace(':', "_"))
    }
}

impl Validate for ClientAddress {
    fn validate(&self) -> Result<(), ContractViolation> {
        if self.0.trim().is_empty() {
            return Err(ContractViolation::InvalidValue {
                field: "client_address",
                reason: "must not be blank",
            });
        }
        if self.0.len() > CLIENT_ADDRESS_MAX_LEN {
            return Err(ContractViolation::TooLong {
                field: "client_address",
                max: CLIENT_ADDRESS_MAX_LEN,
                got: self.0.len(),
            });
        }
        // '_' is the substitution target; an address carrying one would not round-trip.
        if self.0.contains('_') {
            return Err(ContractViolation::InvalidValue {
                field: "client_address",
                reason: "must not contain an underscore",
            });
        }
        self.client_key().validate()
    }
}

/// Storage lookup key for one caller.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClientKey(String);

impl ClientKey {
    pub fn new(key: impl Into<String>) -> Result<Self, ContractViolation> {
        let key = Self(key.into());
        key.validate()?;
        Ok(key)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Inverse of [`ClientAddress::client_key`].
    pub fn client_address(&self) -> ClientAddress {
        ClientAddress(self.0.replace('_', ":"))
    }
}

impl Validate for ClientKey {
    fn validate(&self) -> Result<(), ContractViolation> {
        validate_path_segment("client_key", &self.0)?;
        if self.0 == COMMENT_LOG_NAME {
            return Err(ContractViolation::InvalidValue {
                field: "client_key",
                reason: "collides with the comment log name",
            });
        }
        if self.0.starts_with('.') {
            return Err(ContractViolation::InvalidValue {
                field: "client_key",
                reason: "must not start with a dot",
            });
        }
        Ok(())
    }
}

impl fmt::Display for ClientKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Short display id for a comment author. Not unique, never a lookup key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PseudoId(String);

impl PseudoId {
    pub fn new(id: impl Into<String>) -> Result<Self, ContractViolation> {
        let id = Self(id.into());
        id.validate()?;
        Ok(id)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Validate for PseudoId {
    fn validate(&self) -> Result<(), ContractViolation> {
        if self.0.len() != PSEUDO_ID_LEN {
            return Err(ContractViolation::InvalidValue {
                field: "pseudo_id",
                reason: "must be exactly 8 characters",
            });
        }
        if !self
            .0
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
        {
            return Err(ContractViolation::InvalidValue {
                field: "pseudo_id",
                reason: "must be lowercase hex",
            });
        }
        Ok(())
    }
}

impl fmt::Display for PseudoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
