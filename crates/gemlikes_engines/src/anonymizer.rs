#![forbid(unsafe_code)]

use std::fmt;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use gemlikes_kernel_contracts::identity::{ClientAddress, ClientKey, PseudoId, PSEUDO_ID_LEN};
use gemlikes_kernel_contracts::ContractViolation;
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::{Digest, Sha256};
use thiserror::Error;

pub const AUTO_SALT_LEN: usize = 16;

#[derive(Debug, Error)]
pub enum AnonymizerError {
    #[error("failed to read ip salt '{}': {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to create ip salt '{}': {source}", .path.display())]
    Create {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error(transparent)]
    Contract(#[from] ContractViolation),
}

/// Where the salt comes from.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SaltMode {
    /// No salt. Pseudo ids become plain hashes of the address.
    Disabled,
    /// `ip_salt` under the data root, generated on first use.
    #[default]
    Auto,
    /// Operator-provided file; never generated.
    Fixed(PathBuf),
}

impl SaltMode {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "disabled" => SaltMode::Disabled,
            "auto" => SaltMode::Auto,
            path => SaltMode::Fixed(PathBuf::from(path)),
        }
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct IpSalt(Vec<u8>);

impl IpSalt {
    pub fn empty() -> Self {
        Self(Vec::new())
    }

    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    /// Resolves the salt for `mode`. `auto_path` is only consulted in auto mode.
    ///
    /// Auto mode creates the file with create-new semantics, so an existing
    /// salt is never overwritten, even by a concurrent first run.
    pub fn load(mode: &SaltMode, auto_path: &Path) -> Result<Self, AnonymizerError> {
        match mode {
            SaltMode::Disabled => Ok(Self::empty()),
            SaltMode::Fixed(path) => read_salt(path),
            SaltMode::Auto => match create_salt(auto_path)? {
                Some(salt) => Ok(salt),
                None => read_salt(auto_path),
            },
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for IpSalt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "IpSalt(<{} bytes>)", self.0.len())
    }
}

fn read_salt(path: &Path) -> Result<IpSalt, AnonymizerError> {
    fs::read(path)
        .map(IpSalt)
        .map_err(|source| AnonymizerError::Read {
            path: path.to_path_buf(),
            source,
        })
}

fn create_salt(path: &Path) -> Result<Option<IpSalt>, AnonymizerError> {
    let create_err = |source| AnonymizerError::Create {
        path: path.to_path_buf(),
        source,
    };
    let mut options = OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut file = match options.open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => return Ok(None),
        Err(e) => return Err(create_err(e)),
    };
    let mut salt = [0u8; AUTO_SALT_LEN];
    OsRng.fill_bytes(&mut salt);
    file.write_all(&salt).map_err(create_err)?;
    file.sync_all().map_err(create_err)?;
    tracing::info!(path = %path.display(), "generated new ip salt");
    Ok(Some(IpSalt(salt.to_vec())))
}

/// Turns client addresses into storage keys and display ids.
#[derive(Debug, Clone)]
pub struct Anonymizer {
    salt: IpSalt,
}

impl Anonymizer {
    pub fn new(salt: IpSalt) -> Self {
        Self { salt }
    }

    pub fn client_key(&self, addr: &ClientAddress) -> ClientKey {
        addr.client_key()
    }

    /// First eight hex digits of SHA-256(salt ++ address).
    pub fn pseudo_id(&self, addr: &ClientAddress) -> Result<PseudoId, AnonymizerError> {
        let mut hasher = Sha256::new();
        hasher.update(&self.salt.0);
        hasher.update(addr.as_str().as_bytes());
        let digest = hex::encode(hasher.finalize());
        Ok(PseudoId::new(&digest[..PSEUDO_ID_LEN])?)
    }
}
