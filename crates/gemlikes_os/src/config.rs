#![forbid(unsafe_code)]

use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use gemlikes_engines::anonymizer::SaltMode;
use gemlikes_engines::comments::CommentConfig;
use gemlikes_engines::likes::LikeConfig;
use serde::Deserialize;
use thiserror::Error;

pub const CONFIG_FILE_NAME: &str = "gemlikes.toml";
pub const CONFIG_PATH_ENV: &str = "GEMLIKES_CONFIG";
pub const DEFAULT_MAX_COMMENTS: u32 = 5;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not locate the gemlikes executable: {0}")]
    Locate(#[source] io::Error),
    #[error("failed to create config file '{}': {source}", .path.display())]
    Create {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to read config file '{}': {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse config file '{}': {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("config '{key}' invalid or not set: {reason}")]
    Invalid { key: &'static str, reason: String },
}

#[derive(Debug, Default, Deserialize)]
struct RawConfig {
    dirs: Option<Vec<String>>,
    data: Option<String>,
    max_comments: Option<i64>,
    disable_likes: Option<bool>,
    ip_salt: Option<String>,
}

/// Validated deployment settings, loaded once per invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GemlikesConfig {
    pub content_dirs: Vec<PathBuf>,
    pub data_dir: PathBuf,
    pub likes: LikeConfig,
    pub comments: CommentConfig,
    pub salt_mode: SaltMode,
}

impl GemlikesConfig {
    /// Parses and validates TOML text. `path` is only used in error messages.
    pub fn from_toml_str(text: &str, path: &Path) -> Result<Self, ConfigError> {
        let raw: RawConfig = toml::from_str(text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_raw(raw)
    }

    fn from_raw(raw: RawConfig) -> Result<Self, ConfigError> {
        let dirs = raw.dirs.unwrap_or_default();
        if dirs.is_empty() {
            return Err(invalid("dirs", "at least one content directory is required"));
        }
        let mut content_dirs = Vec::with_capacity(dirs.len());
        for dir in dirs {
            let dir = PathBuf::from(dir);
            if !dir.exists() {
                return Err(invalid(
                    "dirs",
                    format!("'{}' does not exist", dir.display()),
                ));
            }
            content_dirs.push(dir);
        }

        let Some(data) = raw.data else {
            return Err(invalid("data", "a data directory is required"));
        };
        let data_dir = PathBuf::from(data);
        if !data_dir.exists() {
            return Err(invalid(
                "data",
                format!("'{}' does not exist", data_dir.display()),
            ));
        }

        let max_comments = match raw.max_comments {
            None => DEFAULT_MAX_COMMENTS,
            Some(n) if n <= 0 => 0,
            Some(n) => u32::try_from(n)
                .map_err(|_| invalid("max_comments", format!("{n} is too large")))?,
        };

        Ok(Self {
            content_dirs,
            data_dir,
            likes: LikeConfig {
                likes_enabled: !raw.disable_likes.unwrap_or(false),
            },
            comments: CommentConfig { max_comments },
            salt_mode: raw
                .ip_salt
                .as_deref()
                .map(SaltMode::parse)
                .unwrap_or_default(),
        })
    }
}

fn invalid(key: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        key,
        reason: reason.into(),
    }
}

/// `override_path` if set, otherwise `gemlikes.toml` beside the executable.
pub fn resolve_config_path(override_path: Option<PathBuf>, exe: &Path) -> PathBuf {
    match override_path {
        Some(path) => path,
        None => exe
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .join(CONFIG_FILE_NAME),
    }
}

pub fn config_path() -> Result<PathBuf, ConfigError> {
    if let Some(path) = std::env::var_os(CONFIG_PATH_ENV).filter(|v| !v.is_empty()) {
        return Ok(PathBuf::from(path));
    }
    let exe = std::env::current_exe().map_err(ConfigError::Locate)?;
    Ok(resolve_config_path(None, &exe))
}

/// Reads and validates the config at `path`.
///
/// A missing file is created empty first, so operators find it where it is
/// expected; the empty file then fails validation.
pub fn load_config(path: &Path) -> Result<GemlikesConfig, ConfigError> {
    match OpenOptions::new().write(true).create_new(true).open(path) {
        Ok(_) => tracing::warn!(path = %path.display(), "created empty config file"),
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {}
        Err(source) => {
            return Err(ConfigError::Create {
                path: path.to_path_buf(),
                source,
            })
        }
    }
    let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let config = GemlikesConfig::from_toml_str(&text, path)?;
    tracing::debug!(
        path = %path.display(),
        content_dirs = config.content_dirs.len(),
        max_comments = config.comments.max_comments,
        likes_enabled = config.likes.likes_enabled,
        "loaded config"
    );
    Ok(config)
}
