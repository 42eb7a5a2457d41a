//! Layered scan settings.
//!
//! Settings are merged from, lowest priority first:
//!
//! 1. built-in defaults ([`Settings::default`])
//! 2. a TOML file: the `--config` path, or `config.toml` in the platform
//!    config directory (`~/.config/duplicates/` on Linux)
//! 3. `DUPLICATES_*` environment variables, e.g. `DUPLICATES_MIN_FILE_SIZE=4096`
//! 4. command-line flags, applied by the binary after loading
//!
//! ```toml
//! follow_symlinks = false
//! min_file_size = 1
//! worker_count = 8
//! prehash = true
//! prehash_bytes = 4096
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use directories::ProjectDirs;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::duplicates::{FinderConfig, PartialHashPrefilter, DEFAULT_QUEUE_CAPACITY};
use crate::scanner::PREHASH_SIZE;

/// Prefix of environment variables read by [`Settings::load`].
pub const ENV_PREFIX: &str = "DUPLICATES_";

/// Name of the config file inside the config directory.
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Errors raised while loading settings.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// An explicitly requested config file does not exist.
    #[error("Config file not found: {0}")]
    NotFound(PathBuf),

    /// A provider produced a value of the wrong type or syntax.
    #[error("Invalid configuration: {0}")]
    Invalid(Box<figment::Error>),

    /// A value parsed but is out of range.
    #[error("Invalid value for {key}: {reason}")]
    OutOfRange {
        /// Setting name
        key: &'static str,
        /// Why it was rejected
        reason: String,
    },
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Invalid(Box::new(err))
    }
}

/// User-facing scan settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Follow symbolic links during traversal.
    pub follow_symlinks: bool,
    /// Skip files shorter than this many bytes.
    pub min_file_size: u64,
    /// Worker threads; `None` uses the available parallelism.
    pub worker_count: Option<usize>,
    /// Run the partial-hash pre-check before full hashing.
    pub prehash: bool,
    /// Leading bytes read by the pre-check.
    pub prehash_bytes: u64,
    /// Report only one path per inode.
    pub skip_hardlinks: bool,
    /// Capacity of the walker → indexer queue.
    pub queue_capacity: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            follow_symlinks: false,
            min_file_size: 0,
            worker_count: None,
            prehash: true,
            prehash_bytes: PREHASH_SIZE,
            skip_hardlinks: false,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }
}

impl Settings {
    /// Load defaults, the config file and the environment.
    ///
    /// With `explicit` set, that file must exist. Without it, the file in the
    /// platform config directory is read if present.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] on a missing explicit file, malformed input or
    /// out-of-range values.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let file = match explicit {
            Some(path) if !path.is_file() => return Err(ConfigError::NotFound(path.to_path_buf())),
            Some(path) => Some(path.to_path_buf()),
            None => default_config_path(),
        };

        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        if let Some(ref file) = file {
            log::debug!("Reading settings from {}", file.display());
            figment = figment.merge(Toml::file(file));
        }
        figment = figment.merge(Env::prefixed(ENV_PREFIX));

        Self::extract(&figment)
    }

    /// Extract and validate settings from any figment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] on malformed input or out-of-range values.
    pub fn extract(figment: &Figment) -> Result<Self, ConfigError> {
        let settings: Self = figment.extract()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Reject values the engine cannot work with.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::OutOfRange`] naming the first bad setting.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.worker_count == Some(0) {
            return Err(ConfigError::OutOfRange {
                key: "worker_count",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.prehash_bytes == 0 {
            return Err(ConfigError::OutOfRange {
                key: "prehash_bytes",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.queue_capacity == 0 {
            return Err(ConfigError::OutOfRange {
                key: "queue_capacity",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    /// Engine configuration for these settings.
    #[must_use]
    pub fn to_finder_config(&self) -> FinderConfig {
        let mut config = FinderConfig::default()
            .with_follow_symlinks(self.follow_symlinks)
            .with_min_file_size(self.min_file_size)
            .with_skip_hardlinks(self.skip_hardlinks)
            .with_queue_capacity(self.queue_capacity);

        if let Some(workers) = self.worker_count {
            config = config.with_worker_count(workers);
        }

        if self.prehash {
            config.with_prefilter(Arc::new(PartialHashPrefilter::new(self.prehash_bytes)))
        } else {
            config.without_prefilter()
        }
    }
}

/// `config.toml` in the platform config directory, if one can be determined.
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", "duplicates").map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
}
