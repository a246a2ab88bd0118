//! Credentials configuration.
//!
//! The CLI reads a small TOML file holding the login credentials and the
//! two-factor seed. This is glue around the library, which itself only
//! ever sees the values.
//!
//! # Example
//!
//! ```toml
//! username = "octocat"
//! password = "hunter2"
//! otp_seed = "GEZDGNBVGY3TQOJQGEZDGNBVGY3TQOJQ"
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

#[derive(Clone, Serialize, Deserialize)]
pub struct Config {
    pub username: String,
    pub password: String,
    /// Base32 TOTP seed shown during two-factor enrollment.
    pub otp_seed: String,
}

impl Config {
    /// Load credentials from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read credentials file: {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse credentials file: {}", path.display()))
    }

    /// Default location: `<config dir>/forgehand/config.toml`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("forgehand").join("config.toml"))
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Keep the password and seed out of logs.
        f.debug_struct("Config")
            .field("username", &self.username)
            .finish()
    }
}
