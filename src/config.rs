//! Project level configuration stored in `sigil.toml`.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sigil_ssr::SsrConfig;
use sigil_web::HydrationConfig;

/// Contents of `sigil.toml`. Every section is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SigilConfig {
    /// Server rendering options.
    pub ssr: SsrConfig,
    /// Client hydration options.
    pub hydration: HydrationConfig,
    /// Logging options.
    pub log: LogConfig,
}

/// The `[log]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Fallback level when `RUST_LOG` is unset.
    pub level: String,
    /// Colored terminal output.
    pub ansi: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            ansi: true,
        }
    }
}

impl SigilConfig {
    /// Reads `sigil.toml` from `root`.
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be read or parsed.
    pub fn load(root: &Path) -> Result<Self> {
        let path = Self::path(root);
        let contents = fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let config = toml::from_str(&contents)
            .with_context(|| format!("failed to parse {}", path.display()))?;
        Ok(config)
    }

    /// Reads `sigil.toml` from `root`, or the defaults if there is none.
    ///
    /// # Errors
    ///
    /// Fails if the file exists but cannot be read or parsed.
    pub fn load_or_default(root: &Path) -> Result<Self> {
        if Self::path(root).exists() {
            Self::load(root)
        } else {
            Ok(Self::default())
        }
    }

    /// Writes `sigil.toml` into `root`.
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be written.
    pub fn save(&self, root: &Path) -> Result<()> {
        let path = Self::path(root);
        let contents = toml::to_string_pretty(self)?;
        fs::write(&path, contents).with_context(|| format!("failed to write {}", path.display()))
    }

    /// Location of the configuration file under `root`.
    #[must_use]
    pub fn path(root: &Path) -> PathBuf {
        root.join("sigil.toml")
    }
}
