use std::{fs, io, net::SocketAddr, path::{Path, PathBuf}};

use anyhow::{self, Context};
use serde::{Serialize, Deserialize};

use crate::core::{CodePolicy, LedgerStore};

/// Not the old form's `pengeluaran_kas.csv`: that file uses different
/// column headers and would load as corrupt.
pub const DEFAULT_LEDGER_FILE: &str = "cashbook.csv";
pub const DEFAULT_CONFIG_FILE: &str = "cashbook.toml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: SocketAddr,
    /// Directory of static files served for paths the API does not handle
    pub static_dir: Option<PathBuf>
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            bind: SocketAddr::from(([127, 0, 0, 1], 8080)),
            static_dir: None
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub ledger_path: PathBuf,
    pub code_policy: CodePolicy,
    pub server: ServerConfig
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            ledger_path: PathBuf::from(DEFAULT_LEDGER_FILE),
            code_policy: CodePolicy::default(),
            server: ServerConfig::default()
        }
    }
}

impl AppConfig {
    pub fn read(filepath: impl AsRef<Path>) -> anyhow::Result<Self> {
        let file_content = fs::read_to_string(filepath)
            .with_context(|| "failed to read config file")?;
        let config = toml::from_str(&file_content)
            .with_context(|| "failed to parse config file")?;
        return Ok(config);
    }

    /// Like [`AppConfig::read`], but a missing file gives the defaults.
    pub fn read_or_default(filepath: impl AsRef<Path>) -> anyhow::Result<Self> {
        let filepath = filepath.as_ref();
        match fs::metadata(filepath) {
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                log::debug!("no config at {}, using defaults", filepath.display());
                Ok(AppConfig::default())
            },
            _ => AppConfig::read(filepath)
                .with_context(|| format!("config file {}", filepath.display()))
        }
    }

    pub fn open_store(&self) -> LedgerStore {
        LedgerStore::open(&self.ledger_path, self.code_policy)
    }
}
