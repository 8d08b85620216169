pub mod create;
pub mod form;
pub mod init;
pub mod mapping;
pub mod scan;
pub mod status;
pub mod templates;
pub mod types;

use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};
use unicode_width::UnicodeWidthStr;

use entity_creator::{EntityCreator, Settings, Vault, VaultPaths};

/// Where the vault and its settings live for this invocation.
pub struct Context {
    pub paths: VaultPaths,
    /// `--config` as given, before resolution against the vault root.
    config: Option<PathBuf>,
}

impl Context {
    pub fn new(vault: Option<PathBuf>, config: Option<&Path>) -> Result<Self> {
        let paths = match vault {
            Some(root) => VaultPaths::from_root(root),
            None => VaultPaths::current().context("Failed to get current directory")?,
        };
        Ok(Self {
            paths: paths.with_settings(config),
            config: config.map(Path::to_path_buf),
        })
    }

    /// Arguments that start an MCP server on this vault and settings file.
    pub fn mcp_server_args(&self) -> Vec<String> {
        let mut args = vec![
            "--vault".to_string(),
            self.paths.root.to_string_lossy().to_string(),
        ];
        if let Some(config) = &self.config {
            args.push("--config".to_string());
            args.push(config.to_string_lossy().to_string());
        }
        args.push("mcp".to_string());
        args
    }

    pub fn vault(&self) -> Vault {
        Vault::open(&self.paths.root)
    }

    pub fn load_settings(&self) -> Result<Settings> {
        Settings::load(&self.paths.settings).with_context(|| {
            format!("Failed to load settings from {}", self.paths.settings.display())
        })
    }

    pub fn save_settings(&self, settings: &Settings) -> Result<()> {
        settings.save(&self.paths.settings).with_context(|| {
            format!("Failed to save settings to {}", self.paths.settings.display())
        })
    }

    pub fn creator(&self) -> Result<EntityCreator> {
        Ok(EntityCreator::new(self.vault(), self.load_settings()?))
    }
}

/// Right-pad `text` to `width` terminal columns, counting wide glyphs as two.
pub fn pad(text: &str, width: usize) -> String {
    let used = UnicodeWidthStr::width(text);
    format!("{}{}", text, " ".repeat(width.saturating_sub(used)))
}

pub fn column_width<'a>(items: impl Iterator<Item = &'a str>) -> usize {
    items.map(UnicodeWidthStr::width).max().unwrap_or(0)
}
