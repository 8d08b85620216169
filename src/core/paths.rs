use std::path::{Path, PathBuf};

pub const SETTINGS_FILE: &str = ".entity-creator.json";
pub const TEMPLATES_DIR: &str = "_Templates";

pub struct VaultPaths {
    pub root: PathBuf,
    pub settings: PathBuf,
    pub templates: PathBuf,
}

impl VaultPaths {
    pub fn current() -> std::io::Result<Self> {
        Ok(Self::from_root(std::env::current_dir()?))
    }

    pub fn from_root(root: PathBuf) -> Self {
        Self {
            settings: root.join(SETTINGS_FILE),
            templates: root.join(TEMPLATES_DIR),
            root,
        }
    }

    /// Use an explicit settings file instead of the one in the vault root.
    pub fn with_settings(mut self, settings: Option<&Path>) -> Self {
        if let Some(path) = settings {
            self.settings = if path.is_absolute() {
                path.to_path_buf()
            } else {
                self.root.join(path)
            };
        }
        self
    }
}
