use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Component, Path, PathBuf};

use walkdir::WalkDir;

use super::error::{EntityError, Result};

/// File access relative to a vault root.
///
/// Every path handed in is vault-relative with `/` separators, the way
/// Obsidian addresses files. Paths that would leave the root are refused.
#[derive(Debug, Clone)]
pub struct Vault {
    root: PathBuf,
}

impl Vault {
    pub fn open(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn resolve(&self, rel: &str) -> Result<PathBuf> {
        let rel = rel.trim().trim_start_matches("./");
        let path = Path::new(rel);
        let escapes = path.components().any(|c| {
            matches!(
                c,
                Component::ParentDir | Component::RootDir | Component::Prefix(_)
            )
        });
        if escapes {
            return Err(EntityError::InvalidPath(rel.to_string()));
        }
        Ok(self.root.join(path))
    }

    pub fn exists(&self, rel: &str) -> bool {
        self.resolve(rel).map(|p| p.exists()).unwrap_or(false)
    }

    pub fn is_file(&self, rel: &str) -> bool {
        self.resolve(rel).map(|p| p.is_file()).unwrap_or(false)
    }

    pub fn read(&self, rel: &str) -> Result<String> {
        Ok(fs::read_to_string(self.resolve(rel)?)?)
    }

    pub fn create_folder(&self, rel: &str) -> Result<PathBuf> {
        let path = self.resolve(rel)?;
        fs::create_dir_all(&path)?;
        Ok(path)
    }

    /// Write a new file. Fails with `NoteExists` unless `overwrite` is set.
    pub fn create(&self, rel: &str, content: &str, overwrite: bool) -> Result<PathBuf> {
        let path = self.resolve(rel)?;
        if overwrite {
            fs::write(&path, content)?;
            return Ok(path);
        }

        let mut file = match fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
        {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                return Err(EntityError::NoteExists(path));
            }
            Err(e) => return Err(e.into()),
        };
        file.write_all(content.as_bytes())?;
        Ok(path)
    }

    /// Markdown files under a folder, recursively, sorted by path.
    pub fn list_notes(&self, rel: &str) -> Result<Vec<PathBuf>> {
        let dir = self.resolve(rel)?;
        if !dir.is_dir() {
            return Ok(Vec::new());
        }
        let mut notes: Vec<PathBuf> = WalkDir::new(&dir)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .map(|e| e.into_path())
            .filter(|p| p.extension().map(|ext| ext == "md").unwrap_or(false))
            .collect();
        notes.sort();
        Ok(notes)
    }

    /// Files matching a vault-relative glob such as `_Templates/*.md`.
    pub fn list_templates(&self, pattern: &str) -> Result<Vec<PathBuf>> {
        self.resolve(pattern)?;
        let root = glob::Pattern::escape(&self.root.to_string_lossy());
        let full = format!("{}/{}", root.trim_end_matches('/'), pattern);
        let paths = glob::glob(&full)
            .map_err(|e| EntityError::InvalidPath(format!("{}: {}", pattern, e)))?;
        let mut templates: Vec<PathBuf> = paths
            .filter_map(|p| p.ok())
            .filter(|p| p.is_file())
            .collect();
        templates.sort();
        Ok(templates)
    }

    /// Vault-relative display form of an absolute path under the root.
    pub fn relative(&self, path: &Path) -> String {
        path.strip_prefix(&self.root)
            .unwrap_or(path)
            .to_string_lossy()
            .replace('\\', "/")
    }
}
