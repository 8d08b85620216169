//! entity-creator library
//!
//! Template-driven entity notes for Obsidian vaults.
//!
//! # Modules
//!
//! - `core`: front matter scanning, value formatting, template substitution,
//!   settings and the note creation flow

pub mod core;

// Re-exports for convenience
pub use core::creator::{CreateOptions, CreatedNote, EntityCreator};
pub use core::error::{EntityError, Result};
pub use core::form::{Form, FormField, FormValues};
pub use core::frontmatter::{parse_frontmatter, template_properties, Frontmatter};
pub use core::paths::VaultPaths;
pub use core::property::{CitationConfig, PropertyMapping, PropertyType};
pub use core::settings::{EntityConfig, Settings};
pub use core::template::{note_file_name, substitute, Rendered, SubstitutionMode};
pub use core::value::PropertyValue;
pub use core::vault::Vault;
