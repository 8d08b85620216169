pub mod creator;
pub mod error;
pub mod form;
pub mod frontmatter;
pub mod paths;
pub mod property;
pub mod settings;
pub mod template;
pub mod value;
pub mod vault;
