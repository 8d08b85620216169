//! Entity Creator MCP Server implementation

use std::collections::BTreeMap;

use anyhow::Result;
use rmcp::{
    handler::server::{tool::ToolRouter, wrapper::Parameters},
    model::{CallToolResult, Content, ServerCapabilities, ServerInfo},
    tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler, ServiceExt,
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use entity_creator::core::paths::VaultPaths;
use entity_creator::{
    parse_frontmatter, template_properties, CreateOptions, EntityCreator, EntityError, Settings,
    SubstitutionMode, Vault,
};

/// Parameters for entity_form tool
#[derive(Debug, Deserialize, JsonSchema)]
pub struct FormParams {
    /// Entity type id (e.g., "person", "event")
    #[schemars(description = "Entity type id, e.g. person or event")]
    pub entity_type: String,
}

/// Parameters for entity_create tool
#[derive(Debug, Deserialize, JsonSchema)]
pub struct CreateParams {
    /// Entity type id (e.g., "person", "event")
    #[schemars(description = "Entity type id, e.g. person or event")]
    pub entity_type: String,
    /// Property values keyed by template property name
    #[schemars(
        description = "Property values keyed by template property. Use an array for List and Citation properties, true/false for Checkbox."
    )]
    #[serde(default)]
    pub values: BTreeMap<String, Value>,
    /// Render without writing the note
    #[schemars(description = "Return the rendered note without writing it")]
    #[serde(default)]
    pub dry_run: bool,
    /// Replace an existing note with the same name
    #[schemars(description = "Replace an existing note with the same file name")]
    #[serde(default)]
    pub overwrite: bool,
    /// Substitution mode: anchored (default) or global
    #[schemars(description = "anchored (default) or global")]
    #[serde(default)]
    pub mode: Option<String>,
}

/// Parameters for scan_frontmatter tool
#[derive(Debug, Deserialize, JsonSchema)]
pub struct ScanParams {
    /// Vault-relative file path (e.g., "_Templates/Temp-Person.md")
    #[schemars(description = "Vault-relative path of the file to scan")]
    pub path: String,
}

/// Entity type info for JSON output
#[derive(Debug, Serialize)]
struct EntityTypeJson {
    id: String,
    display_name: String,
    note_path: Option<String>,
    template_path: Option<String>,
    template_exists: bool,
}

/// Scan result for JSON output
#[derive(Debug, Serialize)]
struct ScanJson {
    path: String,
    has_frontmatter: bool,
    properties: BTreeMap<String, String>,
    template_properties: Vec<String>,
}

/// Entity Creator MCP Service
#[derive(Clone)]
pub struct EntityService {
    vault_root: std::path::PathBuf,
    settings_path: std::path::PathBuf,
    tool_router: ToolRouter<Self>,
}

impl EntityService {
    pub fn new(paths: VaultPaths) -> Self {
        Self {
            vault_root: paths.root,
            settings_path: paths.settings,
            tool_router: Self::tool_router(),
        }
    }

    fn vault(&self) -> Vault {
        Vault::open(&self.vault_root)
    }

    // Settings are reread per call so CLI edits show up without a restart.
    fn get_creator(&self) -> Result<EntityCreator, McpError> {
        let settings = Settings::load(&self.settings_path).map_err(to_mcp_error)?;
        Ok(EntityCreator::new(self.vault(), settings))
    }
}

fn to_mcp_error(e: EntityError) -> McpError {
    match e {
        EntityError::UnknownEntityType(_)
        | EntityError::InvalidValue { .. }
        | EntityError::UnknownProperty { .. }
        | EntityError::InvalidPath(_) => McpError::invalid_params(e.to_string(), None),
        other => McpError::internal_error(other.to_string(), None),
    }
}

fn to_json<T: Serialize>(value: &T) -> Result<String, McpError> {
    serde_json::to_string_pretty(value).map_err(|e| {
        McpError::internal_error(format!("JSON serialization failed: {}", e), None)
    })
}

/// Flatten tool values into `(key, raw)` inputs; arrays repeat the key.
fn inputs_from_json(values: &BTreeMap<String, Value>) -> Vec<(String, String)> {
    let mut inputs = Vec::new();
    for (key, value) in values {
        match value {
            Value::Array(items) => {
                for item in items {
                    if let Some(text) = scalar_text(item) {
                        inputs.push((key.clone(), text));
                    }
                }
            }
            other => {
                if let Some(text) = scalar_text(other) {
                    inputs.push((key.clone(), text));
                }
            }
        }
    }
    inputs
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[tool_router]
impl EntityService {
    /// List configured entity types
    #[tool(description = "List the entity types (event, person, ...) with their note folders and template files.")]
    async fn entity_types(&self) -> Result<CallToolResult, McpError> {
        let creator = self.get_creator()?;
        let settings = creator.settings();
        let vault = creator.vault();

        let types: Vec<EntityTypeJson> = settings
            .entity_types()
            .into_iter()
            .map(|(id, display)| {
                let config = settings.entity_config(id);
                EntityTypeJson {
                    id: id.to_string(),
                    display_name: display.to_string(),
                    note_path: config.map(|c| c.note_path.clone()),
                    template_path: config.map(|c| c.template_path.clone()),
                    template_exists: config
                        .map(|c| vault.is_file(&c.template_path))
                        .unwrap_or(false),
                }
            })
            .collect();

        Ok(CallToolResult::success(vec![Content::text(to_json(&types)?)]))
    }

    /// Get the creation form of an entity type
    #[tool(description = "Get the creation form for an entity type: one field per template property with its label, type and options.")]
    async fn entity_form(
        &self,
        params: Parameters<FormParams>,
    ) -> Result<CallToolResult, McpError> {
        let creator = self.get_creator()?;
        let form = creator
            .open_form(&params.0.entity_type)
            .map_err(to_mcp_error)?;

        Ok(CallToolResult::success(vec![Content::text(to_json(&form)?)]))
    }

    /// Create an entity note
    #[tool(description = "Create an entity note from its template. The note is named after full_name (or Untitled) and placed in the entity's folder.")]
    async fn entity_create(
        &self,
        params: Parameters<CreateParams>,
    ) -> Result<CallToolResult, McpError> {
        let params = params.0;
        let mode = match params.mode.as_deref() {
            Some(m) => m
                .parse::<SubstitutionMode>()
                .map_err(|e| McpError::invalid_params(e, None))?,
            None => SubstitutionMode::default(),
        };

        let creator = self.get_creator()?;
        let form = creator
            .open_form(&params.entity_type)
            .map_err(to_mcp_error)?;
        let values = form
            .submit(&inputs_from_json(&params.values))
            .map_err(to_mcp_error)?;

        let options = CreateOptions {
            mode,
            overwrite: params.overwrite,
            dry_run: params.dry_run,
        };
        let note = creator
            .create_note(&params.entity_type, &values, options)
            .map_err(to_mcp_error)?;

        Ok(CallToolResult::success(vec![Content::text(to_json(&note)?)]))
    }

    /// Scan front matter of a vault file
    #[tool(description = "Read the front matter key/value pairs of a vault file and the template properties it offers.")]
    async fn scan_frontmatter(
        &self,
        params: Parameters<ScanParams>,
    ) -> Result<CallToolResult, McpError> {
        let content = self.vault().read(&params.0.path).map_err(to_mcp_error)?;
        let fm = parse_frontmatter(&content);

        let result = ScanJson {
            path: params.0.path.clone(),
            has_frontmatter: fm.has_block(),
            properties: fm
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            template_properties: template_properties(&content),
        };

        Ok(CallToolResult::success(vec![Content::text(to_json(&result)?)]))
    }
}

#[tool_handler]
impl ServerHandler for EntityService {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "Entity Creator MCP Server. Call entity_form to see which properties an entity type takes, then entity_create to write the note into the Obsidian vault.".to_string()
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}

/// Run the MCP server
pub async fn run_mcp_server(paths: VaultPaths) -> Result<()> {
    use tokio::io::{stdin, stdout};

    tracing::info!(vault = %paths.root.display(), "starting MCP server");
    let service = EntityService::new(paths);
    let transport = (stdin(), stdout());
    let server = service.serve(transport).await?;
    server.waiting().await?;

    Ok(())
}
