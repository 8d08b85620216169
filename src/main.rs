mod commands;
#[cfg(feature = "mcp")]
mod mcp;

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};
use colored::Colorize;
use tracing_subscriber::EnvFilter;

use commands::create::{parse_key_value, CreateArgs};
use commands::mapping::MappingCommand;
use commands::types::TypesCommand;
use commands::Context;
use entity_creator::SubstitutionMode;

#[derive(Parser)]
#[command(name = "entity")]
#[command(about = "Create entity notes in an Obsidian vault from front matter templates", long_about = None)]
#[command(version)]
struct Cli {
    #[arg(long, global = true, env = "ENTITY_VAULT", help = "Vault root (default: current directory)")]
    vault: Option<PathBuf>,

    #[arg(long, global = true, env = "ENTITY_CREATOR_CONFIG", help = "Settings file (default: <vault>/.entity-creator.json)")]
    config: Option<PathBuf>,

    #[arg(short, long, global = true, action = ArgAction::Count, help = "More log output (-v, -vv, -vvv)")]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    // ===== Setup =====
    /// Write default settings and check entity folders and templates
    Init {
        #[arg(long, help = "Create missing note folders")]
        create: bool,
        #[arg(long, help = "Overwrite an existing settings file with defaults")]
        force: bool,
    },
    /// Show entity types, templates and note counts
    Status {
        #[arg(long, help = "JSON output")]
        json: bool,
    },

    // ===== Templates =====
    /// Print the front matter properties of a file
    Scan {
        file: PathBuf,
        #[arg(long, help = "JSON output")]
        json: bool,
    },
    /// List template files found in the vault
    Templates {
        #[arg(long, help = "Glob relative to the vault (default: _Templates/*.md)")]
        pattern: Option<String>,
        #[arg(long, help = "JSON output")]
        json: bool,
    },

    // ===== Notes =====
    /// Show the creation form for an entity type
    Form {
        entity_type: String,
        #[arg(long, help = "JSON output")]
        json: bool,
    },
    /// Create an entity note from its template
    Create {
        entity_type: String,
        #[arg(short, long = "set", value_name = "KEY=VALUE", value_parser = parse_key_value, help = "Property value; repeat for list entries")]
        set: Vec<(String, String)>,
        #[arg(long = "values", value_name = "FILE", help = "YAML file mapping properties to values")]
        values: Option<PathBuf>,
        #[arg(long, default_value_t = SubstitutionMode::Anchored, help = "anchored: whole keys in front matter; global: every 'key:' in the text")]
        mode: SubstitutionMode,
        #[arg(long, help = "Print the note instead of writing it")]
        dry_run: bool,
        #[arg(long, help = "Replace an existing note with the same name")]
        overwrite: bool,
        #[arg(long, help = "JSON output")]
        json: bool,
    },

    // ===== Settings =====
    /// Manage entity types
    Types {
        #[command(subcommand)]
        command: TypesCommand,
    },
    /// Manage property mappings
    Mapping {
        #[command(subcommand)]
        command: MappingCommand,
    },

    // ===== MCP Server =====
    /// Start MCP server exposing entity creation tools
    #[cfg(feature = "mcp")]
    Mcp {
        #[arg(long, help = "Show MCP client configuration instructions")]
        install: bool,
    },
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli) {
        let message = format!("{:#}", e);
        tracing::error!(error = %message, "command failed");
        eprintln!("{} {}", "error:".red().bold(), message);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let ctx = Context::new(cli.vault, cli.config.as_deref())?;

    match cli.command {
        Commands::Init { create, force } => commands::init::run(&ctx, create, force),
        Commands::Status { json } => commands::status::run(&ctx, json),
        Commands::Scan { file, json } => commands::scan::run(&ctx, &file, json),
        Commands::Templates { pattern, json } => {
            commands::templates::run(&ctx, pattern.as_deref(), json)
        }
        Commands::Form { entity_type, json } => commands::form::run(&ctx, &entity_type, json),
        Commands::Create {
            entity_type,
            set,
            values,
            mode,
            dry_run,
            overwrite,
            json,
        } => commands::create::run(
            &ctx,
            CreateArgs {
                entity_type: &entity_type,
                set: &set,
                values_file: values.as_deref(),
                mode,
                dry_run,
                overwrite,
                json,
            },
        ),
        Commands::Types { command } => commands::types::run(&ctx, command),
        Commands::Mapping { command } => commands::mapping::run(&ctx, command),

        #[cfg(feature = "mcp")]
        Commands::Mcp { install } => {
            if install {
                print_mcp_install_instructions(&ctx);
                Ok(())
            } else {
                run_mcp_server(ctx)
            }
        }
    }
}

#[cfg(feature = "mcp")]
fn run_mcp_server(ctx: Context) -> anyhow::Result<()> {
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(mcp::run_mcp_server(ctx.paths))
}

#[cfg(feature = "mcp")]
fn print_mcp_install_instructions(ctx: &Context) {
    let binary_path = std::env::current_exe()
        .map(|p| p.to_string_lossy().to_string())
        .unwrap_or_else(|_| "entity".to_string());
    let args = serde_json::to_string(&ctx.mcp_server_args()).unwrap_or_default();

    println!("{}", "MCP Server Installation Guide".bold().cyan());
    println!();
    println!("Add the following to your MCP client configuration:");
    println!();
    println!(r#"{{
  "mcpServers": {{
    "entity-creator": {{
      "command": {},
      "args": {}
    }}
  }}
}}"#, serde_json::Value::String(binary_path), args);
    println!();
    println!("{}", "Available tools:".bold());
    println!("  • {} - List entity types and their folders", "entity_types".green());
    println!("  • {} - Show the creation form for an entity type", "entity_form".green());
    println!("  • {} - Create an entity note from its template", "entity_create".green());
    println!("  • {} - Read front matter properties of a vault file", "scan_frontmatter".green());
}
