/// Main entry point for the Condition Journal MCP server
///
/// This file sets up logging, parses command line arguments, opens the store
/// and starts the MCP server. The server listens for JSON-RPC requests over
/// stdin/stdout following the MCP protocol.

use clap::Parser;
use std::path::{Path, PathBuf};
use tracing::info;

use condition_journal_mcp::{BackendKind, JournalServer, StoreConfig};

/// Get the default database path with robust fallback strategy
fn get_default_database_path() -> Result<PathBuf, Box<dyn std::error::Error>> {
    // Try various locations in order of preference
    let potential_paths = [
        dirs::home_dir().map(|p| p.join(".condition_journal")),
        dirs::data_dir().map(|p| p.join("condition_journal")),
        dirs::config_dir().map(|p| p.join("condition_journal")),
        std::env::current_dir()
            .ok()
            .map(|p| p.join(".condition_journal")),
    ];

    for dir in potential_paths.iter().flatten() {
        if is_writable_dir(dir) {
            return Ok(dir.join("journal.db"));
        }
    }

    // Ultimate fallback: use a temporary directory
    let temp_dir = std::env::temp_dir().join("condition_journal");
    std::fs::create_dir_all(&temp_dir)?;

    tracing::warn!("Using temporary directory for database: {}", temp_dir.display());
    Ok(temp_dir.join("journal.db"))
}

/// Create `dir` if needed and check a file can be written in it
fn is_writable_dir(dir: &Path) -> bool {
    if std::fs::create_dir_all(dir).is_err() {
        return false;
    }
    let marker = dir.join(".test_write");
    let writable = std::fs::write(&marker, "test").is_ok();
    let _ = std::fs::remove_file(&marker);
    writable
}

/// Command line arguments for the Condition Journal MCP server
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the database file
    /// If not provided, uses a default location in the user's home directory
    #[arg(long)]
    database: Option<PathBuf>,

    /// Storage backend; `auto` falls back to a JSON key-value file next to
    /// the database when SQLite cannot be opened
    #[arg(long, value_enum, default_value_t = BackendKind::Auto)]
    backend: BackendKind,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Enable verbose output (implies debug)
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let log_level = if args.verbose {
        "debug"
    } else if args.debug {
        "info"
    } else {
        "warn"
    };

    tracing_subscriber::fmt()
        .with_env_filter(format!("condition_journal_mcp={}", log_level))
        .with_writer(std::io::stderr) // stdout carries JSON-RPC
        .init();

    info!("Starting Condition Journal MCP server");

    let db_path = match args.database {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                if !parent.exists() {
                    std::fs::create_dir_all(parent)?;
                }
            }
            path
        }
        None => get_default_database_path()?,
    };

    info!("Using database at: {}", db_path.display());

    let server = JournalServer::new(StoreConfig::new(args.backend, db_path))?;

    // Run the MCP server - this will handle JSON-RPC communication over stdin/stdout
    server.run().await?;

    info!("Condition Journal MCP server shutdown complete");
    Ok(())
}
