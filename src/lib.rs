/// Public library interface for the Condition Journal MCP server
///
/// This module exports the journal server and the public types that other
/// applications and the tests use: the domain model, the storage backends,
/// the repositories, the editing-session helpers and the calendar report.

use thiserror::Error;

pub mod domain;
pub mod mcp;
pub mod report;
pub mod repository;
pub mod session;
pub mod storage;
pub mod tools;

// Re-export public modules and types
pub use domain::*;
pub use repository::{DailyLogRepository, MedicationRepository};
pub use storage::{
    BackendKind, JournalStore, KvStore, SqliteStore, StorageError, StoreBackend, StoreConfig,
};

/// Errors that can occur during server operation
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Database error: {0}")]
    Database(#[from] storage::StorageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Main condition journal server that implements the MCP protocol
///
/// Owns the store opened at startup; every tool call goes through it.
pub struct JournalServer {
    storage: StoreBackend,
}

impl JournalServer {
    /// Open the configured store and prepare the server
    ///
    /// The schema is created or migrated before this returns.
    pub fn new(config: StoreConfig) -> Result<Self, ServerError> {
        tracing::info!(
            "Initializing Condition Journal server with {:?} backend at {:?}",
            config.backend,
            config.path
        );

        let storage = StoreBackend::open(&config)?;
        tracing::info!("Using {} storage", storage.backend_name());

        Ok(Self { storage })
    }

    /// Create a server around an already opened store
    pub fn with_storage(storage: StoreBackend) -> Self {
        Self { storage }
    }

    /// Run the MCP server, handling JSON-RPC requests over stdin/stdout
    ///
    /// This method will block until stdin is closed or an error occurs.
    pub async fn run(self) -> Result<(), ServerError> {
        tracing::info!("Starting MCP server...");

        match self.storage.list_medications() {
            Ok(medications) => tracing::info!(
                "Server started successfully, found {} existing medication(s)",
                medications.len()
            ),
            Err(e) => tracing::warn!("Server started, but medications are unreadable: {}", e),
        }

        let mut mcp_server = mcp::McpServer::new(self);
        mcp_server.run().await?;

        Ok(())
    }

    /// Get a reference to the storage layer (useful for testing)
    pub fn storage(&self) -> &StoreBackend {
        &self.storage
    }
}
