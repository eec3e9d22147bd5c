/// MCP server implementation that handles JSON-RPC communication
///
/// This module implements the actual MCP server that:
/// 1. Reads JSON-RPC requests line by line from stdin
/// 2. Dispatches tool calls to the journal tools
/// 3. Sends JSON-RPC responses to stdout

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Map, Value};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, error, info, warn};

use crate::mcp::protocol::*;
use crate::storage::{JournalStore, StorageError};
use crate::tools::{self, ToolResponse};
use crate::{JournalServer, ServerError};

/// MCP server that handles communication with the client
pub struct McpServer {
    /// The underlying journal server
    journal: JournalServer,
    /// Whether the client has sent `initialized`
    initialized: bool,
}

impl McpServer {
    /// Create a new MCP server
    pub fn new(journal: JournalServer) -> Self {
        Self {
            journal,
            initialized: false,
        }
    }

    /// Whether the client has completed the initialize handshake
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Run the MCP server over stdin/stdout
    pub async fn run(&mut self) -> Result<(), ServerError> {
        let stdin = BufReader::new(tokio::io::stdin());
        let stdout = tokio::io::stdout();
        self.serve(stdin, stdout).await
    }

    /// Serve newline-delimited JSON-RPC from `reader`, answering on `writer`
    ///
    /// Returns when the reader reaches end of input.
    pub async fn serve<R, W>(&mut self, mut reader: R, mut writer: W) -> Result<(), ServerError>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        info!("Starting MCP server, waiting for JSON-RPC requests...");

        let mut line = String::new();

        loop {
            line.clear();

            match reader.read_line(&mut line).await {
                Ok(0) => {
                    info!("MCP server shutting down (input closed)");
                    break;
                }
                Ok(_) => {
                    if let Some(response) = self.process_line(&line) {
                        let response_str = serde_json::to_string(&response)?;

                        writer.write_all(response_str.as_bytes()).await?;
                        writer.write_all(b"\n").await?;
                        writer.flush().await?;

                        debug!("Sent response: {}", response_str);
                    }
                }
                Err(e) => {
                    error!("Failed to read request: {}", e);
                    break;
                }
            }
        }

        Ok(())
    }

    /// Process a single line of JSON-RPC input
    ///
    /// Returns `None` for blank lines and notifications.
    pub fn process_line(&mut self, line: &str) -> Option<JsonRpcResponse> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }

        debug!("Processing request: {}", line);

        let request: JsonRpcRequest = match serde_json::from_str(line) {
            Ok(req) => req,
            Err(e) => {
                error!("Failed to parse JSON-RPC request: {}", e);
                return Some(JsonRpcResponse::error(
                    Value::Null,
                    error_codes::PARSE_ERROR,
                    format!("Invalid JSON: {}", e),
                    None,
                ));
            }
        };

        self.handle_request(request)
    }

    /// Handle a parsed JSON-RPC request
    fn handle_request(&mut self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        if request.method == "notifications/initialized" || request.method == "initialized" {
            self.initialized = true;
            return request
                .id
                .map(|id| JsonRpcResponse::success(id, Value::Null));
        }

        if request.is_notification() {
            debug!("Ignoring notification: {}", request.method);
            return None;
        }
        let id = request.id.clone().unwrap_or(Value::Null);

        if request.jsonrpc != "2.0" {
            return Some(JsonRpcResponse::error(
                id,
                error_codes::INVALID_REQUEST,
                format!("Unsupported JSON-RPC version '{}'", request.jsonrpc),
                None,
            ));
        }

        let response = match request.method.as_str() {
            "initialize" => self.handle_initialize(id, request.params),
            "ping" => JsonRpcResponse::success(id, json!({})),
            "tools/list" => self.handle_tools_list(id),
            "tools/call" => self.handle_tools_call(id, request.params),
            _ => JsonRpcResponse::error(
                id,
                error_codes::METHOD_NOT_FOUND,
                format!("Method '{}' not found", request.method),
                None,
            ),
        };

        Some(response)
    }

    /// Handle MCP initialization request
    fn handle_initialize(&mut self, id: Value, params: Option<Value>) -> JsonRpcResponse {
        let params: InitializeParams = params
            .and_then(|p| serde_json::from_value(p).ok())
            .unwrap_or_default();

        match &params.client_info {
            Some(client) => info!(
                "MCP client connected: {} {}",
                client.name,
                client.version.as_deref().unwrap_or("")
            ),
            None => info!("MCP client connected"),
        }
        if let Some(version) = params.protocol_version.as_deref().filter(|v| *v != MCP_VERSION) {
            warn!("Client requested protocol {}, answering with {}", version, MCP_VERSION);
        }

        let result = InitializeResult {
            protocol_version: MCP_VERSION.to_string(),
            capabilities: ServerCapabilities {
                tools: Some(ToolsCapability {
                    list_changed: false,
                }),
            },
            server_info: ServerInfo {
                name: "Condition Journal MCP".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
        };

        to_response(id, &result)
    }

    /// Handle tools/list request
    fn handle_tools_list(&self, id: Value) -> JsonRpcResponse {
        to_response(id, &json!({ "tools": tool_definitions() }))
    }

    /// Handle tools/call request
    fn handle_tools_call(&self, id: Value, params: Option<Value>) -> JsonRpcResponse {
        let tool_params: ToolCallParams = match params {
            Some(params) => match serde_json::from_value(params) {
                Ok(p) => p,
                Err(e) => {
                    return JsonRpcResponse::error(
                        id,
                        error_codes::INVALID_PARAMS,
                        format!("Invalid parameters: {}", e),
                        None,
                    );
                }
            },
            None => {
                return JsonRpcResponse::error(
                    id,
                    error_codes::INVALID_PARAMS,
                    "Missing parameters".to_string(),
                    None,
                );
            }
        };

        let store = self.journal.storage();
        let args = tool_params.arguments;

        let result = match tool_params.name.as_str() {
            "condition_log_get" => run_tool(args, |p| tools::get_condition_log(store, p)),
            "condition_log_save" => run_tool(args, |p| tools::save_condition_log(store, p)),
            "condition_calendar" => run_tool(args, |p| tools::condition_calendar(store, p)),
            "condition_backfill" => run_tool(args, |p| tools::condition_backfill(store, p)),
            "medication_list" => run_tool(args, |p| tools::list_medications(store, p)),
            "medication_save" => run_tool(args, |p| tools::save_medication(store, p)),
            "medication_delete" => run_tool(args, |p| tools::delete_medication(store, p)),
            _ => ToolCallResult::error(format!("Unknown tool: {}", tool_params.name)),
        };

        debug!(
            "Tool {} finished via {} store (error: {})",
            tool_params.name,
            store.backend_name(),
            result.is_error
        );

        to_response(id, &result)
    }
}

/// Every tool this server offers, with schemas generated from the
/// parameter structs
pub fn tool_definitions() -> Vec<ToolDefinition> {
    vec![
        ToolDefinition::for_params::<tools::GetConditionLogParams>(
            "condition_log_get",
            "Read the condition log for a day (symptom levels, condition scores, blood pressure, memo)",
        ),
        ToolDefinition::for_params::<tools::SaveConditionLogParams>(
            "condition_log_save",
            "Save the condition log for a day; omitted fields keep their current value",
        ),
        ToolDefinition::for_params::<tools::CalendarParams>(
            "condition_calendar",
            "Show a month (or date span) of days with their good/caution/poor status",
        ),
        ToolDefinition::for_params::<tools::BackfillParams>(
            "condition_backfill",
            "Create default logs for days without one (defaults to the past year)",
        ),
        ToolDefinition::for_params::<tools::ListMedicationsParams>(
            "medication_list",
            "List all medications, newest first",
        ),
        ToolDefinition::for_params::<tools::SaveMedicationParams>(
            "medication_save",
            "Add a medication, or update one by id",
        ),
        ToolDefinition::for_params::<tools::DeleteMedicationParams>(
            "medication_delete",
            "Delete a medication by id",
        ),
    ]
}

/// Deserialize tool arguments, run the tool and wrap its outcome
fn run_tool<P, R>(
    args: Map<String, Value>,
    tool: impl FnOnce(P) -> Result<R, StorageError>,
) -> ToolCallResult
where
    P: DeserializeOwned,
    R: ToolResponse,
{
    let params: P = match serde_json::from_value(Value::Object(args)) {
        Ok(params) => params,
        Err(e) => {
            return ToolCallResult {
                error_code: Some(error_codes::INVALID_PARAMS),
                ..ToolCallResult::error(format!("Invalid arguments: {}", e))
            }
        }
    };

    match tool(params) {
        Ok(response) => ToolCallResult::with_structured(response.message().to_string(), &response),
        Err(e) => {
            if e.is_validation() {
                debug!("Tool rejected input: {}", e);
            } else {
                warn!("Tool failed: {}", e);
            }
            ToolCallResult::storage_error(&e)
        }
    }
}

fn to_response(id: Value, result: &impl Serialize) -> JsonRpcResponse {
    match serde_json::to_value(result) {
        Ok(value) => JsonRpcResponse::success(id, value),
        Err(e) => JsonRpcResponse::error(
            id,
            error_codes::INTERNAL_ERROR,
            format!("Failed to serialize result: {}", e),
            None,
        ),
    }
}
