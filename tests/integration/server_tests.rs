/// MCP server end-to-end tests
use condition_journal_mcp::mcp::protocol::{error_codes, JsonRpcResponse};
use condition_journal_mcp::mcp::McpServer;
use condition_journal_mcp::*;
use serde_json::{json, Value};
use tempfile::TempDir;

fn server() -> (TempDir, McpServer) {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let journal = JournalServer::new(StoreConfig::new(
        BackendKind::Sqlite,
        dir.path().join("journal.db"),
    ))
    .expect("Failed to create server");
    (dir, McpServer::new(journal))
}

fn call(server: &mut McpServer, id: i64, tool: &str, arguments: Value) -> Value {
    let request = json!({
        "jsonrpc": "2.0",
        "id": id,
        "method": "tools/call",
        "params": { "name": tool, "arguments": arguments }
    });
    let response = server
        .process_line(&request.to_string())
        .expect("tools/call must be answered");
    assert!(response.error.is_none(), "{:?}", response.error);
    response.result.expect("tools/call result")
}

#[tokio::test]
async fn test_initialize_and_list_tools_over_a_stream() {
    let (_dir, mut server) = server();

    let input = [
        json!({"jsonrpc": "2.0", "id": 1, "method": "initialize", "params": {
            "protocolVersion": "2024-11-05",
            "capabilities": {},
            "clientInfo": {"name": "test-client", "version": "1.0"}
        }}),
        json!({"jsonrpc": "2.0", "method": "notifications/initialized"}),
        json!({"jsonrpc": "2.0", "id": 2, "method": "tools/list"}),
    ]
    .iter()
    .map(Value::to_string)
    .collect::<Vec<_>>()
    .join("\n");

    let mut output = Vec::new();
    server
        .serve(tokio::io::BufReader::new(input.as_bytes()), &mut output)
        .await
        .unwrap();
    assert!(server.is_initialized());

    let responses: Vec<JsonRpcResponse> = String::from_utf8(output)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    // The notification is not answered
    assert_eq!(responses.len(), 2);

    let init = responses[0].result.as_ref().unwrap();
    assert_eq!(init["protocolVersion"], "2024-11-05");
    assert_eq!(init["serverInfo"]["name"], "Condition Journal MCP");

    let tools = responses[1].result.as_ref().unwrap()["tools"].as_array().unwrap().clone();
    let names: Vec<&str> = tools.iter().map(|t| t["name"].as_str().unwrap()).collect();
    assert_eq!(
        names,
        vec![
            "condition_log_get",
            "condition_log_save",
            "condition_calendar",
            "condition_backfill",
            "medication_list",
            "medication_save",
            "medication_delete",
        ]
    );
    let save_schema = &tools[5]["inputSchema"];
    assert!(save_schema["properties"]["medication_name"].is_object());
}

#[tokio::test]
async fn test_condition_log_save_and_calendar() {
    let (_dir, mut server) = server();

    let saved = call(
        &mut server,
        1,
        "condition_log_save",
        json!({
            "date": "2025-01-15",
            "headache_level": 3,
            "seizure_level": 4,
            "right_side_level": 3,
            "left_side_level": 3,
            "speech_impairment_level": 4,
            "memory_impairment_level": 4,
            "physical_condition": "350",
            "mental_condition": "not a number"
        }),
    );
    assert_eq!(saved["isError"], false);
    let log = &saved["structuredContent"]["log"];
    assert_eq!(log["physical_condition"], 200);
    assert_eq!(log["mental_condition"], 0);
    assert_eq!(saved["structuredContent"]["status"], "caution");

    let fetched = call(&mut server, 2, "condition_log_get", json!({"date": "2025-01-15"}));
    assert_eq!(fetched["structuredContent"]["found"], true);

    let calendar = call(&mut server, 3, "condition_calendar", json!({"month": "2025-01"}));
    let summary = &calendar["structuredContent"]["report"]["summary"];
    assert_eq!(summary["caution"], 1);
    assert_eq!(summary["missing"], 30);
}

#[tokio::test]
async fn test_invalid_level_is_reported_as_tool_error() {
    let (_dir, mut server) = server();

    let result = call(
        &mut server,
        1,
        "condition_log_save",
        json!({"date": "2025-01-15", "headache_level": 9}),
    );
    assert_eq!(result["isError"], true);
    assert_eq!(result["errorCode"], error_codes::VALIDATION_ERROR);

    let fetched = call(&mut server, 2, "condition_log_get", json!({"date": "2025-01-15"}));
    assert_eq!(fetched["structuredContent"]["found"], false);
}

#[tokio::test]
async fn test_medication_tools() {
    let (_dir, mut server) = server();

    let created = call(
        &mut server,
        1,
        "medication_save",
        json!({"medication_name": "Levetiracetam", "dosage": "500mg", "intake_timing": 3}),
    );
    let id = created["structuredContent"]["medication"]["id"].as_i64().unwrap();

    let updated = call(
        &mut server,
        2,
        "medication_save",
        json!({"id": id, "medication_name": "Levetiracetam", "dosage": "750mg", "intake_timing": 9}),
    );
    assert_eq!(updated["structuredContent"]["medication"]["dosage"], "750mg");

    let missing = call(
        &mut server,
        3,
        "medication_save",
        json!({"id": id + 100, "medication_name": "Nothing"}),
    );
    assert_eq!(missing["errorCode"], error_codes::MEDICATION_NOT_FOUND);

    let blank = call(&mut server, 4, "medication_save", json!({"medication_name": "  "}));
    assert_eq!(blank["isError"], true);

    let listed = call(&mut server, 5, "medication_list", json!({}));
    assert_eq!(listed["structuredContent"]["medications"].as_array().unwrap().len(), 1);

    call(&mut server, 6, "medication_delete", json!({"id": id}));
    let deleted_again = call(&mut server, 7, "medication_delete", json!({"id": id}));
    assert_eq!(deleted_again["isError"], false);
}

#[test]
fn test_protocol_errors() {
    let (_dir, mut server) = server();

    let parse = server.process_line("{not json").unwrap();
    assert_eq!(parse.error.unwrap().code, error_codes::PARSE_ERROR);

    let unknown = server
        .process_line(r#"{"jsonrpc":"2.0","id":1,"method":"resources/list"}"#)
        .unwrap();
    assert_eq!(unknown.error.unwrap().code, error_codes::METHOD_NOT_FOUND);

    let missing = server
        .process_line(r#"{"jsonrpc":"2.0","id":2,"method":"tools/call"}"#)
        .unwrap();
    assert_eq!(missing.error.unwrap().code, error_codes::INVALID_PARAMS);

    let bad_args = call(&mut server, 3, "medication_delete", json!({"id": "seven"}));
    assert_eq!(bad_args["errorCode"], error_codes::INVALID_PARAMS);

    assert!(server.process_line("   ").is_none());
}

#[test]
fn test_backfill_tool_with_explicit_span() {
    let (_dir, mut server) = server();

    let result = call(
        &mut server,
        1,
        "condition_backfill",
        json!({"start": "2025-02-01", "end": "2025-02-28"}),
    );
    assert_eq!(result["structuredContent"]["inserted"], 28);

    let result = tokio_test::block_on(async {
        call(&mut server, 2, "condition_backfill", json!({"start": "2025-02-01", "end": "2025-02-28"}))
    });
    assert_eq!(result["structuredContent"]["inserted"], 0);
}

#[test]
fn test_backfill_tool_rejects_spans_over_a_year() {
    let (_dir, mut server) = server();

    let result = call(
        &mut server,
        1,
        "condition_backfill",
        json!({"start": "1900-01-01", "end": "2025-01-01"}),
    );
    assert_eq!(result["isError"], true);
    assert_eq!(result["errorCode"], error_codes::VALIDATION_ERROR);
}

#[test]
fn test_blood_pressure_can_be_cleared_with_null() {
    let (_dir, mut server) = server();

    call(
        &mut server,
        1,
        "condition_log_save",
        json!({"date": "2025-01-15", "blood_pressure_systolic": 120}),
    );
    let cleared = call(
        &mut server,
        2,
        "condition_log_save",
        json!({"date": "2025-01-15", "blood_pressure_systolic": null}),
    );
    assert_eq!(cleared["structuredContent"]["log"]["blood_pressure_systolic"], Value::Null);
}
