//! Integration tests for MCP server functionality
//!
//! These tests drive the server over in-memory streams against a store
//! populated by the importer.

use async_trait::async_trait;
use gradebook::mcp::McpServer;
use gradebook::translate::SqlTranslator;
use gradebook::{Importer, Store};
use serde_json::{json, Value};
use tempfile::tempdir;

const SAMPLE_CSV: &str = "\
id,first_name,last_name,course_name,grade
1,Ann,Lee,Math,3.5
2,Bo,Kim,Physics,2.0
3,Cy,Doe,Math,4.0
";

/// Translator that answers every question with the same model output
struct FixedTranslator(&'static str);

#[async_trait]
impl SqlTranslator for FixedTranslator {
    async fn complete(&self, _question: &str, _schema: &str) -> gradebook::Result<String> {
        Ok(self.0.to_string())
    }

    fn model(&self) -> &str {
        "fixed"
    }
}

fn create_test_server() -> McpServer {
    let store = Store::open_memory().unwrap();
    let stats = Importer::new(&store)
        .import_reader(SAMPLE_CSV.as_bytes())
        .unwrap();
    assert_eq!(stats.rows_imported, 3);
    McpServer::with_store(store)
}

/// Send one JSON-RPC line per request and collect the response lines
async fn exchange(server: &McpServer, requests: &[Value]) -> Vec<Value> {
    let input: String = requests
        .iter()
        .map(|r| format!("{}\n", r))
        .collect();
    let mut output = Vec::new();

    server.serve(input.as_bytes(), &mut output).await.unwrap();

    String::from_utf8(output)
        .unwrap()
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect()
}

fn call(id: i64, method: &str, params: Value) -> Value {
    json!({ "jsonrpc": "2.0", "id": id, "method": method, "params": params })
}

#[tokio::test]
async fn test_handshake_and_listing() {
    let server = create_test_server();
    let responses = exchange(
        &server,
        &[
            call(1, "initialize", json!({})),
            json!({ "jsonrpc": "2.0", "method": "notifications/initialized" }),
            call(2, "tools/list", json!({})),
            call(3, "resources/list", json!({})),
            call(4, "resources/templates/list", json!({})),
            call(5, "prompts/list", json!({})),
        ],
    )
    .await;

    assert_eq!(responses.len(), 5);
    assert_eq!(responses[0]["result"]["protocolVersion"], "2024-11-05");

    let tools: Vec<&str> = responses[1]["result"]["tools"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["name"].as_str().unwrap())
        .collect();
    assert_eq!(tools, vec!["execute_query", "ask_database"]);

    let resources = responses[2]["result"]["resources"].as_array().unwrap();
    assert!(resources.iter().any(|r| r["uri"] == "database://csv"));

    let templates = responses[3]["result"]["resourceTemplates"].as_array().unwrap();
    assert!(templates
        .iter()
        .any(|t| t["uriTemplate"] == "database://csv/{table_name}/columns"));

    assert_eq!(
        responses[4]["result"]["prompts"][0]["name"],
        "ask_database_prompt"
    );
}

#[tokio::test]
async fn test_execute_query_tool() {
    let server = create_test_server();
    let responses = exchange(
        &server,
        &[
            call(
                1,
                "tools/call",
                json!({ "name": "execute_query", "arguments": { "sql_query": "SELECT COUNT(*) FROM students" } }),
            ),
            call(
                2,
                "tools/call",
                json!({ "name": "execute_query", "arguments": { "sql_query": "SELECT first_name FROM students WHERE course_name = 'Math' ORDER BY student_id" } }),
            ),
            call(
                3,
                "tools/call",
                json!({ "name": "execute_query", "arguments": { "sql_query": "DROP TABLES everything" } }),
            ),
        ],
    )
    .await;

    assert_eq!(responses[0]["result"]["content"][0]["text"], "3");
    assert_eq!(responses[1]["result"]["content"][0]["text"], "Ann\nCy");
    let error_text = responses[2]["result"]["content"][0]["text"].as_str().unwrap();
    assert!(error_text.starts_with("SQL execution error:"));
}

#[tokio::test]
async fn test_read_resources() {
    let server = create_test_server();
    let responses = exchange(
        &server,
        &[
            call(1, "resources/read", json!({ "uri": "database://csv" })),
            call(2, "resources/read", json!({ "uri": "database://csv/students/columns" })),
            call(3, "resources/read", json!({ "uri": "database://csv/students/grade/data" })),
            call(4, "resources/read", json!({ "uri": "database://csv/students/all/data" })),
            call(5, "resources/read", json!({ "uri": "database://csv/nowhere/columns" })),
        ],
    )
    .await;

    let text = |i: usize| responses[i]["result"]["contents"][0]["text"].as_str().unwrap().to_string();

    assert_eq!(text(0), r#"["students"]"#);
    assert_eq!(
        text(1),
        r#"["student_id","first_name","last_name","course_name","grade"]"#
    );
    assert_eq!(text(2), "3.5\n2.0\n4.0");
    assert!(text(3).starts_with("student_id: 1, first_name: Ann, last_name: Lee, course_name: Math, grade: 3.5"));
    assert_eq!(text(3).lines().count(), 3);
    assert_eq!(text(4), "No columns found for table nowhere.");
}

#[tokio::test]
async fn test_question_without_translator() {
    let server = create_test_server();
    let responses = exchange(
        &server,
        &[
            call(
                1,
                "tools/call",
                json!({ "name": "ask_database", "arguments": { "question": "How many students?" } }),
            ),
            call(
                2,
                "prompts/get",
                json!({ "name": "ask_database_prompt", "arguments": { "question": "How many students?" } }),
            ),
        ],
    )
    .await;

    let text = responses[0]["result"]["content"][0]["text"].as_str().unwrap();
    assert!(text.contains("GOOGLE_API_KEY"));
    assert_eq!(responses[1]["error"]["code"], -32000);
}

#[tokio::test]
async fn test_question_with_translator() {
    let server = create_test_server().with_translator(Box::new(FixedTranslator(
        "Sure!\n```sql\nSELECT AVG(grade) FROM students WHERE course_name = 'Math'\n```",
    )));
    let responses = exchange(
        &server,
        &[
            call(
                1,
                "tools/call",
                json!({ "name": "ask_database", "arguments": { "question": "Average Math grade?" } }),
            ),
            call(
                2,
                "resources/read",
                json!({ "uri": "database://csv/query/Average%20Math%20grade%3F" }),
            ),
            call(
                3,
                "prompts/get",
                json!({ "name": "ask_database_prompt", "arguments": { "question": "Average Math grade?" } }),
            ),
        ],
    )
    .await;

    assert_eq!(responses[0]["result"]["content"][0]["text"], "3.75");
    assert_eq!(responses[1]["result"]["contents"][0]["text"], "3.75");
    assert_eq!(
        responses[2]["result"]["messages"][0]["content"]["text"],
        "SELECT AVG(grade) FROM students WHERE course_name = 'Math'"
    );
}

#[tokio::test]
async fn test_server_over_imported_file() {
    let dir = tempdir().unwrap();
    let csv_path = dir.path().join("data.csv");
    let db_path = dir.path().join("csv.db");
    std::fs::write(&csv_path, SAMPLE_CSV).unwrap();

    let store = Store::open(&db_path).unwrap();
    Importer::new(&store).import_file(&csv_path).unwrap();
    store.close().unwrap();

    let server = McpServer::new(&db_path).unwrap();
    let responses = exchange(
        &server,
        &[call(1, "resources/read", json!({ "uri": "database://csv/students/rows" }))],
    )
    .await;

    let rows: Value =
        serde_json::from_str(responses[0]["result"]["contents"][0]["text"].as_str().unwrap())
            .unwrap();
    assert_eq!(rows.as_array().unwrap().len(), 3);
    assert_eq!(rows[0], json!([1, "Ann", "Lee", "Math", 3.5]));
}
