mod common;

use lifelog_mcp::mcp::{McpClient, McpServer, McpTool, McpToolResult};
use lifelog_mcp::runner::interactive_loop;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Server with a single `count` tool that records every invocation.
async fn counting_client() -> (McpClient, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let mut server = McpServer::new("counter", "0.0.1");

    let counter = Arc::clone(&calls);
    server
        .register_tool(
            McpTool {
                name: "count".to_string(),
                description: "Count invocations".to_string(),
                input_schema: json!({ "type": "object" }),
            },
            move |args: Value| {
                let counter = Arc::clone(&counter);
                async move {
                    let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
                    McpToolResult::success(json!({ "call": n, "args": args }).to_string())
                }
            },
        )
        .unwrap();

    let client = McpClient::in_process(Arc::new(server)).await.unwrap();
    (client, calls)
}

async fn run(client: &mut McpClient, input: &str) -> String {
    let mut out = Vec::new();
    interactive_loop(client, input.as_bytes(), &mut out)
        .await
        .unwrap();
    String::from_utf8(out).unwrap()
}

#[tokio::test]
async fn test_malformed_json_skips_the_call_and_prompts_again() {
    let (mut client, calls) = counting_client().await;

    let printed = run(&mut client, "count\nnot-json\nexit\n").await;

    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert!(printed.contains("arguments are not valid JSON"));
    assert_eq!(printed.matches("Tool name: ").count(), 2);
}

#[tokio::test]
async fn test_valid_call_echoes_raw_result() {
    let (mut client, calls) = counting_client().await;

    let printed = run(&mut client, "count\n{\"x\": 1}\ncount\n\nquit\n").await;

    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert!(printed.contains("\"content\""));
    assert!(printed.contains("\\\"call\\\":2"));
}

#[tokio::test]
async fn test_non_object_arguments_are_rejected_locally() {
    let (mut client, calls) = counting_client().await;

    let printed = run(&mut client, "count\n[1,2]\nexit\n").await;

    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert!(printed.contains("arguments must be a JSON object"));
}

#[tokio::test]
async fn test_unknown_tool_is_sent_and_rejected_by_server() {
    let (mut client, calls) = counting_client().await;

    let printed = run(&mut client, "missing\n{}\ncount\n{}\nexit\n").await;

    assert!(printed.contains("Unknown tool: missing"));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_list_and_blank_lines() {
    let (mut client, calls) = counting_client().await;

    let printed = run(&mut client, "\nlist\nexit\n").await;

    assert!(printed.contains("count"));
    assert!(printed.contains("Count invocations"));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_eof_ends_the_loop() {
    let (mut client, calls) = counting_client().await;

    let printed = run(&mut client, "count\n").await;

    assert!(printed.contains("Goodbye."));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    client.close().await.unwrap();
}
