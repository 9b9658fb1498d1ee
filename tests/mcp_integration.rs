//! Testes de integração do servidor MCP sobre um Google Chat em memória.

mod common;

use std::sync::Arc;

use serde_json::{json, Value};

use common::{FailingChat, InMemoryChat};
use gchat_mcp::mcp::{
    JsonRpcId, JsonRpcRequest, McpServer, ToolHandler, ToolResult, Transport, INVALID_PARAMS,
    INVALID_REQUEST, METHOD_NOT_FOUND, PARSE_ERROR,
};
use gchat_mcp::{Config, GchatError};

fn handler(chat: InMemoryChat) -> (Arc<InMemoryChat>, ToolHandler) {
    let chat = Arc::new(chat);
    let handler = ToolHandler::with_api(chat.clone(), &Config::default_config());
    (chat, handler)
}

fn payload(result: &ToolResult) -> Value {
    result.json().expect("tool result is JSON")
}

/// Roda o servidor sobre `input` e devolve cada linha de saída como JSON.
async fn run_server(input: &str, tools: ToolHandler) -> Vec<Value> {
    run_server_bytes(input.as_bytes(), tools).await
}

async fn run_server_bytes(input: &[u8], tools: ToolHandler) -> Vec<Value> {
    let mut output = Vec::new();
    {
        let transport = Transport::new(input, &mut output);
        let mut server = McpServer::new(transport, tools);
        server.run().await.unwrap();
    }

    String::from_utf8(output)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}

fn request(id: i64, method: &str, params: Value) -> JsonRpcRequest {
    JsonRpcRequest::new(method, Some(JsonRpcId::Number(id))).with_params(params)
}

// ═══════════════════════════════════════════════════════════════════════════
// Protocolo
// ═══════════════════════════════════════════════════════════════════════════

mod protocol_tests {
    use super::*;

    fn server() -> McpServer<&'static [u8], Vec<u8>> {
        let (_, tools) = handler(InMemoryChat::with_messages("A", &[]));
        McpServer::new(Transport::new(&b""[..], Vec::new()), tools)
    }

    #[tokio::test]
    async fn test_initialize_negotiates_version() {
        let mut server = server();
        let response = server
            .handle_request(request(
                1,
                "initialize",
                json!({
                    "protocolVersion": "2024-11-05",
                    "capabilities": {},
                    "clientInfo": {"name": "test-client", "version": "1.0"}
                }),
            ))
            .await
            .unwrap();

        let result = response.result.unwrap();
        assert_eq!(result["protocolVersion"], "2024-11-05");
        assert_eq!(result["serverInfo"]["name"], "gchat-mcp");
        assert!(server.is_initialized());
    }

    #[tokio::test]
    async fn test_notification_has_no_response() {
        let mut server = server();
        let notification = JsonRpcRequest::new("notifications/initialized", None);
        assert!(server.handle_request(notification).await.is_none());
    }

    #[tokio::test]
    async fn test_ping_and_unknown_method() {
        let mut server = server();

        let pong = server.handle_request(request(1, "ping", json!({}))).await.unwrap();
        assert!(!pong.is_error());

        let unknown = server
            .handle_request(request(2, "resources/list", json!({})))
            .await
            .unwrap();
        assert_eq!(unknown.error.unwrap().code, METHOD_NOT_FOUND);
    }

    #[tokio::test]
    async fn test_tools_list_has_all_tools() {
        let mut server = server();
        let response = server
            .handle_request(request(1, "tools/list", json!({})))
            .await
            .unwrap();

        let result = response.result.unwrap();
        let names: Vec<&str> = result["tools"]
            .as_array()
            .unwrap()
            .iter()
            .map(|t| t["name"].as_str().unwrap())
            .collect();

        for expected in [
            "gchat_send_message",
            "gchat_reply_to_thread",
            "gchat_list_messages",
            "gchat_get_message",
            "gchat_update_message",
            "gchat_delete_message",
            "gchat_list_spaces",
            "gchat_get_space",
            "gchat_create_space",
            "gchat_search_messages",
            "gchat_list_members",
        ] {
            assert!(names.contains(&expected), "missing {expected}");
        }
    }

    #[tokio::test]
    async fn test_unknown_tool_is_invalid_params() {
        let mut server = server();
        let response = server
            .handle_request(request(
                1,
                "tools/call",
                json!({"name": "gchat_teleport", "arguments": {}}),
            ))
            .await
            .unwrap();
        assert_eq!(response.error.unwrap().code, INVALID_PARAMS);

        let missing = server
            .handle_request(JsonRpcRequest::new("tools/call", Some(2.into())))
            .await
            .unwrap();
        assert_eq!(missing.error.unwrap().code, INVALID_PARAMS);
    }

    #[tokio::test]
    async fn test_shutdown_clears_initialized() {
        let mut server = server();
        server
            .handle_request(request(1, "initialize", json!({})))
            .await
            .unwrap();
        server
            .handle_request(request(2, "shutdown", json!({})))
            .await
            .unwrap();
        assert!(!server.is_initialized());
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Loop stdio
// ═══════════════════════════════════════════════════════════════════════════

mod stdio_tests {
    use super::*;

    #[tokio::test]
    async fn test_run_answers_requests_and_skips_notifications() {
        let input = concat!(
            r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{}}"#,
            "\n",
            r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#,
            "\n",
            "{not json\n",
            r#"{"jsonrpc":"2.0","id":2,"method":"tools/list"}"#,
            "\n",
        );

        let (_, tools) = handler(InMemoryChat::with_messages("A", &[]));
        let lines = run_server(input, tools).await;

        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0]["id"], 1);
        assert_eq!(lines[1]["error"]["code"], PARSE_ERROR);
        assert!(lines[1]["id"].is_null());
        assert_eq!(lines[2]["id"], 2);
        assert!(lines[2]["result"]["tools"].is_array());
    }

    #[tokio::test]
    async fn test_run_survives_non_utf8_line() {
        let mut input = b"\xff\xfe garbage\n".to_vec();
        input.extend_from_slice(br#"{"jsonrpc":"2.0","id":1,"method":"ping"}"#);
        input.push(b'\n');

        let (_, tools) = handler(InMemoryChat::new());
        let lines = run_server_bytes(&input, tools).await;

        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["error"]["code"], PARSE_ERROR);
        assert_eq!(lines[1]["id"], 1);
        assert!(lines[1]["result"].is_object());
    }

    #[tokio::test]
    async fn test_valid_json_without_method_is_invalid_request() {
        let input = concat!(
            r#"{"jsonrpc":"2.0","id":5}"#,
            "\n",
            r#"[1, 2, 3]"#,
            "\n",
        );
        let (_, tools) = handler(InMemoryChat::new());

        let lines = run_server(input, tools).await;
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["error"]["code"], INVALID_REQUEST);
        assert_eq!(lines[0]["id"], 5);
        assert_eq!(lines[1]["error"]["code"], INVALID_REQUEST);
        assert!(lines[1]["id"].is_null());
    }

    #[tokio::test]
    async fn test_run_stops_on_eof() {
        let (_, tools) = handler(InMemoryChat::new());
        assert!(run_server("", tools).await.is_empty());
    }

    #[tokio::test]
    async fn test_run_stops_after_shutdown() {
        let input = concat!(
            r#"{"jsonrpc":"2.0","id":1,"method":"shutdown"}"#,
            "\n",
            r#"{"jsonrpc":"2.0","id":2,"method":"ping"}"#,
            "\n",
        );
        let (_, tools) = handler(InMemoryChat::new());

        let lines = run_server(input, tools).await;
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0]["id"], 1);
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Ferramentas
// ═══════════════════════════════════════════════════════════════════════════

mod tool_tests {
    use super::*;

    #[tokio::test]
    async fn test_send_then_get_round_trip() {
        let (_, tools) = handler(InMemoryChat::with_messages("A", &[]));

        let sent = tools
            .handle_tool_call(
                "gchat_send_message",
                json!({"space": "A", "text": "hello team"}),
            )
            .await;
        assert!(!sent.is_error);
        let sent = payload(&sent);
        let name = sent["name"].as_str().unwrap();
        assert!(name.starts_with("spaces/A/messages/"));

        let fetched = tools
            .handle_tool_call("gchat_get_message", json!({"name": name}))
            .await;
        assert!(!fetched.is_error);
        assert_eq!(payload(&fetched)["text"], "hello team");
    }

    #[tokio::test]
    async fn test_reply_update_delete() {
        let (chat, tools) = handler(InMemoryChat::with_messages("A", &["root"]));

        let reply = tools
            .handle_tool_call(
                "gchat_reply_to_thread",
                json!({"space": "spaces/A", "thread": "incident-7", "text": "on it"}),
            )
            .await;
        let reply = payload(&reply);
        assert_eq!(reply["thread"]["threadKey"], "incident-7");

        let name = reply["name"].as_str().unwrap().to_string();
        let updated = tools
            .handle_tool_call(
                "gchat_update_message",
                json!({"name": name, "text": "on it, ETA 10m"}),
            )
            .await;
        assert_eq!(payload(&updated)["text"], "on it, ETA 10m");

        let deleted = tools
            .handle_tool_call("gchat_delete_message", json!({"name": name}))
            .await;
        assert_eq!(payload(&deleted)["deleted"], true);

        let gone = tools
            .handle_tool_call("gchat_get_message", json!({"name": name}))
            .await;
        assert!(gone.is_error);
        assert_eq!(payload(&gone)["error"]["code"], "NOT_FOUND");
        assert_eq!(chat.list_calls(), 0);
    }

    #[tokio::test]
    async fn test_validation_errors_are_invalid_query() {
        let (_, tools) = handler(InMemoryChat::with_messages("A", &[]));

        for (tool, args) in [
            ("gchat_send_message", json!({"space": "", "text": "hi"})),
            ("gchat_send_message", json!({"space": "A", "text": "   "})),
            ("gchat_send_message", json!({"space": "A"})),
            ("gchat_get_message", json!({"name": "spaces/A"})),
            ("gchat_search_messages", json!({"space": "A", "query": " "})),
            ("gchat_list_spaces", json!({"space_type": "ROOM"})),
            (
                "gchat_list_messages",
                json!({"space": "A", "start_time": "2025-05-21", "end_time": "2025-05-19"}),
            ),
        ] {
            let result = tools.handle_tool_call(tool, args.clone()).await;
            assert!(result.is_error, "{tool} {args}");
            assert_eq!(payload(&result)["error"]["code"], "INVALID_QUERY", "{tool} {args}");
        }
    }

    #[tokio::test]
    async fn test_list_messages_pagination() {
        let texts: Vec<String> = (0..5).map(|i| format!("message {i}")).collect();
        let refs: Vec<&str> = texts.iter().map(String::as_str).collect();
        let (_, tools) = handler(InMemoryChat::with_messages("A", &refs));

        let first = payload(
            &tools
                .handle_tool_call("gchat_list_messages", json!({"space": "A", "page_size": 2}))
                .await,
        );
        assert_eq!(first["messages"].as_array().unwrap().len(), 2);
        assert_eq!(first["messages"][0]["text"], "message 0");

        let token = first["next_page_token"].as_str().unwrap();
        let second = payload(
            &tools
                .handle_tool_call(
                    "gchat_list_messages",
                    json!({"space": "A", "page_size": 2, "page_token": token}),
                )
                .await,
        );
        assert_eq!(second["messages"][0]["text"], "message 2");

        let newest = payload(
            &tools
                .handle_tool_call(
                    "gchat_list_messages",
                    json!({"space": "A", "page_size": 1, "order": "desc"}),
                )
                .await,
        );
        assert_eq!(newest["messages"][0]["text"], "message 4");
    }

    #[tokio::test]
    async fn test_spaces_and_members() {
        let chat = InMemoryChat::with_messages("A", &[]);
        chat.add_member("A", "ana");
        chat.add_member("A", "bruno");
        let (_, tools) = handler(chat);

        let spaces = payload(&tools.handle_tool_call("gchat_list_spaces", json!({})).await);
        assert_eq!(spaces["spaces"][0]["name"], "spaces/A");

        let space = payload(
            &tools
                .handle_tool_call("gchat_get_space", json!({"space": "A"}))
                .await,
        );
        assert_eq!(space["displayName"], "Test space");

        let created = payload(
            &tools
                .handle_tool_call(
                    "gchat_create_space",
                    json!({"display_name": "Ops", "description": "on-call"}),
                )
                .await,
        );
        assert_eq!(created["displayName"], "Ops");
        assert_eq!(created["spaceDetails"]["description"], "on-call");

        let members = payload(
            &tools
                .handle_tool_call("gchat_list_members", json!({"space": "spaces/A"}))
                .await,
        );
        assert_eq!(members["members"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_search_messages_tool() {
        let (_, tools) = handler(InMemoryChat::with_messages(
            "A",
            &["I don't like bugs", "ship it", "I do not agree", "deploy failed"],
        ));

        let result = payload(
            &tools
                .handle_tool_call(
                    "gchat_search_messages",
                    json!({"space": "A", "query": "dont"}),
                )
                .await,
        );
        assert_eq!(result["mode"], "exact");
        assert!(result["fallback"].is_null());
        assert_eq!(result["total_scanned"], 4);
        assert_eq!(result["truncated"], false);

        let texts: Vec<&str> = result["matches"]
            .as_array()
            .unwrap()
            .iter()
            .map(|m| m["message"]["text"].as_str().unwrap())
            .collect();
        assert_eq!(texts, vec!["I don't like bugs", "I do not agree"]);
    }

    #[tokio::test]
    async fn test_search_semantic_reports_fallback() {
        let (_, tools) = handler(InMemoryChat::with_messages("A", &["deploy failed"]));

        let result = payload(
            &tools
                .handle_tool_call(
                    "gchat_search_messages",
                    json!({"space": "A", "query": "deploy", "mode": "semantic"}),
                )
                .await,
        );
        assert_eq!(result["mode"], "exact");
        assert_eq!(result["fallback"]["requested"], "semantic");
        assert_eq!(result["fallback"]["reason"], "unsupported");
        assert_eq!(result["matches"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_search_invalid_regex() {
        let (_, tools) = handler(InMemoryChat::with_messages("A", &["x"]));
        let result = tools
            .handle_tool_call(
                "gchat_search_messages",
                json!({"space": "A", "query": "[unclosed", "mode": "regex"}),
            )
            .await;
        assert!(result.is_error);
        assert_eq!(payload(&result)["error"]["code"], "INVALID_QUERY");
    }

    #[tokio::test]
    async fn test_search_zero_limit_is_rejected() {
        let (chat, tools) = handler(InMemoryChat::with_messages("A", &["deploy"]));
        let result = tools
            .handle_tool_call(
                "gchat_search_messages",
                json!({"space": "A", "query": "deploy", "limit": 0}),
            )
            .await;
        assert!(result.is_error);
        assert_eq!(payload(&result)["error"]["code"], "INVALID_QUERY");
        assert_eq!(chat.list_calls(), 0);

        let result = tools
            .handle_tool_call(
                "gchat_search_messages",
                json!({"space": "A", "query": "deploy", "limit": 1}),
            )
            .await;
        assert_eq!(payload(&result)["matches"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_search_pages_are_bounded() {
        let texts: Vec<String> = (0..12).map(|i| format!("note {i}")).collect();
        let refs: Vec<&str> = texts.iter().map(String::as_str).collect();
        let chat = Arc::new(InMemoryChat::with_messages("A", &refs));

        let mut config = Config::default_config();
        config.chat.search_page_size = 5;
        config.chat.max_search_pages = 2;
        let tools = ToolHandler::with_api(chat.clone(), &config);

        let result = payload(
            &tools
                .handle_tool_call(
                    "gchat_search_messages",
                    json!({"space": "A", "query": "note"}),
                )
                .await,
        );

        assert_eq!(chat.list_calls(), 2);
        assert_eq!(result["total_scanned"], 10);
        assert_eq!(result["truncated"], true);
        // As 10 mais recentes, em ordem cronológica
        assert_eq!(result["matches"][0]["message"]["text"], "note 2");
        assert_eq!(result["matches"][9]["message"]["text"], "note 11");
    }

    #[tokio::test]
    async fn test_error_payloads() {
        let cases: [(fn() -> GchatError, &str); 4] = [
            (|| GchatError::auth("token expired"), "AUTH_ERROR"),
            (|| GchatError::NotFound("spaces/X".into()), "NOT_FOUND"),
            (
                || GchatError::RateLimited {
                    message: "quota".into(),
                    retry_after_secs: Some(12),
                },
                "RATE_LIMITED",
            ),
            (|| GchatError::remote(Some(500), "backend"), "REMOTE_ERROR"),
        ];

        for (make, code) in cases {
            let chat = Arc::new(FailingChat { make });
            let tools = ToolHandler::with_api(chat, &Config::default_config());
            let result = tools
                .handle_tool_call("gchat_list_spaces", json!({}))
                .await;

            assert!(result.is_error);
            let error = &payload(&result)["error"];
            assert_eq!(error["code"], code);
            assert!(!error["message"].as_str().unwrap().is_empty());
            if code == "RATE_LIMITED" {
                assert_eq!(error["retry_after_secs"], 12);
            }
        }
    }
}
