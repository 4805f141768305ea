use std::io::{BufRead, BufReader, Read, Write};
use std::net::TcpListener;
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;

use chrono::{TimeZone, Utc};
use parlance_core::llm::{OllamaAdapter, OpenAIAdapter};
use parlance_core::*;
use serde_json::{json, Value};
use tempfile::TempDir;

/// What the stub server saw for one request.
struct Captured {
    request_line: String,
    headers: Vec<String>,
    body: Value,
}

/// Serves the canned `(status, body)` replies in order, one per connection.
fn stub_server(replies: Vec<(u16, String)>) -> (String, mpsc::Receiver<Captured>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());
    let (tx, rx) = mpsc::channel();

    thread::spawn(move || {
        for (status, reply) in replies {
            let (stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream.try_clone().unwrap());

            let mut request_line = String::new();
            reader.read_line(&mut request_line).unwrap();
            let mut headers = Vec::new();
            let mut content_length = 0;
            loop {
                let mut line = String::new();
                reader.read_line(&mut line).unwrap();
                let line = line.trim_end().to_string();
                if line.is_empty() {
                    break;
                }
                if let Some((name, value)) = line.split_once(':') {
                    if name.eq_ignore_ascii_case("content-length") {
                        content_length = value.trim().parse().unwrap();
                    }
                }
                headers.push(line);
            }
            let mut body = vec![0; content_length];
            reader.read_exact(&mut body).unwrap();

            let _ = tx.send(Captured {
                request_line: request_line.trim_end().to_string(),
                headers,
                body: serde_json::from_slice(&body).unwrap_or(Value::Null),
            });

            let mut stream = stream;
            write!(
                stream,
                "HTTP/1.1 {} Stub\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                reply.len(),
                reply
            )
            .unwrap();
            stream.flush().unwrap();
        }
    });

    (url, rx)
}

fn clock() -> Arc<dyn Clock> {
    Arc::new(FixedClock(Utc.with_ymd_and_hms(2025, 2, 3, 4, 5, 6).unwrap()))
}

fn openai_reply(text: &str) -> String {
    json!({
        "model": "gpt-4.1-mini",
        "choices": [{"message": {"role": "assistant", "content": text}}]
    })
    .to_string()
}

fn openai_client(url: &str) -> AiClient {
    let adapter = OpenAIAdapter::new("sk-test", "gpt-4.1-mini")
        .unwrap()
        .with_base_url(url);
    AiClient::new(Box::new(adapter)).unwrap().with_clock(clock())
}

fn session(dir: &TempDir) -> ChatSession {
    let store = ConversationStore::open(dir.path().join("conversations.yaml")).unwrap();
    ChatSession::new(store, "/work/app").unwrap()
}

// ========================================================================
// Chat Tests (llm/client.rs)
// ========================================================================

#[test]
fn test_chat_records_exchange_and_persists() {
    let (url, requests) = stub_server(vec![(200, openai_reply("Hello there"))]);
    let dir = TempDir::new().unwrap();
    let mut session = session(&dir);
    let client = openai_client(&url).with_system_prompt(" Be terse.\n");

    let reply = client
        .chat(&mut session, "hi", &ChatOptions::default())
        .unwrap();
    assert_eq!(reply.reply, "Hello there");
    assert_eq!(reply.history[0].text(), "Be terse.");
    assert_eq!(reply.history.len(), 3);
    assert_eq!(reply.history[0].role, Role::System);
    assert_eq!(reply.history[1].role, Role::User);
    assert_eq!(reply.history[2].role, Role::Assistant);
    assert_eq!(reply.history[2].model, "openai:gpt-4.1-mini");
    assert_eq!(reply.history[2].time, "2025-02-03T04:05:06.000Z");

    let captured = requests.recv().unwrap();
    assert_eq!(captured.request_line, "POST /v1/chat/completions HTTP/1.1");
    assert!(captured
        .headers
        .iter()
        .any(|h| h.eq_ignore_ascii_case("authorization: Bearer sk-test")));
    assert_eq!(captured.body["messages"].as_array().unwrap().len(), 2);
    assert_eq!(captured.body["temperature"], 0.3);

    let reloaded = ConversationStore::open(dir.path().join("conversations.yaml")).unwrap();
    assert_eq!(reloaded.turns("/work/app", ""), reply.history.as_slice());
}

#[test]
fn test_chat_sends_prior_history() {
    let (url, requests) = stub_server(vec![
        (200, openai_reply("first")),
        (200, openai_reply("second")),
    ]);
    let dir = TempDir::new().unwrap();
    let mut session = session(&dir);
    let client = openai_client(&url);

    client
        .chat(&mut session, "one", &ChatOptions::default())
        .unwrap();
    let reply = client
        .chat(&mut session, "two", &ChatOptions::default())
        .unwrap();
    assert_eq!(reply.history.len(), 4);

    let _ = requests.recv().unwrap();
    let second = requests.recv().unwrap();
    let messages = second.body["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 3);
    assert_eq!(messages[1]["content"][0]["text"], "first");
}

#[test]
fn test_chat_failure_leaves_context_untouched() {
    let (url, _requests) = stub_server(vec![(500, r#"{"error":"boom"}"#.to_string())]);
    let dir = TempDir::new().unwrap();
    let mut session = session(&dir);
    let client = openai_client(&url).with_system_prompt("Be terse.");

    let err = client
        .chat(&mut session, "hi", &ChatOptions::default())
        .unwrap_err();
    match err {
        ParlanceError::Http { status, body } => {
            assert_eq!(status, 500);
            assert!(body.contains("boom"));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(session.is_empty());
    assert!(!dir.path().join("conversations.yaml").exists());
}

#[test]
fn test_chat_no_save_keeps_memory_only() {
    let (url, _requests) = stub_server(vec![(200, openai_reply("ok"))]);
    let dir = TempDir::new().unwrap();
    let mut session = session(&dir);

    let options = ChatOptions {
        no_save: true,
        ..Default::default()
    };
    openai_client(&url)
        .chat(&mut session, "hi", &options)
        .unwrap();
    assert_eq!(session.turns().len(), 2);
    assert!(!dir.path().join("conversations.yaml").exists());
}

#[test]
fn test_chat_with_schema_records_format_on_user_turn() {
    let (url, requests) = stub_server(vec![(200, openai_reply(r#"{"answer":4}"#))]);
    let dir = TempDir::new().unwrap();
    let mut session = session(&dir);

    let options = ChatOptions {
        response_schema: Some(ResponseSchema::new(json!({
            "type": "object",
            "properties": {"answer": {"type": "integer"}}
        }))),
        ..Default::default()
    };
    let reply = openai_client(&url)
        .chat(&mut session, "2+2?", &options)
        .unwrap();

    let recorded: Value =
        serde_json::from_str(reply.history[0].response_format.as_ref().unwrap()).unwrap();
    assert_eq!(recorded["type"], "json_schema");

    let captured = requests.recv().unwrap();
    assert_eq!(captured.body["response_format"], recorded);
}

#[test]
fn test_unsupported_attachment_rejected_before_sending() {
    let dir = TempDir::new().unwrap();
    let mut session = session(&dir);
    let client = AiClient::new(Box::new(OllamaAdapter::new("llama3.1:8b").unwrap()))
        .unwrap()
        .with_clock(clock());

    let options = ChatOptions {
        files: vec![b"%PDF-1.4\n".to_vec()],
        ..Default::default()
    };
    let err = client.chat(&mut session, "read this", &options).unwrap_err();
    assert!(matches!(
        err,
        ParlanceError::UnsupportedContentKind {
            kind: ContentKind::Attachment,
            ..
        }
    ));
    assert!(session.is_empty());
}

// ========================================================================
// Prompt Tests (llm/client.rs)
// ========================================================================

#[test]
fn test_prompt_ollama_round_trip() {
    let reply = json!({
        "model": "llama3.1:8b",
        "message": {"role": "assistant", "content": "Paris"},
        "done": true
    })
    .to_string();
    let (url, requests) = stub_server(vec![(200, reply)]);
    let adapter = OllamaAdapter::new("llama3.1:8b").unwrap().with_base_url(&url);
    let client = AiClient::new(Box::new(adapter))
        .unwrap()
        .with_clock(clock())
        .with_temperature(0.0);

    let options = PromptOptions {
        system_prompt: Some("  Answer in one word.\n".into()),
        ..Default::default()
    };
    let reply = client.prompt("Capital of France?", &options).unwrap();
    assert_eq!(reply.content, "Paris");
    assert_eq!(reply.model, "llama3.1:8b");

    let captured = requests.recv().unwrap();
    assert_eq!(captured.request_line, "POST /api/chat HTTP/1.1");
    assert_eq!(captured.body["stream"], false);
    assert_eq!(captured.body["options"]["temperature"], 0.0);
    assert_eq!(captured.body["messages"][0]["role"], "system");
    assert_eq!(captured.body["messages"][0]["content"], "Answer in one word.");
    assert_eq!(captured.body["messages"][1]["content"], "Capital of France?");
}

// ========================================================================
// Model Listing Tests (llm/client.rs)
// ========================================================================

#[test]
fn test_list_models_single_provider() {
    let body = json!({"data": [
        {"id": "gpt-4o", "owned_by": "system"},
        {"id": "whisper-1", "owned_by": "openai-internal"}
    ]})
    .to_string();
    let (url, requests) = stub_server(vec![(200, body)]);

    let models = openai_client(&url).list_models().unwrap();
    assert_eq!(models, vec![AIModel::new(ProviderId::OpenAI, "gpt-4o")]);
    assert_eq!(requests.recv().unwrap().request_line, "GET /v1/models HTTP/1.1");
}

#[test]
fn test_list_models_skips_unconfigured_providers() {
    let tags = json!({"models": [{"name": "qwen2.5:7b"}, {"name": "Llama3.1:8b"}]}).to_string();
    let (url, _requests) = stub_server(vec![(200, tags)]);

    // No API key: OpenAI is skipped, Ollama is listed through the override.
    let settings = Settings {
        model: Some("ollama:llama3.1:8b".into()),
        base_url: Some(url),
        ..Default::default()
    };
    let names: Vec<String> = list_models(&settings)
        .iter()
        .map(ToString::to_string)
        .collect();
    assert_eq!(names, vec!["ollama:llama3.1:8b", "ollama:qwen2.5:7b"]);
}
