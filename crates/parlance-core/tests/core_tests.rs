use chrono::{TimeZone, Utc};
use parlance_core::content::{decode_data_uri, detect_kind, ensure_plain_text, mime_types};
use parlance_core::*;
use tempfile::TempDir;

fn clock() -> FixedClock {
    FixedClock(Utc.with_ymd_and_hms(2025, 5, 17, 9, 30, 0).unwrap())
}

fn open_store(dir: &TempDir) -> ConversationStore {
    ConversationStore::open(dir.path().join("conversations.yaml")).unwrap()
}

// ========================================================================
// ConversationStore Tests (conversation/store.rs)
// ========================================================================

#[test]
fn test_store_round_trip_preserves_every_field() {
    let dir = TempDir::new().unwrap();
    let mut store = open_store(&dir);
    store.ensure_context("/repo", "Design Review");

    let mut user = ConversationItem::user("summarize", "openai:gpt-4.1-mini", &clock())
        .with_content(ContentItem::Image("data:image/png;base64,AAAA".into()))
        .with_content(ContentItem::Attachment(
            "data:application/pdf;base64,JVBERg==".into(),
        ));
    user.response_format = Some(r#"{"type":"json_schema"}"#.into());
    store.append("/repo", "design-review", user.clone());
    store.append(
        "/repo",
        "design-review",
        ConversationItem::assistant("done", "openai:gpt-4.1-mini", &clock()),
    );
    store.save().unwrap();

    let reloaded = open_store(&dir);
    let turns = reloaded.turns("/repo", "design-review");
    assert_eq!(turns.len(), 2);
    assert_eq!(turns[0], user);
    assert_eq!(turns[0].time, "2025-05-17T09:30:00.000Z");
    assert_eq!(turns[1].text(), "done");
}

#[test]
fn test_store_file_is_yaml_keyed_by_directory_and_slug() {
    let dir = TempDir::new().unwrap();
    let mut store = open_store(&dir);
    store.ensure_context("/repo", "Bug Hunt");
    store.save().unwrap();

    let raw = std::fs::read_to_string(dir.path().join("conversations.yaml")).unwrap();
    assert!(raw.contains("conversations:"));
    assert!(raw.contains("/repo"));
    assert!(raw.contains("bug-hunt"));
}

#[test]
fn test_store_replace_all() {
    let dir = TempDir::new().unwrap();
    let mut store = open_store(&dir);
    store.append("/a", "", ConversationItem::user("1", "m", &clock()));
    store.append("/a", "", ConversationItem::user("2", "m", &clock()));
    store.replace_all("/a", "", vec![ConversationItem::user("only", "m", &clock())]);

    let turns = store.turns("/a", "");
    assert_eq!(turns.len(), 1);
    assert_eq!(turns[0].text(), "only");
}

// ========================================================================
// ChatSession Tests (conversation/session.rs)
// ========================================================================

#[test]
fn test_session_contexts_are_isolated_per_directory() {
    let dir = TempDir::new().unwrap();
    let mut first = ChatSession::new(open_store(&dir), "/one").unwrap();
    first.append_turn(ConversationItem::user("hello one", "m", &clock()));
    first.persist(&PersistOptions::default()).unwrap();

    let mut second = ChatSession::new(open_store(&dir), "/two").unwrap();
    assert!(second.is_empty());
    second.append_turn(ConversationItem::user("hello two", "m", &clock()));
    second.persist(&PersistOptions::default()).unwrap();

    let store = open_store(&dir);
    assert_eq!(store.turns("/one", "").len(), 1);
    assert_eq!(store.turns("/two", "").len(), 1);
}

#[test]
fn test_session_reset_only_clears_active_context() {
    let dir = TempDir::new().unwrap();
    let mut session = ChatSession::new(open_store(&dir), "/repo").unwrap();
    session.append_turn(ConversationItem::user("keep", "m", &clock()));
    session.switch_context("scratch");
    session.append_turn(ConversationItem::user("drop", "m", &clock()));

    session.reset();
    assert!(session.is_empty());

    session.switch_context("");
    assert_eq!(session.turns().len(), 1);
}

#[test]
fn test_session_pseudo_exchange_overrides() {
    let dir = TempDir::new().unwrap();
    let mut session = ChatSession::new(open_store(&dir), "/repo").unwrap();
    session.append_pseudo_exchange(
        "my name is Sam",
        "openai:gpt-4.1-mini",
        &clock(),
        PseudoExchangeOptions {
            answer: Some("Noted.".into()),
            model: Some("ollama:llama3.1:8b".into()),
            time: Some("2020-01-01T00:00:00.000Z".into()),
        },
    );

    let turns = session.turns();
    assert_eq!(turns[0].text(), "my name is Sam");
    assert_eq!(turns[1].text(), "Noted.");
    assert!(turns.iter().all(|t| t.model == "ollama:llama3.1:8b"));
    assert!(turns.iter().all(|t| t.time == "2020-01-01T00:00:00.000Z"));
}

// ========================================================================
// Content Tests (content/)
// ========================================================================

#[test]
fn test_file_bytes_classification() {
    let pdf = b"%PDF-1.4\n%\xe2\xe3\xcf\xd3\n";
    assert_eq!(detect_kind(pdf), mime_types::PDF);

    let item = ContentItem::from_file_bytes(pdf).unwrap();
    assert_eq!(item.kind(), ContentKind::Attachment);
    let (bytes, mime) = decode_data_uri(item.payload()).unwrap();
    assert_eq!(mime, mime_types::PDF);
    assert_eq!(bytes, pdf.to_vec());
}

#[test]
fn test_plain_text_of_unknown_bytes_is_lossy_utf8() {
    assert_eq!(ensure_plain_text(b"caf\xc3\xa9").unwrap(), "café");
}
