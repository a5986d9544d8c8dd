//! Integration test: run a stub of the Ollama HTTP API on a free port and drive
//! the real client and session against it. Does not require Ollama.

use std::sync::{Arc, Mutex};

use axum::{extract::State, http::StatusCode, routing::get, routing::post, Json, Router};
use serde_json::{json, Value};

use sigma::{BackendError, ChatMessage, Error, ModelBackend, OllamaClient, Session};

#[derive(Clone, Default)]
struct Received {
    chats: Arc<Mutex<Vec<Value>>>,
}

async fn tags() -> Json<Value> {
    Json(json!({
        "models": [
            {
                "name": "llama3:latest",
                "size": 4661224676u64,
                "modified_at": "2024-05-01T10:00:00Z"
            },
            { "name": "mistral:latest", "size": 4109865159u64 },
        ]
    }))
}

async fn chat(
    State(received): State<Received>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    received.chats.lock().unwrap().push(body.clone());

    let model = body["model"].as_str().unwrap_or_default().to_string();
    match model.as_str() {
        "llama3:latest" | "mistral:latest" => {
            let prompt = body["messages"][0]["content"].as_str().unwrap_or_default();
            let content = if prompt == "hello" {
                "Hi there".to_string()
            } else {
                format!("{model}: {prompt}")
            };
            (
                StatusCode::OK,
                Json(json!({
                    "model": model,
                    "message": { "role": "assistant", "content": content },
                    "done": true,
                })),
            )
        }
        "broken:latest" => (StatusCode::OK, Json(json!({ "done": true }))),
        _ => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": format!("model \"{model}\" not found, try pulling it first") })),
        ),
    }
}

async fn spawn_stub() -> (String, Received) {
    let received = Received::default();
    let router = Router::new()
        .route("/api/tags", get(tags))
        .route("/api/chat", post(chat))
        .with_state(received.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind stub");
    let addr = listener.local_addr().expect("local_addr");
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });
    (format!("http://{}", addr), received)
}

#[tokio::test]
async fn lists_models_in_server_order_with_metadata() {
    let (url, _) = spawn_stub().await;
    let client = OllamaClient::new(&format!("{}/", url)).expect("client");
    assert_eq!(client.base_url(), url);

    let models = client.list_models().await.expect("list models");
    let names: Vec<&str> = models.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(names, ["llama3:latest", "mistral:latest"]);
    assert_eq!(models[0].display_size().as_deref(), Some("4.7 GB"));
    assert_eq!(models[0].modified_at.as_deref(), Some("2024-05-01T10:00:00Z"));
    assert_eq!(models[1].modified_at, None);
}

#[tokio::test]
async fn chat_sends_one_user_message_without_streaming() {
    let (url, received) = spawn_stub().await;
    let client = OllamaClient::new(&url).expect("client");

    let reply = client
        .chat("mistral:latest", &[ChatMessage::user("hello")])
        .await
        .expect("chat");
    assert_eq!(reply, "Hi there");

    let chats = received.chats.lock().unwrap().clone();
    assert_eq!(
        chats,
        [json!({
            "model": "mistral:latest",
            "messages": [{ "role": "user", "content": "hello" }],
            "stream": false,
        })]
    );
}

#[tokio::test]
async fn unknown_model_surfaces_the_server_error() {
    let (url, _) = spawn_stub().await;
    let client = OllamaClient::new(&url).expect("client");

    let err = client
        .chat("phi3:latest", &[ChatMessage::user("hello")])
        .await
        .unwrap_err();
    match err {
        BackendError::Status { status, message } => {
            assert_eq!(status.as_u16(), 404);
            assert_eq!(message, "model \"phi3:latest\" not found, try pulling it first");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn reply_without_message_is_invalid() {
    let (url, _) = spawn_stub().await;
    let client = OllamaClient::new(&url).expect("client");

    let err = client
        .chat("broken:latest", &[ChatMessage::user("hello")])
        .await
        .unwrap_err();
    assert!(matches!(err, BackendError::InvalidResponse(_)), "{err}");
}

#[tokio::test]
async fn session_over_http_records_the_exchange() {
    let (url, received) = spawn_stub().await;
    let client = OllamaClient::new(&url).expect("client");
    let mut session = Session::start(Arc::new(client), Some("mistral:latest"))
        .await
        .expect("start session");

    session.submit("hello").await.expect("first answer");
    assert_eq!(
        session.conversation().all(),
        [ChatMessage::user("hello"), ChatMessage::assistant("Hi there")]
    );

    assert!(session.select_model_by_name("llama3:latest"));
    session.submit("again").await.expect("second answer");
    assert_eq!(
        session.conversation().last(),
        Some(&ChatMessage::assistant("llama3:latest: again"))
    );

    let models: Vec<String> = received
        .chats
        .lock()
        .unwrap()
        .iter()
        .map(|c| c["model"].as_str().unwrap_or_default().to_string())
        .collect();
    assert_eq!(models, ["mistral:latest", "llama3:latest"]);
}

#[tokio::test]
async fn absent_server_fails_startup() {
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind free port");
        listener.local_addr().expect("local_addr").port()
    };
    let url = format!("http://127.0.0.1:{}", port);

    let client = OllamaClient::new(&url).expect("client");
    let err = Session::start(Arc::new(client), None)
        .await
        .err()
        .expect("startup should fail");
    match err {
        Error::BackendUnavailable { url: reported, source } => {
            assert_eq!(reported, url);
            assert!(matches!(source, BackendError::Request(_)));
        }
        other => panic!("unexpected error: {other}"),
    }
}
