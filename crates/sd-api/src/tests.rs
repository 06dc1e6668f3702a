use crate::sse::{decode_frame, StreamFrame};
use crate::transport::*;
use crate::{ApiClient, ChatRequest};
use async_trait::async_trait;
use sd_core::error::ApiError;
use sd_core::route::{Location, Navigator, Route, Router};
use sd_core::user::LoginRequest;
use sd_storage::{keys, LocalStorage};
use serde_json::json;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio_stream::StreamExt;

/// Replays canned responses in order and records every request.
#[derive(Default)]
struct FakeTransport {
    responses: Mutex<VecDeque<Result<ApiResponse, ApiError>>>,
    events: Mutex<Vec<Result<String, ApiError>>>,
    requests: Mutex<Vec<ApiRequest>>,
}

impl FakeTransport {
    fn reply(&self, status: u16, body: serde_json::Value) {
        self.responses
            .lock()
            .unwrap()
            .push_back(Ok(ApiResponse { status, body }));
    }

    fn fail(&self, error: ApiError) {
        self.responses.lock().unwrap().push_back(Err(error));
    }

    fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, ApiError> {
        self.requests.lock().unwrap().push(request);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ApiError::Network("no canned response".into())))
    }

    async fn open_events(&self, request: ApiRequest) -> Result<EventDataStream, ApiError> {
        self.requests.lock().unwrap().push(request);
        let events: Vec<_> = std::mem::take(&mut *self.events.lock().unwrap());
        Ok(Box::pin(tokio_stream::iter(events)))
    }
}

async fn setup() -> (ApiClient, Arc<FakeTransport>, Arc<Router>, LocalStorage) {
    let transport = Arc::new(FakeTransport::default());
    let router = Arc::new(Router::new(Location::new("/chat")));
    let storage = LocalStorage::open_in_memory().await.unwrap();
    let client = ApiClient::new(transport.clone(), storage.clone(), router.clone());
    (client, transport, router, storage)
}

#[tokio::test]
async fn test_bearer_token_attached_from_storage() {
    let (client, transport, _router, storage) = setup().await;
    storage.set(keys::TOKEN, "abc").await.unwrap();
    transport.reply(200, json!({"data": {"sessions": [], "total": 0}}));

    client.list_sessions(2, 5).await.unwrap();

    let req = &transport.requests()[0];
    assert_eq!(req.method, Method::Get);
    assert_eq!(req.path, "/chat/sessions");
    assert_eq!(req.bearer.as_deref(), Some("abc"));
    assert_eq!(
        req.query,
        vec![
            ("page".to_string(), "2".to_string()),
            ("page_size".to_string(), "5".to_string())
        ]
    );
}

#[tokio::test]
async fn test_no_token_means_no_bearer() {
    let (client, transport, _router, _storage) = setup().await;
    transport.reply(200, json!({"data": []}));
    client.list_ai_configs().await.unwrap();
    assert_eq!(transport.requests()[0].bearer, None);
}

#[tokio::test]
async fn test_unauthorized_clears_token_and_redirects() {
    let (client, transport, router, storage) = setup().await;
    storage.set(keys::TOKEN, "stale").await.unwrap();
    storage.set(keys::USERNAME, "a").await.unwrap();
    transport.reply(401, json!({"error": "token expired"}));

    let err = client.list_sessions(1, 10).await.unwrap_err();
    assert!(matches!(err, ApiError::Unauthorized { .. }));
    assert_eq!(err.user_message(), "token expired");

    assert_eq!(storage.get(keys::TOKEN).await.unwrap(), None);
    assert_eq!(storage.get(keys::USERNAME).await.unwrap().as_deref(), Some("a"));
    let here = router.current();
    assert_eq!(here.route, Route::Login);
    assert_eq!(here.redirect.as_deref(), Some("/chat"));
}

#[tokio::test]
async fn test_other_statuses_keep_token() {
    let (client, transport, router, storage) = setup().await;
    storage.set(keys::TOKEN, "t").await.unwrap();
    transport.reply(403, json!({"error": "forbidden"}));
    transport.reply(422, json!({"error": "title too long"}));
    transport.reply(502, serde_json::Value::Null);

    let err = client.delete_session(1).await.unwrap_err();
    assert_eq!(err, ApiError::Forbidden);

    let err = client.update_session(1, "x").await.unwrap_err();
    assert_eq!(err.user_message(), "title too long");

    let err = client.delete_ai_config(3).await.unwrap_err();
    assert_eq!(err.user_message(), "Unknown error, status code: 502");

    assert_eq!(storage.get(keys::TOKEN).await.unwrap().as_deref(), Some("t"));
    assert_eq!(router.current().route, Route::Chat);
}

#[tokio::test]
async fn test_network_error() {
    let (client, transport, _router, _storage) = setup().await;
    transport.fail(ApiError::Network("connection refused".into()));
    let err = client.list_knowledge_files(1, 10).await.unwrap_err();
    assert_eq!(err.user_message(), "Network error, please try again later");
}

#[tokio::test]
async fn test_list_sessions_server_envelope() {
    let (client, transport, _router, _storage) = setup().await;
    transport.reply(
        200,
        json!({
            "message": "ok",
            "data": {
                "total": 12,
                "page": 2,
                "pageSize": 5,
                "sessions": [
                    {"ID": 9, "title": "a", "last_message": "hi",
                     "CreatedAt": "2024-01-01T00:00:00Z", "UpdatedAt": "2024-01-02T00:00:00Z"},
                    {"ID": 8, "title": "b", "last_message": ""}
                ]
            }
        }),
    );

    let page = client.list_sessions(2, 5).await.unwrap();
    assert_eq!(page.total, 12);
    assert_eq!(page.page, 2);
    assert_eq!(page.page_size, 5);
    assert_eq!(page.items.len(), 2);
    assert_eq!(page.items[0].id, 9);
    assert_eq!(page.items[0].last_message, "hi");
}

#[tokio::test]
async fn test_list_sessions_legacy_shapes() {
    let (client, transport, _router, _storage) = setup().await;
    transport.reply(200, json!({"sessions": [{"id": 1, "title": "x"}], "total": 3}));
    transport.reply(200, json!({"data": [{"id": 2, "title": "y"}]}));
    transport.reply(200, json!({"data": {"unexpected": true}}));

    let page = client.list_sessions(1, 10).await.unwrap();
    assert_eq!(page.items[0].id, 1);
    assert_eq!(page.total, 3);

    let page = client.list_sessions(1, 10).await.unwrap();
    assert_eq!(page.items[0].id, 2);
    assert_eq!(page.total, 1);
    assert_eq!(page.page_size, 10);

    let err = client.list_sessions(1, 10).await.unwrap_err();
    assert!(matches!(err, ApiError::Decode(_)));
}

#[tokio::test]
async fn test_session_messages() {
    let (client, transport, _router, _storage) = setup().await;
    transport.reply(
        200,
        json!({"data": {"total": 2, "messages": [
            {"id": 1, "role": "user", "content": "hi", "created_at": "2024-01-01T00:00:00Z"},
            {"id": 2, "role": "assistant", "content": "hello"}
        ]}}),
    );

    let page = client.session_messages(4, 1, 20).await.unwrap();
    assert_eq!(page.items.len(), 2);
    assert_eq!(page.items[1].content, "hello");
    assert_eq!(transport.requests()[0].path, "/chat/sessions/4");
}

#[tokio::test]
async fn test_complete_parses_message_and_session() {
    let (client, transport, _router, _storage) = setup().await;
    transport.reply(
        200,
        json!({
            "data": {"id": 77, "role": "assistant", "content": "answer",
                     "created_at": "2024-01-01T00:00:00Z"},
            "session_id": 5
        }),
    );

    let req = ChatRequest {
        session_id: 5,
        message: "question".into(),
        ai_config_id: 0,
        knowledge_ids: vec![1, 2],
    };
    let completion = client.complete(&req).await.unwrap();
    let message = completion.message.unwrap();
    assert_eq!(message.id, 77);
    assert_eq!(message.content, "answer");
    assert_eq!(completion.session_id, Some(5));
    assert!(completion.session.is_none());

    match &transport.requests()[0].body {
        Body::Json(body) => {
            assert_eq!(body["knowledge_ids"], json!([1, 2]));
            assert_eq!(body["message"], "question");
        }
        other => panic!("Expected JSON body, got {other:?}"),
    }
}

#[tokio::test]
async fn test_stream_chat_frames_and_query() {
    let (client, transport, _router, storage) = setup().await;
    storage.set(keys::TOKEN, "tok").await.unwrap();
    *transport.events.lock().unwrap() = vec![
        Ok(r#"{"delta": {"content": "Hel"}}"#.into()),
        Ok(r#"{"id": "x", "content": "lo", "done": false}"#.into()),
        Ok("not json".into()),
        Ok("[DONE]".into()),
    ];

    let req = ChatRequest {
        session_id: 3,
        message: "hi there".into(),
        ai_config_id: 2,
        knowledge_ids: vec![7],
    };
    let frames: Vec<_> = client
        .stream_chat(&req)
        .await
        .unwrap()
        .collect::<Vec<_>>()
        .await;

    assert_eq!(
        frames,
        vec![
            Ok(StreamFrame::Delta("Hel".into())),
            Ok(StreamFrame::Delta("lo".into())),
            Ok(StreamFrame::Skip),
            Ok(StreamFrame::Done { session_id: None }),
        ]
    );

    let req = &transport.requests()[0];
    assert_eq!(req.path, "/chat/stream");
    assert!(req.query.contains(&("knowledge_ids".into(), "[7]".into())));
    assert!(req.query.contains(&("token".into(), "tok".into())));
    assert!(req.query.contains(&("message".into(), "hi there".into())));
}

#[tokio::test]
async fn test_stream_unauthorized_clears_token() {
    let (client, transport, router, storage) = setup().await;
    storage.set(keys::TOKEN, "old").await.unwrap();
    *transport.events.lock().unwrap() = vec![Err(ApiError::Unauthorized { server_error: None })];

    let req = ChatRequest {
        session_id: 1,
        message: "x".into(),
        ai_config_id: 0,
        knowledge_ids: vec![],
    };
    let frames: Vec<_> = client.stream_chat(&req).await.unwrap().collect::<Vec<_>>().await;
    assert_eq!(frames.len(), 1);
    assert!(frames[0].is_err());
    assert_eq!(storage.get(keys::TOKEN).await.unwrap(), None);
    assert_eq!(router.current().route, Route::Login);
}

#[tokio::test]
async fn test_login_and_verify_decoding() {
    let (client, transport, _router, _storage) = setup().await;
    transport.reply(200, json!({"token": "t", "username": "a", "email": "e"}));
    transport.reply(200, json!({"valid": false, "message": "expired"}));

    let resp = client
        .login(&LoginRequest {
            username: "a".into(),
            password: "b".into(),
        })
        .await
        .unwrap();
    assert_eq!(resp.token, "t");
    assert_eq!(resp.email, "e");

    let verify = client.verify_verification_code("e", "123456").await.unwrap();
    assert!(!verify.valid);
    assert_eq!(verify.message.as_deref(), Some("expired"));

    assert_eq!(transport.requests()[1].path, "/auth/verify-verification-code");
}

#[tokio::test]
async fn test_upload_sends_multipart_file() {
    let (client, transport, _router, _storage) = setup().await;
    transport.reply(
        200,
        json!({"data": {"id": 11, "file_name": "notes.txt", "file_size": 5,
                        "file_type": "txt", "status": "pending"}}),
    );

    let file = client
        .upload_knowledge_file("notes.txt", b"hello".to_vec())
        .await
        .unwrap();
    assert_eq!(file.id, 11);

    let req = &transport.requests()[0];
    assert_eq!(req.path, "/knowledge/upload");
    assert_eq!(
        req.body,
        Body::File {
            field: "file".into(),
            file_name: "notes.txt".into(),
            bytes: b"hello".to_vec(),
        }
    );
}

#[tokio::test]
async fn test_available_models() {
    let (client, transport, _router, _storage) = setup().await;
    transport.reply(
        200,
        json!({"data": {
            "deepseek": [{"name": "deepseek-chat", "provider": "deepseek", "description": "general"}],
            "kimi": [{"name": "moonshot-v1-8k", "provider": "kimi", "description": "8k"}]
        }}),
    );
    let catalog = client.available_models().await.unwrap();
    assert_eq!(catalog.len(), 2);
    assert_eq!(catalog["kimi"][0].name, "moonshot-v1-8k");
}

#[test]
fn test_decode_frame_shapes() {
    assert_eq!(decode_frame("[DONE]"), StreamFrame::Done { session_id: None });
    assert_eq!(decode_frame("  "), StreamFrame::Skip);
    assert_eq!(
        decode_frame(r#"{"id": "done", "content": "", "done": true, "session_id": 12}"#),
        StreamFrame::Done {
            session_id: Some(12)
        }
    );
    assert_eq!(
        decode_frame(r#"{"error": "model offline", "done": true}"#),
        StreamFrame::Failed("model offline".into())
    );
    assert_eq!(decode_frame(r#"{"delta": {}}"#), StreamFrame::Skip);
    assert_eq!(decode_frame("{broken"), StreamFrame::Skip);
}
