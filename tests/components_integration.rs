//! Cross-component integration tests
//!
//! These tests run the real HTTP server on a loopback listener and exercise
//! the registry, dispatcher, and WebSocket handshake through the public
//! surface. No external services are required.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use futures::{SinkExt, StreamExt};
use serde_json::json;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use hirely_realtime_service::auth::Claims;
use hirely_realtime_service::config::{
    ApiConfig, JwtConfig, ServerConfig, Settings, WebSocketConfig,
};
use hirely_realtime_service::push::PushEvent;
use hirely_realtime_service::registry::SocketRegistry;
use hirely_realtime_service::server::{create_app, AppState};
use hirely_realtime_service::websocket::ServerMessage;

const JWT_SECRET: &str = "integration-test-secret";

fn test_settings(api_key: Option<&str>) -> Settings {
    Settings {
        server: ServerConfig::default(),
        jwt: JwtConfig {
            secret: JWT_SECRET.to_string(),
            issuer: None,
            audience: None,
        },
        api: ApiConfig {
            key: api_key.map(String::from),
        },
        websocket: WebSocketConfig::default(),
    }
}

/// Spin up the app on an ephemeral port and return its base address
async fn spawn_app(state: AppState) -> String {
    let app = create_app(state);
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr.to_string()
}

fn make_token(user_id: &str, exp_offset_secs: i64) -> String {
    let now = Utc::now().timestamp();
    let claims = Claims {
        sub: user_id.to_string(),
        exp: now + exp_offset_secs,
        iat: now,
        roles: vec!["seeker".to_string()],
        extra: HashMap::new(),
    };
    jsonwebtoken::encode(
        &jsonwebtoken::Header::default(),
        &claims,
        &jsonwebtoken::EncodingKey::from_secret(JWT_SECRET.as_bytes()),
    )
    .unwrap()
}

// =============================================================================
// Registry + Dispatcher Integration Tests
// =============================================================================

mod registry_tests {
    use super::*;

    #[tokio::test]
    async fn test_multi_device_lifecycle() {
        let registry = Arc::new(SocketRegistry::new());
        let (tx_phone, _rx_phone) = mpsc::channel(8);
        let (tx_laptop, _rx_laptop) = mpsc::channel(8);

        let phone = registry.register("seeker-42".to_string(), tx_phone);
        let laptop = registry.register("seeker-42".to_string(), tx_laptop);

        assert!(registry.is_online("seeker-42"));
        assert_eq!(registry.user_sockets("seeker-42").len(), 2);
        assert_eq!(
            registry.find_user_by_socket(phone.id),
            Some("seeker-42".to_string())
        );

        registry.unregister("seeker-42", phone.id);
        assert!(registry.is_online("seeker-42"));

        registry.unregister("seeker-42", laptop.id);
        assert!(!registry.is_online("seeker-42"));
        assert!(registry.users().is_empty());
    }

    #[tokio::test]
    async fn test_dispatch_reaches_every_device() {
        let registry = Arc::new(SocketRegistry::new());
        let dispatcher =
            hirely_realtime_service::push::PushDispatcher::new(registry.clone());

        let (tx1, mut rx1) = mpsc::channel(8);
        let (tx2, mut rx2) = mpsc::channel(8);
        registry.register("recruiter-7".to_string(), tx1);
        registry.register("recruiter-7".to_string(), tx2);

        let event = PushEvent::new(
            "application.submitted",
            json!({"job_id": "job-9", "applicant": "seeker-42"}),
        );
        let result = dispatcher.emit_to_user("recruiter-7", event).await;

        assert_eq!(result.delivered, 2);
        for rx in [&mut rx1, &mut rx2] {
            match rx.recv().await {
                Some(ServerMessage::Event { event }) => {
                    assert_eq!(event.event, "application.submitted");
                }
                other => panic!("expected event, got {:?}", other),
            }
        }
    }

    #[tokio::test]
    async fn test_concurrent_register_unregister() {
        let registry = Arc::new(SocketRegistry::new());

        let mut handles = Vec::new();
        for i in 0..10 {
            let registry = registry.clone();
            handles.push(tokio::spawn(async move {
                let user = format!("user-{}", i % 3);
                for _ in 0..20 {
                    let (tx, _rx) = mpsc::channel(1);
                    let handle = registry.register(user.clone(), tx);
                    registry.unregister(&user, handle.id);
                }
            }));
        }

        for handle in handles {
            handle.await.unwrap();
        }

        // Every registered socket was also unregistered
        assert_eq!(registry.stats().total_sockets, 0);
        assert_eq!(registry.stats().unique_users, 0);
    }
}

// =============================================================================
// HTTP API Integration Tests
// =============================================================================

mod http_api_tests {
    use super::*;

    #[tokio::test]
    async fn test_health_endpoint() {
        let state = AppState::new(test_settings(None));
        let addr = spawn_app(state).await;

        let response = reqwest::get(format!("http://{}/health", addr)).await.unwrap();
        assert_eq!(response.status(), 200);

        let body: serde_json::Value = response.json().await.unwrap();
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["connections"]["total_sockets"], 0);
    }

    #[tokio::test]
    async fn test_stats_endpoint() {
        let state = AppState::new(test_settings(None));
        let addr = spawn_app(state).await;

        let response = reqwest::get(format!("http://{}/stats", addr)).await.unwrap();
        assert_eq!(response.status(), 200);

        let body: serde_json::Value = response.json().await.unwrap();
        assert_eq!(body["events"]["total_emitted"], 0);
        assert_eq!(body["connections"]["unique_users"], 0);
    }

    #[tokio::test]
    async fn test_metrics_endpoint() {
        let state = AppState::new(test_settings(None));
        let addr = spawn_app(state).await;

        let response = reqwest::get(format!("http://{}/metrics", addr)).await.unwrap();
        assert_eq!(response.status(), 200);

        let body = response.text().await.unwrap();
        assert!(body.contains("hirely_sockets_total"));
    }

    #[tokio::test]
    async fn test_presence_endpoint() {
        let state = AppState::new(test_settings(None));
        let registry = state.registry.clone();
        let addr = spawn_app(state).await;

        let url = format!("http://{}/api/v1/presence/seeker-42", addr);

        let response = reqwest::get(&url).await.unwrap();
        let body: serde_json::Value = response.json().await.unwrap();
        assert_eq!(body["online"], false);
        assert_eq!(body["socket_count"], 0);

        let (tx, _rx) = mpsc::channel(8);
        let handle = registry.register("seeker-42".to_string(), tx);

        let response = reqwest::get(&url).await.unwrap();
        let body: serde_json::Value = response.json().await.unwrap();
        assert_eq!(body["online"], true);
        assert_eq!(body["socket_count"], 1);
        assert_eq!(body["sockets"][0], handle.id.to_string());
    }

    #[tokio::test]
    async fn test_emit_to_user_over_http() {
        let state = AppState::new(test_settings(None));
        let registry = state.registry.clone();
        let addr = spawn_app(state).await;

        let (tx, mut rx) = mpsc::channel(8);
        registry.register("seeker-42".to_string(), tx);

        let response = reqwest::Client::new()
            .post(format!("http://{}/api/v1/emit/user", addr))
            .json(&json!({
                "user_id": "seeker-42",
                "event": "message.received",
                "payload": {"from": "recruiter-7", "preview": "Hi!"},
                "correlation_id": "conv-123"
            }))
            .send()
            .await
            .unwrap();

        assert_eq!(response.status(), 200);
        let body: serde_json::Value = response.json().await.unwrap();
        assert_eq!(body["delivered"], 1);
        assert_eq!(body["failed"], 0);

        match rx.recv().await {
            Some(ServerMessage::Event { event }) => {
                assert_eq!(event.event, "message.received");
                assert_eq!(event.payload["from"], "recruiter-7");
                assert_eq!(event.correlation_id.as_deref(), Some("conv-123"));
            }
            other => panic!("expected event, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_emit_to_socket_over_http() {
        let state = AppState::new(test_settings(None));
        let registry = state.registry.clone();
        let addr = spawn_app(state).await;

        let (tx1, mut rx1) = mpsc::channel(8);
        let (tx2, mut rx2) = mpsc::channel(8);
        let phone = registry.register("seeker-42".to_string(), tx1);
        registry.register("seeker-42".to_string(), tx2);

        let response = reqwest::Client::new()
            .post(format!("http://{}/api/v1/emit/socket", addr))
            .json(&json!({
                "socket_id": phone.id,
                "event": "session.expiring",
            }))
            .send()
            .await
            .unwrap();

        assert_eq!(response.status(), 200);
        let body: serde_json::Value = response.json().await.unwrap();
        assert_eq!(body["delivered"], 1);

        assert!(rx1.recv().await.is_some());
        assert!(rx2.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_emit_rejects_invalid_event_name() {
        let state = AppState::new(test_settings(None));
        let addr = spawn_app(state).await;

        let response = reqwest::Client::new()
            .post(format!("http://{}/api/v1/emit/user", addr))
            .json(&json!({
                "user_id": "seeker-42",
                "event": "not a valid event name!",
            }))
            .send()
            .await
            .unwrap();

        assert_eq!(response.status(), 400);
        let body: serde_json::Value = response.json().await.unwrap();
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_emit_requires_api_key_when_configured() {
        let state = AppState::new(test_settings(Some("secret-key")));
        let addr = spawn_app(state).await;
        let url = format!("http://{}/api/v1/emit/user", addr);
        let payload = json!({
            "user_id": "seeker-42",
            "event": "message.received",
        });

        // Without the key
        let response = reqwest::Client::new()
            .post(&url)
            .json(&payload)
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 401);

        // With the wrong key
        let response = reqwest::Client::new()
            .post(&url)
            .header("X-API-Key", "wrong")
            .json(&payload)
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 401);

        // With the right key
        let response = reqwest::Client::new()
            .post(&url)
            .header("X-API-Key", "secret-key")
            .json(&payload)
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 200);
    }

    #[tokio::test]
    async fn test_presence_is_open_when_api_key_configured() {
        let state = AppState::new(test_settings(Some("secret-key")));
        let addr = spawn_app(state).await;

        // Only the emit routes sit behind the key
        let response = reqwest::get(format!("http://{}/api/v1/presence/anyone", addr))
            .await
            .unwrap();
        assert_eq!(response.status(), 200);
    }
}

// =============================================================================
// WebSocket Integration Tests
// =============================================================================

mod websocket_tests {
    use super::*;
    use tokio_tungstenite::tungstenite::client::IntoClientRequest;
    use tokio_tungstenite::tungstenite::{Error as WsError, Message};
    use tokio_tungstenite::connect_async;

    #[tokio::test]
    async fn test_handshake_rejected_without_token() {
        let state = AppState::new(test_settings(None));
        let addr = spawn_app(state).await;

        let result = connect_async(format!("ws://{}/ws", addr)).await;
        match result {
            Err(WsError::Http(response)) => {
                assert_eq!(response.status(), 401);
            }
            other => panic!("expected HTTP 401, got {:?}", other.map(|_| "connected")),
        }
    }

    #[tokio::test]
    async fn test_handshake_rejected_with_invalid_token() {
        let state = AppState::new(test_settings(None));
        let addr = spawn_app(state).await;

        let result = connect_async(format!("ws://{}/ws?token=garbage", addr)).await;
        match result {
            Err(WsError::Http(response)) => {
                assert_eq!(response.status(), 401);
            }
            other => panic!("expected HTTP 401, got {:?}", other.map(|_| "connected")),
        }
    }

    #[tokio::test]
    async fn test_handshake_rejected_with_expired_token() {
        let state = AppState::new(test_settings(None));
        let addr = spawn_app(state).await;

        let token = make_token("seeker-42", -3600);
        let result = connect_async(format!("ws://{}/ws?token={}", addr, token)).await;
        match result {
            Err(WsError::Http(response)) => {
                assert_eq!(response.status(), 401);
            }
            other => panic!("expected HTTP 401, got {:?}", other.map(|_| "connected")),
        }
    }

    #[tokio::test]
    async fn test_connect_receives_greeting_and_pong() {
        let state = AppState::new(test_settings(None));
        let registry = state.registry.clone();
        let addr = spawn_app(state).await;

        let token = make_token("seeker-42", 3600);
        let (mut ws, _) = connect_async(format!("ws://{}/ws?token={}", addr, token))
            .await
            .unwrap();

        // First frame is the connected greeting
        let frame = ws.next().await.unwrap().unwrap();
        let socket_id = match frame {
            Message::Text(text) => {
                let msg: ServerMessage = serde_json::from_str(&text).unwrap();
                match msg {
                    ServerMessage::Connected { user_id, socket_id } => {
                        assert_eq!(user_id, "seeker-42");
                        socket_id
                    }
                    other => panic!("expected connected, got {:?}", other),
                }
            }
            other => panic!("expected text frame, got {:?}", other),
        };

        // The server now sees the user online via that socket
        assert!(registry.is_online("seeker-42"));
        assert_eq!(
            registry.find_user_by_socket(socket_id),
            Some("seeker-42".to_string())
        );

        // Application-level ping comes back as pong with a timestamp
        ws.send(Message::Text(r#"{"type":"ping"}"#.into()))
            .await
            .unwrap();
        let frame = ws.next().await.unwrap().unwrap();
        match frame {
            Message::Text(text) => {
                let msg: ServerMessage = serde_json::from_str(&text).unwrap();
                assert!(matches!(msg, ServerMessage::Pong { .. }));
            }
            other => panic!("expected text frame, got {:?}", other),
        }

        // Closing the socket takes the user offline
        ws.close(None).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        assert!(!registry.is_online("seeker-42"));
    }

    #[tokio::test]
    async fn test_token_accepted_via_authorization_header() {
        let state = AppState::new(test_settings(None));
        let addr = spawn_app(state).await;

        let token = make_token("recruiter-7", 3600);
        let mut request = format!("ws://{}/ws", addr).into_client_request().unwrap();
        request.headers_mut().insert(
            "Authorization",
            format!("Bearer {}", token).parse().unwrap(),
        );

        let (mut ws, _) = connect_async(request).await.unwrap();

        let frame = ws.next().await.unwrap().unwrap();
        match frame {
            Message::Text(text) => {
                let msg: ServerMessage = serde_json::from_str(&text).unwrap();
                match msg {
                    ServerMessage::Connected { user_id, .. } => {
                        assert_eq!(user_id, "recruiter-7");
                    }
                    other => panic!("expected connected, got {:?}", other),
                }
            }
            other => panic!("expected text frame, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_push_arrives_over_websocket() {
        let state = AppState::new(test_settings(None));
        let dispatcher = state.dispatcher.clone();
        let addr = spawn_app(state).await;

        let token = make_token("seeker-42", 3600);
        let (mut ws, _) = connect_async(format!("ws://{}/ws?token={}", addr, token))
            .await
            .unwrap();

        // Drain the greeting
        let _ = ws.next().await.unwrap().unwrap();

        let event = PushEvent::new("job.posted", json!({"job_id": "job-1", "title": "Rust Engineer"}));
        let result = dispatcher.emit_to_user("seeker-42", event).await;
        assert_eq!(result.delivered, 1);

        let frame = ws.next().await.unwrap().unwrap();
        match frame {
            Message::Text(text) => {
                let msg: ServerMessage = serde_json::from_str(&text).unwrap();
                match msg {
                    ServerMessage::Event { event } => {
                        assert_eq!(event.event, "job.posted");
                        assert_eq!(event.payload["title"], "Rust Engineer");
                    }
                    other => panic!("expected event, got {:?}", other),
                }
            }
            other => panic!("expected text frame, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_malformed_client_message_gets_error_frame() {
        let state = AppState::new(test_settings(None));
        let addr = spawn_app(state).await;

        let token = make_token("seeker-42", 3600);
        let (mut ws, _) = connect_async(format!("ws://{}/ws?token={}", addr, token))
            .await
            .unwrap();

        // Drain the greeting
        let _ = ws.next().await.unwrap().unwrap();

        ws.send(Message::Text("this is not json".into())).await.unwrap();

        let frame = ws.next().await.unwrap().unwrap();
        match frame {
            Message::Text(text) => {
                let msg: ServerMessage = serde_json::from_str(&text).unwrap();
                match msg {
                    ServerMessage::Error { code, .. } => {
                        assert_eq!(code, "INVALID_MESSAGE");
                    }
                    other => panic!("expected error, got {:?}", other),
                }
            }
            other => panic!("expected text frame, got {:?}", other),
        }
    }
}
