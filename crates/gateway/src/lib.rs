//! HTTP gateway for ChatRelay.
//!
//! Routes:
//! - `POST /whatsapp` — inbound WhatsApp webhook (form-encoded)
//! - `GET  /ws`       — WebSocket feed of completed exchanges
//! - `GET  /health`   — liveness probe
//!
//! Built on Axum. All collaborators are constructed once in
//! [`build_state`] and shared through [`GatewayState`].

pub mod inbound;
pub mod ws;

use axum::extract::DefaultBodyLimit;
use axum::{Router, response::Json, routing::{get, post}};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::info;

use chatrelay_config::AppConfig;
use chatrelay_core::error::{DeliveryError, ProviderError, StoreError};
use chatrelay_core::event::EventBus;
use chatrelay_core::store::AuditStore;
use chatrelay_pipeline::{CompletionDispatcher, ExchangePipeline, SideEffectMode};

const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Failures while assembling or running the gateway.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("Completion provider setup failed: {0}")]
    Provider(#[from] ProviderError),

    #[error("Audit store setup failed: {0}")]
    Store(#[from] StoreError),

    #[error("Messaging gateway setup failed: {0}")]
    Messaging(#[from] DeliveryError),

    #[error("Server error: {0}")]
    Io(#[from] std::io::Error),
}

/// Shared application state for the gateway.
pub struct GatewayState {
    pub pipeline: Arc<ExchangePipeline>,
    pub events: Arc<EventBus>,
    pub store: Arc<dyn AuditStore>,
}

pub type SharedState = Arc<GatewayState>;

/// Build the Axum router with all gateway routes.
pub fn build_router(state: SharedState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/whatsapp", post(inbound::whatsapp_handler))
        .route("/ws", get(ws::ws_handler))
        .with_state(state)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(CorsLayer::permissive())
        .layer(tower_http::trace::TraceLayer::new_for_http())
}

/// Construct every collaborator described by `config`.
pub async fn build_state(config: &AppConfig) -> Result<SharedState, GatewayError> {
    let provider = chatrelay_providers::build_from_config(&config.completion)?;
    let tools = Arc::new(chatrelay_tools::default_registry());
    let dispatcher = CompletionDispatcher::from_config(provider, tools, &config.completion);

    let store = chatrelay_store::open_from_config(&config.store).await?;
    let messaging = chatrelay_channels::build_from_config(&config.messaging)?;
    let events = Arc::new(EventBus::new(config.gateway.broadcast_capacity));

    let mode = if config.gateway.detach_side_effects {
        SideEffectMode::Detached
    } else {
        SideEffectMode::Awaited
    };

    let pipeline = ExchangePipeline::new(
        dispatcher,
        store.clone(),
        messaging.clone(),
        events.clone(),
        &config.messaging.from,
    )
    .with_side_effect_mode(mode);

    info!(
        store = %store.name(),
        messaging = %messaging.name(),
        mode = ?mode,
        "Gateway collaborators ready"
    );

    Ok(Arc::new(GatewayState {
        pipeline: Arc::new(pipeline),
        events,
        store,
    }))
}

/// Start the gateway HTTP server.
pub async fn start(config: AppConfig) -> Result<(), GatewayError> {
    let addr = format!("{}:{}", config.gateway.host, config.gateway.port);
    let state = build_state(&config).await?;
    let app = build_router(state);

    info!(addr = %addr, "Gateway starting");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// --- Handlers ---

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inbound::{ErrorResponse, InboundResponse};
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use chatrelay_channels::LogGateway;
    use chatrelay_core::error::ProviderError;
    use chatrelay_core::message::Message;
    use chatrelay_core::provider::{Provider, ProviderRequest, ProviderResponse};
    use chatrelay_store::InMemoryStore;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    /// Answers every request with the same text, or fails.
    struct FixedProvider(Option<String>);

    #[async_trait]
    impl Provider for FixedProvider {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn complete(&self, _request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
            match &self.0 {
                Some(text) => Ok(ProviderResponse {
                    message: Message::assistant(text),
                    usage: None,
                    model: "fixed".into(),
                }),
                None => Err(ProviderError::AuthenticationFailed("bad key".into())),
            }
        }
    }

    struct Fixture {
        state: SharedState,
        store: Arc<InMemoryStore>,
        messaging: Arc<LogGateway>,
    }

    fn fixture(reply: Option<&str>) -> Fixture {
        let store = Arc::new(InMemoryStore::new());
        let messaging = Arc::new(LogGateway::recording());
        let events = Arc::new(EventBus::default());
        let dispatcher = CompletionDispatcher::new(
            Arc::new(FixedProvider(reply.map(String::from))),
            Arc::new(chatrelay_tools::default_registry()),
            "gpt-3.5-turbo",
        );
        let pipeline = ExchangePipeline::new(
            dispatcher,
            store.clone(),
            messaging.clone(),
            events.clone(),
            "whatsapp:+14155238886",
        )
        .with_side_effect_mode(SideEffectMode::Awaited);
        let state = Arc::new(GatewayState {
            pipeline: Arc::new(pipeline),
            events,
            store: store.clone(),
        });
        Fixture { state, store, messaging }
    }

    fn form_request(body: &'static str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/whatsapp")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body))
            .unwrap()
    }

    async fn body_bytes(response: axum::response::Response) -> Vec<u8> {
        response.into_body().collect().await.unwrap().to_bytes().to_vec()
    }

    #[tokio::test]
    async fn health_endpoint() {
        let app = build_router(fixture(Some("hi")).state);
        let req = Request::builder().uri("/health").body(Body::empty()).unwrap();

        let response = app.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json: serde_json::Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
        assert_eq!(json["status"], "ok");
    }

    #[tokio::test]
    async fn whatsapp_returns_reply_and_runs_side_effects() {
        let fx = fixture(Some("Hello from the bot"));
        let app = build_router(fx.state.clone());

        let response = app
            .oneshot(form_request("From=whatsapp%3A%2B15550001111&Body=++hello++"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body: InboundResponse = serde_json::from_slice(&body_bytes(response).await).unwrap();
        assert_eq!(
            body,
            InboundResponse {
                message_sent: "hello".into(),
                reply: "Hello from the bot".into(),
            }
        );

        assert_eq!(fx.store.records().await.len(), 1);
        let sent = fx.messaging.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "whatsapp:+15550001111");
        assert_eq!(sent[0].from, "whatsapp:+14155238886");
    }

    #[tokio::test]
    async fn missing_body_defaults_to_empty() {
        let fx = fixture(Some("ok"));
        let app = build_router(fx.state.clone());

        let response = app.oneshot(form_request("From=whatsapp%3A%2B1")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body: InboundResponse = serde_json::from_slice(&body_bytes(response).await).unwrap();
        assert_eq!(body.message_sent, "");
    }

    #[tokio::test]
    async fn missing_from_is_bad_request() {
        let fx = fixture(Some("ok"));
        let app = build_router(fx.state.clone());

        let response = app.oneshot(form_request("Body=hello")).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let err: ErrorResponse = serde_json::from_slice(&body_bytes(response).await).unwrap();
        assert_eq!(err.kind, "invalid_request");
        assert!(fx.store.records().await.is_empty());
    }

    #[tokio::test]
    async fn dispatch_failure_is_bad_gateway() {
        let fx = fixture(None);
        let app = build_router(fx.state.clone());

        let response = app
            .oneshot(form_request("From=whatsapp%3A%2B1&Body=hello"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

        let err: ErrorResponse = serde_json::from_slice(&body_bytes(response).await).unwrap();
        assert_eq!(err.kind, "completion_unavailable");
        assert!(fx.store.records().await.is_empty());
        assert!(fx.messaging.sent().is_empty());
    }

    #[tokio::test]
    async fn ws_route_exists() {
        let app = build_router(fixture(Some("hi")).state);
        let req = Request::builder().uri("/ws").body(Body::empty()).unwrap();

        let response = app.oneshot(req).await.unwrap();
        // Without upgrade headers the handshake is refused, but the route is there
        assert_ne!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn cors_allows_any_origin() {
        let app = build_router(fixture(Some("hi")).state);
        let req = Request::builder()
            .uri("/health")
            .header(header::ORIGIN, "https://dashboard.example")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(req).await.unwrap();
        assert_eq!(
            response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
            "*"
        );
    }

    #[tokio::test]
    async fn build_state_from_memory_config() {
        let mut config = AppConfig::default();
        config.store.backend = "memory".into();
        let state = build_state(&config).await.unwrap();
        assert_eq!(state.store.name(), "in_memory");
        assert_eq!(state.pipeline.side_effect_mode(), SideEffectMode::Detached);
    }
}
