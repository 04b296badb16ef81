//! Shared harness for HTTP-level tests.
//!
//! Builds the full router over the in-memory repository with a stepping
//! clock and an in-memory notifier, and issues tokens with a fixed clock.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use chrono::Utc;
use civic_api::auth::{test_clocks, JwtSecret};
use civic_api::notifications::{MemoryNotifier, NotificationDispatcher, OutboundMessage};
use civic_api::services::SteppingClock;
use civic_api::{
    create_api_router, generate_jwt_token, ApiConfig, AppState, AuthConfig, NotifierConfig,
};
use civic_core::Principal;
use civic_storage::InMemoryRepository;
use serde_json::Value;
use tower::ServiceExt;

pub const TEST_SECRET: &str = "civic-integration-test-secret-0123456789";

pub fn test_auth_config() -> AuthConfig {
    AuthConfig {
        jwt_secret: JwtSecret::new(TEST_SECRET.to_string()).expect("test secret is valid"),
        clock: Arc::new(test_clocks::valid()),
        ..AuthConfig::default()
    }
}

pub fn test_api_config() -> ApiConfig {
    ApiConfig {
        rate_limit_enabled: false,
        media_base_url: Some("https://media.city.gov/complaints/".to_string()),
        ..ApiConfig::default()
    }
}

/// A running app plus handles on its side effects.
pub struct TestApp {
    pub router: Router,
    pub notifier: MemoryNotifier,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_config(test_api_config()).await
    }

    pub async fn with_config(api_config: ApiConfig) -> Self {
        let notifier = MemoryNotifier::new();
        let (dispatcher, _task) =
            NotificationDispatcher::spawn(Arc::new(notifier.clone()), NotifierConfig::default());
        let state = AppState::new(
            Arc::new(InMemoryRepository::new()),
            dispatcher,
            Arc::new(SteppingClock::per_second(Utc::now())),
            api_config,
        );
        state
            .categories
            .seed_defaults()
            .await
            .expect("default categories seed");
        let router = create_api_router(state, test_auth_config()).expect("router builds");
        Self { router, notifier }
    }

    /// Send a request and decode the JSON body (`Value::Null` when empty).
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        principal: Option<&Principal>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(principal) = principal {
            builder = builder.header(header::AUTHORIZATION, bearer(principal));
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("request builds");

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body reads");
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, json)
    }

    pub async fn get(&self, uri: &str, principal: Option<&Principal>) -> (StatusCode, Value) {
        self.send(Method::GET, uri, principal, None).await
    }

    pub async fn post(
        &self,
        uri: &str,
        principal: Option<&Principal>,
        body: Value,
    ) -> (StatusCode, Value) {
        self.send(Method::POST, uri, principal, Some(body)).await
    }

    pub async fn patch(&self, uri: &str, principal: &Principal, body: Value) -> (StatusCode, Value) {
        self.send(Method::PATCH, uri, Some(principal), Some(body)).await
    }

    /// Submit a complaint anonymously and return its detail body.
    pub async fn submit(&self, body: Value) -> Value {
        let (status, json) = self.post("/api/v1/complaints", None, body).await;
        assert_eq!(status, StatusCode::CREATED, "submission failed: {}", json);
        json
    }

    /// Poll the notifier until `count` messages arrived.
    pub async fn wait_for_messages(&self, count: usize) -> Vec<OutboundMessage> {
        for _ in 0..100 {
            let sent = self.notifier.sent();
            if sent.len() >= count {
                return sent;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        self.notifier.sent()
    }
}

pub fn bearer(principal: &Principal) -> String {
    let token = generate_jwt_token(&test_auth_config(), principal).expect("token issues");
    format!("Bearer {}", token)
}

/// A valid submission body for the named default category.
pub fn complaint_body(category_id: impl std::fmt::Display, title: &str) -> Value {
    serde_json::json!({
        "title": title,
        "description": format!("{} near the market", title),
        "category": category_id.to_string(),
        "citizen_name": "Amina Yusuf",
        "citizen_email": "amina@example.org",
        "citizen_phone": "5550123",
        "address": "12 Harbour Road",
    })
}
