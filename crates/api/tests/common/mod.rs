//! Shared helpers for API integration tests.

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use aura_api::config::ServerConfig;
use aura_api::router::build_app_router;
use aura_api::state::AppState;
use aura_core::config::MonitorConfig;
use aura_core::error::CoreError;
use aura_core::health::{FailureModel, FeatureVector};
use aura_events::EventBus;
use aura_pipeline::{MonitorScheduler, MonitorService};
use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;

pub const TEST_ORIGIN: &str = "http://localhost:5000";

pub struct FixedModel(pub f64);

impl FailureModel for FixedModel {
    fn predict_probability(&self, _: &FeatureVector) -> Result<f64, CoreError> {
        Ok(self.0)
    }

    fn name(&self) -> &str {
        "fixed"
    }
}

pub struct UnavailableModel;

impl FailureModel for UnavailableModel {
    fn predict_probability(&self, _: &FeatureVector) -> Result<f64, CoreError> {
        Err(CoreError::ModelUnavailable("no weights loaded".to_string()))
    }
}

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec![TEST_ORIGIN.to_string()],
        request_timeout_secs: 30,
        model_path: PathBuf::from("does-not-exist/aura_model.json"),
    }
}

pub fn monitor_config() -> MonitorConfig {
    MonitorConfig {
        degradation_chance: 0.0,
        simulation_seed: Some(7),
        scoring_timeout: Duration::from_secs(2),
        ..MonitorConfig::default()
    }
}

/// Everything a test needs: the router plus direct handles on the state.
pub struct TestApp {
    pub router: Router,
    pub monitor: Arc<MonitorService>,
    pub scheduler: MonitorScheduler,
    pub shutdown: CancellationToken,
}

pub fn build_test_app(model: impl FailureModel + 'static) -> TestApp {
    build_test_app_with(model, test_config())
}

/// Build the full application router with the production middleware stack.
pub fn build_test_app_with(model: impl FailureModel + 'static, config: ServerConfig) -> TestApp {
    let monitor_config = monitor_config();
    let event_bus = Arc::new(EventBus::default());
    let monitor = Arc::new(
        MonitorService::new(&monitor_config, Arc::new(model), Arc::clone(&event_bus)).unwrap(),
    );
    let scheduler = MonitorScheduler::from_config(Arc::clone(&monitor), &monitor_config);

    let shutdown = CancellationToken::new();
    let state = AppState {
        config: Arc::new(config.clone()),
        monitor: Arc::clone(&monitor),
        event_bus,
        shutdown: shutdown.clone(),
    };
    let router = build_app_router(state, &config).unwrap();

    TestApp {
        router,
        monitor,
        scheduler,
        shutdown,
    }
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn post_empty(app: Router, uri: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
