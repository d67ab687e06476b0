use std::{net::SocketAddr, sync::Arc};

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use shared::{
    error::ApiError,
    protocol::{InterpretationResponse, INTERPRET_ROUTE},
};
use tower_http::limit::RequestBodyLimitLayer;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

mod api;
mod app_state;
mod config;
#[cfg(test)]
#[path = "tests/support.rs"]
mod test_support;
mod upstream;

use api::{InterpretError, InterpretationService};
use app_state::AppState;
use config::load_settings;
use upstream::ChatCompletionsGenerator;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let settings = load_settings();
    let generator = ChatCompletionsGenerator::new(&settings.upstream)?;
    let service = InterpretationService::new(settings.credential(), Arc::new(generator));
    if !service.is_configured() {
        warn!("no upstream credential configured; interpretation requests will fail with 500");
    }

    let state = AppState {
        service,
        body_limit_bytes: settings.body_limit_bytes,
    };
    let app = build_router(Arc::new(state));

    let addr: SocketAddr = settings.server_bind.parse()?;
    info!(%addr, model = %settings.upstream.model, "interpretation server listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn build_router(state: Arc<AppState>) -> Router {
    let body_limit = state.body_limit_bytes;
    Router::new()
        .route("/healthz", get(healthz))
        .route(
            INTERPRET_ROUTE,
            post(interpret).fallback(interpret_wrong_method),
        )
        .layer(RequestBodyLimitLayer::new(body_limit))
        .with_state(state)
}

async fn healthz() -> &'static str {
    "ok"
}

async fn interpret(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<InterpretationResponse>, (StatusCode, Json<ApiError>)> {
    let interpretation = state
        .service
        .interpret_body(&body)
        .await
        .map_err(error_response)?;
    Ok(Json(InterpretationResponse { interpretation }))
}

async fn interpret_wrong_method() -> (StatusCode, Json<ApiError>) {
    error_response(InterpretError::MethodNotAllowed)
}

fn error_response(err: InterpretError) -> (StatusCode, Json<ApiError>) {
    match &err {
        InterpretError::Misconfigured => {
            error!("interpretation rejected: deployment is missing its upstream credential")
        }
        InterpretError::Upstream(source) => warn!(error = %source, "interpretation failed upstream"),
        other => info!(error = %other, "interpretation request rejected"),
    }
    (err.status(), Json(err.to_api_error()))
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
