use std::{net::SocketAddr, sync::Arc};

use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderValue, StatusCode},
    routing::{get, post},
    Json, Router,
};
use mailer::{Mailer, MissingMailer, ResendConfig, ResendMailer};
use server_api::{register, ApiContext};
use shared::{
    error::{ApiError, ApiException, ErrorCode, METHOD_NOT_ALLOWED},
    protocol::{RegistrationRequest, RegistrationResponse, REGISTER_ROUTE},
};
use storage::StorageManager;
use tower_http::{limit::RequestBodyLimitLayer, set_header::SetResponseHeaderLayer};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod app_state;
mod config;

use app_state::AppState;
use config::{load_settings, prepare_database_url};

const MAX_REGISTRATION_BODY_BYTES: usize = 64 * 1024;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let settings = load_settings();
    let database_url = settings
        .database_url
        .as_deref()
        .and_then(prepare_database_url);
    if database_url.is_none() {
        warn!("DATABASE_URL is not set; registrations will fail until it is configured");
    }

    let mailer: Arc<dyn Mailer> = match settings.resend_api_key.clone() {
        Some(api_key) => Arc::new(ResendMailer::new(ResendConfig {
            api_key,
            api_url: settings.resend_api_url.clone(),
            timeout: settings.notify_timeout(),
        })?),
        None => {
            warn!("RESEND_API_KEY is not set; confirmation emails will be reported as not sent");
            Arc::new(MissingMailer)
        }
    };

    let store = Arc::new(StorageManager::new(database_url));
    let api = ApiContext {
        store: store.clone(),
        mailer,
        mail_from: settings.mail_from.clone(),
        write_timeout: settings.write_timeout(),
        notify_timeout: settings.notify_timeout(),
    };
    let app = build_router(Arc::new(AppState { api }));

    let addr: SocketAddr = settings.server_bind.parse()?;
    info!(%addr, "server listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    store.shutdown().await;
    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        warn!(%error, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}

fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route(
            REGISTER_ROUTE,
            post(http_register)
                .options(preflight)
                .fallback(method_not_allowed),
        )
        .layer(RequestBodyLimitLayer::new(MAX_REGISTRATION_BODY_BYTES))
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_CREDENTIALS,
            HeaderValue::from_static("true"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_static("*"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static("GET,OPTIONS,POST"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static("Content-Type"),
        ))
        .with_state(state)
}

async fn healthz() -> &'static str {
    "ok"
}

async fn preflight() -> StatusCode {
    StatusCode::OK
}

async fn method_not_allowed() -> (StatusCode, Json<ApiError>) {
    error_response(ApiException::new(
        ErrorCode::MethodNotAllowed,
        METHOD_NOT_ALLOWED,
    ))
}

async fn http_register(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<(StatusCode, Json<RegistrationResponse>), (StatusCode, Json<ApiError>)> {
    let request: RegistrationRequest =
        serde_json::from_slice(&body).map_err(|_| error_response(ApiException::missing_fields()))?;

    let outcome = register(&state.api, request)
        .await
        .map_err(error_response)?;

    Ok((
        StatusCode::CREATED,
        Json(RegistrationResponse::created(&outcome.email)),
    ))
}

fn error_response(err: ApiException) -> (StatusCode, Json<ApiError>) {
    let status = match err.code {
        ErrorCode::Validation => StatusCode::BAD_REQUEST,
        ErrorCode::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
        ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(ApiError::from(err)))
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
