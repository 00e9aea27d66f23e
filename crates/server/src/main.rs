use std::{net::SocketAddr, sync::Arc};

use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use server_api::{dashboard, fetch_workout_rows, render_text, ApiContext};
use shared::{
    error::{ApiError, ErrorCode},
    protocol::{DashboardQuery, DashboardView, WorkoutRow},
};
use storage::Storage;
use tower_http::trace::TraceLayer;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod app_state;
mod auth;
mod config;

use app_state::AppState;
use auth::BearerSession;
use config::{load_settings, prepare_database_url};

type ApiResult<T> = Result<T, (StatusCode, Json<ApiError>)>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let settings = load_settings()?;
    let session = settings.session_config()?;
    let database_url = prepare_database_url(&settings.database_url)?;
    let storage = Storage::new(&database_url).await.map_err(|error| {
        error!(
            %database_url,
            %error,
            "failed to open SQLite database; verify parent directory exists and permissions are correct"
        );
        error
    })?;
    let api = ApiContext { storage, session };

    let app = build_router(Arc::new(AppState::new(api)));

    let addr: SocketAddr = settings.server_bind.parse()?;
    info!(%addr, "server listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/api/workouts", get(http_workout_rows))
        .route("/dashboard", get(http_dashboard))
        .route("/dashboard.txt", get(http_dashboard_text))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn healthz(State(state): State<Arc<AppState>>) -> ApiResult<&'static str> {
    state.api.storage.health_check().await.map_err(|e| {
        error!(error = %e, "health check failed");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiError::new(ErrorCode::Internal, e.to_string())),
        )
    })?;
    Ok("ok")
}

async fn http_workout_rows(
    State(state): State<Arc<AppState>>,
    BearerSession(session): BearerSession,
    Query(q): Query<DashboardQuery>,
) -> ApiResult<Json<Vec<WorkoutRow>>> {
    server_api::require_session(session.as_ref()).map_err(error_response)?;
    let date = server_api::resolve_date(&q, (state.today)()).map_err(error_response)?;
    let rows = fetch_workout_rows(&state.api.storage, session.as_ref(), date)
        .await
        .map_err(error_response)?;
    Ok(Json(rows))
}

async fn http_dashboard(
    State(state): State<Arc<AppState>>,
    BearerSession(session): BearerSession,
    Query(q): Query<DashboardQuery>,
) -> ApiResult<Json<DashboardView>> {
    let view = load_dashboard(&state, session.as_ref(), &q).await?;
    Ok(Json(view))
}

async fn http_dashboard_text(
    State(state): State<Arc<AppState>>,
    BearerSession(session): BearerSession,
    Query(q): Query<DashboardQuery>,
) -> Result<impl IntoResponse, (StatusCode, Json<ApiError>)> {
    let view = load_dashboard(&state, session.as_ref(), &q).await?;
    Ok((
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        render_text(&view),
    ))
}

async fn load_dashboard(
    state: &AppState,
    session: Option<&server_api::AuthSession>,
    q: &DashboardQuery,
) -> ApiResult<DashboardView> {
    dashboard(&state.api.storage, session, q, (state.today)())
        .await
        .map_err(error_response)
}

fn error_response(err: ApiError) -> (StatusCode, Json<ApiError>) {
    let status = match err.code {
        ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
        ErrorCode::Validation => StatusCode::BAD_REQUEST,
        ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(err))
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
