use std::{net::SocketAddr, sync::Arc};

use axum::{
    extract::{DefaultBodyLimit, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use server_api::{
    find_match, is_registered, list_departments, list_registrants, register, unregister,
    ApiContext,
};
use shared::{
    domain::{DepartmentFilter, PersonKey},
    error::{ApiError, ErrorCode},
    protocol::{ExistsResponse, MatchRequest, MatchResponse, RegisterRequest, RegisterResponse},
};
use storage::open_store;
use tower_http::limit::RequestBodyLimitLayer;
use tracing::{error, info};

mod app_state;
mod config;

use app_state::AppState;
use config::load_settings;

const MAX_REQUEST_BYTES: usize = 16 * 1024;

type ApiResult<T> = Result<T, (StatusCode, Json<ApiError>)>;

#[derive(Debug, Deserialize)]
struct DepartmentQuery {
    department: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PersonQuery {
    name: String,
    surname: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    let settings = load_settings();
    let store_config = settings.store_config()?;
    let store = open_store(&store_config).await.map_err(|error| {
        error!(
            backend = %store_config.backend,
            database_url = %store_config.database_url,
            csv_path = %store_config.csv_path.display(),
            %error,
            "failed to open registration store; verify parent directory exists and permissions are correct"
        );
        error
    })?;
    info!(backend = %store_config.backend, "registration store ready");

    let api = ApiContext::new(store).with_departments(settings.departments);
    let app = build_router(Arc::new(AppState { api }));

    let addr: SocketAddr = settings.server_bind.parse()?;
    info!(%addr, "server listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/departments", get(http_list_departments))
        .route(
            "/registrations",
            get(http_list_registrations)
                .post(http_register)
                .delete(http_unregister),
        )
        .route("/registrations/exists", get(http_exists))
        .route("/match", post(http_find_match))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(MAX_REQUEST_BYTES))
        .with_state(state)
}

fn status_for(code: ErrorCode) -> StatusCode {
    match code {
        ErrorCode::NotFound => StatusCode::NOT_FOUND,
        ErrorCode::Conflict => StatusCode::CONFLICT,
        ErrorCode::Validation => StatusCode::BAD_REQUEST,
        ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn reject(err: ApiError) -> (StatusCode, Json<ApiError>) {
    (status_for(err.code), Json(err))
}

async fn healthz(State(state): State<Arc<AppState>>) -> ApiResult<&'static str> {
    state.api.store.health_check().await.map_err(|e| {
        error!(error = %e, "health check failed");
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ApiError::new(ErrorCode::Internal, e.to_string())),
        )
    })?;
    Ok("ok")
}

async fn http_list_departments(State(state): State<Arc<AppState>>) -> Json<Vec<String>> {
    Json(list_departments(&state.api))
}

async fn http_list_registrations(
    State(state): State<Arc<AppState>>,
    Query(q): Query<DepartmentQuery>,
) -> ApiResult<Json<Vec<String>>> {
    let filter = DepartmentFilter::parse(q.department.as_deref());
    let registrants = list_registrants(&state.api, &filter)
        .await
        .map_err(reject)?;
    Ok(Json(registrants))
}

async fn http_register(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<RegisterResponse>)> {
    let registered = register(&state.api, req).await.map_err(reject)?;
    Ok((StatusCode::CREATED, Json(registered)))
}

async fn http_unregister(
    State(state): State<Arc<AppState>>,
    Json(key): Json<PersonKey>,
) -> ApiResult<StatusCode> {
    unregister(&state.api, &key.name, &key.surname)
        .await
        .map_err(reject)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn http_exists(
    State(state): State<Arc<AppState>>,
    Query(q): Query<PersonQuery>,
) -> ApiResult<Json<ExistsResponse>> {
    let exists = is_registered(&state.api, &q.name, &q.surname)
        .await
        .map_err(reject)?;
    Ok(Json(ExistsResponse { exists }))
}

async fn http_find_match(
    State(state): State<Arc<AppState>>,
    Json(req): Json<MatchRequest>,
) -> ApiResult<Json<MatchResponse>> {
    let filter = DepartmentFilter::parse(req.department.as_deref());
    let response = find_match(&state.api, &filter).await.map_err(reject)?;
    Ok(Json(response))
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
