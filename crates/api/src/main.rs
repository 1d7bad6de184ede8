use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use price_dash_core::ingest::loader::{CsvFileLoader, DatasetLoader};
use price_dash_core::query::{QueryError, YearQuery};
use price_dash_core::response::{ErrorResponse, YearResponse};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = price_dash_core::config::Settings::from_env();
    let port = settings.require_port()?;
    let percent_change_policy = settings.require_percent_change_policy()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer())
        .init();

    let loader = CsvFileLoader::new(settings.data_path.clone());
    let dataset = match loader.load().await {
        Ok(ds) => ds,
        Err(e) => {
            sentry_anyhow::capture_anyhow(&e);
            tracing::error!(error = %e, source = %loader.source_name(), "price dataset load failed");
            return Err(e);
        }
    };
    if dataset.is_empty() {
        tracing::warn!(source = %loader.source_name(), "price dataset is empty; every query will 404");
    }

    let mut query =
        YearQuery::new(Arc::new(dataset)).with_percent_change_policy(percent_change_policy);
    if let Some(limit) = settings.row_limit {
        query = query.with_row_limit(limit);
    }
    tracing::info!(
        row_limit = query.row_limit(),
        percent_change_policy = ?query.percent_change_policy(),
        "year query configured"
    );

    let app = router(AppState {
        query: Arc::new(query),
    });

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));

    tracing::info!(%addr, "api listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/get_data", get(get_data))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

async fn healthz() -> &'static str {
    "ok"
}

#[derive(Debug, Clone)]
struct AppState {
    query: Arc<YearQuery>,
}

/// Repeated keys are allowed; the first `year` wins.
fn first_year_param(params: Vec<(String, String)>) -> String {
    params
        .into_iter()
        .find(|(k, _)| k == "year")
        .map(|(_, v)| v)
        .unwrap_or_default()
}

async fn get_data(
    State(state): State<AppState>,
    Query(params): Query<Vec<(String, String)>>,
) -> Response {
    let input = first_year_param(params);

    match state.query.run(&input) {
        Ok(result) => Json(YearResponse::from(result)).into_response(),
        Err(err) => {
            let status = status_for(&err);
            tracing::info!(%status, kind = err.kind(), input = %input, "year query rejected");
            (status, Json(ErrorResponse::from(&err))).into_response()
        }
    }
}

fn status_for(err: &QueryError) -> StatusCode {
    match err {
        QueryError::InvalidYear { .. } => StatusCode::BAD_REQUEST,
        QueryError::NoDataForYear(_) => StatusCode::NOT_FOUND,
    }
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}

fn init_sentry(settings: &price_dash_core::config::Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}
