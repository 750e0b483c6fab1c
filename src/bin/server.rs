use axum::{
    extract::{Json, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use dealrank_engine::{
    CatalogStats, DealEngine, DealEngineError, DealQuery, DealResponse, EngineConfig, Resolution,
};

#[derive(Clone)]
struct AppState {
    engine: Arc<DealEngine>,
}

#[derive(Debug, Deserialize)]
struct DealsRequest {
    query: String,
    #[serde(default)]
    top_n: Option<usize>,
    #[serde(default = "default_fx_rate")]
    fx_rate: f64,
}

#[derive(Debug, Deserialize)]
struct ResolveRequest {
    query: String,
}

fn default_fx_rate() -> f64 { 1.0 }

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: String,
    version: String,
    oracle: String,
}

#[derive(Debug, Serialize)]
struct StatsResponse {
    catalog: CatalogStats,
    oracle: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "dealrank_server=debug,dealrank_engine=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut config = match std::env::var("CONFIG_PATH") {
        Ok(path) => EngineConfig::from_file(&path)?,
        Err(_) => EngineConfig::default(),
    };
    config.apply_env()?;

    let port = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse::<u16>().ok())
        .unwrap_or(8091);

    tracing::info!("🚀 Starting Deal Ranking Server");
    tracing::info!("⚙️ Config: {}", config);
    tracing::info!("🔌 Port: {}", port);

    // A partially loaded catalog must never serve requests
    let engine = match DealEngine::from_config(&config).await {
        Ok(engine) => engine,
        Err(e) => {
            tracing::error!("❌ Refusing to start: {}", e);
            return Err(e.into());
        }
    };

    let state = AppState {
        engine: Arc::new(engine),
    };

    // Build router
    let app = Router::new()
        .route("/health", get(health_handler))
        .route("/v1/deals", post(deals_handler))
        .route("/v1/resolve", post(resolve_handler))
        .route("/v1/stats", get(stats_handler))
        .layer(CorsLayer::permissive())
        .with_state(state);

    // Start server
    let addr = format!("0.0.0.0:{}", port);
    tracing::info!("🛒 Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: dealrank_engine::VERSION.to_string(),
        oracle: state.engine.oracle_name().to_string(),
    })
}

async fn deals_handler(
    State(state): State<AppState>,
    Json(req): Json<DealsRequest>,
) -> Result<Json<DealResponse>, AppError> {
    tracing::debug!("Deals request: {:?}", req);

    let mut query = DealQuery::new(req.query.clone()).with_fx_rate(req.fx_rate);
    query.top_n = req.top_n;

    let result = state.engine.search(query).await?;

    tracing::info!(
        "✅ {} → {} deals [{}] ({} dropped, {:.2}ms)",
        req.query,
        result.deals.len(),
        result.category,
        result.dropped,
        result.latency_ms
    );

    Ok(Json(result))
}

async fn resolve_handler(
    State(state): State<AppState>,
    Json(req): Json<ResolveRequest>,
) -> Json<Resolution> {
    Json(state.engine.resolve(&req.query))
}

async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(StatsResponse {
        catalog: state.engine.catalog_stats(),
        oracle: state.engine.oracle_name().to_string(),
    })
}

// Error handling
struct AppError(DealEngineError);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self.0 {
            DealEngineError::InvalidRequest(message) => (StatusCode::BAD_REQUEST, message),
            e => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
        };

        tracing::error!("❌ Error: {} - {}", status, message);

        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<DealEngineError>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}
