use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use stockagent_core::agent::StockAgent;
use stockagent_core::domain::OutcomeRecord;
use stockagent_core::report;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = stockagent_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer())
        .init();

    let agent = match StockAgent::from_settings(&settings) {
        Ok(agent) => Some(agent),
        Err(e) => {
            let err = anyhow::Error::new(e);
            sentry_anyhow::capture_anyhow(&err);
            tracing::error!(error = %err, "agent setup failed; starting API in degraded mode");
            None
        }
    };

    let state = AppState { agent };

    let app = Router::new()
        .route("/healthz", get(healthz))
        .route("/analyze/:symbol", get(analyze))
        .route("/report/:symbol", get(get_report))
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(3000);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));

    tracing::info!(%addr, "api listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn healthz() -> &'static str {
    "ok"
}

#[derive(Clone)]
struct AppState {
    agent: Option<StockAgent>,
}

/// Failure outcomes are ordinary results and still come back as 200.
async fn analyze(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
) -> Result<Json<OutcomeRecord>, StatusCode> {
    let outcome = run(&state, &symbol).await?;
    Ok(Json(outcome))
}

async fn get_report(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
) -> Result<String, StatusCode> {
    let outcome = run(&state, &symbol).await?;
    Ok(report::render_report(&outcome))
}

async fn run(state: &AppState, symbol: &str) -> Result<OutcomeRecord, StatusCode> {
    let Some(agent) = &state.agent else {
        return Err(StatusCode::SERVICE_UNAVAILABLE);
    };
    if symbol.trim().is_empty() {
        return Err(StatusCode::BAD_REQUEST);
    }
    Ok(agent.analyze_symbol(symbol).await)
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}

fn init_sentry(settings: &stockagent_core::config::Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}
