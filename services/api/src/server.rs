use crate::cli::ServeArgs;
use crate::infra::{load_survey, AppState, InMemoryResponseRepository};
use crate::routes::with_survey_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use lpc_survey::config::AppConfig;
use lpc_survey::error::AppError;
use lpc_survey::telemetry;
use lpc_survey::workflows::survey::{ScoringEngine, SurveyApi, SurveyIntakeService};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (catalog, variant) = load_survey(&config.survey)?;
    info!(
        projects = catalog.len(),
        variant = %variant.name,
        "survey catalog loaded"
    );

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let repository = Arc::new(InMemoryResponseRepository::default());
    let api = SurveyApi {
        intake: Arc::new(SurveyIntakeService::new(repository)),
        catalog,
        engine: Arc::new(ScoringEngine::new(variant)),
    };

    let app = with_survey_routes(api)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "survey intake service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
