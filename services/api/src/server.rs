use crate::cli::ServeArgs;
use crate::infra::{AppState, InMemoryReceiptLog};
use crate::routes::with_survey_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use survey_tally::config::AppConfig;
use survey_tally::error::AppError;
use survey_tally::surveys::{InMemorySurveyStore, SurveyService};
use survey_tally::telemetry;
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

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let receipts = Arc::new(InMemoryReceiptLog::default());
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
        receipts: receipts.clone(),
    };

    let survey_service = Arc::new(SurveyService::new(
        Arc::new(InMemorySurveyStore::new()),
        receipts,
    ));

    let app = with_survey_routes(survey_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "survey tally service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
