use crate::cli::ServeArgs;
use crate::infra::{AppState, RequestDefaults, ServiceProvider};
use crate::routes::api_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use district_match::config::AppConfig;
use district_match::error::AppError;
use district_match::recommend::FactorSchema;
use district_match::telemetry;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }
    if let Some(path) = args.influence_csv.take() {
        config.recommendation.influence_csv = path;
    }

    telemetry::init(&config.telemetry)?;

    let services = Arc::new(ServiceProvider::new(
        config.recommendation.influence_csv.clone(),
        FactorSchema::standard().shared(),
    ));
    match services.service() {
        Ok(service) => info!(
            path = %services.path().display(),
            districts = service.table().len(),
            "influence table loaded"
        ),
        Err(err) => warn!(
            path = %services.path().display(),
            error = %err,
            "influence table unavailable, recommendation requests will fail until it loads"
        ),
    }

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
        services,
        defaults: RequestDefaults::from(&config.recommendation),
    };

    let app = api_routes()
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        default_tier = %config.recommendation.default_tier,
        "district recommender ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
