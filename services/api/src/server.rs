use crate::cli::ServeArgs;
use crate::infra::{seeded_repository, AppState, ConfiguredUploader};
use crate::routes::with_property_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use dormhub::auth::InMemoryAuthenticator;
use dormhub::config::AppConfig;
use dormhub::error::AppError;
use dormhub::property::PropertyService;
use dormhub::telemetry;
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

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let repository = Arc::new(seeded_repository()?);
    let uploader = Arc::new(ConfiguredUploader::from_config(config.upload.take()));
    let authenticator = Arc::new(InMemoryAuthenticator::with_demo_users(
        &config.auth.demo_password,
    ));
    let property_service = Arc::new(PropertyService::new(repository, uploader));

    let app = with_property_routes(property_service, authenticator)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "dormhub service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
