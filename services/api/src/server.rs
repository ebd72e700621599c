use crate::cli::ServeArgs;
use crate::infra::AppState;
use crate::routes::with_school_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use preschool_desk::config::AppConfig;
use preschool_desk::error::AppError;
use preschool_desk::school::{MemoryObjectStore, MemoryStore, SchoolService};
use preschool_desk::telemetry;
use std::sync::atomic::{AtomicBool, Ordering};
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
    let readiness_flag = Arc::new(AtomicBool::new(false));

    let storage = &config.school.storage;
    let objects = MemoryObjectStore::new(
        storage.public_base_url.clone(),
        storage.signed_url_ttl_secs,
        &storage.signing_key,
    );
    let fees = config.school.fee_schedule();

    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
        objects: objects.clone(),
        fees: fees.clone(),
    };

    let school_service = Arc::new(SchoolService::new(
        Arc::new(MemoryStore::default()),
        Arc::new(objects),
        fees,
    ));

    let app = with_school_routes(school_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        storage = %config.school.storage.public_base_url,
        "preschool desk ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
