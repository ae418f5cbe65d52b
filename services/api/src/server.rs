use crate::cli::ServeArgs;
use crate::infra::{lifecycle_service, AppState};
use crate::routes::with_lifecycle_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use rotable_tracker::config::{AppConfig, StoreBackend};
use rotable_tracker::error::AppError;
use rotable_tracker::telemetry;
use rotable_tracker::workflows::lifecycle::{InMemoryLifecycleStore, SqliteLifecycleStore};
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

    let routes = match config.store.backend {
        StoreBackend::Memory => {
            let store = Arc::new(InMemoryLifecycleStore::with_timeout(config.store.timeout));
            with_lifecycle_routes(lifecycle_service(store, &config.lifecycle))
        }
        StoreBackend::Sqlite => {
            let store = Arc::new(SqliteLifecycleStore::open(
                &config.store.sqlite_path,
                config.store.timeout,
            )?);
            info!(path = %config.store.sqlite_path.display(), "sqlite store opened");
            with_lifecycle_routes(lifecycle_service(store, &config.lifecycle))
        }
    };

    let app = routes.layer(Extension(app_state)).layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        store = ?config.store.backend,
        policy = ?config.lifecycle.rejection_policy,
        "rotable component tracker ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
