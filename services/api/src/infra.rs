use chrono::NaiveDate;
use clap::Args;
use metrics_exporter_prometheus::PrometheusHandle;
use rotable_tracker::config::{AppConfig, LifecycleConfig, StoreBackend};
use rotable_tracker::error::AppError;
use rotable_tracker::telemetry;
use rotable_tracker::workflows::lifecycle::{
    DashboardSummary, ImportOutcome, InMemoryLifecycleStore, LifecycleRepository,
    LifecycleService, NotificationSink, SqliteLifecycleStore, TracingNotifications,
};
use rotable_tracker::workflows::register_import::{RegisterImport, RegisterImporter};
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::warn;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

#[derive(Args, Debug)]
pub(crate) struct ImportArgs {
    /// Register CSV export to load
    pub(crate) path: PathBuf,
    /// Parse and report without writing to the store
    #[arg(long)]
    pub(crate) dry_run: bool,
}

pub(crate) fn lifecycle_service<R>(
    store: Arc<R>,
    config: &LifecycleConfig,
) -> Arc<LifecycleService<R, TracingNotifications>>
where
    R: LifecycleRepository + 'static,
{
    Arc::new(LifecycleService::with_policy(
        store,
        Arc::new(TracingNotifications),
        config.rejection_policy,
    ))
}

pub(crate) fn run_import(args: ImportArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;

    let import = RegisterImporter::from_path(&args.path)?;
    render_parse_summary(&args.path, &import);
    if args.dry_run {
        return Ok(());
    }

    let (outcome, dashboard) = match config.store.backend {
        StoreBackend::Memory => {
            warn!("ROTABLE_STORE=memory; imported components are discarded on exit");
            let store = Arc::new(InMemoryLifecycleStore::with_timeout(config.store.timeout));
            import_components(&lifecycle_service(store, &config.lifecycle), import)?
        }
        StoreBackend::Sqlite => {
            let store = Arc::new(SqliteLifecycleStore::open(
                &config.store.sqlite_path,
                config.store.timeout,
            )?);
            import_components(&lifecycle_service(store, &config.lifecycle), import)?
        }
    };

    render_import_outcome(&outcome);
    println!(
        "Workshop: {} tracked | {} in workshop | {} in QA | {} RFU stock | {} installed",
        dashboard.total,
        dashboard.in_workshop,
        dashboard.in_qa,
        dashboard.rfu_stock,
        dashboard.installed
    );
    Ok(())
}

fn import_components<R, N>(
    service: &LifecycleService<R, N>,
    import: RegisterImport,
) -> Result<(ImportOutcome, DashboardSummary), AppError>
where
    R: LifecycleRepository + 'static,
    N: NotificationSink + 'static,
{
    let outcome = service.import(import.components)?;
    let dashboard = service.dashboard()?;
    Ok((outcome, dashboard))
}

fn render_parse_summary(path: &std::path::Path, import: &RegisterImport) {
    let fitted = import
        .components
        .iter()
        .filter(|row| row.install.is_some())
        .count();
    println!(
        "Register {}: {} components parsed ({fitted} fitted), {} rows skipped",
        path.display(),
        import.components.len(),
        import.skipped.len()
    );
    for skipped in &import.skipped {
        let id = skipped.component_id.as_deref().unwrap_or("<no id>");
        println!("  - line {} ({id}): {}", skipped.line, skipped.reason);
    }
}

fn render_import_outcome(outcome: &ImportOutcome) {
    println!(
        "Imported {} components; {} already tracked, {} installed without an open cycle",
        outcome.inserted.len(),
        outcome.skipped_existing,
        outcome.skipped_without_install
    );
    for id in &outcome.inserted {
        println!("  + {id}");
    }
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}
