use crate::cli::ServeArgs;
use crate::infra::{AppState, InMemoryListingStore, Services};
use crate::routes::with_application_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use jobboard::config::AppConfig;
use jobboard::error::AppError;
use jobboard::listings::CatalogImporter;
use jobboard::telemetry;
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
    if let Some(seed_csv) = args.seed_csv.take() {
        config.catalog.seed_csv = Some(seed_csv);
    }

    telemetry::init(&config.telemetry, config.environment)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let store = match &config.catalog.seed_csv {
        Some(path) => {
            let documents = CatalogImporter::from_path(path)?;
            info!(path = %path.display(), postings = documents.len(), "catalog seeded");
            InMemoryListingStore::with_documents(documents)
        }
        None => InMemoryListingStore::default(),
    };
    let services = Services::in_memory(store, &config.moderation, &config.resume);

    let app = with_application_routes(&services)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        postings = services.store.len(),
        "job board service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
