use crate::cli::ServeArgs;
use crate::infra::{seed_demo_data, AppState};
use crate::routes::with_donation_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use food_rescue::config::AppConfig;
use food_rescue::donations::{DonationService, FixedDistance, MemoryDonationStore};
use food_rescue::error::AppError;
use food_rescue::telemetry;
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

    let store = Arc::new(MemoryDonationStore::new());
    let distance = Arc::new(FixedDistance(config.matching.placeholder_distance_km));
    let donation_service = Arc::new(DonationService::new(
        store,
        distance,
        config.matching.clone(),
    ));

    if args.seed_demo {
        let summary = seed_demo_data(donation_service.as_ref())?;
        info!(
            claimants = summary.claimants.len(),
            donations = summary.donations.len(),
            "demo data loaded"
        );
    }

    let app = with_donation_routes(donation_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "food rescue service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
