// Main entry point - Dependency injection and client lifecycle
mod application;
mod domain;
mod infrastructure;
mod presentation;
#[cfg(test)]
mod test_support;

use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use crate::application::auth_session::AuthSession;
use crate::application::chart_series::ChartSeries;
use crate::application::dashboard_sync::DashboardSync;
use crate::application::pub_service::PubService;
use crate::application::scale_backend::ScaleBackend;
use crate::application::scheduler::{FocusSignal, Scheduler};
use crate::infrastructure::config::load_client_config;
use crate::infrastructure::credential_file::FileCredentialStore;
use crate::infrastructure::http_backend::HttpScaleBackend;
use crate::presentation::app_state::{AppState, ChartView};
use crate::presentation::console::{run_console, watch_dashboard, HELP};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr, the console view owns stdout
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = load_client_config()?;

    // Adapters (infrastructure layer)
    let backend: Arc<dyn ScaleBackend> = Arc::new(HttpScaleBackend::new(
        &config.backend.base_url,
        config.backend.request_timeout(),
    )?);
    let store = Arc::new(FileCredentialStore::new(
        config.storage.credential_file.clone(),
    ));
    tracing::debug!("Credential file {}", store.path().display());

    // Use cases (application layer)
    let session = AuthSession::new(backend.clone(), store);
    let dashboard = DashboardSync::new(backend.clone(), session.clone());
    let pub_service = PubService::new(backend.clone(), session.clone(), dashboard.clone());
    let focus = FocusSignal::new();

    let mut charts = Vec::with_capacity(config.charts.len());
    let mut initial_ranges = Vec::with_capacity(config.charts.len());
    for chart in &config.charts {
        charts.push(ChartView {
            title: chart.title.clone(),
            series: ChartSeries::new(backend.clone(), chart.metric.clone(), chart.stepped),
        });
        initial_ranges.push(chart.default_range()?);
    }

    let state = Arc::new(AppState {
        session: session.clone(),
        dashboard: dashboard.clone(),
        charts,
        pub_service,
        focus: focus.clone(),
    });

    tracing::info!("Connecting to {}", config.backend.base_url);
    session.restore().await;

    let mut scheduler = Scheduler::new();
    dashboard.mount(
        &mut scheduler,
        config.sync.dashboard_interval(),
        focus.subscribe(),
    );
    for (chart, initial) in state.charts.iter().zip(initial_ranges) {
        chart
            .series
            .mount(&mut scheduler, config.sync.chart_interval(), initial);
    }
    scheduler.spawn("dashboard-view", watch_dashboard(state.clone()));
    tracing::info!("Started {} background tasks", scheduler.len());

    println!("{}", HELP);
    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    tokio::select! {
        result = run_console(state.clone(), stdin) => result?,
        _ = tokio::signal::ctrl_c() => tracing::info!("Interrupted"),
    }

    scheduler.shutdown();
    tracing::info!("Stopped");
    Ok(())
}
