// Application state shared by the console and the view tasks
use crate::application::auth_session::AuthSession;
use crate::application::chart_series::ChartSeries;
use crate::application::dashboard_sync::DashboardSync;
use crate::application::pub_service::PubService;
use crate::application::scheduler::FocusSignal;

#[derive(Clone)]
pub struct ChartView {
    pub title: String,
    pub series: ChartSeries,
}

#[derive(Clone)]
pub struct AppState {
    pub session: AuthSession,
    pub dashboard: DashboardSync,
    pub charts: Vec<ChartView>,
    pub pub_service: PubService,
    pub focus: FocusSignal,
}

impl AppState {
    pub fn chart(&self, metric: &str) -> Option<&ChartView> {
        self.charts.iter().find(|chart| chart.series.metric() == metric)
    }
}
