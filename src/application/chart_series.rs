// Chart series - One metric's time series, refetched per selected range
use crate::application::scale_backend::ScaleBackend;
use crate::application::scheduler::Scheduler;
use crate::domain::chart::{ChartPoint, ChartRange};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{Instant, MissedTickBehavior};

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ChartState {
    pub selected_range: Option<ChartRange>,
    pub points: Arc<Vec<ChartPoint>>,
    pub is_loading: bool,
}

#[derive(Clone)]
pub struct ChartSeries {
    inner: Arc<SeriesInner>,
}

struct SeriesInner {
    backend: Arc<dyn ScaleBackend>,
    metric: String,
    stepped: bool,
    state: watch::Sender<ChartState>,
}

impl ChartSeries {
    pub fn new(backend: Arc<dyn ScaleBackend>, metric: impl Into<String>, stepped: bool) -> Self {
        let (state, _) = watch::channel(ChartState::default());
        Self {
            inner: Arc::new(SeriesInner {
                backend,
                metric: metric.into(),
                stepped,
                state,
            }),
        }
    }

    pub fn metric(&self) -> &str {
        &self.inner.metric
    }

    /// Rendering hint for the view; not interpreted here.
    pub fn stepped(&self) -> bool {
        self.inner.stepped
    }

    pub fn state(&self) -> ChartState {
        self.inner.state.borrow().clone()
    }

    pub fn selected_range(&self) -> Option<ChartRange> {
        self.inner.state.borrow().selected_range
    }

    /// Make `range` the selected one without fetching. Responses for any
    /// other range are stale from here on.
    pub fn set_range(&self, range: ChartRange) {
        self.inner.state.send_if_modified(|state| {
            let changed = state.selected_range != Some(range) || !state.is_loading;
            state.selected_range = Some(range);
            state.is_loading = true;
            changed
        });
    }

    pub async fn select_range(&self, range: ChartRange) {
        self.set_range(range);
        self.fetch(range).await;
    }

    /// Refetch whatever range is selected right now.
    pub async fn refresh(&self) {
        if let Some(range) = self.selected_range() {
            self.fetch(range).await;
        }
    }

    /// Fetch `range`; the points are kept only if it is still selected.
    pub async fn fetch(&self, range: ChartRange) {
        self.inner.state.send_if_modified(|state| {
            let changed = !state.is_loading;
            state.is_loading = true;
            changed
        });

        let points = match self.inner.backend.fetch_chart(&self.inner.metric, range).await {
            Ok(points) => points,
            Err(e) => {
                tracing::warn!("Chart {} ({}) fetch failed: {}", self.inner.metric, range, e);
                Vec::new()
            }
        };

        self.inner.state.send_if_modified(|state| {
            // A response for a range that is no longer selected is stale
            if state.selected_range != Some(range) {
                tracing::debug!(
                    "Discarding stale {} response for chart {}",
                    range,
                    self.inner.metric
                );
                return false;
            }
            state.points = Arc::new(points);
            state.is_loading = false;
            true
        });
    }

    /// Select `initial` (if any), then refetch the selected range every
    /// `period` until the scheduler is shut down.
    pub fn mount(&self, scheduler: &mut Scheduler, period: Duration, initial: Option<ChartRange>) {
        let series = self.clone();
        scheduler.spawn("chart-refresh", async move {
            if let Some(range) = initial {
                series.select_range(range).await;
            }

            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                series.refresh().await;
            }
        });
    }
}
