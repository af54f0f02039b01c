// In-memory doubles for the backend and the credential slot
use crate::application::credential_store::CredentialStore;
use crate::application::scale_backend::{BackendError, BackendResult, ScaleBackend};
use crate::domain::chart::{ChartPoint, ChartRange};
use crate::domain::dashboard::DashboardSnapshot;
use crate::domain::keg::{ActiveKeg, StockDirection, WarehouseKeg};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use tokio::sync::oneshot;

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    CheckPassword(String),
    Dashboard(String),
    Chart(String, ChartRange),
    ActiveKeg(String, u32),
    Warehouse(String, u32, StockDirection),
}

struct Scripted<T> {
    reply: BackendResult<T>,
    gate: Option<oneshot::Receiver<()>>,
}

impl<T> Scripted<T> {
    async fn resolve(self) -> BackendResult<T> {
        if let Some(gate) = self.gate {
            let _ = gate.await;
        }
        self.reply
    }
}

/// Scripted backend. Replies are consumed in call order; a gated reply is
/// held back until its sender fires (or is dropped).
#[derive(Default)]
pub struct FakeScaleBackend {
    calls: Mutex<Vec<Call>>,
    passwords: Mutex<HashMap<String, BackendResult<()>>>,
    password_gates: Mutex<HashMap<String, oneshot::Receiver<()>>>,
    dashboards: Mutex<VecDeque<Scripted<DashboardSnapshot>>>,
    charts: Mutex<VecDeque<Scripted<Vec<ChartPoint>>>>,
    command_failure: Mutex<Option<BackendError>>,
}

pub fn rejected(endpoint: &'static str, status: u16) -> BackendError {
    BackendError::Rejected { endpoint, status }
}

pub fn transport(endpoint: &'static str) -> BackendError {
    BackendError::Transport {
        endpoint,
        message: "connection refused".to_string(),
    }
}

impl FakeScaleBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn accept_password(&self, secret: &str) {
        self.set_password_reply(secret, Ok(()));
    }

    pub fn set_password_reply(&self, secret: &str, reply: BackendResult<()>) {
        self.passwords
            .lock()
            .unwrap()
            .insert(secret.to_string(), reply);
    }

    /// Hold back the next reply for `secret` until the sender fires.
    pub fn gate_password(&self, secret: &str) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.password_gates
            .lock()
            .unwrap()
            .insert(secret.to_string(), rx);
        tx
    }

    pub fn push_dashboard(&self, reply: BackendResult<DashboardSnapshot>) {
        self.dashboards
            .lock()
            .unwrap()
            .push_back(Scripted { reply, gate: None });
    }

    pub fn push_dashboard_gated(
        &self,
        reply: BackendResult<DashboardSnapshot>,
    ) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.dashboards.lock().unwrap().push_back(Scripted {
            reply,
            gate: Some(rx),
        });
        tx
    }

    pub fn push_chart(&self, reply: BackendResult<Vec<ChartPoint>>) {
        self.charts
            .lock()
            .unwrap()
            .push_back(Scripted { reply, gate: None });
    }

    pub fn push_chart_gated(&self, reply: BackendResult<Vec<ChartPoint>>) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.charts.lock().unwrap().push_back(Scripted {
            reply,
            gate: Some(rx),
        });
        tx
    }

    pub fn fail_commands(&self, error: BackendError) {
        *self.command_failure.lock().unwrap() = Some(error);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn dashboard_calls(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Dashboard(secret) => Some(secret),
                _ => None,
            })
            .collect()
    }

    pub fn chart_calls(&self) -> Vec<ChartRange> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Chart(_, range) => Some(range),
                _ => None,
            })
            .collect()
    }

    /// Yield until at least `n` calls were issued. Does not advance a
    /// paused clock.
    pub async fn wait_for_calls(&self, n: usize) {
        while self.calls.lock().unwrap().len() < n {
            tokio::task::yield_now().await;
        }
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn command_reply(&self) -> BackendResult<()> {
        match self.command_failure.lock().unwrap().clone() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl ScaleBackend for FakeScaleBackend {
    async fn check_password(&self, secret: &str) -> BackendResult<()> {
        self.record(Call::CheckPassword(secret.to_string()));
        let reply = self.passwords.lock().unwrap().get(secret).cloned();
        let gate = self.password_gates.lock().unwrap().remove(secret);
        tokio::task::yield_now().await;
        if let Some(gate) = gate {
            let _ = gate.await;
        }
        reply.unwrap_or(Err(rejected("check_password", 401)))
    }

    async fn fetch_dashboard(&self, secret: &str) -> BackendResult<DashboardSnapshot> {
        self.record(Call::Dashboard(secret.to_string()));
        let scripted = self.dashboards.lock().unwrap().pop_front();
        match scripted {
            Some(scripted) => scripted.resolve().await,
            None => Ok(DashboardSnapshot::default()),
        }
    }

    async fn fetch_chart(&self, metric: &str, range: ChartRange) -> BackendResult<Vec<ChartPoint>> {
        self.record(Call::Chart(metric.to_string(), range));
        let scripted = self.charts.lock().unwrap().pop_front();
        match scripted {
            Some(scripted) => scripted.resolve().await,
            None => Ok(Vec::new()),
        }
    }

    async fn set_active_keg(&self, secret: &str, keg: ActiveKeg) -> BackendResult<()> {
        self.record(Call::ActiveKeg(secret.to_string(), keg.litres()));
        self.command_reply()
    }

    async fn adjust_warehouse(
        &self,
        secret: &str,
        keg: WarehouseKeg,
        way: StockDirection,
    ) -> BackendResult<()> {
        self.record(Call::Warehouse(secret.to_string(), keg.litres(), way));
        self.command_reply()
    }
}

#[derive(Default)]
pub struct MemoryCredentialStore {
    slot: Mutex<Option<String>>,
}

impl MemoryCredentialStore {
    pub fn with_secret(secret: &str) -> Self {
        Self {
            slot: Mutex::new(Some(secret.to_string())),
        }
    }

    pub fn stored(&self) -> Option<String> {
        self.slot.lock().unwrap().clone()
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn load(&self) -> anyhow::Result<Option<String>> {
        Ok(self.stored())
    }

    fn save(&self, secret: &str) -> anyhow::Result<()> {
        *self.slot.lock().unwrap() = Some(secret.to_string());
        Ok(())
    }

    fn clear(&self) -> anyhow::Result<()> {
        *self.slot.lock().unwrap() = None;
        Ok(())
    }
}
