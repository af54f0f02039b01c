// Backend trait for the keg scale HTTP surface
use crate::domain::chart::{ChartPoint, ChartRange};
use crate::domain::dashboard::DashboardSnapshot;
use crate::domain::keg::{ActiveKeg, StockDirection, WarehouseKeg};
use async_trait::async_trait;
use thiserror::Error;

/// Failure taxonomy shared by every backend call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    /// No response was received.
    #[error("{endpoint}: request failed: {message}")]
    Transport {
        endpoint: &'static str,
        message: String,
    },
    /// The backend answered with a status other than the expected one.
    #[error("{endpoint}: rejected with status {status}")]
    Rejected { endpoint: &'static str, status: u16 },
    /// The response body did not match the expected schema.
    #[error("{endpoint}: malformed response: {message}")]
    Decode {
        endpoint: &'static str,
        message: String,
    },
}

impl BackendError {
    /// Only an explicit answer from the backend counts as a rejection.
    pub fn is_rejection(&self) -> bool {
        matches!(self, BackendError::Rejected { .. })
    }
}

pub type BackendResult<T> = Result<T, BackendError>;

#[async_trait]
pub trait ScaleBackend: Send + Sync {
    /// Validate a secret; `Ok` only when the backend accepts it
    async fn check_password(&self, secret: &str) -> BackendResult<()>;

    /// Fetch the dashboard snapshot; the secret may be empty
    async fn fetch_dashboard(&self, secret: &str) -> BackendResult<DashboardSnapshot>;

    /// Fetch one metric's samples for a range
    async fn fetch_chart(&self, metric: &str, range: ChartRange) -> BackendResult<Vec<ChartPoint>>;

    async fn set_active_keg(&self, secret: &str, keg: ActiveKeg) -> BackendResult<()>;

    async fn adjust_warehouse(
        &self,
        secret: &str,
        keg: WarehouseKeg,
        way: StockDirection,
    ) -> BackendResult<()>;
}
