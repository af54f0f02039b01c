// Pub service - Operator commands that change backend state
use crate::application::auth_session::AuthSession;
use crate::application::dashboard_sync::DashboardSync;
use crate::application::scale_backend::{BackendError, ScaleBackend};
use crate::domain::keg::{ActiveKeg, InvalidKegSize, StockDirection, WarehouseKeg};
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("not logged in")]
    NotAuthenticated,
    #[error(transparent)]
    InvalidKeg(#[from] InvalidKegSize),
    #[error(transparent)]
    Backend(#[from] BackendError),
}

#[derive(Clone)]
pub struct PubService {
    backend: Arc<dyn ScaleBackend>,
    session: AuthSession,
    dashboard: DashboardSync,
}

impl PubService {
    pub fn new(backend: Arc<dyn ScaleBackend>, session: AuthSession, dashboard: DashboardSync) -> Self {
        Self {
            backend,
            session,
            dashboard,
        }
    }

    /// Switch the tapped keg. `0` means no keg.
    pub async fn switch_active_keg(&self, litres: u32) -> Result<(), CommandError> {
        let keg = ActiveKeg::try_from(litres)?;
        let secret = self.authorized_secret()?;

        let result = self.backend.set_active_keg(&secret, keg).await;
        self.dashboard.refresh().await;

        result.map_err(|e| {
            tracing::warn!("Switching active keg to {} l failed: {}", litres, e);
            e.into()
        })
    }

    /// Add or remove one keg of the given size from warehouse stock.
    pub async fn adjust_warehouse(&self, litres: u32, way: StockDirection) -> Result<(), CommandError> {
        let keg = WarehouseKeg::try_from(litres)?;
        let secret = self.authorized_secret()?;

        let result = self.backend.adjust_warehouse(&secret, keg, way).await;
        self.dashboard.refresh().await;

        result.map_err(|e| {
            tracing::warn!("Moving warehouse {} l {} failed: {}", litres, way, e);
            e.into()
        })
    }

    fn authorized_secret(&self) -> Result<String, CommandError> {
        if !self.session.is_authenticated() {
            return Err(CommandError::NotAuthenticated);
        }
        Ok(self.session.secret())
    }
}
