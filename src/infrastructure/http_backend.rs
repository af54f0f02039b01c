// HTTP backend implementation of the keg scale API
use crate::application::scale_backend::{BackendError, BackendResult, ScaleBackend};
use crate::domain::chart::{ChartPoint, ChartRange};
use crate::domain::dashboard::{DashboardDocument, DashboardSnapshot};
use crate::domain::keg::{ActiveKeg, StockDirection, WarehouseKeg};
use anyhow::Context;
use async_trait::async_trait;
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct HttpScaleBackend {
    base_url: String,
    client: reqwest::Client,
}

#[derive(Debug, Serialize)]
struct ActiveKegRequest {
    keg: u32,
}

#[derive(Debug, Serialize)]
struct WarehouseRequest {
    keg: u32,
    way: StockDirection,
}

impl HttpScaleBackend {
    pub fn new(base_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn chart_url(&self, metric: &str, range: ChartRange) -> String {
        format!(
            "{}/api/scale/chart?metric={}&interval={}",
            self.base_url,
            urlencoding::encode(metric),
            urlencoding::encode(range.token())
        )
    }

    async fn send(endpoint: &'static str, request: RequestBuilder) -> BackendResult<Response> {
        request
            .send()
            .await
            .map_err(|e| BackendError::Transport {
                endpoint,
                message: e.to_string(),
            })
    }

    fn expect_status(
        endpoint: &'static str,
        response: &Response,
        expected: StatusCode,
    ) -> BackendResult<()> {
        let status = response.status();
        if status != expected {
            return Err(BackendError::Rejected {
                endpoint,
                status: status.as_u16(),
            });
        }
        Ok(())
    }

    async fn decode<T: DeserializeOwned>(
        endpoint: &'static str,
        response: Response,
    ) -> BackendResult<T> {
        let status = response.status();
        if !status.is_success() {
            return Err(BackendError::Rejected {
                endpoint,
                status: status.as_u16(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| BackendError::Transport {
                endpoint,
                message: e.to_string(),
            })?;

        serde_json::from_slice(&body).map_err(|e| BackendError::Decode {
            endpoint,
            message: e.to_string(),
        })
    }
}

#[async_trait]
impl ScaleBackend for HttpScaleBackend {
    async fn check_password(&self, secret: &str) -> BackendResult<()> {
        let request = self
            .client
            .get(self.url("/api/check/password"))
            .header("Content-Type", "application/json")
            .header("Authorization", secret);

        let response = Self::send("check_password", request).await?;
        Self::expect_status("check_password", &response, StatusCode::NO_CONTENT)
    }

    async fn fetch_dashboard(&self, secret: &str) -> BackendResult<DashboardSnapshot> {
        let request = self
            .client
            .get(self.url("/api/scale/dashboard"))
            .header("Authorization", secret);

        let response = Self::send("dashboard", request).await?;
        let document: DashboardDocument = Self::decode("dashboard", response).await?;
        Ok(document.scale)
    }

    async fn fetch_chart(&self, metric: &str, range: ChartRange) -> BackendResult<Vec<ChartPoint>> {
        let request = self.client.get(self.chart_url(metric, range));

        let response = Self::send("chart", request).await?;
        Self::decode("chart", response).await
    }

    async fn set_active_keg(&self, secret: &str, keg: ActiveKeg) -> BackendResult<()> {
        let request = self
            .client
            .post(self.url("/api/pub/active_keg"))
            .header("Authorization", secret)
            .json(&ActiveKegRequest { keg: keg.litres() });

        let response = Self::send("active_keg", request).await?;
        Self::expect_status("active_keg", &response, StatusCode::OK)
    }

    async fn adjust_warehouse(
        &self,
        secret: &str,
        keg: WarehouseKeg,
        way: StockDirection,
    ) -> BackendResult<()> {
        let request = self
            .client
            .post(self.url("/api/scale/warehouse"))
            .header("Authorization", secret)
            .json(&WarehouseRequest {
                keg: keg.litres(),
                way,
            });

        let response = Self::send("warehouse", request).await?;
        Self::expect_status("warehouse", &response, StatusCode::OK)
    }
}
