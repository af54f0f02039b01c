// Application layer - Use cases and the ports they depend on
pub mod auth_session;
pub mod chart_series;
pub mod credential_store;
pub mod dashboard_sync;
pub mod pub_service;
pub mod scale_backend;
pub mod scheduler;
