// Infrastructure layer - External dependencies and adapters
pub mod config;
pub mod credential_file;
pub mod http_backend;
