// Library half of the backend; `main.rs` and the integration tests both build on it.
pub mod api_doc;
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod extractors;
pub mod lead_store;
pub mod leads;
pub mod user_store;
pub mod web_server;
