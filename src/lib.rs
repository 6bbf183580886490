pub mod apis;
pub mod config;
pub mod constants;
pub mod error;
pub mod logging;
pub mod pipeline;

// Ports and use cases, with their reqwest adapters
pub mod app;
pub mod infra;
