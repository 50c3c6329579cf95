pub mod api;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod models;
pub mod panel;
pub mod resolve;
pub mod state;
pub mod store;
pub mod watcher;
