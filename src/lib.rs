// Library module for s3explorer
// Re-exports modules for use in integration tests and the terminal front end

pub mod app;
pub mod breadcrumb;
pub mod config;
pub mod datasource;
pub mod error;
pub mod events;
pub mod listing;
pub mod nav;
pub mod ui;
pub mod upload;

pub use error::ExplorerError;
