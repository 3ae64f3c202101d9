pub mod config;
pub mod error;
pub mod http;
pub mod kinship;
pub mod reports;
pub mod service;
pub mod store;
pub mod types;
