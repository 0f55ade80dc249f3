//! promo-sync: declare discount codes in YAML, reconcile the commerce
//! platform to match. Remote calls go through the [`contract`] trait so
//! orchestration can be tested against mocks.

pub mod actions;
pub mod auth;
pub mod cli;
pub mod client;
pub mod config;
pub mod contract;
pub mod error;
pub mod load_config;
pub mod marshal;
pub mod models;
pub mod plan;
pub mod resource;
pub mod retry;
pub mod schema;
pub mod sync;

pub use cli::{run, Cli, Commands};
