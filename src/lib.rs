//! TimeLock Vault client library.
//!
//! Drives a Stacks time-locked inheritance vault contract: unit conversion,
//! wallet session, contract call construction, and the screen state behind
//! the vault creation and management flows.

pub mod blockchain;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod session;
pub mod units;
pub mod vault;
pub mod views;

pub use config::schema::VaultConfig;
pub use http::{AppState, HttpServer};
pub use lifecycle::Shutdown;
