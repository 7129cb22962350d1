//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML) or defaults
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → VaultConfig (validated, immutable)
//!     → shared via Arc to all subsystems
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; the selected network is runtime state, not config
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, load_or_default, ConfigError};
pub use schema::{
    AppConfig, ContractConfig, NetworkConfig, NetworkEndpointConfig, ObservabilityConfig,
    ServerConfig, TrackingConfig, VaultConfig, WalletConfig,
};
