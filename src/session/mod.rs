//! Session and identity subsystem.
//!
//! # Data Flow
//! ```text
//! sign-in request
//!     → identity.rs (wallet connect, store identity)
//!     → context.rs (SessionContext snapshot)
//!     → passed explicitly into facade and view operations
//! ```

pub mod context;
pub mod identity;

pub use context::{short_address, SessionContext};
pub use identity::Session;
