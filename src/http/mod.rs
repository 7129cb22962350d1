//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → request.rs (request ID, metrics)
//!     → server.rs (Axum setup, trace + timeout layers)
//!     → middleware/session_guard.rs (redirect signed-out, SessionContext)
//!     → handlers.rs (drive the screens)
//!     → response.rs (errors → status + JSON)
//!     → Send to client
//! ```

pub mod handlers;
pub mod middleware;
pub mod request;
pub mod response;
pub mod server;

pub use request::{RequestIdExt, X_REQUEST_ID};
pub use response::ApiError;
pub use server::{AppState, HttpServer};
