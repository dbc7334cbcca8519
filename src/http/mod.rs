//! HTTP process boundary.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, graceful shutdown)
//!     → request.rs (x-request-id set or propagated)
//!     → middleware.rs (Request started / Request completed records)
//!     → handlers (`/`, `/health`, 404 fallback)
//! ```

pub mod middleware;
pub mod request;
pub mod server;

pub use middleware::{request_logging, PanicResponder, X_PROCESS_TIME};
pub use request::{MakeRequestUuidV4, X_REQUEST_ID};
pub use server::HttpServer;
