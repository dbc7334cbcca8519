//! Structured application logging for the elections API.
//!
//! - [`logging`]: the JSON record contract and its emitter
//! - [`index`]: collector-side index naming, document mapping and filters
//! - [`http`]: the API process boundary with request logging
//! - [`config`], [`lifecycle`], [`observability`]: ambient plumbing

pub mod config;
pub mod http;
pub mod index;
pub mod lifecycle;
pub mod logging;
pub mod observability;

pub use config::AppConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use logging::{Context, Emitter, EmitterConfig, Level, LogRecord};
