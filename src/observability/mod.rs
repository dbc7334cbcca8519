//! Observability subsystem.
//!
//! Structured logs live in [`crate::logging`]; this module holds the
//! metrics side.
//!
//! # Data Flow
//! ```text
//! logging::Emitter ──▶ metrics.rs (emitted / degraded / suppressed counters)
//! http middleware  ──▶ metrics.rs (request counter, latency histogram)
//!                        → Prometheus scrape endpoint (optional)
//! ```

pub mod metrics;
