//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → AppConfig (validated, immutable)
//!     → passed explicitly to logging and http
//!
//! On file change:
//!     watcher.rs detects change
//!     → loader.rs loads new config
//!     → validation.rs validates
//!     → new log threshold applied to the shared emitter
//! ```
//!
//! # Design Decisions
//! - All fields have defaults so an absent file means "run with defaults"
//! - Validation separates syntactic (serde) from semantic checks
//! - Only the log threshold is hot-reloadable; outputs and listener need a restart

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{AppConfig, IndexConfig, ListenerConfig, LoggingConfig, ObservabilityConfig, TimeoutConfig};
pub use validation::{validate_config, ValidationError};
pub use watcher::ConfigWatcher;
