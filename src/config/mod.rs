//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → ServerConfig (validated, immutable)
//!     → RouteConfig tree handed to the router builder
//!
//! On reload:
//!     watcher.rs detects change
//!     → loader.rs loads new config
//!     → validation.rs validates
//!     → router rebuilt from scratch (new scopes, no fallbacks)
//!     → atomic swap of the live dispatcher
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require full reload
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{
    InfoConfig, ListenerConfig, ObservabilityConfig, PathMatch, RequestMetadata, ResponseMetadata,
    RouteConfig, RouterConfig, ServerConfig, TimeoutConfig,
};
pub use validation::{validate_config, ValidationError};
