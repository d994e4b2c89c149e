//! # Core Runtime Module
//!
//! Foundational runtime infrastructure for the subtitle core:
//! - Logging and tracing bootstrap
//! - Configuration with fail-fast bridge validation
//!
//! Every other core crate depends on the logging conventions and the
//! [`CoreConfig`](config::CoreConfig) established here.

pub mod config;
pub mod error;
pub mod logging;

pub use config::{CoreConfig, CoreConfigBuilder, ProviderEndpoints};
pub use error::{Error, Result};
