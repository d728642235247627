//! Common types shared by the M-Pesa client crates
//!
//! Holds the pieces every other crate needs without pulling in HTTP:
//! secret handling for consumer credentials, the sandbox/production
//! environment switch, and TOML client configuration.

mod config;
mod environment;
mod error;
mod secret;

pub use config::{ClientConfig, RetryConfig};
pub use environment::Environment;
pub use error::{Error, Result};
pub use secret::Secret;
