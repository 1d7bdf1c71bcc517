//! Shared utilities for the page analyzer crates.
//!
//! Right now this is only the tracing setup in [`observability`]; it is kept
//! in its own crate so binaries and integration tests across the workspace
//! initialise logging the same way.
//!
//! ```rust
//! use analyzer_common::observability::{LogConfig, LogFormat};
//!
//! let cfg = LogConfig {
//!     format: LogFormat::Json,
//!     ..LogConfig::default()
//! };
//! assert_eq!(cfg.app_name, "page-analyzer");
//! ```

pub mod observability;
