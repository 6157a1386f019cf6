//! # stencil-cli
//!
//! The `stencil` command line over the template engine and the upgrade
//! orchestrator.
//!
//! - `stencil create [TEMPLATE] [PARAM=VALUE]...`
//! - `stencil upgrade <DIRECTORY>`
//! - `stencil list`
//!
//! Configuration is read from TOML (see [`StencilConfig`]). Logging goes to
//! stderr through a subscriber that only lives for the command run.

#![warn(unreachable_pub)]

mod cli;
mod commands;
mod config;
mod logging;

pub use cli::{command, parse_assignment};
pub use commands::{run, write_listing};
pub use config::{StencilConfig, CONFIG_ENV};
pub use logging::{level_for, subscriber, LOG_ENV};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
