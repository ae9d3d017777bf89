//! dockwait - wait until a freshly started container is ready.
//!
//! The crate is built around a small poll engine ([`wait::Waiter`]) that
//! runs readiness [`wait::Probe`]s (HTTP status ping, TCP connect) until one
//! succeeds or a deadline passes, and a bounded task runner
//! ([`wait::run_bounded`]) that puts a hard deadline on a single unit of work.
//!
//! Container lifecycle is reached through the injected
//! [`container::ContainerAccess`] collaborator.

pub mod cli;
pub mod config;
pub mod container;
pub mod error;
pub mod wait;

pub use error::{ConfigError, ContainerError, ProbeError, WaitError};
