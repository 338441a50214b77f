//! TAT Daemon library
//!
//! - REST API over the timeline service
//! - Configuration loading
//! - Server lifecycle management

pub mod api;
pub mod config;
pub mod error;
pub mod server;

pub use config::DaemonConfig;
pub use error::{ApiError, DaemonError, DaemonResult};
pub use server::Server;
