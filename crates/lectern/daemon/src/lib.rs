//! Lectern Daemon library
//!
//! This module provides the core components for the Lectern daemon:
//! - REST API handlers with per-action access tables
//! - Projector element engine
//! - Config store, history log and change notifications
//! - Storage backends
//! - Server lifecycle management

pub mod access;
pub mod api;
pub mod auth;
pub mod autoupdate;
pub mod bootstrap;
pub mod config;
pub mod config_store;
pub mod error;
pub mod history;
pub mod locks;
pub mod projector;
pub mod server;
pub mod storage;

pub use api::{create_router, AppState};
pub use config::DaemonConfig;
pub use error::{ApiError, DaemonError, StorageError};
pub use server::Server;
pub use storage::{InMemoryStorage, Storage};
