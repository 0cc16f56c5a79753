//! HTTP API module.
//!
//! This module provides the HTTP server, its shared state and the API types
//! for the stockview dashboard.

pub mod logs;
pub mod server;
pub mod state;
pub mod types;

pub use logs::*;
pub use server::{router, start_server};
pub use state::{AppState, Session};
pub use types::*;
