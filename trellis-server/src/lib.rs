//! Websocket host for server-driven widget trees.
//!
//! Each connection gets a fresh [`trellis_ui::Ui`] from a [`UiFactory`],
//! receives its snapshot, and from then on exchanges events for batches of
//! ops. See [`session::run_session`] for the per-connection loop.

pub mod config;
pub mod demo;
pub mod server;
pub mod session;

pub use config::{ServerConfig, init_tracing};
pub use server::{UiFactory, serve, serve_with_listener};
pub use session::run_session;
