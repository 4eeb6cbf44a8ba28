//! Browser-side mirror of a server widget tree.
//!
//! [`ClientSession`] applies server messages to a [`ClientCache`] and keeps
//! a [`Dom`] in step with it. [`Client`] adds the connection: event sending
//! and the reconnect policy. Nothing here touches a real browser; see
//! `trellis-web` for the `web-sys` backend and [`VirtualDom`] for an
//! in-memory one.

pub mod cache;
pub mod client;
pub mod dom;
pub mod error;
pub mod render;
pub mod session;
pub mod virtual_dom;

pub use cache::{CachedWidget, ClientCache};
pub use client::{Channel, Client, ReconnectPolicy};
pub use dom::{Dom, Listener};
pub use error::{ChannelError, ReconcileError, RenderError};
pub use session::ClientSession;
pub use virtual_dom::{NodeKey, VirtualDom};

pub use trellis_types as types;
