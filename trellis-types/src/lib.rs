//! Wire types shared by the server tree and the browser-side cache.
//!
//! Everything in this crate is plain data with a stable JSON shape:
//! server to client envelopes carry either a full snapshot or an ordered
//! list of [`Op`]s, and client to server envelopes carry a single
//! [`ClientEvent`].

mod descriptor;
mod error;
mod event;
mod id;
mod kind;
mod message;

pub use descriptor::{Properties, WidgetDescriptor, props};
pub use error::ProtocolError;
pub use event::{ClientEvent, EventData, EventKind};
pub use id::WidgetId;
pub use kind::WidgetKind;
pub use message::{ClientMessage, Op, ResyncRequest, ServerMessage, Snapshot};

pub use serde_json::Value;
