use thiserror::Error;
use trellis_types::{ProtocolError, WidgetId};

/// Why a single widget could not be rendered. Never fatal: the widget is
/// left out of the DOM and its siblings render normally.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    #[error("widget '{0}' is not in the cache")]
    UnresolvedReference(WidgetId),

    #[error("widget '{id}' has unknown type '{kind}'")]
    UnknownWidgetType { id: WidgetId, kind: String },

    #[error("widget '{0}' is only known from property updates")]
    Placeholder(WidgetId),

    #[error("document rejected element for '{id}': {reason}")]
    Dom { id: WidgetId, reason: String },
}

/// An op or message that could not be applied.
#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("parent '{parent}' of widget '{id}' is not rendered")]
    UnresolvedParent { id: WidgetId, parent: String },

    #[error("snapshot has no root container")]
    NoRoot,

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("channel is not open, event dropped")]
    Unavailable,

    #[error("failed to send on channel: {0}")]
    Send(String),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}
