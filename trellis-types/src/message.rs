use crate::{ClientEvent, ProtocolError, WidgetDescriptor, WidgetId};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One entry of an `updates` message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Op {
    /// Partial-property patch.
    Update {
        id: WidgetId,
        property: String,
        value: Value,
    },
    /// Removal of a widget and, on the client, everything below it.
    Remove {
        id: WidgetId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        parent: Option<WidgetId>,
    },
    /// URL/title change without widget replacement.
    Navigation {
        path: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        title: Option<String>,
    },
    /// New widget; `widget.properties.parent` names its container.
    AddWidget { widget: WidgetDescriptor },
    /// Bulk replacement of the visible page.
    PageWidgets {
        page_path: String,
        widgets: Vec<WidgetDescriptor>,
    },
}

impl Op {
    pub fn action(&self) -> &'static str {
        match self {
            Op::Update { .. } => "update",
            Op::Remove { .. } => "remove",
            Op::Navigation { .. } => "navigation",
            Op::AddWidget { .. } => "add_widget",
            Op::PageWidgets { .. } => "page_widgets",
        }
    }
}

/// Full widget set, root first, in pre-order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub widgets: Vec<WidgetDescriptor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

/// Server to client envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ServerMessage {
    InitialState(Snapshot),
    Updates(Vec<Op>),
}

impl ServerMessage {
    pub fn to_json(&self) -> Result<String, ProtocolError> {
        serde_json::to_string(self).map_err(ProtocolError::Encode)
    }

    pub fn from_json(text: &str) -> Result<Self, ProtocolError> {
        serde_json::from_str(text).map_err(ProtocolError::Decode)
    }
}

/// Body of `{ "resync": {} }`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResyncRequest {}

/// Client to server envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ClientMessage {
    Event(ClientEvent),
    /// Ask for a fresh snapshot, sent after every reconnect.
    Resync(ResyncRequest),
}

impl ClientMessage {
    pub fn resync() -> Self {
        Self::Resync(ResyncRequest::default())
    }

    pub fn to_json(&self) -> Result<String, ProtocolError> {
        serde_json::to_string(self).map_err(ProtocolError::Encode)
    }

    pub fn from_json(text: &str) -> Result<Self, ProtocolError> {
        serde_json::from_str(text).map_err(ProtocolError::Decode)
    }
}
