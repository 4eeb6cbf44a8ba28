use crate::{WidgetId, props};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Named event channel of a widget (`click`, `change`, `navigate`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EventKind {
    Click,
    Change,
    /// Synthetic event sent when browser history moves.
    Navigate,
    Other(String),
}

impl EventKind {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Click => "click",
            Self::Change => "change",
            Self::Navigate => "navigate",
            Self::Other(name) => name,
        }
    }
}

impl From<String> for EventKind {
    fn from(name: String) -> Self {
        match name.as_str() {
            "click" => Self::Click,
            "change" => Self::Change,
            "navigate" => Self::Navigate,
            _ => Self::Other(name),
        }
    }
}

impl From<&str> for EventKind {
    fn from(name: &str) -> Self {
        Self::from(name.to_string())
    }
}

impl From<EventKind> for String {
    fn from(kind: EventKind) -> Self {
        match kind {
            EventKind::Other(name) => name,
            other => other.as_str().to_string(),
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Action-specific payload: `{}` for click, `{value}` for change,
/// `{path}` for links and navigation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventData(Map<String, Value>);

impl EventData {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_value(value: impl Into<String>) -> Self {
        let mut data = Map::new();
        data.insert(props::VALUE.to_string(), Value::String(value.into()));
        Self(data)
    }

    pub fn with_path(path: impl Into<String>) -> Self {
        let mut data = Map::new();
        data.insert(props::PATH.to_string(), Value::String(path.into()));
        Self(data)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn value(&self) -> Option<&str> {
        self.0.get(props::VALUE).and_then(Value::as_str)
    }

    pub fn path(&self) -> Option<&str> {
        self.0.get(props::PATH).and_then(Value::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// `{ id, type, data }` body of a client event envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientEvent {
    pub id: WidgetId,
    #[serde(rename = "type")]
    pub kind: EventKind,
    #[serde(default)]
    pub data: EventData,
}

impl ClientEvent {
    pub fn new(id: impl Into<WidgetId>, kind: EventKind, data: EventData) -> Self {
        Self {
            id: id.into(),
            kind,
            data,
        }
    }

    pub fn click(id: impl Into<WidgetId>) -> Self {
        Self::new(id, EventKind::Click, EventData::empty())
    }

    pub fn change(id: impl Into<WidgetId>, value: impl Into<String>) -> Self {
        Self::new(id, EventKind::Change, EventData::with_value(value))
    }

    pub fn navigate(id: impl Into<WidgetId>, path: impl Into<String>) -> Self {
        Self::new(id, EventKind::Navigate, EventData::with_path(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_event_kind_strings() {
        assert_eq!(EventKind::from("click"), EventKind::Click);
        assert_eq!(EventKind::from("hover"), EventKind::Other("hover".to_string()));
        assert_eq!(String::from(EventKind::Navigate), "navigate");
    }

    #[test]
    fn test_change_event_shape() {
        let event = ClientEvent::change("t1", "hello");
        assert_eq!(
            serde_json::to_value(&event).unwrap(),
            json!({ "id": "t1", "type": "change", "data": { "value": "hello" } })
        );
    }

    #[test]
    fn test_missing_data_defaults_to_empty() {
        let event: ClientEvent =
            serde_json::from_value(json!({ "id": "b1", "type": "click" })).unwrap();
        assert!(event.data.is_empty());
        assert_eq!(event.kind, EventKind::Click);
    }
}
