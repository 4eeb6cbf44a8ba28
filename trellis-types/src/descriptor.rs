use crate::{WidgetId, WidgetKind};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Property bag of a widget. Unknown keys are carried but never interpreted.
pub type Properties = serde_json::Map<String, Value>;

/// Property names with meaning to the protocol or the renderer.
pub mod props {
    pub const PARENT: &str = "parent";
    pub const VISIBLE: &str = "visible";
    pub const TEXT: &str = "text";
    pub const VALUE: &str = "value";
    pub const PLACEHOLDER: &str = "placeholder";
    pub const PATH: &str = "path";
    pub const TITLE: &str = "title";
}

/// Serialized form of a widget: `{ id, type, properties, children }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WidgetDescriptor {
    pub id: WidgetId,
    #[serde(rename = "type")]
    pub kind: WidgetKind,
    #[serde(default)]
    pub properties: Properties,
    #[serde(default)]
    pub children: Vec<WidgetId>,
}

impl WidgetDescriptor {
    pub fn new(id: impl Into<WidgetId>, kind: WidgetKind) -> Self {
        Self {
            id: id.into(),
            kind,
            properties: Properties::new(),
            children: Vec::new(),
        }
    }

    /// Builder-style property setter, mostly for tests and fixtures.
    pub fn with_property(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.properties.insert(name.to_string(), value.into());
        self
    }

    pub fn with_children<I, T>(mut self, children: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<WidgetId>,
    {
        self.children = children.into_iter().map(Into::into).collect();
        self
    }

    /// Parent id mirrored in `properties.parent`.
    pub fn parent(&self) -> Option<WidgetId> {
        self.str_property(props::PARENT).map(WidgetId::from)
    }

    pub fn str_property(&self, name: &str) -> Option<&str> {
        self.properties.get(name).and_then(Value::as_str)
    }

    /// Only an explicit `true` counts as visible.
    pub fn is_visible(&self) -> bool {
        matches!(self.properties.get(props::VISIBLE), Some(Value::Bool(true)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_descriptor_wire_shape() {
        let descriptor = WidgetDescriptor::new("b1", WidgetKind::Button)
            .with_property("text", "Go")
            .with_property("parent", "p1");

        let value = serde_json::to_value(&descriptor).unwrap();
        assert_eq!(
            value,
            json!({
                "id": "b1",
                "type": "Button",
                "properties": { "text": "Go", "parent": "p1" },
                "children": []
            })
        );
    }

    #[test]
    fn test_missing_collections_default() {
        let descriptor: WidgetDescriptor =
            serde_json::from_value(json!({ "id": "l1", "type": "Label" })).unwrap();
        assert!(descriptor.properties.is_empty());
        assert!(descriptor.children.is_empty());
        assert_eq!(descriptor.parent(), None);
    }

    #[test]
    fn test_visibility_requires_true() {
        let page = WidgetDescriptor::new("p", WidgetKind::page("HomePage"));
        assert!(!page.is_visible());
        assert!(!page.clone().with_property("visible", "yes").is_visible());
        assert!(page.with_property("visible", true).is_visible());
    }
}
