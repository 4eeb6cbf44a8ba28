use serde_json::Value;
use trellis_types::{Properties, WidgetDescriptor, WidgetId, WidgetKind, props};

/// A widget as held by the server tree.
#[derive(Debug, Clone, PartialEq)]
pub struct WidgetNode {
    pub id: WidgetId,
    pub kind: WidgetKind,
    pub properties: Properties,
    pub children: Vec<WidgetId>,
    /// Back-reference; agrees with exactly one container's `children`.
    pub parent: Option<WidgetId>,
}

impl WidgetNode {
    pub fn new(
        id: WidgetId,
        kind: WidgetKind,
        properties: Properties,
        parent: Option<WidgetId>,
    ) -> Self {
        Self {
            id,
            kind,
            properties,
            children: Vec::new(),
            parent,
        }
    }

    pub fn property(&self, name: &str) -> Option<&Value> {
        self.properties.get(name)
    }

    pub fn is_visible(&self) -> bool {
        matches!(self.properties.get(props::VISIBLE), Some(Value::Bool(true)))
    }

    /// Wire form with `properties.parent` filled in from the back-reference.
    pub fn descriptor(&self) -> WidgetDescriptor {
        let mut properties = self.properties.clone();
        if let Some(parent) = &self.parent {
            properties.insert(
                props::PARENT.to_string(),
                Value::String(parent.to_string()),
            );
        }
        WidgetDescriptor {
            id: self.id.clone(),
            kind: self.kind.clone(),
            properties,
            children: self.children.clone(),
        }
    }

    /// Descriptor without children, as carried by `add_widget`. Children
    /// follow in their own ops and are appended on arrival.
    pub fn shallow_descriptor(&self) -> WidgetDescriptor {
        let mut descriptor = self.descriptor();
        descriptor.children.clear();
        descriptor
    }
}
