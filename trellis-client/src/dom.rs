use crate::error::RenderError;
use trellis_types::{ClientEvent, EventData, EventKind, WidgetId};

/// DOM event a rendered widget listens to and the wire event it turns into.
#[derive(Debug, Clone, PartialEq)]
pub struct Listener {
    /// Native event name, `click` or `input`.
    pub dom_event: &'static str,
    pub widget: WidgetId,
    pub kind: EventKind,
    /// Fixed payload, e.g. a link's `path`.
    pub data: EventData,
    /// Add the element's current value as `data.value` when fired.
    pub include_value: bool,
    pub prevent_default: bool,
}

impl Listener {
    pub fn click(widget: WidgetId) -> Self {
        Self {
            dom_event: "click",
            widget,
            kind: EventKind::Click,
            data: EventData::empty(),
            include_value: false,
            prevent_default: false,
        }
    }

    pub fn link(widget: WidgetId, path: &str) -> Self {
        Self {
            data: EventData::with_path(path),
            prevent_default: true,
            ..Self::click(widget)
        }
    }

    pub fn change(widget: WidgetId) -> Self {
        Self {
            dom_event: "input",
            widget,
            kind: EventKind::Change,
            data: EventData::empty(),
            include_value: true,
            prevent_default: false,
        }
    }

    /// Wire event for one firing, given the element's value at that time.
    pub fn event(&self, value: Option<&str>) -> ClientEvent {
        let mut data = self.data.clone();
        if self.include_value {
            data.insert("value", value.unwrap_or_default());
        }
        ClientEvent::new(self.widget.clone(), self.kind.clone(), data)
    }
}

/// The operations reconciliation needs from a document.
///
/// Elements are handles; a backend decides what they point at. Every
/// element created for a widget carries that widget's id so
/// [`Dom::element_for`] can find it again.
pub trait Dom {
    type Element: Clone;

    /// Element that widget trees are rendered into.
    fn mount(&self) -> Self::Element;

    fn create_element(&mut self, tag: &str, widget: &WidgetId) -> Result<Self::Element, RenderError>;

    fn set_text(&mut self, el: &Self::Element, text: &str);

    fn set_attribute(&mut self, el: &Self::Element, name: &str, value: &str);

    fn set_input_value(&mut self, el: &Self::Element, value: &str);

    fn append_child(&mut self, parent: &Self::Element, child: &Self::Element);

    /// Put `new` where `old` is, detaching `old`.
    fn replace_with(&mut self, old: &Self::Element, new: &Self::Element);

    fn remove(&mut self, el: &Self::Element);

    fn clear_children(&mut self, el: &Self::Element);

    /// Element currently in the document for `widget`, if any.
    fn element_for(&self, widget: &WidgetId) -> Option<Self::Element>;

    fn listen(&mut self, el: &Self::Element, listener: Listener);

    fn set_title(&mut self, title: &str);

    /// Mirror `path` into the address bar without reloading.
    fn push_location(&mut self, path: &str);
}

#[cfg(test)]
mod tests {
    use super::*;
    use trellis_types::Value;

    #[test]
    fn test_listener_events() {
        let click = Listener::click("b1".into()).event(None);
        assert_eq!(click.kind, EventKind::Click);
        assert!(click.data.is_empty());

        let link = Listener::link("n1".into(), "about");
        assert!(link.prevent_default);
        assert_eq!(link.event(None).data.path(), Some("about"));

        let change = Listener::change("t1".into()).event(Some("abc"));
        assert_eq!(change.kind, EventKind::Change);
        assert_eq!(change.data.get("value"), Some(&Value::from("abc")));
    }
}
