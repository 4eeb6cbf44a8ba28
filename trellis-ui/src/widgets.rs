//! Constructors for the built-in widget catalog.
//!
//! Only the properties the protocol and renderer understand are set here;
//! anything else can be added with [`WidgetSpec::with`].

use serde_json::Value;
use trellis_types::{Properties, WidgetKind, props};

/// Kind plus initial properties of a widget about to be attached.
#[derive(Debug, Clone, PartialEq)]
pub struct WidgetSpec {
    pub kind: WidgetKind,
    pub properties: Properties,
}

impl WidgetSpec {
    pub fn new(kind: WidgetKind) -> Self {
        Self {
            kind,
            properties: Properties::new(),
        }
    }

    pub fn with(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.properties.insert(name.to_string(), value.into());
        self
    }
}

pub fn container() -> WidgetSpec {
    WidgetSpec::new(WidgetKind::Container)
}

pub fn label(text: impl Into<String>) -> WidgetSpec {
    WidgetSpec::new(WidgetKind::Label).with(props::TEXT, text.into())
}

pub fn button(text: impl Into<String>) -> WidgetSpec {
    WidgetSpec::new(WidgetKind::Button).with(props::TEXT, text.into())
}

pub fn text_box(value: impl Into<String>, placeholder: impl Into<String>) -> WidgetSpec {
    WidgetSpec::new(WidgetKind::TextBox)
        .with(props::VALUE, value.into())
        .with(props::PLACEHOLDER, placeholder.into())
}

pub fn nav_link(text: impl Into<String>, path: impl Into<String>) -> WidgetSpec {
    WidgetSpec::new(WidgetKind::NavLink)
        .with(props::TEXT, text.into())
        .with(props::PATH, path.into())
}

/// Page-variant, hidden until navigated to.
pub fn page(variant: &str, path: impl Into<String>, title: impl Into<String>) -> WidgetSpec {
    WidgetSpec::new(WidgetKind::page(variant))
        .with(props::PATH, path.into())
        .with(props::TITLE, title.into())
        .with(props::VISIBLE, false)
}
