use serde::{Deserialize, Serialize};
use std::fmt;

/// Widget type tag as carried in the `type` field of a descriptor.
///
/// Page-variants keep their concrete tag (`HomePage`, `AboutPage`, ...) so
/// the wire shape round-trips unchanged. Any tag that is not part of the
/// known catalog is preserved in [`WidgetKind::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum WidgetKind {
    RootContainer,
    Container,
    Page(String),
    Button,
    TextBox,
    Label,
    NavLink,
    Other(String),
}

impl WidgetKind {
    /// Page-variant with the given tag. Tags that don't name a page fall
    /// back to the plain `Page` tag.
    pub fn page(variant: impl Into<String>) -> Self {
        let variant = variant.into();
        if is_page_tag(&variant) {
            Self::Page(variant)
        } else {
            Self::Page("Page".to_string())
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::RootContainer => "RootContainer",
            Self::Container => "Container",
            Self::Page(tag) => tag,
            Self::Button => "Button",
            Self::TextBox => "TextBox",
            Self::Label => "Label",
            Self::NavLink => "NavLink",
            Self::Other(tag) => tag,
        }
    }

    pub fn is_page(&self) -> bool {
        matches!(self, Self::Page(_))
    }

    pub fn is_root(&self) -> bool {
        matches!(self, Self::RootContainer)
    }

    /// Kinds that may own children.
    pub fn is_container(&self) -> bool {
        matches!(self, Self::RootContainer | Self::Container | Self::Page(_))
    }
}

fn is_page_tag(tag: &str) -> bool {
    tag == "Page" || (tag.len() > 4 && tag.ends_with("Page"))
}

impl From<String> for WidgetKind {
    fn from(tag: String) -> Self {
        match tag.as_str() {
            "RootContainer" => Self::RootContainer,
            "Container" => Self::Container,
            "Button" => Self::Button,
            "TextBox" => Self::TextBox,
            "Label" => Self::Label,
            "NavLink" => Self::NavLink,
            _ if is_page_tag(&tag) => Self::Page(tag),
            _ => Self::Other(tag),
        }
    }
}

impl From<&str> for WidgetKind {
    fn from(tag: &str) -> Self {
        Self::from(tag.to_string())
    }
}

impl From<WidgetKind> for String {
    fn from(kind: WidgetKind) -> Self {
        match kind {
            WidgetKind::Page(tag) | WidgetKind::Other(tag) => tag,
            other => other.as_str().to_string(),
        }
    }
}

impl fmt::Display for WidgetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_tags() {
        assert_eq!(WidgetKind::from("Button"), WidgetKind::Button);
        assert_eq!(WidgetKind::from("RootContainer"), WidgetKind::RootContainer);
        assert_eq!(WidgetKind::from("NavLink"), WidgetKind::NavLink);
    }

    #[test]
    fn test_page_variants() {
        assert!(WidgetKind::from("Page").is_page());
        assert!(WidgetKind::from("HomePage").is_page());
        assert_eq!(WidgetKind::from("AboutPage").as_str(), "AboutPage");
        assert_eq!(WidgetKind::page("Sidebar"), WidgetKind::Page("Page".to_string()));
    }

    #[test]
    fn test_unknown_tag_is_preserved() {
        let kind = WidgetKind::from("Slider");
        assert_eq!(kind, WidgetKind::Other("Slider".to_string()));
        assert!(!kind.is_container());

        let json = serde_json::to_string(&kind).unwrap();
        assert_eq!(json, "\"Slider\"");
    }

    #[test]
    fn test_containers() {
        assert!(WidgetKind::RootContainer.is_container());
        assert!(WidgetKind::Container.is_container());
        assert!(WidgetKind::page("HomePage").is_container());
        assert!(!WidgetKind::Label.is_container());
    }
}
