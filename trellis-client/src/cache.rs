use ahash::{AHashMap, AHashSet};
use serde_json::Value;
use trellis_types::{Properties, WidgetDescriptor, WidgetId, WidgetKind, props};

/// A widget as mirrored by the client.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedWidget {
    pub id: WidgetId,
    /// `None` for a placeholder created by an `update` that arrived before
    /// the widget itself.
    pub kind: Option<WidgetKind>,
    pub properties: Properties,
    pub children: Vec<WidgetId>,
}

impl CachedWidget {
    pub fn placeholder(id: WidgetId) -> Self {
        Self {
            id,
            kind: None,
            properties: Properties::new(),
            children: Vec::new(),
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.kind.is_none()
    }

    pub fn is_page(&self) -> bool {
        self.kind.as_ref().is_some_and(WidgetKind::is_page)
    }

    pub fn parent(&self) -> Option<WidgetId> {
        self.str_property(props::PARENT).map(WidgetId::from)
    }

    pub fn str_property(&self, name: &str) -> Option<&str> {
        self.properties.get(name).and_then(Value::as_str)
    }

    pub fn is_visible(&self) -> bool {
        matches!(self.properties.get(props::VISIBLE), Some(Value::Bool(true)))
    }

    /// Whether the renderer descends into this widget's children.
    pub fn shows_children(&self) -> bool {
        match &self.kind {
            Some(kind) if kind.is_page() => self.is_visible(),
            Some(kind) => kind.is_container(),
            None => false,
        }
    }

    /// Wire form; placeholders have no descriptor.
    pub fn descriptor(&self) -> Option<WidgetDescriptor> {
        Some(WidgetDescriptor {
            id: self.id.clone(),
            kind: self.kind.clone()?,
            properties: self.properties.clone(),
            children: self.children.clone(),
        })
    }
}

impl From<WidgetDescriptor> for CachedWidget {
    fn from(descriptor: WidgetDescriptor) -> Self {
        Self {
            id: descriptor.id,
            kind: Some(descriptor.kind),
            properties: descriptor.properties,
            children: descriptor.children,
        }
    }
}

/// Session-scoped mirror of the widget descriptors seen so far.
#[derive(Debug, Default)]
pub struct ClientCache {
    entries: AHashMap<WidgetId, CachedWidget>,
    root: Option<WidgetId>,
}

impl ClientCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &WidgetId) -> Option<&CachedWidget> {
        self.entries.get(id)
    }

    pub fn get_mut(&mut self, id: &WidgetId) -> Option<&mut CachedWidget> {
        self.entries.get_mut(id)
    }

    pub fn contains(&self, id: &WidgetId) -> bool {
        self.entries.contains_key(id)
    }

    pub fn root(&self) -> Option<&WidgetId> {
        self.root.as_ref()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &WidgetId> {
        self.entries.keys()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.root = None;
    }

    /// Replace the whole cache with a snapshot. Returns the root id.
    pub fn load(&mut self, widgets: Vec<WidgetDescriptor>) -> Option<WidgetId> {
        self.clear();
        for descriptor in widgets {
            self.insert(descriptor);
        }
        self.root.clone()
    }

    /// Store a descriptor as received, replacing any previous entry.
    pub fn insert(&mut self, descriptor: WidgetDescriptor) {
        self.insert_entry(CachedWidget::from(descriptor));
    }

    pub fn insert_entry(&mut self, entry: CachedWidget) {
        if entry.kind.as_ref().is_some_and(WidgetKind::is_root) && self.root.is_none() {
            self.root = Some(entry.id.clone());
        }
        self.entries.insert(entry.id.clone(), entry);
    }

    /// Merge one property. Returns true if a placeholder had to be created.
    pub fn merge_property(&mut self, id: &WidgetId, name: &str, value: Value) -> bool {
        let created = !self.entries.contains_key(id);
        self.entries
            .entry(id.clone())
            .or_insert_with(|| CachedWidget::placeholder(id.clone()))
            .properties
            .insert(name.to_string(), value);
        created
    }

    /// Append `child` to `parent`'s children unless already listed.
    pub fn link_child(&mut self, parent: &WidgetId, child: &WidgetId) {
        if let Some(parent) = self.entries.get_mut(parent) {
            if !parent.children.contains(child) {
                parent.children.push(child.clone());
            }
        }
    }

    pub fn unlink_child(&mut self, parent: &WidgetId, child: &WidgetId) {
        if let Some(parent) = self.entries.get_mut(parent) {
            parent.children.retain(|c| c != child);
        }
    }

    /// `id` and every cached descendant, in pre-order.
    pub fn subtree(&self, id: &WidgetId) -> Vec<WidgetId> {
        let mut out = Vec::new();
        let mut seen = AHashSet::new();
        let mut stack = vec![id.clone()];
        while let Some(current) = stack.pop() {
            let Some(entry) = self.entries.get(&current) else {
                continue;
            };
            if !seen.insert(current.clone()) {
                continue;
            }
            stack.extend(entry.children.iter().rev().cloned());
            out.push(current);
        }
        out
    }

    /// Delete `id` with all of its descendants and unlink it from its
    /// parent. Returns the removed ids; empty when `id` was not cached.
    pub fn remove_cascade(&mut self, id: &WidgetId) -> Vec<WidgetId> {
        let parent = self.entries.get(id).and_then(CachedWidget::parent);
        if let Some(parent) = parent {
            self.unlink_child(&parent, id);
        }
        let removed = self.subtree(id);
        for widget in &removed {
            self.entries.remove(widget);
        }
        if self.root.as_ref().is_some_and(|root| removed.contains(root)) {
            self.root = None;
        }
        removed
    }

    /// Drop every page-variant together with its descendants, plus any
    /// placeholder still waiting for its widget.
    ///
    /// Parents keep listing the evicted pages so a page that comes back
    /// later lands in its original position.
    pub fn evict_pages(&mut self) -> Vec<WidgetId> {
        self.evict_where(|entry| entry.is_page() || entry.is_placeholder())
    }

    /// Like [`evict_pages`](Self::evict_pages), but keeps the visible page.
    pub fn evict_hidden_pages(&mut self) -> Vec<WidgetId> {
        self.evict_where(|entry| (entry.is_page() && !entry.is_visible()) || entry.is_placeholder())
    }

    fn evict_where(&mut self, evict: impl Fn(&CachedWidget) -> bool) -> Vec<WidgetId> {
        let targets: Vec<WidgetId> = self
            .entries
            .values()
            .filter(|entry| evict(entry))
            .map(|entry| entry.id.clone())
            .collect();

        let mut evicted = Vec::new();
        for target in targets {
            for widget in self.subtree(&target) {
                if self.entries.remove(&widget).is_some() {
                    evicted.push(widget);
                }
            }
        }
        evicted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn id(s: &str) -> WidgetId {
        WidgetId::from(s)
    }

    fn snapshot() -> Vec<WidgetDescriptor> {
        vec![
            WidgetDescriptor::new("r", WidgetKind::RootContainer).with_children(["p1", "p2"]),
            WidgetDescriptor::new("p1", WidgetKind::page("HomePage"))
                .with_property("parent", "r")
                .with_property("visible", true)
                .with_children(["l1"]),
            WidgetDescriptor::new("l1", WidgetKind::Label)
                .with_property("parent", "p1")
                .with_property("text", "Hi"),
            WidgetDescriptor::new("p2", WidgetKind::page("AboutPage"))
                .with_property("parent", "r")
                .with_property("visible", false),
        ]
    }

    #[test]
    fn test_load_finds_root() {
        let mut cache = ClientCache::new();
        assert_eq!(cache.load(snapshot()), Some(id("r")));
        assert_eq!(cache.len(), 4);
    }

    #[test]
    fn test_merge_property_creates_placeholder() {
        let mut cache = ClientCache::new();
        assert!(cache.merge_property(&id("x"), "text", json!("early")));
        let entry = cache.get(&id("x")).unwrap();
        assert!(entry.is_placeholder());
        assert!(entry.descriptor().is_none());
        assert!(!cache.merge_property(&id("x"), "text", json!("later")));
    }

    #[test]
    fn test_remove_cascade_unlinks_parent() {
        let mut cache = ClientCache::new();
        cache.load(snapshot());

        let removed = cache.remove_cascade(&id("p1"));
        assert_eq!(removed, vec![id("p1"), id("l1")]);
        assert_eq!(cache.get(&id("r")).unwrap().children, vec![id("p2")]);
        assert!(!cache.contains(&id("l1")));

        assert!(cache.remove_cascade(&id("p1")).is_empty());
    }

    #[test]
    fn test_evict_pages_keeps_parent_listing() {
        let mut cache = ClientCache::new();
        cache.load(snapshot());

        let mut evicted = cache.evict_pages();
        evicted.sort();
        assert_eq!(evicted, vec![id("l1"), id("p1"), id("p2")]);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(&id("r")).unwrap().children, vec![id("p1"), id("p2")]);
    }

    #[test]
    fn test_evict_pages_drops_placeholders() {
        let mut cache = ClientCache::new();
        cache.load(snapshot());
        cache.merge_property(&id("x"), "text", json!("early"));

        let evicted = cache.evict_pages();
        assert!(evicted.contains(&id("x")));
        assert_eq!(cache.ids().collect::<Vec<_>>(), vec![&id("r")]);
    }

    #[test]
    fn test_evict_hidden_pages_keeps_visible_page() {
        let mut cache = ClientCache::new();
        cache.load(snapshot());

        assert_eq!(cache.evict_hidden_pages(), vec![id("p2")]);
        assert!(cache.contains(&id("p1")));
        assert!(cache.contains(&id("l1")));
        assert_eq!(cache.get(&id("r")).unwrap().children, vec![id("p1"), id("p2")]);
    }

    #[test]
    fn test_shows_children() {
        let mut cache = ClientCache::new();
        cache.load(snapshot());
        assert!(cache.get(&id("r")).unwrap().shows_children());
        assert!(cache.get(&id("p1")).unwrap().shows_children());
        assert!(!cache.get(&id("p2")).unwrap().shows_children());
        assert!(!cache.get(&id("l1")).unwrap().shows_children());
    }
}
