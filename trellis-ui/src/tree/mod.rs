mod arena;
mod node;

pub use arena::WidgetArena;
pub use node::WidgetNode;

use crate::error::TreeError;
use crate::recorder::ChangeRecorder;
use crate::widgets::WidgetSpec;
use serde_json::Value;
use tracing::{debug, trace};
use trellis_types::{Op, Properties, Snapshot, WidgetDescriptor, WidgetId, WidgetKind, props};
use uuid::Uuid;

/// Fresh, session-unique widget id.
pub fn new_widget_id() -> WidgetId {
    WidgetId::new(Uuid::new_v4().to_string())
}

/// Server-side source of truth: a rooted, ordered widget tree whose
/// mutations are recorded as wire ops.
///
/// Every mutating call either fails without touching the tree or appends
/// its ops to the recorder in causal order. No-op mutations record nothing.
pub struct WidgetTree {
    arena: WidgetArena,
    root: WidgetId,
    recorder: ChangeRecorder,
}

impl WidgetTree {
    pub fn new() -> Self {
        Self::with_root_id(new_widget_id())
    }

    pub fn with_root_id(root: impl Into<WidgetId>) -> Self {
        let root = root.into();
        let mut arena = WidgetArena::new();
        arena.insert(WidgetNode::new(
            root.clone(),
            WidgetKind::RootContainer,
            Properties::new(),
            None,
        ));
        Self {
            arena,
            root,
            recorder: ChangeRecorder::new(),
        }
    }

    pub fn root(&self) -> &WidgetId {
        &self.root
    }

    pub fn get(&self, id: &WidgetId) -> Option<&WidgetNode> {
        self.arena.get(id)
    }

    pub fn contains(&self, id: &WidgetId) -> bool {
        self.arena.contains(id)
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    pub fn property(&self, id: &WidgetId, name: &str) -> Option<&Value> {
        self.arena.get(id)?.property(name)
    }

    pub fn children(&self, id: &WidgetId) -> &[WidgetId] {
        self.arena
            .get(id)
            .map(|node| node.children.as_slice())
            .unwrap_or(&[])
    }

    pub fn parent(&self, id: &WidgetId) -> Option<&WidgetId> {
        self.arena.get(id)?.parent.as_ref()
    }

    /// Attach a new widget with a generated id as the last child of `parent`.
    pub fn attach(&mut self, parent: &WidgetId, spec: WidgetSpec) -> Result<WidgetId, TreeError> {
        self.attach_with_id(parent, new_widget_id(), spec)
    }

    /// Attach a new widget with an application-chosen id.
    pub fn attach_with_id(
        &mut self,
        parent: &WidgetId,
        id: impl Into<WidgetId>,
        spec: WidgetSpec,
    ) -> Result<WidgetId, TreeError> {
        let id = id.into();
        if self.arena.was_used(&id) {
            return Err(TreeError::DuplicateId(id));
        }
        if spec.kind.is_root() {
            return Err(TreeError::SecondRoot);
        }
        if spec.properties.contains_key(props::PARENT) {
            return Err(TreeError::ReservedProperty(props::PARENT.to_string()));
        }

        let parent_node = self
            .arena
            .get_mut(parent)
            .ok_or_else(|| TreeError::UnresolvedReference(parent.clone()))?;
        if !parent_node.kind.is_container() {
            return Err(TreeError::NotAContainer(parent.clone()));
        }
        parent_node.children.push(id.clone());

        let node = WidgetNode::new(id.clone(), spec.kind, spec.properties, Some(parent.clone()));
        let widget = node.shallow_descriptor();
        self.arena.insert(node);

        debug!(widget = %id, parent = %parent, kind = %widget.kind, "attached widget");
        if !self.in_hidden_page(parent) {
            self.recorder.record(Op::AddWidget { widget });
        }
        Ok(id)
    }

    /// Set a property. Returns `Ok(false)` when the value was already current.
    ///
    /// A page's `visible` flag belongs to [`show_page`](Self::show_page).
    /// Changes inside a hidden page are applied but not recorded; the page's
    /// `page_widgets` op carries them once it is shown.
    pub fn set_property(
        &mut self,
        id: &WidgetId,
        name: &str,
        value: impl Into<Value>,
    ) -> Result<bool, TreeError> {
        if name == props::PARENT {
            return Err(TreeError::ReservedProperty(name.to_string()));
        }
        let value = value.into();
        let node = self
            .arena
            .get_mut(id)
            .ok_or_else(|| TreeError::UnresolvedReference(id.clone()))?;
        if name == props::VISIBLE && node.kind.is_page() {
            return Err(TreeError::ReservedProperty(name.to_string()));
        }
        if node.properties.get(name) == Some(&value) {
            return Ok(false);
        }
        node.properties.insert(name.to_string(), value.clone());

        if self.in_hidden_page(id) {
            trace!(widget = %id, property = name, "update inside hidden page not recorded");
            return Ok(true);
        }
        self.recorder.record(Op::Update {
            id: id.clone(),
            property: name.to_string(),
            value,
        });
        Ok(true)
    }

    /// Remove a widget together with its descendants. One `remove` op is
    /// recorded; the client cascades it. Returns the removed ids, `id` first.
    pub fn detach(&mut self, id: &WidgetId) -> Result<Vec<WidgetId>, TreeError> {
        if *id == self.root {
            return Err(TreeError::RootRemoval);
        }
        let parent = self
            .arena
            .get(id)
            .ok_or_else(|| TreeError::UnresolvedReference(id.clone()))?
            .parent
            .clone();

        if let Some(parent_node) = parent.as_ref().and_then(|p| self.arena.get_mut(p)) {
            parent_node.children.retain(|child| child != id);
        }
        let removed = self.arena.subtree(id);
        for widget in &removed {
            self.arena.remove(widget);
        }

        debug!(widget = %id, removed = removed.len(), "detached widget");
        self.recorder.record(Op::Remove {
            id: id.clone(),
            parent,
        });
        Ok(removed)
    }

    /// Re-parent a subtree, appending it to `new_parent`'s children.
    ///
    /// Recorded as a `remove` of the old position followed by one
    /// `add_widget` per subtree node in pre-order.
    pub fn move_widget(&mut self, id: &WidgetId, new_parent: &WidgetId) -> Result<(), TreeError> {
        if *id == self.root {
            return Err(TreeError::RootRemoval);
        }
        let old_parent = self
            .arena
            .get(id)
            .ok_or_else(|| TreeError::UnresolvedReference(id.clone()))?
            .parent
            .clone();
        let target = self
            .arena
            .get(new_parent)
            .ok_or_else(|| TreeError::UnresolvedReference(new_parent.clone()))?;
        if !target.kind.is_container() {
            return Err(TreeError::NotAContainer(new_parent.clone()));
        }
        if id == new_parent || self.arena.is_ancestor(id, new_parent) {
            return Err(TreeError::Cycle(id.clone(), new_parent.clone()));
        }

        if let Some(parent_node) = old_parent.as_ref().and_then(|p| self.arena.get_mut(p)) {
            parent_node.children.retain(|child| child != id);
        }
        if let Some(parent_node) = self.arena.get_mut(new_parent) {
            parent_node.children.push(id.clone());
        }
        if let Some(node) = self.arena.get_mut(id) {
            node.parent = Some(new_parent.clone());
        }

        self.recorder.record(Op::Remove {
            id: id.clone(),
            parent: old_parent,
        });
        if self.in_hidden_page(new_parent) {
            return Ok(());
        }
        for widget in self.arena.subtree(id) {
            if let Some(node) = self.arena.get(&widget) {
                let widget = node.shallow_descriptor();
                self.recorder.record(Op::AddWidget { widget });
            }
        }
        Ok(())
    }

    /// Make `page` the only visible page-variant and record the bulk
    /// `page_widgets` op for its subtree. Visibility flips on the other
    /// pages are folded into that op rather than recorded one by one.
    pub fn show_page(&mut self, page: &WidgetId) -> Result<(), TreeError> {
        let node = self
            .arena
            .get(page)
            .ok_or_else(|| TreeError::UnresolvedReference(page.clone()))?;
        if !node.kind.is_page() {
            return Err(TreeError::NotAPage(page.clone()));
        }
        let page_path = node
            .property(props::PATH)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        for node in self.arena.nodes_mut().filter(|n| n.kind.is_page()) {
            let visible = node.id == *page;
            node.properties
                .insert(props::VISIBLE.to_string(), Value::Bool(visible));
        }

        let widgets = self.subtree_descriptors(page);
        debug!(page = %page, path = %page_path, widgets = widgets.len(), "page swap");
        self.recorder.record(Op::PageWidgets { page_path, widgets });
        Ok(())
    }

    /// Whether `id` is a page-variant that is not shown, or sits below one.
    pub fn in_hidden_page(&self, id: &WidgetId) -> bool {
        let mut current = Some(id);
        while let Some(widget) = current {
            let Some(node) = self.arena.get(widget) else {
                return false;
            };
            if node.kind.is_page() && !node.is_visible() {
                return true;
            }
            current = node.parent.as_ref();
        }
        false
    }

    pub fn record_navigation(&mut self, path: impl Into<String>, title: Option<String>) {
        self.recorder.record(Op::Navigation {
            path: path.into(),
            title,
        });
    }

    pub fn descriptor(&self, id: &WidgetId) -> Option<WidgetDescriptor> {
        self.arena.get(id).map(WidgetNode::descriptor)
    }

    /// `id` and its descendants as descriptors, in pre-order.
    pub fn subtree_descriptors(&self, id: &WidgetId) -> Vec<WidgetDescriptor> {
        self.arena
            .subtree(id)
            .iter()
            .filter_map(|widget| self.descriptor(widget))
            .collect()
    }

    /// Whole tree, root first.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            widgets: self.subtree_descriptors(&self.root),
            path: None,
            title: None,
        }
    }

    pub fn recorder(&self) -> &ChangeRecorder {
        &self.recorder
    }

    /// Drain the ops recorded since the last call.
    pub fn take_ops(&mut self) -> Vec<Op> {
        self.recorder.take()
    }

    pub fn discard_ops(&mut self) {
        self.recorder.clear();
    }
}

impl Default for WidgetTree {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::widgets::{button, container, label, page};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn id(s: &str) -> WidgetId {
        WidgetId::from(s)
    }

    fn tree_with_page() -> WidgetTree {
        let mut tree = WidgetTree::with_root_id("r");
        tree.attach_with_id(&id("r"), "p1", page("HomePage", "home", "Home"))
            .unwrap();
        tree.attach_with_id(&id("p1"), "l1", label("Hi")).unwrap();
        tree.attach_with_id(&id("p1"), "b1", button("Go")).unwrap();
        tree.show_page(&id("p1")).unwrap();
        tree.discard_ops();
        tree
    }

    #[test]
    fn test_new_tree_has_single_root() {
        let tree = WidgetTree::new();
        assert_eq!(tree.len(), 1);
        let root = tree.get(tree.root()).unwrap();
        assert_eq!(root.kind, WidgetKind::RootContainer);
        assert!(root.parent.is_none());
    }

    #[test]
    fn test_attach_records_add_widget_with_parent() {
        let mut tree = WidgetTree::with_root_id("r");
        let b = tree.attach(&id("r"), button("Go")).unwrap();

        let ops = tree.take_ops();
        assert_eq!(ops.len(), 1);
        let Op::AddWidget { widget } = &ops[0] else {
            panic!("expected add_widget, got {:?}", ops[0]);
        };
        assert_eq!(widget.id, b);
        assert_eq!(widget.parent(), Some(id("r")));
        assert_eq!(widget.properties.get("text"), Some(&json!("Go")));
        assert_eq!(tree.children(&id("r")), &[b.clone()]);
        assert_eq!(tree.parent(&b), Some(&id("r")));
    }

    #[test]
    fn test_attach_rejects_bad_references() {
        let mut tree = tree_with_page();

        assert_eq!(
            tree.attach(&id("missing"), label("x")),
            Err(TreeError::UnresolvedReference(id("missing")))
        );
        assert_eq!(
            tree.attach(&id("b1"), label("x")),
            Err(TreeError::NotAContainer(id("b1")))
        );
        assert_eq!(
            tree.attach_with_id(&id("p1"), "l1", label("x")),
            Err(TreeError::DuplicateId(id("l1")))
        );
        assert_eq!(
            tree.attach(&id("p1"), WidgetSpec::new(WidgetKind::RootContainer)),
            Err(TreeError::SecondRoot)
        );
        assert!(tree.take_ops().is_empty());
    }

    #[test]
    fn test_set_property_skips_no_op() {
        let mut tree = tree_with_page();

        assert_eq!(tree.set_property(&id("l1"), "text", "Hi"), Ok(false));
        assert!(tree.take_ops().is_empty());

        assert_eq!(tree.set_property(&id("l1"), "text", "Bye"), Ok(true));
        assert_eq!(
            tree.take_ops(),
            vec![Op::Update {
                id: id("l1"),
                property: "text".to_string(),
                value: json!("Bye"),
            }]
        );
    }

    #[test]
    fn test_parent_property_is_reserved() {
        let mut tree = tree_with_page();
        assert_eq!(
            tree.set_property(&id("l1"), "parent", "r"),
            Err(TreeError::ReservedProperty("parent".to_string()))
        );
    }

    #[test]
    fn test_page_visibility_is_reserved() {
        let mut tree = tree_with_page();
        assert_eq!(
            tree.set_property(&id("p1"), "visible", false),
            Err(TreeError::ReservedProperty("visible".to_string()))
        );
        assert_eq!(tree.property(&id("p1"), "visible"), Some(&json!(true)));
        assert!(tree.take_ops().is_empty());

        // plain widgets may still carry the flag
        assert_eq!(tree.set_property(&id("l1"), "visible", false), Ok(true));
    }

    #[test]
    fn test_hidden_page_changes_are_not_recorded() {
        let mut tree = tree_with_page();
        tree.attach_with_id(&id("r"), "p2", page("AboutPage", "about", "About"))
            .unwrap();
        assert_eq!(tree.take_ops().len(), 1);

        tree.attach_with_id(&id("p2"), "l2", label("About us")).unwrap();
        assert_eq!(tree.set_property(&id("l2"), "text", "Who we are"), Ok(true));
        assert_eq!(tree.set_property(&id("p2"), "title", "About Trellis"), Ok(true));
        assert!(tree.take_ops().is_empty());
        assert!(tree.in_hidden_page(&id("l2")));
        assert!(!tree.in_hidden_page(&id("l1")));

        // moving into a hidden page only tells the client to drop it
        tree.move_widget(&id("b1"), &id("p2")).unwrap();
        let actions: Vec<_> = tree.take_ops().iter().map(Op::action).collect();
        assert_eq!(actions, vec!["remove"]);

        tree.show_page(&id("p2")).unwrap();
        let ops = tree.take_ops();
        let Op::PageWidgets { widgets, .. } = &ops[0] else {
            panic!("expected page_widgets");
        };
        assert_eq!(widgets[0].str_property("title"), Some("About Trellis"));
        assert_eq!(widgets[1].str_property("text"), Some("Who we are"));
        assert_eq!(widgets.len(), 3);
    }

    #[test]
    fn test_detach_cascades() {
        let mut tree = tree_with_page();
        let removed = tree.detach(&id("p1")).unwrap();

        assert_eq!(removed, vec![id("p1"), id("l1"), id("b1")]);
        assert_eq!(tree.len(), 1);
        assert!(tree.children(&id("r")).is_empty());
        assert_eq!(
            tree.take_ops(),
            vec![Op::Remove {
                id: id("p1"),
                parent: Some(id("r")),
            }]
        );

        // removed ids stay burnt
        assert_eq!(
            tree.attach_with_id(&id("r"), "l1", label("again")),
            Err(TreeError::DuplicateId(id("l1")))
        );
    }

    #[test]
    fn test_root_cannot_be_detached() {
        let mut tree = tree_with_page();
        assert_eq!(tree.detach(&id("r")), Err(TreeError::RootRemoval));
    }

    #[test]
    fn test_move_widget_records_remove_then_adds() {
        let mut tree = tree_with_page();
        tree.attach_with_id(&id("p1"), "c", container()).unwrap();
        tree.attach_with_id(&id("c"), "c1", label("inner")).unwrap();
        tree.discard_ops();

        tree.move_widget(&id("c"), &id("r")).unwrap();

        assert_eq!(tree.children(&id("r")), &[id("p1"), id("c")]);
        assert_eq!(tree.children(&id("p1")), &[id("l1"), id("b1")]);
        assert_eq!(tree.parent(&id("c")), Some(&id("r")));

        let ops = tree.take_ops();
        let actions: Vec<_> = ops.iter().map(Op::action).collect();
        assert_eq!(actions, vec!["remove", "add_widget", "add_widget"]);
        if let Op::AddWidget { widget } = &ops[1] {
            assert_eq!(widget.id, id("c"));
            assert_eq!(widget.parent(), Some(id("r")));
            assert!(widget.children.is_empty());
        }
    }

    #[test]
    fn test_move_widget_rejects_cycles() {
        let mut tree = tree_with_page();
        tree.attach_with_id(&id("p1"), "c", container()).unwrap();
        assert_eq!(
            tree.move_widget(&id("p1"), &id("c")),
            Err(TreeError::Cycle(id("p1"), id("c")))
        );
        assert_eq!(
            tree.move_widget(&id("c"), &id("c")),
            Err(TreeError::Cycle(id("c"), id("c")))
        );
    }

    #[test]
    fn test_show_page_emits_single_bulk_op() {
        let mut tree = tree_with_page();
        tree.attach_with_id(&id("r"), "p2", page("AboutPage", "about", "About"))
            .unwrap();
        tree.attach_with_id(&id("p2"), "l2", label("About us")).unwrap();
        tree.discard_ops();

        tree.show_page(&id("p2")).unwrap();

        let ops = tree.take_ops();
        assert_eq!(ops.len(), 1);
        let Op::PageWidgets { page_path, widgets } = &ops[0] else {
            panic!("expected page_widgets");
        };
        assert_eq!(page_path, "about");
        let ids: Vec<_> = widgets.iter().map(|w| w.id.clone()).collect();
        assert_eq!(ids, vec![id("p2"), id("l2")]);
        assert!(widgets[0].is_visible());

        assert_eq!(tree.property(&id("p1"), "visible"), Some(&json!(false)));
        assert_eq!(tree.property(&id("p2"), "visible"), Some(&json!(true)));
    }

    #[test]
    fn test_show_page_rejects_non_pages() {
        let mut tree = tree_with_page();
        assert_eq!(tree.show_page(&id("l1")), Err(TreeError::NotAPage(id("l1"))));
    }

    #[test]
    fn test_snapshot_is_pre_order_with_parent_property() {
        let tree = tree_with_page();
        let snapshot = tree.snapshot();
        let ids: Vec<_> = snapshot.widgets.iter().map(|w| w.id.to_string()).collect();
        assert_eq!(ids, vec!["r", "p1", "l1", "b1"]);

        assert_eq!(snapshot.widgets[0].parent(), None);
        assert_eq!(snapshot.widgets[1].children, vec![id("l1"), id("b1")]);
        assert_eq!(snapshot.widgets[2].parent(), Some(id("p1")));
    }
}
