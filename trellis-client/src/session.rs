//! Client-side reconciliation: applying server messages to the cache and
//! patching the DOM to match.

use crate::cache::{CachedWidget, ClientCache};
use crate::dom::Dom;
use crate::error::{ReconcileError, RenderError};
use crate::render::{self, link_href};
use serde_json::Value;
use tracing::{debug, info, warn};
use trellis_types::{
    ClientEvent, Op, ServerMessage, Snapshot, WidgetDescriptor, WidgetId, props,
};

/// One browser-side view of a server session: the cache plus the document
/// it is rendered into.
pub struct ClientSession<D: Dom> {
    cache: ClientCache,
    dom: D,
    path: Option<String>,
    title: Option<String>,
}

impl<D: Dom> ClientSession<D> {
    pub fn new(dom: D) -> Self {
        Self {
            cache: ClientCache::new(),
            dom,
            path: None,
            title: None,
        }
    }

    pub fn cache(&self) -> &ClientCache {
        &self.cache
    }

    pub fn dom(&self) -> &D {
        &self.dom
    }

    pub fn dom_mut(&mut self) -> &mut D {
        &mut self.dom
    }

    pub fn current_path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    /// Forget everything, e.g. before asking for a fresh snapshot.
    pub fn reset(&mut self) {
        self.cache.clear();
        let mount = self.dom.mount();
        self.dom.clear_children(&mount);
    }

    /// Render the cached tree again from the root, replacing the current render.
    pub fn rerender(&mut self) -> Result<(), RenderError> {
        render::render_root(&self.cache, &mut self.dom)?;
        Ok(())
    }

    /// Decode and apply one server frame.
    pub fn handle_message(&mut self, text: &str) -> Result<(), ReconcileError> {
        match ServerMessage::from_json(text)? {
            ServerMessage::InitialState(snapshot) => self.apply_initial_state(snapshot),
            ServerMessage::Updates(ops) => {
                self.apply_updates(ops);
                Ok(())
            }
        }
    }

    /// Replace the cache with a snapshot and render it from the root.
    pub fn apply_initial_state(&mut self, snapshot: Snapshot) -> Result<(), ReconcileError> {
        let count = snapshot.widgets.len();
        self.reset();
        if self.cache.load(snapshot.widgets).is_none() {
            warn!(widgets = count, "initial state without a root container");
            return Err(ReconcileError::NoRoot);
        }
        // only the shown page is mirrored; the others arrive with page_widgets
        self.cache.evict_hidden_pages();
        if let Some(path) = snapshot.path {
            self.set_location(path, snapshot.title);
        }
        render::render_root(&self.cache, &mut self.dom)?;
        info!(widgets = count, "initial state applied");
        Ok(())
    }

    /// Apply ops in order. A failing op is logged and skipped.
    pub fn apply_updates(&mut self, ops: Vec<Op>) {
        for op in ops {
            let action = op.action();
            if let Err(err) = self.apply_op(op) {
                warn!(action, error = %err, "op not applied");
            }
        }
    }

    pub fn apply_op(&mut self, op: Op) -> Result<(), ReconcileError> {
        match op {
            Op::Update {
                id,
                property,
                value,
            } => self.apply_update(&id, &property, value),
            Op::Remove { id, parent } => {
                self.apply_remove(&id, parent.as_ref());
                Ok(())
            }
            Op::Navigation { path, title } => {
                self.set_location(path, title);
                let mount = self.dom.mount();
                self.dom.clear_children(&mount);
                Ok(())
            }
            Op::AddWidget { widget } => self.apply_add(widget),
            Op::PageWidgets { page_path, widgets } => self.apply_page_widgets(&page_path, widgets),
        }
    }

    fn apply_update(&mut self, id: &WidgetId, property: &str, value: Value) -> Result<(), ReconcileError> {
        if self.cache.merge_property(id, property, value.clone()) {
            debug!(widget = %id, property, "placeholder created by update");
            return Ok(());
        }
        let Some(el) = self.dom.element_for(id) else {
            return Ok(());
        };
        let text = value.as_str().map(str::to_string).unwrap_or_else(|| value.to_string());
        match property {
            props::TEXT => self.dom.set_text(&el, &text),
            props::VALUE => self.dom.set_input_value(&el, &text),
            props::PLACEHOLDER => self.dom.set_attribute(&el, props::PLACEHOLDER, &text),
            // the link listener carries the path, so rebuild it
            props::PATH => {
                render::rerender_in_place(&self.cache, &mut self.dom, id)?;
            }
            props::VISIBLE if self.cache.get(id).is_some_and(CachedWidget::is_page) => {
                render::rerender_in_place(&self.cache, &mut self.dom, id)?;
            }
            _ => {}
        }
        Ok(())
    }

    fn apply_remove(&mut self, id: &WidgetId, parent: Option<&WidgetId>) {
        let removed = self.cache.remove_cascade(id);
        if let Some(el) = self.dom.element_for(id) {
            self.dom.remove(&el);
        }
        if removed.is_empty() {
            // an evicted page is still listed by its parent
            if let Some(parent) = parent {
                self.cache.unlink_child(parent, id);
            }
            debug!(widget = %id, "remove for uncached widget");
        } else {
            debug!(widget = %id, removed = removed.len(), "removed widget");
        }
    }

    fn apply_add(&mut self, widget: WidgetDescriptor) -> Result<(), ReconcileError> {
        let id = widget.id.clone();

        if let Some(existing) = self.cache.get_mut(&id) {
            if !existing.is_placeholder() {
                existing.properties.extend(widget.properties);
                debug!(widget = %id, "add for cached widget merged in place");
                return Ok(());
            }
        }

        if widget.kind.is_root() {
            self.cache.insert(widget);
            return Ok(());
        }

        let parent = widget
            .parent()
            .filter(|parent| self.cache.contains(parent))
            .ok_or_else(|| ReconcileError::UnresolvedParent {
                id: id.clone(),
                parent: widget.str_property(props::PARENT).unwrap_or_default().to_string(),
            })?;

        if widget.kind.is_page() && !widget.is_visible() {
            self.cache.link_child(&parent, &id);
            debug!(widget = %id, "hidden page listed, not cached");
            return Ok(());
        }

        let mut entry = CachedWidget::from(widget);
        if let Some(placeholder) = self.cache.get(&id) {
            entry.properties.extend(placeholder.properties.clone());
        }
        self.cache.insert_entry(entry);
        self.cache.link_child(&parent, &id);

        let shows_children = self.cache.get(&parent).is_some_and(CachedWidget::shows_children);
        let parent_el = self.dom.element_for(&parent).filter(|_| shows_children);
        if let Some(parent_el) = parent_el {
            match render::render(&self.cache, &mut self.dom, &id) {
                Ok(el) => self.dom.append_child(&parent_el, &el),
                Err(err) => warn!(widget = %id, error = %err, "added widget not rendered"),
            }
        }
        Ok(())
    }

    fn apply_page_widgets(&mut self, page_path: &str, widgets: Vec<WidgetDescriptor>) -> Result<(), ReconcileError> {
        for id in self.cache.evict_pages() {
            if let Some(el) = self.dom.element_for(&id) {
                self.dom.remove(&el);
            }
        }

        let count = widgets.len();
        for widget in widgets {
            let page_parent = widget
                .kind
                .is_page()
                .then(|| widget.parent())
                .flatten()
                .map(|parent| (parent, widget.id.clone()));
            self.cache.insert(widget);
            if let Some((parent, page)) = page_parent {
                self.cache.link_child(&parent, &page);
            }
        }

        debug!(page_path, widgets = count, "page swap");
        render::render_root(&self.cache, &mut self.dom)?;
        Ok(())
    }

    fn set_location(&mut self, path: String, title: Option<String>) {
        if let Some(title) = &title {
            self.dom.set_title(title);
        }
        self.dom.push_location(&link_href(&path));
        self.path = Some(path);
        self.title = title;
    }

    /// Back/forward moved the address bar to `path`. The server decides
    /// what to show, so this only builds the event asking it to.
    pub fn location_changed(&mut self, path: &str) -> Option<ClientEvent> {
        if self.path.as_deref() == Some(path) {
            return None;
        }
        let root = self.cache.root()?.clone();
        Some(ClientEvent::navigate(root, path))
    }
}
