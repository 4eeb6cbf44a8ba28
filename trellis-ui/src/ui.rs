use crate::error::{HandlerError, NavigationError, TreeError};
use crate::handlers::{Handler, HandlerId, HandlerRegistry};
use crate::navigation::{NAVIGATED_FROM, NAVIGATED_TO, Navigator, PageTransition};
use crate::tree::WidgetTree;
use crate::widgets::WidgetSpec;
use parking_lot::Mutex;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;
use trellis_types::{ClientEvent, EventKind, Op, Snapshot, WidgetId, WidgetKind, props};

/// UI state shared between a session loop, its handlers and any
/// background tasks the application spawns.
pub type SharedUi = Arc<Mutex<Ui>>;

/// One session's widget tree together with its pages and handlers.
#[derive(Default)]
pub struct Ui {
    tree: WidgetTree,
    navigator: Navigator,
    handlers: HandlerRegistry,
}

impl Ui {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_root_id(root: impl Into<WidgetId>) -> Self {
        Self {
            tree: WidgetTree::with_root_id(root),
            ..Self::default()
        }
    }

    pub fn into_shared(self) -> SharedUi {
        Arc::new(Mutex::new(self))
    }

    pub fn tree(&self) -> &WidgetTree {
        &self.tree
    }

    pub fn navigator(&self) -> &Navigator {
        &self.navigator
    }

    pub fn handlers(&self) -> &HandlerRegistry {
        &self.handlers
    }

    pub fn root(&self) -> WidgetId {
        self.tree.root().clone()
    }

    pub fn contains(&self, id: &WidgetId) -> bool {
        self.tree.contains(id)
    }

    pub fn property(&self, id: &WidgetId, name: &str) -> Option<&Value> {
        self.tree.property(id, name)
    }

    pub fn str_property(&self, id: &WidgetId, name: &str) -> Option<&str> {
        self.property(id, name).and_then(Value::as_str)
    }

    // Tree

    pub fn attach(&mut self, parent: &WidgetId, spec: WidgetSpec) -> Result<WidgetId, TreeError> {
        self.tree.attach(parent, spec)
    }

    pub fn attach_with_id(
        &mut self,
        parent: &WidgetId,
        id: impl Into<WidgetId>,
        spec: WidgetSpec,
    ) -> Result<WidgetId, TreeError> {
        self.tree.attach_with_id(parent, id, spec)
    }

    pub fn set_property(
        &mut self,
        id: &WidgetId,
        name: &str,
        value: impl Into<Value>,
    ) -> Result<bool, TreeError> {
        self.tree.set_property(id, name, value)
    }

    /// Remove a widget and its descendants, dropping their handlers.
    pub fn remove(&mut self, id: &WidgetId) -> Result<Vec<WidgetId>, TreeError> {
        let removed = self.tree.detach(id)?;
        for widget in &removed {
            self.handlers.remove_widget(widget);
            self.navigator.forget_page(widget);
        }
        Ok(removed)
    }

    pub fn move_widget(&mut self, id: &WidgetId, new_parent: &WidgetId) -> Result<(), TreeError> {
        self.tree.move_widget(id, new_parent)
    }

    // Handlers

    pub fn connect(&mut self, widget: &WidgetId, kind: EventKind, handler: Handler) -> HandlerId {
        self.handlers.connect(widget.clone(), kind, handler)
    }

    pub fn on_click(&mut self, widget: &WidgetId, handler: Handler) -> HandlerId {
        self.connect(widget, EventKind::Click, handler)
    }

    pub fn on_change(&mut self, widget: &WidgetId, handler: Handler) -> HandlerId {
        self.connect(widget, EventKind::Change, handler)
    }

    pub fn disconnect(&mut self, id: HandlerId) -> bool {
        self.handlers.disconnect(id)
    }

    /// Run `handler` each time `page` becomes the shown page.
    pub fn on_navigated_to(&mut self, page: &WidgetId, handler: Handler) -> HandlerId {
        self.connect(page, EventKind::from(NAVIGATED_TO), handler)
    }

    /// Run `handler` each time another page replaces `page`.
    pub fn on_navigated_from(&mut self, page: &WidgetId, handler: Handler) -> HandlerId {
        self.connect(page, EventKind::from(NAVIGATED_FROM), handler)
    }

    // Navigation

    pub fn register_page(
        &mut self,
        path: &str,
        variant: &str,
        title: &str,
    ) -> Result<WidgetId, NavigationError> {
        self.navigator
            .register_page(&mut self.tree, path, variant, title)
    }

    pub fn set_default_page(&mut self, path: &str) -> Result<(), NavigationError> {
        self.navigator.set_default_page(path)
    }

    pub fn navigate_to(&mut self, path: &str) -> Result<(), NavigationError> {
        self.navigator.navigate_to(&mut self.tree, path)
    }

    pub fn navigate_back(&mut self) -> Result<bool, NavigationError> {
        self.navigator.navigate_back(&mut self.tree)
    }

    /// Show the default page when pages are registered. A UI without pages
    /// is left as built.
    pub fn initialize(&mut self) -> Result<(), NavigationError> {
        match self.navigator.initialize(&mut self.tree) {
            Err(NavigationError::NoDefaultPage) => Ok(()),
            other => other,
        }
    }

    pub fn current_path(&self) -> Option<&str> {
        self.navigator.current_path()
    }

    pub fn take_transitions(&mut self) -> Vec<PageTransition> {
        self.navigator.take_transitions()
    }

    // Sync

    /// Full tree plus the active page's path and title.
    pub fn snapshot(&self) -> Snapshot {
        let mut snapshot = self.tree.snapshot();
        if let Some(path) = self.navigator.current_path() {
            snapshot.path = Some(path.to_string());
            snapshot.title = self
                .navigator
                .current_page()
                .and_then(|page| self.str_property(page, props::TITLE))
                .map(str::to_string);
        }
        snapshot
    }

    pub fn take_ops(&mut self) -> Vec<Op> {
        self.tree.take_ops()
    }

    pub fn has_pending_ops(&self) -> bool {
        !self.tree.recorder().is_empty()
    }

    pub fn discard_ops(&mut self) {
        self.tree.discard_ops();
    }

    /// Framework behaviour that runs before application handlers.
    pub(crate) fn apply_builtin(&mut self, event: &ClientEvent) -> Result<(), HandlerError> {
        match &event.kind {
            EventKind::Change => {
                if let Some(value) = event.data.value() {
                    self.tree.set_property(&event.id, props::VALUE, value)?;
                }
            }
            EventKind::Click => {
                let is_link = self
                    .tree
                    .get(&event.id)
                    .is_some_and(|node| node.kind == WidgetKind::NavLink);
                if is_link {
                    let path = event
                        .data
                        .path()
                        .or_else(|| self.str_property(&event.id, props::PATH))
                        .map(str::to_string);
                    if let Some(path) = path {
                        debug!(link = %event.id, path, "nav link clicked");
                        self.navigate_to(&path)?;
                    }
                }
            }
            EventKind::Navigate => {
                if let Some(path) = event.data.path() {
                    if self.navigator.current_path() != Some(path) {
                        self.navigate_to(path)?;
                    }
                }
            }
            EventKind::Other(_) => {}
        }
        Ok(())
    }
}
