use crate::error::NavigationError;
use crate::tree::WidgetTree;
use crate::widgets;
use serde_json::Value;
use std::collections::HashMap;
use tracing::{debug, warn};
use trellis_types::{WidgetId, props};

/// Event type delivered to a page's handlers once it has been shown.
pub const NAVIGATED_TO: &str = "navigated_to";
/// Event type delivered to a page's handlers once another page replaced it.
pub const NAVIGATED_FROM: &str = "navigated_from";

/// A registered page, by path and widget id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRef {
    pub path: String,
    pub page: WidgetId,
}

/// One completed page change, queued until its lifecycle hooks have run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageTransition {
    pub from: Option<PageRef>,
    pub to: PageRef,
}

/// Path-addressed page registry with a back stack.
///
/// Pages live under the root as page-variants. Exactly one of them is
/// visible after a navigation; the rest stay in the tree, hidden.
#[derive(Debug, Default)]
pub struct Navigator {
    pages: HashMap<String, WidgetId>,
    current: Option<String>,
    default_page: Option<String>,
    history: Vec<String>,
    transitions: Vec<PageTransition>,
}

impl Navigator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a hidden page under the root and register it for `path`.
    /// The first page registered becomes the default.
    pub fn register_page(
        &mut self,
        tree: &mut WidgetTree,
        path: &str,
        variant: &str,
        title: &str,
    ) -> Result<WidgetId, NavigationError> {
        if self.pages.contains_key(path) {
            return Err(NavigationError::DuplicatePage(path.to_string()));
        }
        let root = tree.root().clone();
        let id = tree.attach(&root, widgets::page(variant, path, title))?;

        self.pages.insert(path.to_string(), id.clone());
        if self.default_page.is_none() {
            self.default_page = Some(path.to_string());
        }
        debug!(path, page = %id, "registered page");
        Ok(id)
    }

    pub fn set_default_page(&mut self, path: &str) -> Result<(), NavigationError> {
        if !self.pages.contains_key(path) {
            return Err(NavigationError::UnknownPage(path.to_string()));
        }
        self.default_page = Some(path.to_string());
        Ok(())
    }

    /// Show the page registered for `path`.
    ///
    /// Records `navigation` followed by `page_widgets`. Unknown paths are
    /// rejected before anything is recorded.
    pub fn navigate_to(&mut self, tree: &mut WidgetTree, path: &str) -> Result<(), NavigationError> {
        let page = match self.pages.get(path) {
            Some(page) => page.clone(),
            None => {
                warn!(path, "navigation to unknown page");
                return Err(NavigationError::UnknownPage(path.to_string()));
            }
        };

        if let Some(previous) = &self.current {
            if previous != path {
                self.history.push(previous.clone());
            }
        }
        self.show(tree, path, &page)
    }

    /// Go to the previous page. Returns false when there is no history.
    pub fn navigate_back(&mut self, tree: &mut WidgetTree) -> Result<bool, NavigationError> {
        let Some(previous) = self.history.pop() else {
            return Ok(false);
        };
        let page = self
            .pages
            .get(&previous)
            .cloned()
            .ok_or_else(|| NavigationError::UnknownPage(previous.clone()))?;
        self.show(tree, &previous, &page)?;
        Ok(true)
    }

    /// Navigate to the default page.
    pub fn initialize(&mut self, tree: &mut WidgetTree) -> Result<(), NavigationError> {
        let path = self
            .default_page
            .clone()
            .ok_or(NavigationError::NoDefaultPage)?;
        self.navigate_to(tree, &path)
    }

    fn show(&mut self, tree: &mut WidgetTree, path: &str, page: &WidgetId) -> Result<(), NavigationError> {
        let title = tree
            .property(page, props::TITLE)
            .and_then(Value::as_str)
            .map(str::to_string);
        tree.record_navigation(path, title);
        tree.show_page(page)?;

        let from = self.current.replace(path.to_string());
        if from.as_deref() != Some(path) {
            let from = from.and_then(|path| {
                let page = self.pages.get(&path)?.clone();
                Some(PageRef { path, page })
            });
            self.transitions.push(PageTransition {
                from,
                to: PageRef {
                    path: path.to_string(),
                    page: page.clone(),
                },
            });
        }
        debug!(path, "navigated");
        Ok(())
    }

    /// Drain the page changes whose hooks have not run yet.
    pub fn take_transitions(&mut self) -> Vec<PageTransition> {
        std::mem::take(&mut self.transitions)
    }

    pub fn current_path(&self) -> Option<&str> {
        self.current.as_deref()
    }

    pub fn current_page(&self) -> Option<&WidgetId> {
        self.pages.get(self.current.as_deref()?)
    }

    pub fn page(&self, path: &str) -> Option<&WidgetId> {
        self.pages.get(path)
    }

    pub fn history(&self) -> &[String] {
        &self.history
    }

    /// Forget a page whose widget was removed from the tree.
    pub fn forget_page(&mut self, page: &WidgetId) {
        self.pages.retain(|_, id| id != page);
        self.history.retain(|path| self.pages.contains_key(path));
        if self.current.as_ref().is_some_and(|p| !self.pages.contains_key(p)) {
            self.current = None;
        }
        if self
            .default_page
            .as_ref()
            .is_some_and(|p| !self.pages.contains_key(p))
        {
            self.default_page = None;
        }
    }
}
