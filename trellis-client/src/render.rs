//! Descriptor to DOM mapping.
//!
//! Rendering is a pure function of the cache at call time. A widget that
//! cannot be rendered is left out and its siblings still render.

use crate::cache::{CachedWidget, ClientCache};
use crate::dom::{Dom, Listener};
use crate::error::RenderError;
use tracing::{debug, warn};
use trellis_types::{WidgetId, WidgetKind, props};

/// Build the DOM subtree for `id`. The returned element is not attached.
pub fn render<D: Dom>(cache: &ClientCache, dom: &mut D, id: &WidgetId) -> Result<D::Element, RenderError> {
    let widget = cache
        .get(id)
        .ok_or_else(|| RenderError::UnresolvedReference(id.clone()))?;
    let Some(kind) = &widget.kind else {
        return Err(RenderError::Placeholder(id.clone()));
    };

    let el = match kind {
        WidgetKind::RootContainer | WidgetKind::Container => {
            let el = dom.create_element("div", id)?;
            render_children(cache, dom, widget, &el);
            el
        }
        WidgetKind::Page(_) => {
            let el = dom.create_element("div", id)?;
            if let Some(path) = widget.str_property(props::PATH) {
                dom.set_attribute(&el, "data-page", path);
            }
            if widget.is_visible() {
                render_children(cache, dom, widget, &el);
            } else {
                dom.set_attribute(&el, "hidden", "");
            }
            el
        }
        WidgetKind::Button => {
            let el = dom.create_element("button", id)?;
            dom.set_text(&el, widget.str_property(props::TEXT).unwrap_or_default());
            dom.listen(&el, Listener::click(id.clone()));
            el
        }
        WidgetKind::TextBox => {
            let el = dom.create_element("input", id)?;
            dom.set_input_value(&el, widget.str_property(props::VALUE).unwrap_or_default());
            if let Some(placeholder) = widget.str_property(props::PLACEHOLDER) {
                dom.set_attribute(&el, props::PLACEHOLDER, placeholder);
            }
            dom.listen(&el, Listener::change(id.clone()));
            el
        }
        WidgetKind::Label => {
            let el = dom.create_element("div", id)?;
            dom.set_text(&el, widget.str_property(props::TEXT).unwrap_or_default());
            el
        }
        WidgetKind::NavLink => {
            let el = dom.create_element("a", id)?;
            let path = widget.str_property(props::PATH).unwrap_or_default();
            dom.set_attribute(&el, "href", &link_href(path));
            dom.set_text(&el, widget.str_property(props::TEXT).unwrap_or_default());
            dom.listen(&el, Listener::link(id.clone(), path));
            el
        }
        WidgetKind::Other(tag) => {
            return Err(RenderError::UnknownWidgetType {
                id: id.clone(),
                kind: tag.clone(),
            });
        }
    };
    Ok(el)
}

fn render_children<D: Dom>(cache: &ClientCache, dom: &mut D, widget: &CachedWidget, el: &D::Element) {
    let is_root = widget.kind.as_ref().is_some_and(WidgetKind::is_root);
    for child in &widget.children {
        match render(cache, dom, child) {
            Ok(child_el) => dom.append_child(el, &child_el),
            // evicted pages stay listed under the root
            Err(RenderError::UnresolvedReference(missing)) if is_root => {
                debug!(parent = %widget.id, child = %missing, "skipping uncached root child");
            }
            Err(err) => {
                warn!(parent = %widget.id, child = %child, error = %err, "child not rendered");
            }
        }
    }
}

/// Re-render `id` and swap it in where its current element sits.
///
/// Returns `Ok(None)` when the widget had no element in the document, in
/// which case nothing is inserted.
pub fn rerender_in_place<D: Dom>(
    cache: &ClientCache,
    dom: &mut D,
    id: &WidgetId,
) -> Result<Option<D::Element>, RenderError> {
    let Some(old) = dom.element_for(id) else {
        return Ok(None);
    };
    let new = render(cache, dom, id)?;
    dom.replace_with(&old, &new);
    Ok(Some(new))
}

/// Render the whole tree into the mount point, replacing a previous render.
pub fn render_root<D: Dom>(cache: &ClientCache, dom: &mut D) -> Result<Option<D::Element>, RenderError> {
    let Some(root) = cache.root().cloned() else {
        return Ok(None);
    };
    if let Some(el) = rerender_in_place(cache, dom, &root)? {
        return Ok(Some(el));
    }
    let el = render(cache, dom, &root)?;
    let mount = dom.mount();
    dom.append_child(&mount, &el);
    Ok(Some(el))
}

const PAGE_PARAM: &str = "page";

/// Query string used for a page path, percent-encoded.
pub fn link_href(path: &str) -> String {
    let query = form_urlencoded::Serializer::new(String::new())
        .append_pair(PAGE_PARAM, path)
        .finish();
    format!("?{query}")
}

/// Decoded page path of a query string such as `location.search`.
pub fn page_param(query: &str) -> Option<String> {
    let query = query.strip_prefix('?').unwrap_or(query);
    form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == PAGE_PARAM)
        .map(|(_, value)| value.into_owned())
}
