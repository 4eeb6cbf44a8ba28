use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use tracing::{trace, warn};
use trellis_client::render::page_param;
use trellis_client::types::{ClientEvent, WidgetId};
use trellis_client::{Dom, Listener, RenderError};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{Document, Element, Event, HtmlInputElement};

/// Where DOM listeners deliver the wire events they build.
pub type EventSink = Rc<dyn Fn(ClientEvent)>;

type Listeners = Rc<RefCell<HashMap<(WidgetId, &'static str), Listener>>>;
type Delegate = Closure<dyn FnMut(Event)>;

/// Native events handled at the mount point.
const DELEGATED: [&str; 2] = ["click", "input"];

/// [`Dom`] backed by the browser document.
///
/// Elements carry their widget id as the `id` attribute, so lookups go
/// through `getElementById` and only ever see connected elements.
///
/// Widgets do not get DOM listeners of their own. One listener per native
/// event sits on the mount and resolves the widget from the event target,
/// so re-rendering never piles up callbacks.
pub struct WebDom {
    document: Document,
    mount: Element,
    listeners: Listeners,
    delegates: Vec<(&'static str, Delegate)>,
}

impl WebDom {
    pub fn new(document: Document, mount: Element, sink: EventSink) -> Self {
        let listeners = Listeners::default();
        let mut delegates = Vec::new();
        for dom_event in DELEGATED {
            let delegate = delegate(dom_event, mount.clone(), listeners.clone(), sink.clone());
            match mount.add_event_listener_with_callback(dom_event, delegate.as_ref().unchecked_ref()) {
                Ok(()) => delegates.push((dom_event, delegate)),
                Err(err) => warn!(dom_event, error = ?err, "mount listener not installed"),
            }
        }
        Self {
            document,
            mount,
            listeners,
            delegates,
        }
    }

    /// Widgets that currently have a listener registered.
    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().len()
    }

    /// Forget listeners of widgets that left the document.
    fn prune_listeners(&self) {
        let document = &self.document;
        self.listeners
            .borrow_mut()
            .retain(|(widget, _), _| document.get_element_by_id(widget.as_str()).is_some());
    }

    fn report(&self, op: &str, result: Result<impl Sized, JsValue>) {
        if let Err(err) = result {
            warn!(op, error = ?err, "dom call failed");
        }
    }
}

impl Drop for WebDom {
    fn drop(&mut self) {
        for (dom_event, delegate) in &self.delegates {
            let _ = self
                .mount
                .remove_event_listener_with_callback(dom_event, delegate.as_ref().unchecked_ref());
        }
    }
}

/// Mount-level callback: walk from the target up to the mount and fire the
/// first registered widget listener for this event type.
fn delegate(dom_event: &'static str, mount: Element, listeners: Listeners, sink: EventSink) -> Delegate {
    Closure::new(move |event: Event| {
        let mut current = event.target().and_then(|target| target.dyn_into::<Element>().ok());
        while let Some(el) = current {
            if el.is_same_node(Some(&mount)) {
                break;
            }
            let key = (WidgetId::from(el.id()), dom_event);
            let listener = listeners.borrow().get(&key).cloned();
            if let Some(listener) = listener {
                if listener.prevent_default {
                    event.prevent_default();
                }
                let value = el.dyn_ref::<HtmlInputElement>().map(HtmlInputElement::value);
                sink(listener.event(value.as_deref()));
                return;
            }
            current = el.parent_element();
        }
        trace!(dom_event, "event outside any widget");
    })
}

impl Dom for WebDom {
    type Element = Element;

    fn mount(&self) -> Element {
        self.mount.clone()
    }

    fn create_element(&mut self, tag: &str, widget: &WidgetId) -> Result<Element, RenderError> {
        let el = self
            .document
            .create_element(tag)
            .map_err(|err| RenderError::Dom {
                id: widget.clone(),
                reason: format!("{err:?}"),
            })?;
        el.set_id(widget.as_str());
        Ok(el)
    }

    fn set_text(&mut self, el: &Element, text: &str) {
        el.set_text_content(Some(text));
    }

    fn set_attribute(&mut self, el: &Element, name: &str, value: &str) {
        self.report("set_attribute", el.set_attribute(name, value));
    }

    fn set_input_value(&mut self, el: &Element, value: &str) {
        match el.dyn_ref::<HtmlInputElement>() {
            Some(input) => input.set_value(value),
            None => self.report("set_attribute", el.set_attribute("value", value)),
        }
    }

    fn append_child(&mut self, parent: &Element, child: &Element) {
        self.report("append_child", parent.append_child(child));
    }

    fn replace_with(&mut self, old: &Element, new: &Element) {
        self.report("replace_with", old.replace_with_with_node_1(new));
        self.prune_listeners();
    }

    fn remove(&mut self, el: &Element) {
        el.remove();
        self.prune_listeners();
    }

    fn clear_children(&mut self, el: &Element) {
        el.set_inner_html("");
        self.prune_listeners();
    }

    fn element_for(&self, widget: &WidgetId) -> Option<Element> {
        self.document.get_element_by_id(widget.as_str())
    }

    fn listen(&mut self, _el: &Element, listener: Listener) {
        self.listeners
            .borrow_mut()
            .insert((listener.widget.clone(), listener.dom_event), listener);
    }

    fn set_title(&mut self, title: &str) {
        self.document.set_title(title);
    }

    fn push_location(&mut self, path: &str) {
        let Some(window) = web_sys::window() else {
            return;
        };
        // back/forward already moved the address bar here
        let search = window.location().search().unwrap_or_default();
        let current = page_param(&search);
        if current.is_some() && current == page_param(path) {
            return;
        }
        match window.history() {
            Ok(history) => self.report(
                "push_state",
                history.push_state_with_url(&JsValue::NULL, "", Some(path)),
            ),
            Err(err) => warn!(error = ?err, "history unavailable"),
        }
    }
}
