use crate::dom::{Dom, Listener};
use crate::error::RenderError;
use ahash::AHashMap;
use std::collections::BTreeMap;
use std::fmt::Write;
use tracing::warn;
use trellis_types::{ClientEvent, WidgetId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeKey(usize);

#[derive(Debug, Clone)]
pub struct VirtualNode {
    pub tag: String,
    pub widget: Option<WidgetId>,
    pub attributes: BTreeMap<String, String>,
    pub text: Option<String>,
    pub value: Option<String>,
    pub children: Vec<NodeKey>,
    pub parent: Option<NodeKey>,
    pub listeners: Vec<Listener>,
}

impl VirtualNode {
    fn new(tag: &str, widget: Option<WidgetId>) -> Self {
        Self {
            tag: tag.to_string(),
            widget,
            attributes: BTreeMap::new(),
            text: None,
            value: None,
            children: Vec::new(),
            parent: None,
            listeners: Vec::new(),
        }
    }
}

/// In-memory document for tests and headless clients.
///
/// Nodes are never freed; detached nodes simply become unreachable from
/// the mount point.
#[derive(Debug)]
pub struct VirtualDom {
    nodes: Vec<VirtualNode>,
    by_widget: AHashMap<WidgetId, NodeKey>,
    mount: NodeKey,
    title: String,
    location: Option<String>,
    history: Vec<String>,
    default_prevented: bool,
}

impl VirtualDom {
    pub fn new() -> Self {
        let mut mount = VirtualNode::new("div", None);
        mount
            .attributes
            .insert("id".to_string(), "app".to_string());
        Self {
            nodes: vec![mount],
            by_widget: AHashMap::new(),
            mount: NodeKey(0),
            title: String::new(),
            location: None,
            history: Vec::new(),
            default_prevented: false,
        }
    }

    pub fn node(&self, key: NodeKey) -> &VirtualNode {
        &self.nodes[key.0]
    }

    fn node_mut(&mut self, key: NodeKey) -> &mut VirtualNode {
        &mut self.nodes[key.0]
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }

    /// Every location pushed so far, oldest first.
    pub fn history(&self) -> &[String] {
        &self.history
    }

    /// Whether the last simulated click suppressed default navigation.
    pub fn default_prevented(&self) -> bool {
        self.default_prevented
    }

    fn is_connected(&self, key: NodeKey) -> bool {
        let mut current = Some(key);
        while let Some(k) = current {
            if k == self.mount {
                return true;
            }
            current = self.nodes[k.0].parent;
        }
        false
    }

    fn detach(&mut self, key: NodeKey) {
        if let Some(parent) = self.nodes[key.0].parent.take() {
            self.nodes[parent.0].children.retain(|c| *c != key);
        }
    }

    /// Number of widget elements reachable from the mount point.
    pub fn connected_widgets(&self) -> usize {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(i, n)| n.widget.is_some() && self.is_connected(NodeKey(*i)))
            .count()
    }

    /// Text of the element rendered for `widget`.
    pub fn text_of(&self, widget: &WidgetId) -> Option<&str> {
        let key = self.element_for(widget)?;
        self.node(key).text.as_deref()
    }

    pub fn value_of(&self, widget: &WidgetId) -> Option<&str> {
        let key = self.element_for(widget)?;
        self.node(key).value.as_deref()
    }

    pub fn attribute_of(&self, widget: &WidgetId, name: &str) -> Option<&str> {
        let key = self.element_for(widget)?;
        self.node(key).attributes.get(name).map(String::as_str)
    }

    /// Simulate a click; returns the wire event the listener would send.
    pub fn click(&mut self, widget: &WidgetId) -> Option<ClientEvent> {
        let key = self.element_for(widget)?;
        let listener = self
            .node(key)
            .listeners
            .iter()
            .find(|l| l.dom_event == "click")?
            .clone();
        self.default_prevented = listener.prevent_default;
        Some(listener.event(None))
    }

    /// Simulate typing `value` into an input.
    pub fn input(&mut self, widget: &WidgetId, value: &str) -> Option<ClientEvent> {
        let key = self.element_for(widget)?;
        self.node_mut(key).value = Some(value.to_string());
        let listener = self
            .node(key)
            .listeners
            .iter()
            .find(|l| l.dom_event == "input")?;
        Some(listener.event(Some(value)))
    }

    /// Compact outline of what is mounted, e.g.
    /// `div#r>div#p1>(div#l1"Hi",button#b1"Go")`.
    pub fn outline(&self) -> String {
        let children = &self.node(self.mount).children;
        let mut out = String::new();
        for (i, child) in children.iter().enumerate() {
            if i > 0 {
                out.push(',');
            }
            self.write_outline(*child, &mut out);
        }
        out
    }

    fn write_outline(&self, key: NodeKey, out: &mut String) {
        let node = self.node(key);
        out.push_str(&node.tag);
        if let Some(widget) = &node.widget {
            let _ = write!(out, "#{widget}");
        }
        if let Some(text) = node.text.as_ref().or(node.value.as_ref()) {
            let _ = write!(out, "\"{text}\"");
        }
        match node.children.as_slice() {
            [] => {}
            [only] => {
                out.push('>');
                self.write_outline(*only, out);
            }
            many => {
                out.push_str(">(");
                for (i, child) in many.iter().enumerate() {
                    if i > 0 {
                        out.push(',');
                    }
                    self.write_outline(*child, out);
                }
                out.push(')');
            }
        }
    }
}

impl Default for VirtualDom {
    fn default() -> Self {
        Self::new()
    }
}

impl Dom for VirtualDom {
    type Element = NodeKey;

    fn mount(&self) -> NodeKey {
        self.mount
    }

    fn create_element(&mut self, tag: &str, widget: &WidgetId) -> Result<NodeKey, RenderError> {
        let key = NodeKey(self.nodes.len());
        let mut node = VirtualNode::new(tag, Some(widget.clone()));
        node.attributes
            .insert("id".to_string(), widget.to_string());
        self.nodes.push(node);
        self.by_widget.insert(widget.clone(), key);
        Ok(key)
    }

    fn set_text(&mut self, el: &NodeKey, text: &str) {
        self.node_mut(*el).text = Some(text.to_string());
    }

    fn set_attribute(&mut self, el: &NodeKey, name: &str, value: &str) {
        self.node_mut(*el)
            .attributes
            .insert(name.to_string(), value.to_string());
    }

    fn set_input_value(&mut self, el: &NodeKey, value: &str) {
        self.node_mut(*el).value = Some(value.to_string());
    }

    fn append_child(&mut self, parent: &NodeKey, child: &NodeKey) {
        self.detach(*child);
        self.node_mut(*child).parent = Some(*parent);
        self.node_mut(*parent).children.push(*child);
    }

    fn replace_with(&mut self, old: &NodeKey, new: &NodeKey) {
        let Some(parent) = self.node(*old).parent else {
            warn!("replace_with on a detached element");
            return;
        };
        self.detach(*new);
        let siblings = &mut self.nodes[parent.0].children;
        if let Some(pos) = siblings.iter().position(|c| c == old) {
            siblings[pos] = *new;
        }
        self.node_mut(*old).parent = None;
        self.node_mut(*new).parent = Some(parent);
    }

    fn remove(&mut self, el: &NodeKey) {
        self.detach(*el);
    }

    fn clear_children(&mut self, el: &NodeKey) {
        let children = std::mem::take(&mut self.node_mut(*el).children);
        for child in children {
            self.node_mut(child).parent = None;
        }
    }

    fn element_for(&self, widget: &WidgetId) -> Option<NodeKey> {
        if let Some(key) = self.by_widget.get(widget) {
            if self.is_connected(*key) {
                return Some(*key);
            }
        }
        (0..self.nodes.len())
            .map(NodeKey)
            .find(|k| self.node(*k).widget.as_ref() == Some(widget) && self.is_connected(*k))
    }

    fn listen(&mut self, el: &NodeKey, listener: Listener) {
        self.node_mut(*el).listeners.push(listener);
    }

    fn set_title(&mut self, title: &str) {
        self.title = title.to_string();
    }

    fn push_location(&mut self, path: &str) {
        self.location = Some(path.to_string());
        self.history.push(path.to_string());
    }
}
