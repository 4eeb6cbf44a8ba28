use super::node::WidgetNode;
use std::collections::{HashMap, HashSet};
use trellis_types::WidgetId;

/// Id-indexed storage for widget nodes.
///
/// Parent/child links are ids, never structural pointers. Ids of removed
/// nodes are remembered so they are never handed out again.
pub struct WidgetArena {
    nodes: HashMap<WidgetId, WidgetNode>,
    retired: HashSet<WidgetId>,
}

impl WidgetArena {
    pub fn new() -> Self {
        Self {
            nodes: HashMap::new(),
            retired: HashSet::new(),
        }
    }

    /// Insert a node. Returns false (and drops the node) if its id was ever used.
    pub fn insert(&mut self, node: WidgetNode) -> bool {
        if self.was_used(&node.id) {
            return false;
        }
        self.nodes.insert(node.id.clone(), node);
        true
    }

    pub fn get(&self, id: &WidgetId) -> Option<&WidgetNode> {
        self.nodes.get(id)
    }

    pub fn get_mut(&mut self, id: &WidgetId) -> Option<&mut WidgetNode> {
        self.nodes.get_mut(id)
    }

    pub fn contains(&self, id: &WidgetId) -> bool {
        self.nodes.contains_key(id)
    }

    /// True for live ids and ids of removed nodes.
    pub fn was_used(&self, id: &WidgetId) -> bool {
        self.nodes.contains_key(id) || self.retired.contains(id)
    }

    /// Remove a single node; the caller is responsible for its children.
    pub fn remove(&mut self, id: &WidgetId) -> Option<WidgetNode> {
        let node = self.nodes.remove(id)?;
        self.retired.insert(id.clone());
        Some(node)
    }

    pub fn nodes_mut(&mut self) -> impl Iterator<Item = &mut WidgetNode> {
        self.nodes.values_mut()
    }

    /// `id` followed by all of its descendants, in pre-order.
    pub fn subtree(&self, id: &WidgetId) -> Vec<WidgetId> {
        let mut out = Vec::new();
        let mut stack = vec![id.clone()];
        while let Some(current) = stack.pop() {
            let Some(node) = self.nodes.get(&current) else {
                continue;
            };
            stack.extend(node.children.iter().rev().cloned());
            out.push(current);
        }
        out
    }

    /// Whether `ancestor` sits on the parent chain of `node`.
    pub fn is_ancestor(&self, ancestor: &WidgetId, node: &WidgetId) -> bool {
        let mut current = self.nodes.get(node).and_then(|n| n.parent.as_ref());
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.nodes.get(id).and_then(|n| n.parent.as_ref());
        }
        false
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

impl Default for WidgetArena {
    fn default() -> Self {
        Self::new()
    }
}
