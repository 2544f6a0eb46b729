use slotmap::SlotMap;

use crate::errors::{PrismError, Result};
use crate::graphic::Graphic;
use crate::raycaster::{Intersection, Raycaster};
use crate::scene::node::Node;
use crate::scene::transform_system;
use crate::scene::{GraphicKey, NodeHandle};

/// Scene graph storage.
///
/// Nodes and their graphic components live in two slot maps; handles stay
/// valid until the node is removed. `roots` holds the parentless nodes in
/// insertion order, which is also the traversal order.
#[derive(Debug, Default)]
pub struct Scene {
    pub nodes: SlotMap<NodeHandle, Node>,
    pub graphics: SlotMap<GraphicKey, Graphic>,
    roots: Vec<NodeHandle>,
}

impl Scene {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // ========================================================================
    // Hierarchy
    // ========================================================================

    /// Inserts `node` as a new root.
    pub fn add_node(&mut self, node: Node) -> NodeHandle {
        let handle = self.nodes.insert(node);
        self.roots.push(handle);
        handle
    }

    /// Inserts `node` under `parent`.
    pub fn add_child(&mut self, parent: NodeHandle, node: Node) -> Result<NodeHandle> {
        if !self.nodes.contains_key(parent) {
            return Err(PrismError::NodeNotFound);
        }
        let handle = self.add_node(node);
        self.attach(parent, handle)?;
        Ok(handle)
    }

    /// Re-parents `child` under `parent`, detaching it from its current
    /// parent first.
    pub fn attach(&mut self, parent: NodeHandle, child: NodeHandle) -> Result<()> {
        if !self.nodes.contains_key(parent) || !self.nodes.contains_key(child) {
            return Err(PrismError::NodeNotFound);
        }
        if self.is_ancestor_or_self(child, parent) {
            return Err(PrismError::HierarchyCycle);
        }

        self.unlink(child);
        self.nodes[parent].children.push(child);
        let node = &mut self.nodes[child];
        node.parent = Some(parent);
        node.transform.mark_dirty();
        Ok(())
    }

    /// Turns `child` into a root node.
    pub fn detach(&mut self, child: NodeHandle) -> Result<()> {
        let Some(node) = self.nodes.get(child) else {
            return Err(PrismError::NodeNotFound);
        };
        if node.parent.is_none() {
            return Ok(());
        }

        self.unlink(child);
        self.roots.push(child);
        let node = &mut self.nodes[child];
        node.parent = None;
        node.transform.mark_dirty();
        Ok(())
    }

    /// Removes `handle` and its whole subtree.
    ///
    /// The graphics attached to the removed nodes are returned so the caller
    /// can dispose their device resources.
    pub fn remove_node(&mut self, handle: NodeHandle) -> Result<Vec<Graphic>> {
        if !self.nodes.contains_key(handle) {
            return Err(PrismError::NodeNotFound);
        }
        self.unlink(handle);

        let mut removed = Vec::new();
        let mut stack = vec![handle];
        while let Some(current) = stack.pop() {
            let Some(node) = self.nodes.remove(current) else {
                continue;
            };
            stack.extend_from_slice(&node.children);
            if let Some(graphic) = node.graphic.and_then(|key| self.graphics.remove(key)) {
                removed.push(graphic);
            }
        }
        Ok(removed)
    }

    /// Removes `child` from its parent's child list, or from the roots.
    fn unlink(&mut self, child: NodeHandle) {
        match self.nodes.get(child).and_then(|n| n.parent) {
            Some(parent) => {
                if let Some(p) = self.nodes.get_mut(parent) {
                    p.children.retain(|&c| c != child);
                }
            }
            None => self.roots.retain(|&r| r != child),
        }
    }

    fn is_ancestor_or_self(&self, ancestor: NodeHandle, mut node: NodeHandle) -> bool {
        loop {
            if node == ancestor {
                return true;
            }
            match self.nodes.get(node).and_then(|n| n.parent) {
                Some(parent) => node = parent,
                None => return false,
            }
        }
    }

    #[must_use]
    pub fn roots(&self) -> &[NodeHandle] {
        &self.roots
    }

    #[must_use]
    pub fn node(&self, handle: NodeHandle) -> Option<&Node> {
        self.nodes.get(handle)
    }

    pub fn node_mut(&mut self, handle: NodeHandle) -> Option<&mut Node> {
        self.nodes.get_mut(handle)
    }

    /// Finds the node created by a loader under `id`.
    #[must_use]
    pub fn find_by_loader_id(&self, id: &str) -> Option<NodeHandle> {
        self.nodes
            .iter()
            .find(|(_, node)| node.loader_id.as_deref() == Some(id))
            .map(|(handle, _)| handle)
    }

    #[must_use]
    pub fn find_by_name(&self, name: &str) -> Option<NodeHandle> {
        self.nodes
            .iter()
            .find(|(_, node)| node.name == name)
            .map(|(handle, _)| handle)
    }

    // ========================================================================
    // Graphics
    // ========================================================================

    /// Attaches `graphic` to `node`, returning the graphic replaced by it.
    pub fn set_graphic(&mut self, node: NodeHandle, graphic: Graphic) -> Result<Option<Graphic>> {
        let Some(n) = self.nodes.get_mut(node) else {
            return Err(PrismError::NodeNotFound);
        };
        let previous = n.graphic.take().and_then(|key| self.graphics.remove(key));
        let key = self.graphics.insert(graphic);
        self.nodes[node].graphic = Some(key);
        Ok(previous)
    }

    /// Detaches and returns the graphic of `node`.
    pub fn take_graphic(&mut self, node: NodeHandle) -> Option<Graphic> {
        let key = self.nodes.get_mut(node)?.graphic.take()?;
        self.graphics.remove(key)
    }

    #[must_use]
    pub fn graphic(&self, node: NodeHandle) -> Option<&Graphic> {
        let key = self.nodes.get(node)?.graphic?;
        self.graphics.get(key)
    }

    pub fn graphic_mut(&mut self, node: NodeHandle) -> Option<&mut Graphic> {
        let key = self.nodes.get(node)?.graphic?;
        self.graphics.get_mut(key)
    }

    /// Nodes carrying a graphic, in depth-first order, skipping hidden
    /// subtrees.
    #[must_use]
    pub fn visible_graphics(&self) -> Vec<(NodeHandle, GraphicKey)> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeHandle> = self.roots.iter().rev().copied().collect();
        while let Some(handle) = stack.pop() {
            let Some(node) = self.nodes.get(handle) else {
                continue;
            };
            if !node.visible {
                continue;
            }
            if let Some(key) = node.graphic {
                out.push((handle, key));
            }
            stack.extend(node.children.iter().rev());
        }
        out
    }

    // ========================================================================
    // Per-frame
    // ========================================================================

    /// Propagates world matrices; returns the number of nodes updated.
    pub fn update_world_matrices(&mut self) -> usize {
        transform_system::update_hierarchy(&mut self.nodes, &self.roots)
    }

    /// Raycasts every visible graphic. Hits are sorted by distance, nearest
    /// first, and carry the owning node.
    ///
    /// World matrices are used as of the last
    /// [`update_world_matrices`](Self::update_world_matrices).
    pub fn raycast(&self, raycaster: &Raycaster) -> Result<Vec<Intersection>> {
        let mut hits = Vec::new();
        for (handle, key) in self.visible_graphics() {
            let Some(graphic) = self.graphics.get(key) else {
                continue;
            };
            let start = hits.len();
            graphic.raycast(&self.nodes[handle].transform, raycaster, &mut hits)?;
            for hit in &mut hits[start..] {
                hit.node = Some(handle);
            }
        }
        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        Ok(hits)
    }
}
