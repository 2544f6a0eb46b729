//! Transform System
//!
//! Propagates world matrices down the node hierarchy. It borrows only the
//! node map and the root list, so it can run while other parts of the scene
//! are borrowed.

use glam::Affine3A;
use slotmap::SlotMap;

use crate::scene::NodeHandle;
use crate::scene::node::Node;

/// Updates world matrices for every node reachable from `roots`.
///
/// Uses an explicit stack instead of recursion. A node's world matrix is
/// recomputed when its local TRS changed or any ancestor's world matrix did.
/// Returns the number of nodes whose world matrix changed.
pub fn update_hierarchy(nodes: &mut SlotMap<NodeHandle, Node>, roots: &[NodeHandle]) -> usize {
    let mut updated = 0;
    // (node, parent world matrix, parent changed)
    let mut stack: Vec<(NodeHandle, Affine3A, bool)> = Vec::with_capacity(64);
    for &root in roots.iter().rev() {
        stack.push((root, Affine3A::IDENTITY, false));
    }

    while let Some((handle, parent_world, parent_changed)) = stack.pop() {
        let Some(node) = nodes.get_mut(handle) else {
            continue;
        };

        let local_changed = node.transform.update_local_matrix();
        let changed = local_changed || parent_changed;
        if changed {
            let world = parent_world * node.transform.local_matrix;
            node.transform.set_world_matrix(world);
            updated += 1;
        }

        let world = node.transform.world_matrix;
        for &child in node.children.iter().rev() {
            stack.push((child, world, changed));
        }
    }

    updated
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn children_follow_parents() {
        let mut nodes: SlotMap<NodeHandle, Node> = SlotMap::with_key();
        let parent = nodes.insert(Node::new());
        let child = nodes.insert(Node::new());
        nodes[parent].children.push(child);
        nodes[child].parent = Some(parent);

        nodes[parent].transform.position = Vec3::X;
        nodes[child].transform.position = Vec3::Y;
        assert_eq!(update_hierarchy(&mut nodes, &[parent]), 2);
        assert_eq!(nodes[child].transform.world_position(), Vec3::new(1.0, 1.0, 0.0));

        // Nothing moved: nothing recomputed.
        assert_eq!(update_hierarchy(&mut nodes, &[parent]), 0);

        nodes[parent].transform.position = Vec3::Z;
        assert_eq!(update_hierarchy(&mut nodes, &[parent]), 2);
        assert_eq!(nodes[child].transform.world_position(), Vec3::new(0.0, 1.0, 1.0));
    }
}
