use glam::Affine3A;

use crate::scene::transform::Transform;
use crate::scene::{GraphicKey, NodeHandle};

/// A scene node: hierarchy, transform and an optional graphic.
///
/// # Hierarchy
///
/// - `parent`: handle of the parent node (`None` for roots)
/// - `children`: child handles, in attach order
///
/// Use [`Scene::attach`](crate::scene::Scene::attach) to keep both sides in sync.
#[derive(Debug, Clone)]
pub struct Node {
    pub name: String,
    /// Identifier assigned by the asset loader that created this node, used
    /// to resolve cross-references between loaded objects.
    pub loader_id: Option<String>,

    pub(crate) parent: Option<NodeHandle>,
    pub(crate) children: Vec<NodeHandle>,

    pub transform: Transform,
    pub visible: bool,

    /// Drawable component, stored in the scene's graphic map.
    pub(crate) graphic: Option<GraphicKey>,
}

impl Node {
    #[must_use]
    pub fn new() -> Self {
        Self {
            name: String::new(),
            loader_id: None,
            parent: None,
            children: Vec::new(),
            transform: Transform::new(),
            visible: true,
            graphic: None,
        }
    }

    #[must_use]
    pub fn with_name(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::new()
        }
    }

    #[must_use]
    pub fn with_loader_id(mut self, id: &str) -> Self {
        self.loader_id = Some(id.to_string());
        self
    }

    #[inline]
    #[must_use]
    pub fn parent(&self) -> Option<NodeHandle> {
        self.parent
    }

    #[inline]
    #[must_use]
    pub fn children(&self) -> &[NodeHandle] {
        &self.children
    }

    #[inline]
    #[must_use]
    pub fn graphic(&self) -> Option<GraphicKey> {
        self.graphic
    }

    /// World matrix as of the last transform update.
    #[inline]
    #[must_use]
    pub fn world_matrix(&self) -> &Affine3A {
        &self.transform.world_matrix
    }
}

impl Default for Node {
    fn default() -> Self {
        Self::new()
    }
}
