use std::cell::{Ref, RefCell, RefMut};
use std::rc::Rc;

use crate::renderer::device::GraphicsDevice;
use crate::resources::geometry::Geometry;
use crate::resources::morph::MorphGeometry;
use crate::resources::shader_defines::ShaderDefines;

/// The geometry variants a graphic can draw.
#[derive(Debug)]
pub enum GeometryKind {
    Plain(Geometry),
    Morph(MorphGeometry),
}

impl From<Geometry> for GeometryKind {
    fn from(geometry: Geometry) -> Self {
        Self::Plain(geometry)
    }
}

impl From<MorphGeometry> for GeometryKind {
    fn from(morph: MorphGeometry) -> Self {
        Self::Morph(morph)
    }
}

impl GeometryKind {
    /// The geometry holding the rest-pose buffers, indices and groups.
    #[must_use]
    pub fn base(&self) -> &Geometry {
        match self {
            Self::Plain(g) => g,
            Self::Morph(m) => m.base(),
        }
    }

    pub fn base_mut(&mut self) -> &mut Geometry {
        match self {
            Self::Plain(g) => g,
            Self::Morph(m) => m.base_mut(),
        }
    }

    #[must_use]
    pub fn as_morph(&self) -> Option<&MorphGeometry> {
        match self {
            Self::Morph(m) => Some(m),
            Self::Plain(_) => None,
        }
    }

    pub fn as_morph_mut(&mut self) -> Option<&mut MorphGeometry> {
        match self {
            Self::Morph(m) => Some(m),
            Self::Plain(_) => None,
        }
    }

    pub fn render_setup(&mut self, device: &mut dyn GraphicsDevice) {
        match self {
            Self::Plain(g) => g.render_setup(device),
            Self::Morph(m) => m.render_setup(device),
        }
    }

    pub fn incref(&mut self) {
        match self {
            Self::Plain(g) => g.incref(),
            Self::Morph(m) => m.incref(),
        }
    }

    #[must_use]
    pub fn ref_count(&self) -> usize {
        match self {
            Self::Plain(g) => g.ref_count(),
            Self::Morph(m) => m.ref_count(),
        }
    }

    pub fn dispose(&mut self, device: &mut dyn GraphicsDevice) -> bool {
        match self {
            Self::Plain(g) => g.dispose(device),
            Self::Morph(m) => m.dispose(device),
        }
    }

    #[must_use]
    pub fn shader_defines(&self) -> ShaderDefines {
        match self {
            Self::Plain(g) => g.shader_defines(),
            Self::Morph(m) => m.shader_defines(),
        }
    }
}

/// Shared handle to a geometry.
///
/// Every handle counts as one owner of the geometry's device resources:
/// [`GeometryHandle::share`] registers a new owner, and each owner must call
/// `dispose` once.
#[derive(Debug)]
pub struct GeometryHandle(Rc<RefCell<GeometryKind>>);

impl GeometryHandle {
    pub fn new(geometry: impl Into<GeometryKind>) -> Self {
        Self(Rc::new(RefCell::new(geometry.into())))
    }

    /// Returns a new handle to the same geometry and increments its owner count.
    #[must_use]
    pub fn share(&self) -> Self {
        self.0.borrow_mut().incref();
        Self(Rc::clone(&self.0))
    }

    #[must_use]
    pub fn borrow(&self) -> Ref<'_, GeometryKind> {
        self.0.borrow()
    }

    #[must_use]
    pub fn borrow_mut(&self) -> RefMut<'_, GeometryKind> {
        self.0.borrow_mut()
    }

    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    #[must_use]
    pub fn ref_count(&self) -> usize {
        self.0.borrow().ref_count()
    }

    /// Releases this handle's ownership; see [`Geometry::dispose`].
    pub fn dispose(&self, device: &mut dyn GraphicsDevice) -> bool {
        self.0.borrow_mut().dispose(device)
    }
}

impl From<Geometry> for GeometryHandle {
    fn from(geometry: Geometry) -> Self {
        Self::new(geometry)
    }
}

impl From<MorphGeometry> for GeometryHandle {
    fn from(morph: MorphGeometry) -> Self {
        Self::new(morph)
    }
}
