use super::coords::{CoordsBuffer, Vertex};
use super::method::DrawMethod;
use super::state::{Action, DrawMode, PoolState};

/// Method storage of a geometry object.
///
/// Starts as `Single` and becomes `Batch` on the first extension. The conversion is
/// permanent for the object's lifetime.
#[derive(Debug, Clone, PartialEq)]
pub enum Methods {
    Single(DrawMethod),
    Batch(Vec<DrawMethod>),
}

impl Methods {
    pub fn as_slice(&self) -> &[DrawMethod] {
        match self {
            Methods::Single(m) => core::slice::from_ref(m),
            Methods::Batch(list) => list,
        }
    }
}

/// Run of methods sharing one state, submitted as a single batch.
#[derive(Debug, Clone)]
pub struct GeometryObject {
    pub(crate) state: PoolState,
    pub(crate) methods: Methods,
    pub(crate) draw_mode: DrawMode,
    pub(crate) coords: CoordsBuffer,
}

/// Entry of a pool bucket.
#[derive(Debug, Clone)]
pub enum DrawObject {
    /// Side effect with no geometry, run in bucket order.
    Action(Action),
    Geometry(GeometryObject),
}

impl DrawObject {
    /// Creates a single-method object whose coordinates were already built.
    pub(crate) fn geometry(
        state: PoolState,
        method: DrawMethod,
        draw_mode: DrawMode,
        coords: CoordsBuffer,
    ) -> Self {
        DrawObject::Geometry(GeometryObject {
            state,
            methods: Methods::Single(method),
            draw_mode,
            coords,
        })
    }

    /// Extends this object with `method`, whose `vertices` were built in `mode`.
    ///
    /// Promotes the object to a triangle batch. Strip geometry cannot be concatenated,
    /// so a strip-mode first method or incoming method is re-triangulated as a list.
    ///
    /// Calling this on an action object is a caller bug: asserts in debug builds and
    /// does nothing in release builds.
    pub fn add_method(&mut self, method: DrawMethod, vertices: &[Vertex], mode: DrawMode) {
        let DrawObject::Geometry(obj) = self else {
            debug_assert!(false, "add_method called on an action-only draw object");
            return;
        };

        if let Methods::Single(first) = obj.methods {
            if obj.draw_mode == DrawMode::TriangleStrip {
                obj.coords.clear();
                obj.coords.add_method(&first, DrawMode::Triangles);
            }
            obj.methods = Methods::Batch(vec![first]);
        }
        obj.draw_mode = DrawMode::Triangles;

        if let Methods::Batch(list) = &mut obj.methods {
            list.push(method);
        }
        match mode {
            DrawMode::Triangles => obj.coords.extend_from_slice(vertices),
            DrawMode::TriangleStrip => obj.coords.add_method(&method, DrawMode::Triangles),
        }
    }

    pub fn is_action(&self) -> bool {
        matches!(self, DrawObject::Action(_))
    }

    pub fn is_batched(&self) -> bool {
        matches!(self, DrawObject::Geometry(GeometryObject { methods: Methods::Batch(_), .. }))
    }

    pub fn methods(&self) -> &[DrawMethod] {
        match self {
            DrawObject::Action(_) => &[],
            DrawObject::Geometry(obj) => obj.methods.as_slice(),
        }
    }

    #[inline]
    pub fn method_count(&self) -> usize {
        self.methods().len()
    }

    pub fn state(&self) -> Option<&PoolState> {
        match self {
            DrawObject::Action(_) => None,
            DrawObject::Geometry(obj) => Some(&obj.state),
        }
    }

    pub(crate) fn state_mut(&mut self) -> Option<&mut PoolState> {
        match self {
            DrawObject::Action(_) => None,
            DrawObject::Geometry(obj) => Some(&mut obj.state),
        }
    }

    pub fn draw_mode(&self) -> Option<DrawMode> {
        match self {
            DrawObject::Action(_) => None,
            DrawObject::Geometry(obj) => Some(obj.draw_mode),
        }
    }

    pub fn coords(&self) -> Option<&CoordsBuffer> {
        match self {
            DrawObject::Action(_) => None,
            DrawObject::Geometry(obj) => Some(&obj.coords),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::coords::Rect;

    use super::*;

    fn built(method: &DrawMethod, mode: DrawMode) -> CoordsBuffer {
        let mut c = CoordsBuffer::new();
        c.add_method(method, mode);
        c
    }

    #[test]
    fn second_method_promotes_to_triangle_batch() {
        let a = DrawMethod::rect(Rect::new(0.0, 0.0, 1.0, 1.0));
        let b = DrawMethod::rect(Rect::new(2.0, 0.0, 1.0, 1.0));
        let mut obj = DrawObject::geometry(
            PoolState::default(),
            a,
            DrawMode::TriangleStrip,
            built(&a, DrawMode::TriangleStrip),
        );
        assert!(!obj.is_batched());
        assert_eq!(obj.coords().map(CoordsBuffer::len), Some(4));

        obj.add_method(b, built(&b, DrawMode::Triangles).vertices(), DrawMode::Triangles);

        assert!(obj.is_batched());
        assert_eq!(obj.draw_mode(), Some(DrawMode::Triangles));
        assert_eq!(obj.methods(), &[a, b]);
        // Strip quad was rebuilt as two triangles before the second rect was appended.
        assert_eq!(obj.coords().map(CoordsBuffer::len), Some(12));
    }

    #[test]
    fn strip_method_joining_a_batch_is_triangulated() {
        let a = DrawMethod::rect(Rect::new(0.0, 0.0, 1.0, 1.0));
        let b = DrawMethod::rect(Rect::new(2.0, 0.0, 1.0, 1.0));
        let mut obj = DrawObject::geometry(
            PoolState::default(),
            a,
            DrawMode::TriangleStrip,
            built(&a, DrawMode::TriangleStrip),
        );
        obj.add_method(b, built(&b, DrawMode::TriangleStrip).vertices(), DrawMode::TriangleStrip);

        let mut expected = built(&a, DrawMode::Triangles);
        expected.add_method(&b, DrawMode::Triangles);
        assert_eq!(obj.coords(), Some(&expected));
        assert_eq!(obj.draw_mode(), Some(DrawMode::Triangles));
    }

    #[test]
    fn batch_keeps_growing() {
        let m = DrawMethod::rect(Rect::new(0.0, 0.0, 1.0, 1.0));
        let v = built(&m, DrawMode::Triangles);
        let mut obj = DrawObject::geometry(PoolState::default(), m, DrawMode::Triangles, v.clone());
        obj.add_method(m, v.vertices(), DrawMode::Triangles);
        obj.add_method(m, v.vertices(), DrawMode::Triangles);
        assert_eq!(obj.method_count(), 3);
        assert_eq!(obj.coords().map(CoordsBuffer::len), Some(18));
    }

    #[test]
    fn action_objects_have_no_geometry() {
        let obj = DrawObject::Action(Action::new(|| {}));
        assert!(obj.is_action());
        assert_eq!(obj.method_count(), 0);
        assert!(obj.state().is_none());
        assert!(obj.coords().is_none());
    }
}
