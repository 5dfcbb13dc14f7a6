use core::ops::Range;

use crate::coords::Point;

use super::coords::{CoordsBuffer, Vertex};
use super::method::DrawMethod;
use super::order::DrawOrder;
use super::state::{DrawMode, PoolState};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum Validity {
    Invalid,
    Valid,
    /// One-off buffer: never records, never validates.
    Temporary,
}

/// Geometry recorded for one `add` call.
#[derive(Debug, Clone)]
pub(crate) struct BufferEntry {
    pub key: u64,
    pub state_hash: u64,
    pub state: PoolState,
    pub method: DrawMethod,
    pub draw_mode: DrawMode,
    pub range: Range<usize>,
}

/// Caller-owned geometry cache.
///
/// A tile (or any other caller with a stable anchor) keeps one of these across
/// frames. Each frame it calls [`validate`](Self::validate) with its anchor:
///
/// - `false`: rebuild by calling `DrawPool::add` with this buffer; the pool records
///   every call's state and vertices here.
/// - `true`: skip rebuilding and hand the buffer to `DrawPool::replay`, which
///   re-emits the recorded geometry without hashing or triangulating anything.
///
/// The pool only borrows the buffer for the duration of a call, so dropping the
/// owner drops the cache with it.
#[derive(Debug, Clone)]
pub struct DrawBuffer {
    order: DrawOrder,
    agroup: bool,
    reference: Option<Point>,
    validity: Validity,
    entries: Vec<BufferEntry>,
    coords: Option<CoordsBuffer>,
}

impl DrawBuffer {
    /// Grouping buffer drawing into `order`.
    pub fn new(order: DrawOrder) -> Self {
        Self::with_agroup(order, true)
    }

    pub fn with_agroup(order: DrawOrder, agroup: bool) -> Self {
        Self {
            order,
            agroup,
            reference: None,
            validity: Validity::Invalid,
            entries: Vec::new(),
            coords: None,
        }
    }

    /// Buffer for one-off draws that should share the batching path without being
    /// cached.
    pub fn temporary(order: DrawOrder) -> Self {
        Self { validity: Validity::Temporary, ..Self::new(order) }
    }

    /// Allows or forbids merging this buffer's draws with equal-state objects.
    #[inline]
    pub fn agroup(&mut self, v: bool) {
        self.agroup = v;
    }

    #[inline]
    pub fn is_grouped(&self) -> bool {
        self.agroup
    }

    #[inline]
    pub fn set_order(&mut self, order: DrawOrder) {
        self.order = order;
    }

    #[inline]
    pub fn order(&self) -> DrawOrder {
        self.order
    }

    #[inline]
    pub fn is_valid(&self) -> bool {
        self.validity == Validity::Valid
    }

    #[inline]
    pub fn is_temporary(&self) -> bool {
        self.validity == Validity::Temporary
    }

    /// Checks the cache against the caller's anchor.
    ///
    /// A changed anchor (or the very first call) drops the recorded geometry and
    /// returns `false`. Validating the same anchor again returns `true`: the caller
    /// rebuilt after the previous `false`, so the recording is current.
    pub fn validate(&mut self, anchor: Point) -> bool {
        if self.reference != Some(anchor) {
            self.reference = Some(anchor);
            self.drop_recording();
            return false;
        }

        if self.validity == Validity::Invalid {
            self.validity = Validity::Valid;
        }
        self.is_valid()
    }

    /// Forces the next [`validate`](Self::validate) to report a rebuild.
    pub fn invalidate(&mut self) {
        self.reference = None;
        self.drop_recording();
    }

    /// Recorded vertices; allocated on first use.
    pub fn coords(&mut self) -> &mut CoordsBuffer {
        self.coords.get_or_insert_with(CoordsBuffer::new)
    }

    /// Number of recorded `add` calls.
    #[inline]
    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    fn drop_recording(&mut self) {
        if self.validity != Validity::Temporary {
            self.validity = Validity::Invalid;
        }
        self.entries.clear();
        if let Some(coords) = self.coords.as_mut() {
            coords.clear();
        }
    }

    pub(crate) fn entries(&self) -> &[BufferEntry] {
        &self.entries
    }

    pub(crate) fn vertices(&self, range: Range<usize>) -> &[Vertex] {
        match self.coords.as_ref() {
            Some(c) => &c.vertices()[range],
            None => &[],
        }
    }

    /// Previously recorded vertices for `key`.
    pub(crate) fn cached(&self, key: u64) -> Option<&[Vertex]> {
        if !self.is_valid() {
            return None;
        }
        let entry = self.entries.iter().find(|e| e.key == key)?;
        Some(self.vertices(entry.range.clone()))
    }

    /// Stores one call's geometry. No-op for temporaries.
    ///
    /// Validity only changes through [`validate`](Self::validate), so repeated
    /// identical draws in one rebuild are each recorded.
    pub(crate) fn record(
        &mut self,
        key: u64,
        state_hash: u64,
        state: &PoolState,
        method: DrawMethod,
        draw_mode: DrawMode,
        vertices: &[Vertex],
    ) {
        if self.is_temporary() {
            return;
        }

        let coords = self.coords();
        let start = coords.len();
        coords.extend_from_slice(vertices);
        let end = coords.len();

        self.entries.push(BufferEntry {
            key,
            state_hash,
            state: state.clone(),
            method,
            draw_mode,
            range: start..end,
        });
    }
}

#[cfg(test)]
mod tests {
    use crate::coords::Rect;

    use super::*;

    fn record_one(buf: &mut DrawBuffer, key: u64) {
        let m = DrawMethod::rect(Rect::new(0.0, 0.0, 1.0, 1.0));
        let mut c = CoordsBuffer::new();
        c.add_method(&m, DrawMode::Triangles);
        buf.record(key, 0, &PoolState::default(), m, DrawMode::Triangles, c.vertices());
    }

    #[test]
    fn first_validate_is_false() {
        let mut buf = DrawBuffer::new(DrawOrder::First);
        assert!(!buf.validate(Point::new(0, 0)));
    }

    #[test]
    fn same_anchor_validates() {
        let mut buf = DrawBuffer::new(DrawOrder::First);
        assert!(!buf.validate(Point::new(4, 2)));
        assert!(buf.validate(Point::new(4, 2)));
        assert!(buf.validate(Point::new(4, 2)));
    }

    #[test]
    fn moved_anchor_invalidates_and_drops_recording() {
        let mut buf = DrawBuffer::new(DrawOrder::First);
        buf.validate(Point::new(0, 0));
        record_one(&mut buf, 7);
        assert!(buf.validate(Point::new(0, 0)));
        assert!(buf.cached(7).is_some());

        assert!(!buf.validate(Point::new(32, 0)));
        assert_eq!(buf.entry_count(), 0);
        assert!(buf.cached(7).is_none());
    }

    #[test]
    fn explicit_invalidate_forces_rebuild_at_same_anchor() {
        let mut buf = DrawBuffer::new(DrawOrder::First);
        buf.validate(Point::new(1, 1));
        record_one(&mut buf, 1);
        buf.invalidate();
        assert!(!buf.is_valid());
        assert!(!buf.validate(Point::new(1, 1)));
    }

    #[test]
    fn recording_does_not_validate() {
        let mut buf = DrawBuffer::new(DrawOrder::First);
        buf.validate(Point::new(0, 0));
        record_one(&mut buf, 5);
        record_one(&mut buf, 5);
        assert!(!buf.is_valid());
        assert!(buf.cached(5).is_none());
        assert_eq!(buf.entry_count(), 2);
    }

    #[test]
    fn temporary_never_validates_or_records() {
        let mut buf = DrawBuffer::temporary(DrawOrder::Third);
        assert!(!buf.validate(Point::new(0, 0)));
        assert!(!buf.validate(Point::new(0, 0)));
        record_one(&mut buf, 3);
        assert_eq!(buf.entry_count(), 0);
        assert!(buf.is_temporary());
        assert!(!buf.is_valid());
    }

    #[test]
    fn coords_are_allocated_lazily() {
        let mut buf = DrawBuffer::new(DrawOrder::First);
        assert!(buf.coords.is_none());
        assert!(buf.coords().is_empty());
        assert!(buf.coords.is_some());
    }
}
