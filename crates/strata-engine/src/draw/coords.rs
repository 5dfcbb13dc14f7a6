//! Triangulation of draw methods into vertex coordinates.

use bytemuck::{Pod, Zeroable};

use crate::coords::{Rect, Vec2};

use super::method::DrawMethod;
use super::state::DrawMode;

/// Position + texture coordinate, both in pixels.
///
/// Texture coordinates are normalized by the painter, which knows texture sizes.
#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub pos: [f32; 2],
    pub uv: [f32; 2],
}

impl Vertex {
    #[inline]
    pub const fn new(x: f32, y: f32, u: f32, v: f32) -> Self {
        Self { pos: [x, y], uv: [u, v] }
    }
}

impl From<&[Vertex]> for CoordsBuffer {
    fn from(vertices: &[Vertex]) -> Self {
        Self { vertices: vertices.to_vec() }
    }
}

/// Growable vertex store for one draw object or one caller-owned buffer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CoordsBuffer {
    vertices: Vec<Vertex>,
}

impl CoordsBuffer {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Drops all vertices, keeping the allocation.
    #[inline]
    pub fn clear(&mut self) {
        self.vertices.clear();
    }

    #[inline]
    pub fn extend_from_slice(&mut self, vertices: &[Vertex]) {
        self.vertices.extend_from_slice(vertices);
    }

    /// Appends the triangulation of `method`.
    ///
    /// `TriangleStrip` only affects plain and upside-down rects, which become a
    /// four-vertex quad. Every other method is always emitted as a triangle list.
    pub fn add_method(&mut self, method: &DrawMethod, mode: DrawMode) {
        match *method {
            DrawMethod::Rect { dest, src } => match mode {
                DrawMode::Triangles => self.add_rect(dest, src),
                DrawMode::TriangleStrip => self.add_quad(dest, src, false),
            },
            DrawMethod::UpsideDownRect { dest, src } => match mode {
                DrawMode::Triangles => self.add_upside_down_rect(dest, src),
                DrawMode::TriangleStrip => self.add_quad(dest, src, true),
            },
            DrawMethod::Triangle { a, b, c } => self.add_triangle(a, b, c),
            DrawMethod::RepeatedRect { dest, src } => self.add_repeated_rects(dest, src),
            DrawMethod::BoundingRect { dest, inner_width } => {
                self.add_bounding_rect(dest, inner_width)
            }
        }
    }

    pub fn add_triangle(&mut self, a: Vec2, b: Vec2, c: Vec2) {
        self.vertices.extend_from_slice(&[
            Vertex::new(a.x, a.y, 0.0, 0.0),
            Vertex::new(b.x, b.y, 0.0, 0.0),
            Vertex::new(c.x, c.y, 0.0, 0.0),
        ]);
    }

    pub fn add_rect(&mut self, dest: Rect, src: Rect) {
        let (l, t) = (dest.origin.x, dest.origin.y);
        let (r, b) = (l + dest.width(), t + dest.height());
        let (u0, v0) = (src.origin.x, src.origin.y);
        let (u1, v1) = (u0 + src.width(), v0 + src.height());

        self.vertices.extend_from_slice(&[
            Vertex::new(l, t, u0, v0),
            Vertex::new(r, t, u1, v0),
            Vertex::new(l, b, u0, v1),
            Vertex::new(r, t, u1, v0),
            Vertex::new(r, b, u1, v1),
            Vertex::new(l, b, u0, v1),
        ]);
    }

    pub fn add_upside_down_rect(&mut self, dest: Rect, src: Rect) {
        let flipped = Rect::new(
            src.origin.x,
            src.origin.y + src.height(),
            src.width(),
            -src.height(),
        );
        self.add_rect(dest, flipped);
    }

    fn add_quad(&mut self, dest: Rect, src: Rect, upside_down: bool) {
        let (l, t) = (dest.origin.x, dest.origin.y);
        let (r, b) = (l + dest.width(), t + dest.height());
        let (u0, u1) = (src.origin.x, src.origin.x + src.width());
        let (mut v0, mut v1) = (src.origin.y, src.origin.y + src.height());
        if upside_down {
            core::mem::swap(&mut v0, &mut v1);
        }

        self.vertices.extend_from_slice(&[
            Vertex::new(l, t, u0, v0),
            Vertex::new(r, t, u1, v0),
            Vertex::new(l, b, u0, v1),
            Vertex::new(r, b, u1, v1),
        ]);
    }

    /// Tiles `src` over `dest` at 1:1 scale. The last row and column are cropped in
    /// both destination and source so the texture is never stretched.
    pub fn add_repeated_rects(&mut self, dest: Rect, src: Rect) {
        if src.is_empty() || dest.is_empty() {
            self.add_rect(dest, src);
            return;
        }

        let mut y = 0.0;
        while y < dest.height() {
            let h = src.height().min(dest.height() - y);
            let mut x = 0.0;
            while x < dest.width() {
                let w = src.width().min(dest.width() - x);
                self.add_rect(
                    Rect::new(dest.origin.x + x, dest.origin.y + y, w, h),
                    Rect::from_origin_size(src.origin, Vec2::new(w, h)),
                );
                x += src.width();
            }
            y += src.height();
        }
    }

    /// Four edge strips of `inner_width` drawn inside `dest`. Degenerates to a filled
    /// rect when the edges would overlap.
    pub fn add_bounding_rect(&mut self, dest: Rect, inner_width: u16) {
        let iw = f32::from(inner_width);
        let none = Rect::default();
        if iw <= 0.0 {
            return;
        }
        if iw * 2.0 >= dest.width() || iw * 2.0 >= dest.height() {
            self.add_rect(dest, none);
            return;
        }

        let (l, t, w, h) = (dest.origin.x, dest.origin.y, dest.width(), dest.height());
        self.add_rect(Rect::new(l, t, w, iw), none);
        self.add_rect(Rect::new(l, t + h - iw, w, iw), none);
        self.add_rect(Rect::new(l, t + iw, iw, h - 2.0 * iw), none);
        self.add_rect(Rect::new(l + w - iw, t + iw, iw, h - 2.0 * iw), none);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn r(x: f32, y: f32, w: f32, h: f32) -> Rect {
        Rect::new(x, y, w, h)
    }

    #[test]
    fn rect_is_two_triangles() {
        let mut c = CoordsBuffer::new();
        c.add_method(&DrawMethod::rect(r(0.0, 0.0, 4.0, 2.0)), DrawMode::Triangles);
        assert_eq!(c.len(), 6);
        assert_eq!(c.vertices()[4].pos, [4.0, 2.0]);
    }

    #[test]
    fn strip_mode_emits_a_quad() {
        let mut c = CoordsBuffer::new();
        c.add_method(&DrawMethod::rect(r(0.0, 0.0, 4.0, 2.0)), DrawMode::TriangleStrip);
        assert_eq!(c.len(), 4);
    }

    #[test]
    fn strip_mode_does_not_apply_to_triangles() {
        let mut c = CoordsBuffer::new();
        let tri = DrawMethod::Triangle {
            a: Vec2::new(0.0, 0.0),
            b: Vec2::new(1.0, 0.0),
            c: Vec2::new(0.0, 1.0),
        };
        c.add_method(&tri, DrawMode::TriangleStrip);
        assert_eq!(c.len(), 3);
    }

    #[test]
    fn upside_down_flips_v() {
        let mut c = CoordsBuffer::new();
        c.add_upside_down_rect(r(0.0, 0.0, 1.0, 1.0), r(0.0, 0.0, 8.0, 8.0));
        assert_eq!(c.vertices()[0].uv, [0.0, 8.0]);
        assert_eq!(c.vertices()[2].uv, [0.0, 0.0]);
    }

    #[test]
    fn repeated_rect_crops_last_tile() {
        let mut c = CoordsBuffer::new();
        c.add_repeated_rects(r(0.0, 0.0, 10.0, 4.0), r(0.0, 0.0, 4.0, 4.0));
        // 3 columns (4 + 4 + 2) x 1 row.
        assert_eq!(c.len(), 18);
        let last = &c.vertices()[12..18];
        assert_eq!(last[0].pos, [8.0, 0.0]);
        assert_eq!(last[4].pos, [10.0, 4.0]);
        assert_eq!(last[4].uv, [2.0, 4.0]);
    }

    #[test]
    fn bounding_rect_has_four_edges() {
        let mut c = CoordsBuffer::new();
        c.add_bounding_rect(r(0.0, 0.0, 10.0, 10.0), 1);
        assert_eq!(c.len(), 24);
    }

    #[test]
    fn thick_bounding_rect_collapses_to_fill() {
        let mut c = CoordsBuffer::new();
        c.add_bounding_rect(r(0.0, 0.0, 4.0, 4.0), 2);
        assert_eq!(c.len(), 6);
    }
}
