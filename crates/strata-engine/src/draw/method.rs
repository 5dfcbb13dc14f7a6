use crate::coords::{Rect, Vec2};

/// Discriminant of a [`DrawMethod`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum DrawMethodType {
    Rect,
    Triangle,
    RepeatedRect,
    BoundingRect,
    UpsideDownRect,
}

/// One drawing primitive.
///
/// `src` rectangles are in texture pixels; a zero-size `src` means "untextured".
#[derive(Debug, Copy, Clone, PartialEq, Hash)]
pub enum DrawMethod {
    Rect { dest: Rect, src: Rect },
    Triangle { a: Vec2, b: Vec2, c: Vec2 },
    /// Tiles `src` across `dest`, cropping the last row and column.
    RepeatedRect { dest: Rect, src: Rect },
    /// Outline of `dest`, `inner_width` pixels thick, drawn inwards.
    BoundingRect { dest: Rect, inner_width: u16 },
    /// Like `Rect` with the texture flipped vertically.
    UpsideDownRect { dest: Rect, src: Rect },
}

impl DrawMethod {
    #[inline]
    pub fn rect(dest: Rect) -> Self {
        DrawMethod::Rect { dest, src: Rect::default() }
    }

    #[inline]
    pub fn textured_rect(dest: Rect, src: Rect) -> Self {
        DrawMethod::Rect { dest, src }
    }

    pub fn kind(&self) -> DrawMethodType {
        match self {
            DrawMethod::Rect { .. } => DrawMethodType::Rect,
            DrawMethod::Triangle { .. } => DrawMethodType::Triangle,
            DrawMethod::RepeatedRect { .. } => DrawMethodType::RepeatedRect,
            DrawMethod::BoundingRect { .. } => DrawMethodType::BoundingRect,
            DrawMethod::UpsideDownRect { .. } => DrawMethodType::UpsideDownRect,
        }
    }

    /// Destination area covered by this primitive, if it has one.
    pub fn dest(&self) -> Option<Rect> {
        match *self {
            DrawMethod::Rect { dest, .. }
            | DrawMethod::RepeatedRect { dest, .. }
            | DrawMethod::BoundingRect { dest, .. }
            | DrawMethod::UpsideDownRect { dest, .. } => Some(dest),
            DrawMethod::Triangle { .. } => None,
        }
    }
}
