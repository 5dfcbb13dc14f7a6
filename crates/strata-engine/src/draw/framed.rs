use core::fmt;
use core::ops::{Deref, DerefMut};

use crate::coords::{Rect, Size};
use crate::paint::Color;

use super::pool::DrawPool;

/// Handle to an offscreen render target, resolved by the painter.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct FrameBufferId(pub u32);

/// Descriptor of an offscreen render target.
///
/// The painter owns the GPU texture and reallocates it whenever `revision` changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameBuffer {
    id: FrameBufferId,
    size: Size,
    smooth: bool,
    revision: u64,
}

impl FrameBuffer {
    pub fn new(id: FrameBufferId, size: Size) -> Self {
        Self { id, size, smooth: true, revision: 0 }
    }

    #[inline]
    pub fn id(&self) -> FrameBufferId {
        self.id
    }

    #[inline]
    pub fn size(&self) -> Size {
        self.size
    }

    #[inline]
    pub fn is_smooth(&self) -> bool {
        self.smooth
    }

    /// Bumped on every change that requires a new GPU texture or sampler.
    #[inline]
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn resize(&mut self, size: Size) {
        if self.size != size {
            self.size = size;
            self.revision += 1;
        }
    }

    pub fn set_smooth(&mut self, smooth: bool) {
        if self.smooth != smooth {
            self.smooth = smooth;
            self.revision += 1;
        }
    }
}

/// Where and how a framed pool's texture lands on screen.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Composite {
    pub dest: Rect,
    pub src: Rect,
    pub color: Color,
}

type Hook = Box<dyn FnMut()>;

/// Pool that renders into its own framebuffer before being composited.
///
/// Derefs to the inner [`DrawPool`] for recording and repaint control.
pub struct DrawPoolFramed {
    pool: DrawPool,
    framebuffer: FrameBuffer,
    before_draw: Option<Hook>,
    after_draw: Option<Hook>,
    composite: Option<Composite>,
}

impl DrawPoolFramed {
    pub fn new(pool: DrawPool, framebuffer: FrameBuffer) -> Self {
        Self {
            pool,
            framebuffer,
            before_draw: None,
            after_draw: None,
            composite: None,
        }
    }

    #[inline]
    pub const fn has_frame_buffer(&self) -> bool {
        true
    }

    #[inline]
    pub fn frame_buffer(&self) -> &FrameBuffer {
        &self.framebuffer
    }

    /// Runs right after the framebuffer is bound and cleared, before any object.
    pub fn on_before_draw(&mut self, f: impl FnMut() + 'static) {
        self.before_draw = Some(Box::new(f));
    }

    /// Runs after the last object, before the framebuffer is released.
    pub fn on_after_draw(&mut self, f: impl FnMut() + 'static) {
        self.after_draw = Some(Box::new(f));
    }

    #[inline]
    pub fn set_smooth(&mut self, smooth: bool) {
        self.framebuffer.set_smooth(smooth);
    }

    #[inline]
    pub fn resize(&mut self, size: Size) {
        self.framebuffer.resize(size);
    }

    #[inline]
    pub fn size(&self) -> Size {
        self.framebuffer.size()
    }

    pub fn set_composite(&mut self, dest: Rect, src: Rect, color: Color) {
        self.composite = Some(Composite { dest, src, color });
    }

    #[inline]
    pub fn composite(&self) -> Option<Composite> {
        self.composite
    }

    pub(crate) fn run_before_draw(&mut self) {
        if let Some(f) = self.before_draw.as_mut() {
            f();
        }
    }

    pub(crate) fn run_after_draw(&mut self) {
        if let Some(f) = self.after_draw.as_mut() {
            f();
        }
    }
}

impl Deref for DrawPoolFramed {
    type Target = DrawPool;

    fn deref(&self) -> &DrawPool {
        &self.pool
    }
}

impl DerefMut for DrawPoolFramed {
    fn deref_mut(&mut self) -> &mut DrawPool {
        &mut self.pool
    }
}

impl fmt::Debug for DrawPoolFramed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DrawPoolFramed")
            .field("pool_type", &self.pool.pool_type())
            .field("framebuffer", &self.framebuffer)
            .field("composite", &self.composite)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use crate::draw::DrawPoolType;

    use super::*;

    fn framed() -> DrawPoolFramed {
        DrawPoolFramed::new(
            DrawPool::new(DrawPoolType::Map),
            FrameBuffer::new(FrameBufferId(1), Size::new(480, 352)),
        )
    }

    #[test]
    fn resize_and_smooth_delegate_to_framebuffer() {
        let mut f = framed();
        assert_eq!(f.size(), Size::new(480, 352));

        f.resize(Size::new(480, 352));
        assert_eq!(f.frame_buffer().revision(), 0);

        f.resize(Size::new(960, 704));
        f.set_smooth(false);
        assert_eq!(f.size(), Size::new(960, 704));
        assert!(!f.frame_buffer().is_smooth());
        assert_eq!(f.frame_buffer().revision(), 2);
    }

    #[test]
    fn hooks_run_when_invoked() {
        let mut f = framed();
        let log = Rc::new(Cell::new(0u32));
        let (b, a) = (log.clone(), log.clone());
        f.on_before_draw(move || b.set(b.get() * 10 + 1));
        f.on_after_draw(move || a.set(a.get() * 10 + 2));

        f.run_before_draw();
        f.run_after_draw();
        assert_eq!(log.get(), 12);
    }

    #[test]
    fn derefs_to_inner_pool() {
        let mut f = framed();
        f.repaint();
        assert!(f.can_repaint(true));
        assert!(f.has_frame_buffer());
        assert_eq!(f.pool_type(), DrawPoolType::Map);
    }
}
