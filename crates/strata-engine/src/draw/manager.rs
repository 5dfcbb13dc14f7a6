use crate::coords::{Rect, Size, Vec2};
use crate::paint::Color;
use crate::render::Painter;

use super::buffer::DrawBuffer;
use super::config::DrawPoolConfig;
use super::framed::{DrawPoolFramed, FrameBuffer, FrameBufferId};
use super::method::DrawMethod;
use super::object::DrawObject;
use super::order::{DrawOrder, DrawPoolType};
use super::pool::DrawPool;
use super::state::{Action, BlendEquation, CompositionMode, DrawMode, ShaderId, TextureId};

/// A pool with or without an offscreen target.
#[derive(Debug)]
pub enum PoolSlot {
    Plain(DrawPool),
    Framed(DrawPoolFramed),
}

impl PoolSlot {
    pub fn pool(&self) -> &DrawPool {
        match self {
            PoolSlot::Plain(p) => p,
            PoolSlot::Framed(f) => f,
        }
    }

    pub fn pool_mut(&mut self) -> &mut DrawPool {
        match self {
            PoolSlot::Plain(p) => p,
            PoolSlot::Framed(f) => f,
        }
    }

    #[inline]
    pub fn has_frame_buffer(&self) -> bool {
        matches!(self, PoolSlot::Framed(_))
    }

    pub fn as_framed(&self) -> Option<&DrawPoolFramed> {
        match self {
            PoolSlot::Framed(f) => Some(f),
            PoolSlot::Plain(_) => None,
        }
    }

    pub fn as_framed_mut(&mut self) -> Option<&mut DrawPoolFramed> {
        match self {
            PoolSlot::Framed(f) => Some(f),
            PoolSlot::Plain(_) => None,
        }
    }
}

/// Owns one pool per [`DrawPoolType`] and routes drawing into the selected one.
///
/// Per frame: `use_pool` / `use_framed` a pool, issue primitives and state changes,
/// `flush` between floors, then `draw` everything into a [`Painter`].
///
/// Every recording call requires a selected pool. Calling one without is a caller
/// bug: it asserts in debug builds and is ignored in release builds.
pub struct DrawPoolManager {
    pools: Vec<PoolSlot>,
    current: Option<DrawPoolType>,
}

impl DrawPoolManager {
    pub fn new(config: &DrawPoolConfig) -> Self {
        let pools = DrawPoolType::ALL
            .iter()
            .map(|&pool_type| {
                let cfg = config.get(pool_type);
                let pool = DrawPool::with_config(pool_type, cfg);
                log::debug!(
                    "draw pool {:?} created (framed: {}, always_group: {}, refresh: {:?})",
                    pool_type,
                    cfg.framed,
                    cfg.always_group,
                    cfg.refresh_interval
                );
                if cfg.framed {
                    let fb = FrameBuffer::new(FrameBufferId(pool_type.index() as u32), Size::default());
                    PoolSlot::Framed(DrawPoolFramed::new(pool, fb))
                } else {
                    PoolSlot::Plain(pool)
                }
            })
            .collect();

        Self { pools, current: None }
    }

    // ── selection ─────────────────────────────────────────────────────────

    #[inline]
    pub fn select(&mut self, pool_type: DrawPoolType) {
        self.current = Some(pool_type);
    }

    #[inline]
    pub fn current_type(&self) -> Option<DrawPoolType> {
        self.current
    }

    /// Whether a pool is selected.
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.current.is_some()
    }

    /// Selects `pool_type` and starts its usage cycle with a cleared arena and
    /// default state.
    pub fn use_pool(&mut self, pool_type: DrawPoolType) {
        self.select(pool_type);
        let pool = self.pools[pool_type.index()].pool_mut();
        pool.clear();
        pool.reset_state();
        log::trace!("using draw pool {:?}", pool_type);
    }

    /// Like [`use_pool`](Self::use_pool), also setting where a framed pool's
    /// texture is composited. Plain pools ignore the composite rectangles.
    pub fn use_framed(&mut self, pool_type: DrawPoolType, dest: Rect, src: Rect, color: Color) {
        self.use_pool(pool_type);
        match self.pools[pool_type.index()].as_framed_mut() {
            Some(framed) => framed.set_composite(dest, src, color),
            None => log::debug!("use_framed on plain pool {:?}; composite ignored", pool_type),
        }
    }

    pub fn slot(&self, pool_type: DrawPoolType) -> &PoolSlot {
        &self.pools[pool_type.index()]
    }

    pub fn pool(&self, pool_type: DrawPoolType) -> &DrawPool {
        self.pools[pool_type.index()].pool()
    }

    pub fn pool_mut(&mut self, pool_type: DrawPoolType) -> &mut DrawPool {
        self.pools[pool_type.index()].pool_mut()
    }

    pub fn framed(&self, pool_type: DrawPoolType) -> Option<&DrawPoolFramed> {
        self.pools[pool_type.index()].as_framed()
    }

    pub fn framed_mut(&mut self, pool_type: DrawPoolType) -> Option<&mut DrawPoolFramed> {
        self.pools[pool_type.index()].as_framed_mut()
    }

    fn current_pool(&self) -> Option<&DrawPool> {
        debug_assert!(self.current.is_some(), "no draw pool selected");
        self.current.map(|t| self.pools[t.index()].pool())
    }

    fn current_pool_mut(&mut self) -> Option<&mut DrawPool> {
        debug_assert!(self.current.is_some(), "no draw pool selected");
        let t = self.current?;
        Some(self.pools[t.index()].pool_mut())
    }

    fn add(
        &mut self,
        color: Color,
        texture: Option<TextureId>,
        method: DrawMethod,
        draw_mode: DrawMode,
        buffer: Option<&mut DrawBuffer>,
    ) {
        if color.is_transparent() || method.dest().is_some_and(Rect::is_empty) {
            return;
        }
        if let Some(pool) = self.current_pool_mut() {
            pool.add(color, texture, method, draw_mode, buffer);
        }
    }

    // ── primitives ────────────────────────────────────────────────────────

    pub fn add_textured_rect(
        &mut self,
        dest: Rect,
        texture: TextureId,
        src: Rect,
        color: Color,
        buffer: Option<&mut DrawBuffer>,
    ) {
        let method = DrawMethod::textured_rect(dest, src);
        self.add(color, Some(texture), method, DrawMode::TriangleStrip, buffer);
    }

    pub fn add_upside_down_textured_rect(
        &mut self,
        dest: Rect,
        texture: TextureId,
        src: Rect,
        color: Color,
    ) {
        let method = DrawMethod::UpsideDownRect { dest, src };
        self.add(color, Some(texture), method, DrawMode::TriangleStrip, None);
    }

    pub fn add_textured_repeated_rect(
        &mut self,
        dest: Rect,
        texture: TextureId,
        src: Rect,
        color: Color,
        buffer: Option<&mut DrawBuffer>,
    ) {
        let method = DrawMethod::RepeatedRect { dest, src };
        self.add(color, Some(texture), method, DrawMode::Triangles, buffer);
    }

    pub fn add_filled_rect(&mut self, dest: Rect, color: Color, buffer: Option<&mut DrawBuffer>) {
        self.add(color, None, DrawMethod::rect(dest), DrawMode::Triangles, buffer);
    }

    pub fn add_filled_triangle(&mut self, a: Vec2, b: Vec2, c: Vec2, color: Color) {
        if a == b || a == c || b == c {
            return;
        }
        self.add(color, None, DrawMethod::Triangle { a, b, c }, DrawMode::Triangles, None);
    }

    pub fn add_bounding_rect(&mut self, dest: Rect, color: Color, inner_width: u16) {
        if inner_width == 0 {
            return;
        }
        let method = DrawMethod::BoundingRect { dest, inner_width };
        self.add(color, None, method, DrawMode::Triangles, None);
    }

    pub fn add_action(&mut self, f: impl Fn() + 'static) {
        if let Some(pool) = self.current_pool_mut() {
            pool.add_action(Action::new(f));
        }
    }

    /// Replays a caller buffer that validated against its anchor.
    pub fn replay_buffer(&mut self, buffer: &DrawBuffer) {
        if let Some(pool) = self.current_pool_mut() {
            pool.replay(buffer);
        }
    }

    // ── state ─────────────────────────────────────────────────────────────

    pub fn set_clip_rect(&mut self, clip_rect: Option<Rect>, on_last_drawing: bool) {
        if let Some(pool) = self.current_pool_mut() {
            pool.set_clip_rect(clip_rect, on_last_drawing);
        }
    }

    pub fn set_opacity(&mut self, opacity: f32, on_last_drawing: bool) {
        if let Some(pool) = self.current_pool_mut() {
            pool.set_opacity(opacity, on_last_drawing);
        }
    }

    pub fn set_composition_mode(&mut self, mode: CompositionMode, on_last_drawing: bool) {
        if let Some(pool) = self.current_pool_mut() {
            pool.set_composition_mode(mode, on_last_drawing);
        }
    }

    pub fn set_blend_equation(&mut self, equation: BlendEquation, on_last_drawing: bool) {
        if let Some(pool) = self.current_pool_mut() {
            pool.set_blend_equation(equation, on_last_drawing);
        }
    }

    pub fn set_shader_program(
        &mut self,
        shader: Option<ShaderId>,
        on_last_drawing: bool,
        action: Option<Action>,
    ) {
        if let Some(pool) = self.current_pool_mut() {
            pool.set_shader_program(shader, on_last_drawing, action);
        }
    }

    pub fn opacity(&self, last_drawing: bool) -> f32 {
        self.current_pool().map_or(1.0, |p| p.opacity(last_drawing))
    }

    pub fn clip_rect(&self, last_drawing: bool) -> Option<Rect> {
        self.current_pool().and_then(|p| p.clip_rect(last_drawing))
    }

    pub fn reset_state(&mut self) {
        if let Some(pool) = self.current_pool_mut() {
            pool.reset_state();
        }
    }

    pub fn reset_opacity(&mut self) {
        if let Some(pool) = self.current_pool_mut() {
            pool.reset_opacity();
        }
    }

    pub fn reset_clip_rect(&mut self) {
        if let Some(pool) = self.current_pool_mut() {
            pool.reset_clip_rect();
        }
    }

    pub fn reset_shader_program(&mut self) {
        if let Some(pool) = self.current_pool_mut() {
            pool.reset_shader_program();
        }
    }

    pub fn reset_composition_mode(&mut self) {
        if let Some(pool) = self.current_pool_mut() {
            pool.reset_composition_mode();
        }
    }

    pub fn reset_blend_equation(&mut self) {
        if let Some(pool) = self.current_pool_mut() {
            pool.reset_blend_equation();
        }
    }

    pub fn push_transform(&mut self) {
        if let Some(pool) = self.current_pool_mut() {
            pool.push_transform();
        }
    }

    pub fn pop_transform(&mut self) {
        if let Some(pool) = self.current_pool_mut() {
            pool.pop_transform();
        }
    }

    pub fn translate(&mut self, offset: Vec2) {
        if let Some(pool) = self.current_pool_mut() {
            pool.translate(offset);
        }
    }

    pub fn scale(&mut self, sx: f32, sy: f32) {
        if let Some(pool) = self.current_pool_mut() {
            pool.scale(sx, sy);
        }
    }

    pub fn set_draw_order(&mut self, order: DrawOrder) {
        if let Some(pool) = self.current_pool_mut() {
            pool.set_draw_order(order);
        }
    }

    pub fn reset_draw_order(&mut self) {
        if let Some(pool) = self.current_pool_mut() {
            pool.reset_draw_order();
        }
    }

    // ── frame control ─────────────────────────────────────────────────────

    /// Moves the selected pool to the next floor.
    pub fn flush(&mut self) {
        if let Some(pool) = self.current_pool_mut() {
            pool.flush();
        }
    }

    pub fn clear(&mut self, pool_type: DrawPoolType) {
        self.pool_mut(pool_type).clear();
    }

    pub fn repaint(&mut self, pool_type: DrawPoolType) {
        self.pool_mut(pool_type).repaint();
    }

    pub fn can_repaint(&mut self, pool_type: DrawPoolType, auto_update: bool) -> bool {
        self.pool_mut(pool_type).can_repaint(auto_update)
    }

    /// Replays every enabled pool into `painter`.
    ///
    /// Plain pools emit their objects every frame. Framed pools re-render into their
    /// framebuffer only when [`DrawPool::can_repaint`] accepts a repaint, and then
    /// composite the framebuffer, fresh or not.
    pub fn draw<P: Painter + ?Sized>(&mut self, painter: &mut P) {
        for slot in &mut self.pools {
            if !slot.pool().is_enabled() {
                continue;
            }

            match slot {
                PoolSlot::Plain(pool) => emit(pool, painter),
                PoolSlot::Framed(framed) => {
                    if framed.can_repaint(true) {
                        log::trace!("repainting framed pool {:?}", framed.pool_type());
                        painter.begin_frame_buffer(framed.frame_buffer());
                        framed.run_before_draw();
                        emit(framed, painter);
                        framed.run_after_draw();
                        painter.end_frame_buffer(framed.frame_buffer());
                    }
                    if let Some(composite) = framed.composite() {
                        painter.draw_frame_buffer(framed.frame_buffer(), &composite);
                    }
                }
            }
        }
    }
}

impl Default for DrawPoolManager {
    fn default() -> Self {
        Self::new(&DrawPoolConfig::default())
    }
}

fn emit<P: Painter + ?Sized>(pool: &DrawPool, painter: &mut P) {
    for object in pool.iter() {
        match object {
            DrawObject::Action(action) => action.run(),
            DrawObject::Geometry(obj) => {
                painter.set_state(&obj.state);
                if let Some(action) = &obj.state.action {
                    action.run();
                }
                painter.draw_coords(&obj.coords, obj.draw_mode);
            }
        }
    }
}
