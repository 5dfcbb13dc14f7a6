use std::collections::HashMap;
use std::hash::{DefaultHasher, Hash, Hasher};
use std::time::{Duration, Instant};

use crate::coords::{Mat3, Rect, Vec2};
use crate::paint::Color;
use crate::time::Timer;

use super::buffer::DrawBuffer;
use super::config::PoolConfig;
use super::coords::CoordsBuffer;
use super::method::DrawMethod;
use super::object::DrawObject;
use super::order::{DrawOrder, DrawPoolType, FLOOR_COUNT, MAX_Z};
use super::state::{
    Action, BlendEquation, CompositionMode, DrawMode, PoolState, ShaderId, TextureId,
};

/// Counters for one usage cycle (reset by [`DrawPool::clear`]).
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Objects appended to buckets.
    pub objects_created: usize,
    /// Methods merged into an existing object instead of creating one.
    pub methods_batched: usize,
    /// Methods triangulated from scratch.
    pub geometry_built: usize,
    /// Methods whose vertices were copied from a cache.
    pub geometry_reused: usize,
    /// Caller buffers replayed wholesale.
    pub buffers_replayed: usize,
}

type Bucket = Vec<DrawObject>;

/// Retained-mode command buffer for one rendering concern.
///
/// Objects are stored per floor (`0..=MAX_Z`) and per [`DrawOrder`] tier. Within a
/// bucket they keep insertion order. The arena is cleared wholesale at the start of
/// every usage cycle; a hash index maps `(tier, state hash)` to arena positions on
/// the current floor so equal-state draws extend one batch.
#[derive(Debug)]
pub struct DrawPool {
    pool_type: DrawPoolType,
    enabled: bool,
    always_group: bool,

    current_order: DrawOrder,
    current_floor: u8,

    state: PoolState,
    transform_stack: Vec<Mat3>,

    objects: Vec<[Bucket; DrawOrder::COUNT]>,
    group_index: HashMap<(DrawOrder, u64), usize>,
    geometry_cache: HashMap<u64, CoordsBuffer>,
    /// Last geometry object appended or extended: (floor, tier, index).
    last_object: Option<(usize, DrawOrder, usize)>,

    /// (generation, last accepted generation).
    status: (u64, u64),
    refresh_interval: Option<Duration>,
    refresh_timer: Timer,

    stats: PoolStats,
}

impl DrawPool {
    pub fn new(pool_type: DrawPoolType) -> Self {
        Self::with_config(pool_type, &PoolConfig::default())
    }

    pub fn with_config(pool_type: DrawPoolType, config: &PoolConfig) -> Self {
        Self {
            pool_type,
            enabled: config.enabled,
            always_group: config.always_group,
            current_order: DrawOrder::First,
            current_floor: 0,
            state: PoolState::default(),
            transform_stack: Vec::new(),
            objects: (0..FLOOR_COUNT).map(|_| Default::default()).collect(),
            group_index: HashMap::new(),
            geometry_cache: HashMap::new(),
            last_object: None,
            status: (0, 0),
            refresh_interval: config.refresh_interval,
            refresh_timer: Timer::new(),
            stats: PoolStats::default(),
        }
    }

    #[inline]
    pub fn pool_type(&self) -> DrawPoolType {
        self.pool_type
    }

    #[inline]
    pub fn set_enable(&mut self, v: bool) {
        self.enabled = v;
    }

    #[inline]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    #[inline]
    pub fn set_always_group(&mut self, v: bool) {
        self.always_group = v;
    }

    #[inline]
    pub fn is_always_grouping(&self) -> bool {
        self.always_group
    }

    #[inline]
    pub fn stats(&self) -> PoolStats {
        self.stats
    }

    // ── recording ─────────────────────────────────────────────────────────

    /// Records one primitive with the current state tinted by `color` and bound to
    /// `texture`.
    ///
    /// With a caller buffer the draw goes into the buffer's tier and the buffer's
    /// `agroup` flag decides grouping; otherwise the current tier and the pool's
    /// `always_group` flag apply. Vertices are copied from the caller buffer or the
    /// cycle cache when the same state+method was built before, and only
    /// triangulated on a miss.
    pub fn add(
        &mut self,
        color: Color,
        texture: Option<TextureId>,
        method: DrawMethod,
        draw_mode: DrawMode,
        mut buffer: Option<&mut DrawBuffer>,
    ) {
        let state = PoolState { color, texture, ..self.state.clone() };
        let state_hash = hash_of(&state);
        let key = combine(state_hash, hash_of(&(method, draw_mode)));

        let order = buffer.as_deref().map_or(self.current_order, DrawBuffer::order);
        let group = self.always_group || buffer.as_deref().is_some_and(DrawBuffer::is_grouped);

        let coords = match buffer.as_deref_mut() {
            Some(buf) if !buf.is_temporary() => {
                if let Some(cached) = buf.cached(key) {
                    self.stats.geometry_reused += 1;
                    CoordsBuffer::from(cached)
                } else {
                    let coords = self.build_geometry(key, &method, draw_mode);
                    buf.record(key, state_hash, &state, method, draw_mode, coords.vertices());
                    coords
                }
            }
            _ => self.build_geometry(key, &method, draw_mode),
        };

        self.push_geometry(order, state_hash, state, method, draw_mode, coords, group);
    }

    /// Re-emits everything a valid caller buffer recorded, skipping hashing and
    /// triangulation. Invalid and temporary buffers replay nothing.
    ///
    /// Recorded states are used as-is: state changes made since recording do not
    /// apply to replayed geometry.
    pub fn replay(&mut self, buffer: &DrawBuffer) {
        if !buffer.is_valid() {
            return;
        }

        let group = self.always_group || buffer.is_grouped();
        for entry in buffer.entries() {
            let coords = CoordsBuffer::from(buffer.vertices(entry.range.clone()));
            self.push_geometry(
                buffer.order(),
                entry.state_hash,
                entry.state.clone(),
                entry.method,
                entry.draw_mode,
                coords,
                group,
            );
        }

        self.stats.geometry_reused += buffer.entry_count();
        self.stats.buffers_replayed += 1;
        log::trace!(
            "{:?}: replayed {} cached draws into {:?}",
            self.pool_type,
            buffer.entry_count(),
            buffer.order()
        );
    }

    /// Appends a side-effect-only object to the current bucket.
    pub fn add_action(&mut self, action: Action) {
        let floor = self.current_floor as usize;
        self.objects[floor][self.current_order.index()].push(DrawObject::Action(action));
    }

    fn build_geometry(&mut self, key: u64, method: &DrawMethod, draw_mode: DrawMode) -> CoordsBuffer {
        if let Some(cached) = self.geometry_cache.get(&key) {
            self.stats.geometry_reused += 1;
            return cached.clone();
        }

        let mut coords = CoordsBuffer::new();
        coords.add_method(method, draw_mode);
        self.geometry_cache.insert(key, coords.clone());
        self.stats.geometry_built += 1;
        coords
    }

    #[allow(clippy::too_many_arguments)]
    fn push_geometry(
        &mut self,
        order: DrawOrder,
        state_hash: u64,
        state: PoolState,
        method: DrawMethod,
        draw_mode: DrawMode,
        coords: CoordsBuffer,
        group: bool,
    ) {
        let floor = self.current_floor as usize;
        let bucket = &mut self.objects[floor][order.index()];

        if group {
            if let Some(&idx) = self.group_index.get(&(order, state_hash)) {
                // Hash hit with a different state is a collision; fall through.
                if bucket[idx].state() == Some(&state) {
                    bucket[idx].add_method(method, coords.vertices(), draw_mode);
                    self.last_object = Some((floor, order, idx));
                    self.stats.methods_batched += 1;
                    return;
                }
            }
        }

        let idx = bucket.len();
        bucket.push(DrawObject::geometry(state, method, draw_mode, coords));
        if group {
            self.group_index.insert((order, state_hash), idx);
        }
        self.last_object = Some((floor, order, idx));
        self.stats.objects_created += 1;
    }

    // ── state ─────────────────────────────────────────────────────────────

    /// State applied to subsequent `add` calls.
    #[inline]
    pub fn state(&self) -> &PoolState {
        &self.state
    }

    pub fn set_composition_mode(&mut self, mode: CompositionMode, on_last_drawing: bool) {
        self.update_state(on_last_drawing, |s| s.composition_mode = mode);
    }

    pub fn set_blend_equation(&mut self, equation: BlendEquation, on_last_drawing: bool) {
        self.update_state(on_last_drawing, |s| s.blend_equation = equation);
    }

    pub fn set_clip_rect(&mut self, clip_rect: Option<Rect>, on_last_drawing: bool) {
        self.update_state(on_last_drawing, |s| s.clip_rect = clip_rect);
    }

    pub fn set_opacity(&mut self, opacity: f32, on_last_drawing: bool) {
        self.update_state(on_last_drawing, |s| s.opacity = opacity);
    }

    /// Binds `shader` (or the default shader for `None`).
    ///
    /// `action` runs right before each batch drawn with this state is submitted; it
    /// does not affect batching identity.
    pub fn set_shader_program(
        &mut self,
        shader: Option<ShaderId>,
        on_last_drawing: bool,
        action: Option<Action>,
    ) {
        self.update_state(on_last_drawing, |s| {
            s.shader = shader;
            s.action = action;
        });
    }

    pub fn opacity(&self, last_drawing: bool) -> f32 {
        self.read_state(last_drawing).opacity
    }

    pub fn clip_rect(&self, last_drawing: bool) -> Option<Rect> {
        self.read_state(last_drawing).clip_rect
    }

    pub fn reset_state(&mut self) {
        self.state = PoolState::default();
        self.transform_stack.clear();
    }

    pub fn reset_opacity(&mut self) {
        self.state.opacity = 1.0;
    }

    pub fn reset_clip_rect(&mut self) {
        self.state.clip_rect = None;
    }

    pub fn reset_shader_program(&mut self) {
        self.state.shader = None;
        self.state.action = None;
    }

    pub fn reset_composition_mode(&mut self) {
        self.state.composition_mode = CompositionMode::Normal;
    }

    pub fn reset_blend_equation(&mut self) {
        self.state.blend_equation = BlendEquation::Add;
    }

    /// Either mutates the current state, or retroactively the last recorded object.
    ///
    /// A retroactively changed object no longer matches its index entry and is
    /// detached, so later equal-state draws start a new batch after it.
    fn update_state(&mut self, on_last_drawing: bool, f: impl FnOnce(&mut PoolState)) {
        if !on_last_drawing {
            f(&mut self.state);
            return;
        }

        let Some((floor, order, idx)) = self.last_object else { return };
        let Some(state) = self.objects[floor][order.index()][idx].state_mut() else { return };
        f(state);

        if floor == self.current_floor as usize {
            self.group_index.retain(|&(o, _), &mut i| !(o == order && i == idx));
        }
    }

    fn read_state(&self, last_drawing: bool) -> &PoolState {
        if last_drawing {
            if let Some((floor, order, idx)) = self.last_object {
                if let Some(state) = self.objects[floor][order.index()][idx].state() {
                    return state;
                }
            }
        }
        &self.state
    }

    // ── transform ─────────────────────────────────────────────────────────

    pub fn set_transform(&mut self, transform: Mat3) {
        self.state.transform = transform;
    }

    pub fn reset_transform(&mut self) {
        self.state.transform = Mat3::IDENTITY;
    }

    /// Saves the current transform; restore it with [`pop_transform`](Self::pop_transform).
    pub fn push_transform(&mut self) {
        self.transform_stack.push(self.state.transform);
    }

    pub fn pop_transform(&mut self) {
        debug_assert!(!self.transform_stack.is_empty(), "pop_transform without push_transform");
        if let Some(t) = self.transform_stack.pop() {
            self.state.transform = t;
        }
    }

    pub fn translate(&mut self, offset: Vec2) {
        self.state.transform = self.state.transform * Mat3::translation(offset);
    }

    pub fn scale(&mut self, sx: f32, sy: f32) {
        self.state.transform = self.state.transform * Mat3::scaling(sx, sy);
    }

    // ── cursors ───────────────────────────────────────────────────────────

    #[inline]
    pub fn set_draw_order(&mut self, order: DrawOrder) {
        self.current_order = order;
    }

    #[inline]
    pub fn reset_draw_order(&mut self) {
        self.current_order = DrawOrder::First;
    }

    #[inline]
    pub fn current_order(&self) -> DrawOrder {
        self.current_order
    }

    #[inline]
    pub fn current_floor(&self) -> u8 {
        self.current_floor
    }

    /// Finishes the current floor: batching restarts fresh and the floor cursor
    /// moves up one, saturating at `MAX_Z`.
    pub fn flush(&mut self) {
        self.group_index.clear();
        self.geometry_cache.clear();
        if self.current_floor < MAX_Z {
            self.current_floor += 1;
        }
    }

    /// Starts a new usage cycle: drops every object and index, resets the cursors.
    pub fn clear(&mut self) {
        for floor in &mut self.objects {
            for bucket in floor.iter_mut() {
                bucket.clear();
            }
        }
        self.group_index.clear();
        self.geometry_cache.clear();
        self.last_object = None;
        self.current_floor = 0;
        self.current_order = DrawOrder::First;
        self.stats = PoolStats::default();
    }

    // ── repaint ───────────────────────────────────────────────────────────

    /// Marks the content stale.
    #[inline]
    pub fn repaint(&mut self) {
        self.status.0 = self.status.0.wrapping_add(1);
    }

    /// Sets the forced repaint period and restarts its timer.
    pub fn set_refresh_interval(&mut self, interval: Option<Duration>) {
        self.refresh_interval = interval;
        self.refresh_timer.restart();
    }

    #[inline]
    pub fn refresh_interval(&self) -> Option<Duration> {
        self.refresh_interval
    }

    /// Start of the current refresh period.
    #[inline]
    pub fn refresh_started(&self) -> Instant {
        self.refresh_timer.start()
    }

    /// Whether the content must be resubmitted this frame.
    ///
    /// With `auto_update` a `true` answer is consumed: the dirty generation is
    /// acknowledged and the refresh timer restarts. Without it this only peeks.
    pub fn can_repaint(&mut self, auto_update: bool) -> bool {
        self.can_repaint_at(auto_update, Instant::now())
    }

    pub fn can_repaint_at(&mut self, auto_update: bool, now: Instant) -> bool {
        if !self.enabled {
            return false;
        }

        let dirty = self.status.0 != self.status.1;
        let refresh_due = self
            .refresh_interval
            .is_some_and(|interval| self.refresh_timer.elapsed_at(now) >= interval);

        let repaint = dirty || refresh_due;
        if repaint && auto_update {
            self.status.1 = self.status.0;
            if self.refresh_interval.is_some() {
                self.refresh_timer.restart_at(now);
            }
        }
        repaint
    }

    // ── inspection ────────────────────────────────────────────────────────

    /// Objects of one bucket in submission order. Floors above `MAX_Z` are empty.
    pub fn objects(&self, floor: u8, order: DrawOrder) -> &[DrawObject] {
        match self.objects.get(floor as usize) {
            Some(f) => &f[order.index()],
            None => &[],
        }
    }

    /// Every object in composite order: floors ascending, tiers ascending, FIFO.
    pub fn iter(&self) -> impl Iterator<Item = &DrawObject> {
        self.objects.iter().flat_map(|floor| floor.iter().flatten())
    }

    pub fn object_count(&self) -> usize {
        self.iter().count()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }
}

fn hash_of<T: Hash>(value: &T) -> u64 {
    let mut h = DefaultHasher::new();
    value.hash(&mut h);
    h.finish()
}

/// boost-style `hash_combine`.
#[inline]
fn combine(seed: u64, value: u64) -> u64 {
    seed ^ value
        .wrapping_add(0x9e37_79b9_7f4a_7c15)
        .wrapping_add(seed << 6)
        .wrapping_add(seed >> 2)
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use crate::coords::Point;

    use super::*;

    fn rect_at(x: f32) -> DrawMethod {
        DrawMethod::rect(Rect::new(x, 0.0, 32.0, 32.0))
    }

    fn grouped_pool() -> DrawPool {
        let mut pool = DrawPool::new(DrawPoolType::Map);
        pool.set_always_group(true);
        pool
    }

    fn add_rect(pool: &mut DrawPool, x: f32) {
        pool.add(Color::white(), None, rect_at(x), DrawMode::Triangles, None);
    }

    // ── batching ──────────────────────────────────────────────────────────

    #[test]
    fn identical_state_batches_into_one_object() {
        let mut pool = grouped_pool();
        for _ in 0..5 {
            add_rect(&mut pool, 0.0);
        }
        let objs = pool.objects(0, DrawOrder::First);
        assert_eq!(objs.len(), 1);
        assert_eq!(objs[0].method_count(), 5);
        assert!(objs[0].is_batched());
    }

    #[test]
    fn interleaved_states_get_one_object_each() {
        let mut pool = grouped_pool();
        let tex = Some(TextureId(1));
        pool.add(Color::white(), None, rect_at(0.0), DrawMode::Triangles, None);
        pool.add(Color::white(), tex, rect_at(0.0), DrawMode::Triangles, None);
        pool.add(Color::white(), None, rect_at(0.0), DrawMode::Triangles, None);
        pool.add(Color::white(), tex, rect_at(0.0), DrawMode::Triangles, None);

        let objs = pool.objects(0, DrawOrder::First);
        assert_eq!(objs.len(), 2);
        assert_eq!(objs[0].state().and_then(|s| s.texture), None);
        assert_eq!(objs[1].state().and_then(|s| s.texture), tex);
        assert_eq!(objs[0].method_count(), 2);
        assert_eq!(objs[1].method_count(), 2);
    }

    #[test]
    fn opacity_change_splits_batches() {
        let mut pool = grouped_pool();
        add_rect(&mut pool, 0.0);
        pool.set_opacity(0.5, false);
        add_rect(&mut pool, 0.0);
        assert_eq!(pool.objects(0, DrawOrder::First).len(), 2);
    }

    #[test]
    fn without_grouping_every_add_is_discrete() {
        let mut pool = DrawPool::new(DrawPoolType::Map);
        for x in [0.0, 32.0, 64.0] {
            add_rect(&mut pool, x);
        }
        assert_eq!(pool.objects(0, DrawOrder::First).len(), 3);
        assert_eq!(pool.stats().methods_batched, 0);
    }

    #[test]
    fn grouping_buffer_enables_batching_on_plain_pool() {
        let mut pool = DrawPool::new(DrawPoolType::Map);
        let mut buf = DrawBuffer::temporary(DrawOrder::Third);
        for x in [0.0, 32.0] {
            pool.add(Color::white(), None, rect_at(x), DrawMode::Triangles, Some(&mut buf));
        }
        assert!(pool.objects(0, DrawOrder::First).is_empty());
        assert_eq!(pool.objects(0, DrawOrder::Third).len(), 1);
        assert_eq!(pool.objects(0, DrawOrder::Third)[0].method_count(), 2);
    }

    #[test]
    fn scenario_tiers_and_flush() {
        let mut pool = grouped_pool();
        for x in [0.0, 32.0, 64.0] {
            add_rect(&mut pool, x);
        }
        pool.set_draw_order(DrawOrder::Second);
        add_rect(&mut pool, 0.0);

        assert_eq!(pool.objects(0, DrawOrder::First).len(), 1);
        assert_eq!(pool.objects(0, DrawOrder::First)[0].method_count(), 3);
        assert_eq!(pool.objects(0, DrawOrder::Second).len(), 1);

        pool.flush();
        assert_eq!(pool.current_floor(), 1);

        pool.set_draw_order(DrawOrder::First);
        add_rect(&mut pool, 0.0);
        assert_eq!(pool.objects(1, DrawOrder::First).len(), 1);
        // Floor 0 stays intact for replay, and the new floor did not extend it.
        assert_eq!(pool.objects(0, DrawOrder::First)[0].method_count(), 3);
        assert_eq!(pool.object_count(), 3);
    }

    // ── geometry reuse ────────────────────────────────────────────────────

    #[test]
    fn identical_state_and_method_reuse_geometry_within_a_cycle() {
        let mut pool = grouped_pool();
        for _ in 0..3 {
            add_rect(&mut pool, 0.0);
        }
        add_rect(&mut pool, 32.0);
        let stats = pool.stats();
        assert_eq!(stats.geometry_built, 2);
        assert_eq!(stats.geometry_reused, 2);

        pool.flush();
        add_rect(&mut pool, 0.0);
        assert_eq!(pool.stats().geometry_built, 3);
    }

    #[test]
    fn caller_buffer_skips_rebuild_across_cycles() {
        let mut pool = DrawPool::new(DrawPoolType::Map);
        let mut buf = DrawBuffer::new(DrawOrder::First);
        let anchor = Point::new(64, 64);

        assert!(!buf.validate(anchor));
        pool.add(Color::white(), None, rect_at(0.0), DrawMode::Triangles, Some(&mut buf));
        assert_eq!(pool.stats().geometry_built, 1);
        assert_eq!(buf.entry_count(), 1);

        pool.clear();
        assert!(buf.validate(anchor));
        pool.add(Color::white(), None, rect_at(0.0), DrawMode::Triangles, Some(&mut buf));
        assert_eq!(pool.stats().geometry_built, 0);
        assert_eq!(pool.stats().geometry_reused, 1);
        assert_eq!(buf.entry_count(), 1);
    }

    #[test]
    fn replay_reemits_recorded_geometry() {
        let mut pool = DrawPool::new(DrawPoolType::Map);
        let mut buf = DrawBuffer::new(DrawOrder::Second);
        buf.validate(Point::new(0, 0));
        pool.add(Color::white(), None, rect_at(0.0), DrawMode::Triangles, Some(&mut buf));
        pool.add(Color::white(), None, rect_at(32.0), DrawMode::Triangles, Some(&mut buf));
        let first_cycle: Vec<_> = pool.objects(0, DrawOrder::Second)[0]
            .coords()
            .map(|c| c.vertices().to_vec())
            .unwrap_or_default();

        pool.clear();
        assert!(buf.validate(Point::new(0, 0)));
        pool.replay(&buf);

        let objs = pool.objects(0, DrawOrder::Second);
        assert_eq!(objs.len(), 1);
        assert_eq!(objs[0].method_count(), 2);
        assert_eq!(objs[0].coords().map(|c| c.vertices().to_vec()), Some(first_cycle));
        assert_eq!(pool.stats().geometry_built, 0);
        assert_eq!(pool.stats().buffers_replayed, 1);
    }

    #[test]
    fn replayed_strip_batch_matches_first_cycle() {
        let mut pool = DrawPool::new(DrawPoolType::Map);
        let mut buf = DrawBuffer::new(DrawOrder::First);
        let tex = Some(TextureId(1));
        buf.validate(Point::new(0, 0));
        for x in [0.0, 32.0, 64.0] {
            pool.add(Color::white(), tex, rect_at(x), DrawMode::TriangleStrip, Some(&mut buf));
        }
        let first_cycle: Vec<_> = pool.objects(0, DrawOrder::First)[0]
            .coords()
            .map(|c| c.vertices().to_vec())
            .unwrap_or_default();
        assert_eq!(first_cycle.len(), 18);

        pool.clear();
        assert!(buf.validate(Point::new(0, 0)));
        pool.replay(&buf);

        let objs = pool.objects(0, DrawOrder::First);
        assert_eq!(objs.len(), 1);
        assert_eq!(objs[0].draw_mode(), Some(DrawMode::Triangles));
        let replayed = objs[0].coords().map(|c| c.vertices().to_vec()).unwrap_or_default();
        assert_eq!(replayed.len() % 3, 0);
        assert_eq!(replayed, first_cycle);
    }

    #[test]
    fn replay_of_invalid_buffer_is_empty() {
        let mut pool = DrawPool::new(DrawPoolType::Map);
        let mut buf = DrawBuffer::new(DrawOrder::First);
        pool.add(Color::white(), None, rect_at(0.0), DrawMode::Triangles, Some(&mut buf));
        pool.clear();
        assert!(!buf.validate(Point::new(9, 9)));
        pool.replay(&buf);
        assert!(pool.is_empty());
    }

    // ── state on last drawing ─────────────────────────────────────────────

    #[test]
    fn on_last_drawing_mutates_the_emitted_object_only() {
        let mut pool = grouped_pool();
        add_rect(&mut pool, 0.0);
        pool.set_opacity(0.25, true);

        assert_eq!(pool.opacity(true), 0.25);
        assert_eq!(pool.opacity(false), 1.0);

        // Detached from the index: the next equal-state draw starts a new batch.
        add_rect(&mut pool, 32.0);
        let objs = pool.objects(0, DrawOrder::First);
        assert_eq!(objs.len(), 2);
        assert_eq!(objs[1].state().map(|s| s.opacity), Some(1.0));
    }

    #[test]
    fn on_last_drawing_without_objects_is_a_no_op() {
        let mut pool = grouped_pool();
        pool.set_clip_rect(Some(Rect::new(0.0, 0.0, 8.0, 8.0)), true);
        assert_eq!(pool.clip_rect(false), None);
        assert_eq!(pool.clip_rect(true), None);
    }

    #[test]
    fn shader_action_does_not_split_batches() {
        let mut pool = grouped_pool();
        let hits = Rc::new(Cell::new(0));
        let h = hits.clone();
        pool.set_shader_program(Some(ShaderId(2)), false, Some(Action::new(move || h.set(h.get() + 1))));
        add_rect(&mut pool, 0.0);
        pool.set_shader_program(Some(ShaderId(2)), false, None);
        add_rect(&mut pool, 32.0);

        let objs = pool.objects(0, DrawOrder::First);
        assert_eq!(objs.len(), 1);
        if let Some(action) = objs[0].state().and_then(|s| s.action.as_ref()) {
            action.run();
        }
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn reset_state_restores_defaults_for_future_adds() {
        let mut pool = grouped_pool();
        pool.set_opacity(0.5, false);
        pool.set_composition_mode(CompositionMode::Light, false);
        pool.set_blend_equation(BlendEquation::Max, false);
        pool.set_clip_rect(Some(Rect::new(0.0, 0.0, 4.0, 4.0)), false);
        add_rect(&mut pool, 0.0);

        pool.reset_state();
        assert_eq!(pool.state(), &PoolState::default());
        assert_eq!(pool.objects(0, DrawOrder::First)[0].state().map(|s| s.opacity), Some(0.5));
    }

    #[test]
    fn push_pop_transform_restores() {
        let mut pool = grouped_pool();
        pool.push_transform();
        pool.translate(Vec2::new(5.0, 5.0));
        pool.scale(2.0, 2.0);
        assert!(!pool.state().transform.is_identity());
        pool.pop_transform();
        assert!(pool.state().transform.is_identity());
    }

    // ── cursors ───────────────────────────────────────────────────────────

    #[test]
    fn flush_saturates_at_max_z() {
        let mut pool = grouped_pool();
        for n in 1..=40u8 {
            pool.flush();
            assert_eq!(pool.current_floor(), n.min(MAX_Z));
        }
    }

    #[test]
    fn clear_resets_cursors_and_content() {
        let mut pool = grouped_pool();
        pool.set_draw_order(DrawOrder::Fourth);
        add_rect(&mut pool, 0.0);
        pool.flush();
        pool.add_action(Action::new(|| {}));
        pool.clear();

        assert!(pool.is_empty());
        assert_eq!(pool.current_floor(), 0);
        assert_eq!(pool.current_order(), DrawOrder::First);
        assert_eq!(pool.stats(), PoolStats::default());
    }

    #[test]
    fn iteration_follows_floor_then_tier_then_insertion() {
        let mut pool = DrawPool::new(DrawPoolType::Map);
        pool.set_draw_order(DrawOrder::Fifth);
        add_rect(&mut pool, 5.0);
        pool.set_draw_order(DrawOrder::First);
        add_rect(&mut pool, 1.0);
        add_rect(&mut pool, 2.0);
        pool.flush();
        add_rect(&mut pool, 10.0);

        let xs: Vec<f32> = pool
            .iter()
            .filter_map(|o| o.methods().first().and_then(DrawMethod::dest))
            .map(|r| r.origin.x)
            .collect();
        assert_eq!(xs, vec![1.0, 2.0, 5.0, 10.0]);
    }

    // ── repaint ───────────────────────────────────────────────────────────

    #[test]
    fn new_pool_is_clean() {
        let mut pool = DrawPool::new(DrawPoolType::Text);
        assert!(!pool.can_repaint(true));
    }

    #[test]
    fn repaint_is_consumed_once() {
        let mut pool = DrawPool::new(DrawPoolType::Text);
        pool.repaint();
        pool.repaint();
        assert!(pool.can_repaint(false));
        assert!(pool.can_repaint(false));
        assert!(pool.can_repaint(true));
        assert!(!pool.can_repaint(true));
        assert!(!pool.can_repaint(false));
    }

    #[test]
    fn disabled_pool_never_repaints() {
        let mut pool = DrawPool::new(DrawPoolType::Text);
        pool.repaint();
        pool.set_enable(false);
        assert!(!pool.can_repaint(true));
        pool.set_enable(true);
        assert!(pool.can_repaint(true));
    }

    #[test]
    fn refresh_interval_forces_periodic_repaint() {
        let config = PoolConfig {
            refresh_interval: Some(Duration::from_millis(100)),
            ..PoolConfig::default()
        };
        let mut pool = DrawPool::with_config(DrawPoolType::Light, &config);
        let t0 = pool.refresh_started();

        assert!(!pool.can_repaint_at(true, t0 + Duration::from_millis(99)));
        // Peeking does not restart the timer.
        assert!(pool.can_repaint_at(false, t0 + Duration::from_millis(100)));
        assert!(pool.can_repaint_at(true, t0 + Duration::from_millis(100)));

        assert!(!pool.can_repaint_at(true, t0 + Duration::from_millis(150)));
        assert!(pool.can_repaint_at(true, t0 + Duration::from_millis(200)));
    }

    #[test]
    fn accepted_repaint_restarts_refresh_timer() {
        let config = PoolConfig {
            refresh_interval: Some(Duration::from_millis(50)),
            ..PoolConfig::default()
        };
        let mut pool = DrawPool::with_config(DrawPoolType::Light, &config);
        let t0 = pool.refresh_started();

        pool.repaint();
        assert!(pool.can_repaint_at(true, t0 + Duration::from_millis(30)));
        assert!(!pool.can_repaint_at(true, t0 + Duration::from_millis(60)));
        assert!(pool.can_repaint_at(true, t0 + Duration::from_millis(80)));
    }
}
