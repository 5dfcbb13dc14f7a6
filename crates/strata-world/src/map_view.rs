use std::time::Instant;

use strata_engine::coords::{Point, Rect, Size};
use strata_engine::draw::{DrawPoolManager, DrawPoolType, MAX_Z};
use strata_engine::paint::Color;

use crate::highlight::HighlightAnimator;
use crate::tile::Tile;

/// Walks the visible floors into the map pool.
///
/// The map pool is framed: it is only re-recorded when a repaint was requested,
/// otherwise last frame's framebuffer is composited unchanged.
#[derive(Debug)]
pub struct MapView {
    tile_size: f32,
    rect: Rect,
    origin: Point,
    animator: HighlightAnimator,
}

impl MapView {
    pub fn new(tile_size: f32, rect: Rect) -> Self {
        Self {
            tile_size,
            rect,
            origin: Point::default(),
            animator: HighlightAnimator::new(),
        }
    }

    pub fn with_animator(mut self, animator: HighlightAnimator) -> Self {
        self.animator = animator;
        self
    }

    #[inline]
    pub fn tile_size(&self) -> f32 {
        self.tile_size
    }

    #[inline]
    pub fn rect(&self) -> Rect {
        self.rect
    }

    /// Moves the on-screen area and resizes the map framebuffer to match.
    pub fn resize(&mut self, manager: &mut DrawPoolManager, rect: Rect) {
        self.rect = rect;
        if let Some(framed) = manager.framed_mut(DrawPoolType::Map) {
            framed.resize(Size::new(rect.width().max(0.0) as u32, rect.height().max(0.0) as u32));
        }
        manager.repaint(DrawPoolType::Map);
    }

    /// Scrolls so that tile `(x, y)` sits at the top-left corner.
    pub fn set_origin(&mut self, manager: &mut DrawPoolManager, x: i32, y: i32) {
        let origin = Point::new(x, y);
        if origin != self.origin {
            self.origin = origin;
            manager.repaint(DrawPoolType::Map);
        }
    }

    pub fn request_repaint(&self, manager: &mut DrawPoolManager) {
        manager.repaint(DrawPoolType::Map);
    }

    /// Screen position of a tile. Deeper floors shift down-right by one tile each.
    pub fn tile_dest(&self, tile: &Tile, camera_floor: u8) -> Point {
        let pos = tile.position();
        let depth = pos.z as i32 - camera_floor as i32;
        let ts = self.tile_size as i32;
        Point::new(
            (pos.x as i32 - self.origin.x + depth) * ts,
            (pos.y as i32 - self.origin.y + depth) * ts,
        )
    }

    /// Steps tile highlights and requests a repaint if any of them changed.
    pub fn animate_at(&mut self, manager: &mut DrawPoolManager, tiles: &mut [Tile], now: Instant) -> bool {
        let changed = self
            .animator
            .tick_at(now, tiles.iter_mut().map(Tile::highlight_mut));
        if changed > 0 {
            manager.repaint(DrawPoolType::Map);
        }
        changed > 0
    }

    pub fn animate(&mut self, manager: &mut DrawPoolManager, tiles: &mut [Tile]) -> bool {
        self.animate_at(manager, tiles, Instant::now())
    }

    /// Records the map if a repaint is pending. Returns whether it recorded.
    ///
    /// Floors from the deepest down to `camera_floor` are drawn in that order, each
    /// followed by a `flush`, so every world floor lands on its own pool floor.
    pub fn draw(&mut self, manager: &mut DrawPoolManager, tiles: &mut [Tile], camera_floor: u8) -> bool {
        if !manager.can_repaint(DrawPoolType::Map, false) {
            return false;
        }

        let src = Rect::new(0.0, 0.0, self.rect.width(), self.rect.height());
        manager.use_framed(DrawPoolType::Map, self.rect, src, Color::white());

        let camera_floor = camera_floor.min(MAX_Z);
        let mut floors = 0;
        for z in (camera_floor..=MAX_Z).rev() {
            let mut drawn = false;
            for tile in tiles.iter_mut().filter(|t| t.position().z == z) {
                let dest = self.tile_dest(tile, camera_floor);
                tile.draw(manager, dest, self.tile_size);
                drawn = true;
            }
            if drawn {
                manager.flush();
                floors += 1;
            }
        }

        log::trace!("map recorded {} floors, {} tiles", floors, tiles.len());
        true
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use strata_engine::draw::{DrawOrder, TextureId};
    use strata_engine::render::FrameRecorder;

    use crate::position::Position;
    use crate::thing::{Thing, ThingKind};

    use super::*;

    fn ground(x: u16, y: u16, z: u8) -> Tile {
        let mut tile = Tile::new(Position::new(x, y, z));
        tile.add_thing(Thing::new(ThingKind::Ground, TextureId(1), Rect::new(0.0, 0.0, 32.0, 32.0)));
        tile
    }

    fn view() -> MapView {
        MapView::new(32.0, Rect::new(0.0, 0.0, 480.0, 352.0))
    }

    #[test]
    fn skips_recording_until_repaint_requested() {
        let mut mgr = DrawPoolManager::default();
        let mut tiles = vec![ground(1, 1, 7)];
        let mut view = view();

        assert!(!view.draw(&mut mgr, &mut tiles, 7));
        assert!(mgr.pool(DrawPoolType::Map).is_empty());

        view.request_repaint(&mut mgr);
        assert!(view.draw(&mut mgr, &mut tiles, 7));
        assert_eq!(mgr.pool(DrawPoolType::Map).object_count(), 1);

        mgr.draw(&mut FrameRecorder::new());
        assert!(!view.draw(&mut mgr, &mut tiles, 7));
    }

    #[test]
    fn deeper_floors_land_on_lower_pool_floors() {
        let mut mgr = DrawPoolManager::default();
        let mut tiles = vec![ground(1, 1, 7), ground(2, 2, 9), ground(3, 3, 3)];
        let mut view = view();

        view.request_repaint(&mut mgr);
        view.draw(&mut mgr, &mut tiles, 7);

        let pool = mgr.pool(DrawPoolType::Map);
        assert_eq!(pool.objects(0, DrawOrder::First).len(), 1);
        assert_eq!(pool.objects(1, DrawOrder::First).len(), 1);
        assert_eq!(pool.object_count(), 2);
        assert_eq!(pool.current_floor(), 2);
    }

    #[test]
    fn tile_dest_shifts_with_depth_and_origin() {
        let mut mgr = DrawPoolManager::default();
        let mut view = view();
        assert_eq!(view.tile_dest(&ground(2, 3, 8), 7), Point::new(96, 128));

        view.set_origin(&mut mgr, 1, 1);
        assert_eq!(view.tile_dest(&ground(2, 3, 7), 7), Point::new(32, 64));
        assert!(mgr.can_repaint(DrawPoolType::Map, false));
    }

    #[test]
    fn highlight_steps_request_repaint() {
        let t0 = Instant::now();
        let mut mgr = DrawPoolManager::default();
        let mut tiles = vec![ground(1, 1, 7)];
        tiles[0].select();
        let mut view = view().with_animator(HighlightAnimator::started_at(t0));

        assert!(!view.animate_at(&mut mgr, &mut tiles, t0 + Duration::from_millis(10)));
        assert!(!mgr.can_repaint(DrawPoolType::Map, false));

        assert!(view.animate_at(&mut mgr, &mut tiles, t0 + Duration::from_millis(40)));
        assert!(mgr.can_repaint(DrawPoolType::Map, false));
        assert_eq!(tiles[0].highlight().fade_level(), 50);
    }

    #[test]
    fn resize_updates_framebuffer() {
        let mut mgr = DrawPoolManager::default();
        let mut view = view();
        view.resize(&mut mgr, Rect::new(0.0, 0.0, 640.0, 480.0));
        let size = mgr.framed(DrawPoolType::Map).map(|f| f.size());
        assert_eq!(size, Some(Size::new(640, 480)));
        assert!(mgr.can_repaint(DrawPoolType::Map, false));
    }
}
