use strata_engine::coords::{Point, Rect, Vec2};
use strata_engine::draw::{DrawBuffer, DrawOrder, DrawPoolManager};

use crate::highlight::HighlightState;
use crate::position::Position;
use crate::thing::{Thing, ThingKind};

/// Cap on the accumulated lift of stacked items, in pixels.
pub const MAX_ELEVATION: u8 = 24;

/// A world cell: its things plus one geometry cache per draw tier in use.
#[derive(Debug)]
pub struct Tile {
    position: Position,
    things: Vec<Thing>,
    buffers: [Option<DrawBuffer>; DrawOrder::COUNT],
    highlight: HighlightState,
}

impl Tile {
    pub fn new(position: Position) -> Self {
        Self {
            position,
            things: Vec::new(),
            buffers: Default::default(),
            highlight: HighlightState::default(),
        }
    }

    #[inline]
    pub fn position(&self) -> Position {
        self.position
    }

    #[inline]
    pub fn things(&self) -> &[Thing] {
        &self.things
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.things.is_empty()
    }

    pub fn add_thing(&mut self, thing: Thing) {
        self.things.push(thing);
        self.invalidate();
    }

    pub fn remove_thing(&mut self, index: usize) -> Option<Thing> {
        if index >= self.things.len() {
            return None;
        }
        let thing = self.things.remove(index);
        self.invalidate();
        Some(thing)
    }

    pub fn clear(&mut self) {
        self.things.clear();
        self.buffers = Default::default();
        self.highlight.stop();
    }

    /// Forces every tier to rebuild on the next draw.
    pub fn invalidate(&mut self) {
        for buffer in self.buffers.iter_mut().flatten() {
            buffer.invalidate();
        }
    }

    #[inline]
    pub fn highlight(&self) -> &HighlightState {
        &self.highlight
    }

    #[inline]
    pub fn highlight_mut(&mut self) -> &mut HighlightState {
        &mut self.highlight
    }

    /// Starts the highlight pulse. Empty tiles have nothing to highlight.
    ///
    /// The overlay covers the whole tile cell rather than only the top thing's sprite.
    pub fn select(&mut self) {
        if !self.things.is_empty() {
            self.highlight.start();
        }
    }

    pub fn unselect(&mut self) {
        self.highlight.stop();
    }

    /// Draw sequence as `(thing index, elevation offset)`.
    ///
    /// Ground and borders, bottom items, common items newest first, creatures, top
    /// items, effects, missiles. Each item lifts everything after it by its elevation.
    fn stacking(&self) -> Vec<(usize, u8)> {
        const SEQUENCE: [(ThingKind, bool); 8] = [
            (ThingKind::Ground, false),
            (ThingKind::GroundBorder, false),
            (ThingKind::Bottom, false),
            (ThingKind::Common, true),
            (ThingKind::Creature, false),
            (ThingKind::Top, false),
            (ThingKind::Effect, false),
            (ThingKind::Missile, false),
        ];

        let mut out = Vec::with_capacity(self.things.len());
        let mut elevation = 0u8;
        for (kind, reversed) in SEQUENCE {
            let matching = self.things.iter().enumerate().filter(|(_, t)| t.kind() == kind);
            let indices: Vec<usize> = if reversed {
                matching.map(|(i, _)| i).rev().collect()
            } else {
                matching.map(|(i, _)| i).collect()
            };

            for i in indices {
                out.push((i, elevation));
                let thing = &self.things[i];
                if thing.kind().is_item() {
                    elevation = elevation.saturating_add(thing.elevation()).min(MAX_ELEVATION);
                }
            }
        }
        out
    }

    /// Draws the tile at `dest` (top-left, logical px) into the selected pool.
    ///
    /// Each tier's buffer is validated against `dest`: a still-valid buffer is
    /// replayed as is, otherwise its things are re-added through it. A highlighted
    /// tile gets a tile-sized overlay in the effect tier.
    pub fn draw(&mut self, manager: &mut DrawPoolManager, dest: Point, tile_size: f32) {
        let stacking = self.stacking();
        let Self { things, buffers, highlight, .. } = self;

        for order in DrawOrder::ALL {
            let mut tier = stacking
                .iter()
                .filter(|(i, _)| things[*i].kind().draw_order() == order)
                .peekable();
            if tier.peek().is_none() {
                buffers[order.index()] = None;
                continue;
            }

            let buffer = buffers[order.index()].get_or_insert_with(|| DrawBuffer::new(order));
            if buffer.validate(dest) {
                manager.replay_buffer(buffer);
                continue;
            }

            for &(i, elevation) in tier {
                let lift = -(elevation as f32);
                let thing = &things[i];
                let rect = thing
                    .dest_rect(dest.to_vec2(), tile_size)
                    .translated(Vec2::new(lift, lift));
                thing.draw(manager, rect, Some(&mut *buffer));
            }
        }

        if highlight.is_enabled() {
            let mut overlay = DrawBuffer::temporary(DrawOrder::Fourth);
            let rect = Rect::new(dest.x as f32, dest.y as f32, tile_size, tile_size);
            manager.add_filled_rect(rect, highlight.color(), Some(&mut overlay));
        }
    }
}
