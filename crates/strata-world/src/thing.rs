use strata_engine::coords::{Rect, Vec2};
use strata_engine::draw::{DrawBuffer, DrawOrder, DrawPoolManager, TextureId};
use strata_engine::paint::Color;

/// Stacking class of a thing on a tile.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ThingKind {
    Ground,
    GroundBorder,
    Bottom,
    Common,
    Top,
    Creature,
    Effect,
    Missile,
}

impl ThingKind {
    /// Tier a thing of this kind is drawn into.
    pub const fn draw_order(self) -> DrawOrder {
        match self {
            ThingKind::Ground => DrawOrder::First,
            ThingKind::GroundBorder => DrawOrder::Second,
            ThingKind::Bottom | ThingKind::Common | ThingKind::Top | ThingKind::Creature => {
                DrawOrder::Third
            }
            ThingKind::Effect => DrawOrder::Fourth,
            ThingKind::Missile => DrawOrder::Fifth,
        }
    }

    /// Items stack: their elevation lifts whatever is drawn after them.
    #[inline]
    pub const fn is_item(self) -> bool {
        !matches!(self, ThingKind::Creature | ThingKind::Effect | ThingKind::Missile)
    }
}

/// One sprite standing on a tile.
#[derive(Debug, Clone, PartialEq)]
pub struct Thing {
    kind: ThingKind,
    texture: TextureId,
    src: Rect,
    elevation: u8,
}

impl Thing {
    pub fn new(kind: ThingKind, texture: TextureId, src: Rect) -> Self {
        Self { kind, texture, src, elevation: 0 }
    }

    /// Pixels this thing lifts everything stacked above it.
    pub fn with_elevation(mut self, elevation: u8) -> Self {
        self.elevation = elevation;
        self
    }

    #[inline]
    pub fn kind(&self) -> ThingKind {
        self.kind
    }

    #[inline]
    pub fn texture(&self) -> TextureId {
        self.texture
    }

    #[inline]
    pub fn src(&self) -> Rect {
        self.src
    }

    #[inline]
    pub fn elevation(&self) -> u8 {
        self.elevation
    }

    /// Destination rect: sprites larger than a tile grow up and left from the
    /// tile's bottom-right corner.
    pub fn dest_rect(&self, origin: Vec2, tile_size: f32) -> Rect {
        let (w, h) = (self.src.width(), self.src.height());
        Rect::new(origin.x + tile_size - w, origin.y + tile_size - h, w, h)
    }

    pub fn draw(
        &self,
        manager: &mut DrawPoolManager,
        dest: Rect,
        buffer: Option<&mut DrawBuffer>,
    ) {
        manager.add_textured_rect(dest, self.texture, self.src, Color::white(), buffer);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stacking_table_maps_to_tiers() {
        assert_eq!(ThingKind::Ground.draw_order(), DrawOrder::First);
        assert_eq!(ThingKind::GroundBorder.draw_order(), DrawOrder::Second);
        for kind in [ThingKind::Bottom, ThingKind::Common, ThingKind::Top, ThingKind::Creature] {
            assert_eq!(kind.draw_order(), DrawOrder::Third);
        }
        assert_eq!(ThingKind::Effect.draw_order(), DrawOrder::Fourth);
        assert_eq!(ThingKind::Missile.draw_order(), DrawOrder::Fifth);
    }

    #[test]
    fn large_sprites_grow_up_and_left() {
        let t = Thing::new(ThingKind::Common, TextureId(1), Rect::new(0.0, 0.0, 64.0, 64.0));
        assert_eq!(t.dest_rect(Vec2::new(100.0, 100.0), 32.0), Rect::new(68.0, 68.0, 64.0, 64.0));
    }
}
