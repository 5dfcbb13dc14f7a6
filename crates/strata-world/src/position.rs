use strata_engine::draw::MAX_Z;

/// Tile coordinate in the world. `z` 0 is the highest floor, [`MAX_Z`] the deepest.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub struct Position {
    pub x: u16,
    pub y: u16,
    pub z: u8,
}

impl Position {
    #[inline]
    pub const fn new(x: u16, y: u16, z: u8) -> Self {
        Self { x, y, z }
    }

    #[inline]
    pub fn is_valid(self) -> bool {
        self.z <= MAX_Z
    }
}
