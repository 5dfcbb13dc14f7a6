/// Highest floor index a pool can hold. Floors are `0..=MAX_Z`.
pub const MAX_Z: u8 = 15;

/// Number of floor slots per pool.
pub(crate) const FLOOR_COUNT: usize = MAX_Z as usize + 1;

/// Stacking tier within a floor.
///
/// Tiers composite in ascending order. The legacy stacking rules map onto them as
/// ground < border < bottom/top < top-over-top < missiles/above-all.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DrawOrder {
    /// Ground.
    #[default]
    First,
    /// Ground borders.
    Second,
    /// Bottom and top items, creatures.
    Third,
    /// Top items drawn over other tops.
    Fourth,
    /// Above everything: missiles, overlays.
    Fifth,
}

impl DrawOrder {
    pub const COUNT: usize = 5;

    pub const ALL: [DrawOrder; Self::COUNT] = [
        DrawOrder::First,
        DrawOrder::Second,
        DrawOrder::Third,
        DrawOrder::Fourth,
        DrawOrder::Fifth,
    ];

    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }
}

/// Rendering concern a pool is dedicated to.
///
/// The manager creates one pool per type and draws them in `ALL` order.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum DrawPoolType {
    Map,
    CreatureInformation,
    Light,
    Text,
    Foreground,
}

impl DrawPoolType {
    pub const COUNT: usize = 5;

    pub const ALL: [DrawPoolType; Self::COUNT] = [
        DrawPoolType::Map,
        DrawPoolType::CreatureInformation,
        DrawPoolType::Light,
        DrawPoolType::Text,
        DrawPoolType::Foreground,
    ];

    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }
}
