//! Strata world crate.
//!
//! Tile-side collaborator of the draw pools: positions and things, tiles owning
//! per-tier geometry caches, highlight animation, and the floor walker that feeds
//! the map pool.

pub mod highlight;
pub mod map_view;
pub mod position;
pub mod thing;
pub mod tile;

pub use highlight::{HighlightAnimator, HighlightState};
pub use map_view::MapView;
pub use position::Position;
pub use thing::{Thing, ThingKind};
pub use tile::Tile;
