//! Coordinate and geometry types shared by the draw pools and the painter.
//!
//! Canonical CPU space:
//! - Logical pixels
//! - Origin top-left
//! - +X right, +Y down
//!
//! Float types hash by bit pattern so they can take part in pool state hashing.

mod mat3;
mod point;
mod rect;
mod size;
mod vec2;
mod viewport;

pub use mat3::Mat3;
pub use point::Point;
pub use rect::Rect;
pub use size::Size;
pub use vec2::Vec2;
pub use viewport::Viewport;
