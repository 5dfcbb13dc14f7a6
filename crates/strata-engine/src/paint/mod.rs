//! Paint model shared by pools and painters.
//!
//! Colors are linear premultiplied alpha; geometry types live in `coords`.

pub mod color;

pub use color::Color;
