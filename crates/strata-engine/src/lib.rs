//! Strata engine crate.
//!
//! Batched 2D drawing for tile-based renderers: draw pools that record and merge
//! draw calls per floor and tier, caller-owned geometry caches, offscreen framed
//! pools, and a wgpu painter that submits the result.

pub mod coords;
pub mod device;
pub mod draw;
pub mod logging;
pub mod paint;
pub mod render;
pub mod time;
