//! Draw pools: per-frame recording, batching and replay of 2D draw calls.
//!
//! Callers select a pool through [`DrawPoolManager`], issue primitives and state
//! changes, and the manager replays every pool into a [`Painter`](crate::render::Painter).
//! Consecutive draws sharing a state are merged into one object; caller-owned
//! [`DrawBuffer`]s cache triangulated geometry across frames.

mod buffer;
mod config;
mod coords;
mod framed;
mod manager;
mod method;
mod object;
mod order;
mod pool;
mod state;

pub use buffer::DrawBuffer;
pub use config::{DrawPoolConfig, PoolConfig};
pub use coords::{CoordsBuffer, Vertex};
pub use framed::{Composite, DrawPoolFramed, FrameBuffer, FrameBufferId};
pub use manager::{DrawPoolManager, PoolSlot};
pub use method::{DrawMethod, DrawMethodType};
pub use object::{DrawObject, GeometryObject, Methods};
pub use order::{DrawOrder, DrawPoolType, MAX_Z};
pub use pool::{DrawPool, PoolStats};
pub use state::{
    Action, BlendEquation, CompositionMode, DrawMode, PoolState, ShaderId, TextureId,
};
