//! GPU rendering subsystem.
//!
//! The draw pools replay into a [`Painter`]. [`FrameRecorder`] turns those calls into
//! vertex batches and render passes on the CPU; [`WgpuPainter`] uploads and submits
//! them via wgpu.
//!
//! Convention:
//! - CPU geometry is in logical pixels (top-left origin, +Y down).
//! - Vertex shader converts to NDC using a viewport uniform.

mod common;
mod ctx;
mod painter;
mod recorder;
mod wgpu_painter;

pub use ctx::{RenderCtx, RenderTarget};
pub use painter::Painter;
pub use recorder::{BlendKey, DrawCall, FrameRecorder, GpuVertex, PassRecord, PassTarget, TextureSource};
pub use wgpu_painter::WgpuPainter;
