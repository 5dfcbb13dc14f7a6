//! Shared GPU types and utilities for the pool painter.

use bytemuck::{Pod, Zeroable};

use crate::coords::{Rect, Viewport};
use crate::draw::{BlendEquation, CompositionMode};

// ── blend ─────────────────────────────────────────────────────────────────

/// Blend state for a composition mode and equation. Colors are premultiplied.
///
/// `Min` / `Max` ignore blend factors on the GPU, so they always use `One, One`.
pub(super) fn blend_state(mode: CompositionMode, equation: BlendEquation) -> wgpu::BlendState {
    use wgpu::BlendFactor as F;

    let (src, dst) = match mode {
        CompositionMode::Normal => (F::One, F::OneMinusSrcAlpha),
        CompositionMode::Multiply => (F::Dst, F::OneMinusSrcAlpha),
        CompositionMode::Add => (F::One, F::One),
        CompositionMode::Replace => (F::One, F::Zero),
        CompositionMode::DestBlending => (F::OneMinusDstAlpha, F::DstAlpha),
        CompositionMode::Light => (F::Zero, F::Src),
    };

    let (operation, src, dst) = match equation {
        BlendEquation::Add => (wgpu::BlendOperation::Add, src, dst),
        BlendEquation::Subtract => (wgpu::BlendOperation::Subtract, src, dst),
        BlendEquation::ReverseSubtract => (wgpu::BlendOperation::ReverseSubtract, src, dst),
        BlendEquation::Max => (wgpu::BlendOperation::Max, F::One, F::One),
        BlendEquation::Min => (wgpu::BlendOperation::Min, F::One, F::One),
    };

    let component = wgpu::BlendComponent {
        src_factor: src,
        dst_factor: dst,
        operation,
    };
    wgpu::BlendState { color: component, alpha: component }
}

// ── viewport uniform ──────────────────────────────────────────────────────

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub(super) struct ViewportUniform {
    pub viewport: [f32; 2],
    pub _pad: [f32; 2], // 16-byte alignment
}

/// Offset between per-pass viewport uniforms in the shared buffer.
///
/// Matches the default `min_uniform_buffer_offset_alignment`.
pub(super) const VIEWPORT_SLOT_STRIDE: u64 = 256;

pub(super) fn viewport_ubo_min_binding_size() -> Option<std::num::NonZeroU64> {
    std::num::NonZeroU64::new(std::mem::size_of::<ViewportUniform>() as u64)
}

// ── scissor rect ──────────────────────────────────────────────────────────

/// Converts a logical-pixel clip rect to physical scissor rect arguments for wgpu.
///
/// Returns `None` if the clip rect is zero-area (renderer should skip the draw call).
/// Returns `Some((x, y, w, h))` in physical pixels, clamped to the viewport.
///
/// `clip = None` means "no scissor" → returns the full viewport rect.
pub(super) fn logical_clip_to_scissor(
    clip: Option<Rect>,
    viewport: Viewport,
    scale: f32,
) -> Option<(u32, u32, u32, u32)> {
    let phys_vw = (viewport.width * scale).max(1.0) as u32;
    let phys_vh = (viewport.height * scale).max(1.0) as u32;

    let (x, y, w, h) = match clip {
        None => (0, 0, phys_vw, phys_vh),
        Some(r) => {
            let x  = ((r.origin.x * scale).max(0.0) as u32).min(phys_vw);
            let y  = ((r.origin.y * scale).max(0.0) as u32).min(phys_vh);
            let x2 = ((r.right() * scale).max(0.0) as u32).min(phys_vw);
            let y2 = ((r.bottom() * scale).max(0.0) as u32).min(phys_vh);
            (x, y, x2.saturating_sub(x), y2.saturating_sub(y))
        }
    };

    if w == 0 || h == 0 { None } else { Some((x, y, w, h)) }
}
