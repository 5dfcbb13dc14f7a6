use crate::draw::{Composite, CoordsBuffer, DrawMode, FrameBuffer, PoolState};

/// Backend the pool manager replays draw objects into.
///
/// Calls arrive in composite order. `set_state` precedes every `draw_coords`;
/// offscreen passes are bracketed by `begin_frame_buffer` / `end_frame_buffer`.
pub trait Painter {
    /// Binds the GPU state for the following `draw_coords` calls.
    fn set_state(&mut self, state: &PoolState);

    /// Submits one batch of vertices with the current state.
    fn draw_coords(&mut self, coords: &CoordsBuffer, mode: DrawMode);

    /// Redirects drawing into `framebuffer` and clears it.
    fn begin_frame_buffer(&mut self, framebuffer: &FrameBuffer);

    /// Restores the previous target.
    fn end_frame_buffer(&mut self, framebuffer: &FrameBuffer);

    /// Draws the framebuffer's current content onto the active target.
    fn draw_frame_buffer(&mut self, framebuffer: &FrameBuffer, composite: &Composite);
}
