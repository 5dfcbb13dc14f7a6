use std::collections::HashMap;
use std::ops::Range;

use bytemuck::{Pod, Zeroable};

use crate::coords::{Mat3, Rect, Size, Vec2};
use crate::draw::{
    BlendEquation, Composite, CompositionMode, CoordsBuffer, DrawMode, FrameBuffer,
    FrameBufferId, PoolState, TextureId, Vertex,
};

use super::Painter;

/// Vertex as uploaded: logical px position, normalized uv, premultiplied color.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct GpuVertex {
    pub pos: [f32; 2],
    pub uv: [f32; 2],
    pub color: [f32; 4],
}

impl GpuVertex {
    const ATTRS: [wgpu::VertexAttribute; 3] = wgpu::vertex_attr_array![
        0 => Float32x2, // pos
        1 => Float32x2, // uv
        2 => Float32x4  // color
    ];

    pub(super) fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<GpuVertex>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRS,
        }
    }
}

/// What a draw call samples from.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum TextureSource {
    /// 1x1 opaque white; untextured geometry.
    White,
    Texture(TextureId),
    FrameBuffer(FrameBufferId),
}

/// Selects the render pipeline.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub struct BlendKey {
    pub composition: CompositionMode,
    pub equation: BlendEquation,
}

/// One contiguous vertex range drawn with a single pipeline/texture/scissor.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawCall {
    pub blend: BlendKey,
    pub source: TextureSource,
    pub clip: Option<Rect>,
    pub vertices: Range<u32>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PassTarget {
    /// The frame's color view; loaded, never cleared.
    Surface,
    /// An offscreen target; cleared at the start of the pass.
    FrameBuffer(FrameBuffer),
}

#[derive(Debug, Clone, PartialEq)]
pub struct PassRecord {
    pub target: PassTarget,
    pub draws: Vec<DrawCall>,
}

/// CPU half of the painter: turns pool replay into vertex batches grouped in passes.
///
/// Applies each state's transform and opacity to the vertices, normalizes texel
/// coordinates by registered texture sizes, expands strips into triangle lists and
/// merges adjacent draws that share pipeline, texture and clip.
///
/// Offscreen passes are submitted in the order they end, then the surface pass, so
/// a framebuffer is always complete before anything samples it.
#[derive(Debug)]
pub struct FrameRecorder {
    vertices: Vec<GpuVertex>,
    passes: Vec<PassRecord>,
    stack: Vec<usize>,
    completed: Vec<usize>,
    state: PoolState,
    texture_sizes: HashMap<TextureId, Size>,

    warned_shader: bool,
    warned_texture: bool,
}

impl Default for FrameRecorder {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameRecorder {
    pub fn new() -> Self {
        Self {
            vertices: Vec::new(),
            passes: vec![PassRecord { target: PassTarget::Surface, draws: Vec::new() }],
            stack: vec![0],
            completed: Vec::new(),
            state: PoolState::default(),
            texture_sizes: HashMap::new(),
            warned_shader: false,
            warned_texture: false,
        }
    }

    pub fn set_texture_size(&mut self, id: TextureId, size: Size) {
        self.texture_sizes.insert(id, size);
    }

    pub fn remove_texture(&mut self, id: TextureId) {
        self.texture_sizes.remove(&id);
    }

    pub fn texture_size(&self, id: TextureId) -> Option<Size> {
        self.texture_sizes.get(&id).copied()
    }

    #[inline]
    pub fn vertices(&self) -> &[GpuVertex] {
        &self.vertices
    }

    /// Passes in submission order.
    pub fn passes(&self) -> impl Iterator<Item = &PassRecord> {
        self.completed
            .iter()
            .map(|&i| &self.passes[i])
            .chain(self.passes.first())
    }

    pub fn draw_call_count(&self) -> usize {
        self.passes.iter().map(|p| p.draws.len()).sum()
    }

    /// Drops everything recorded; registered texture sizes survive.
    pub fn reset(&mut self) {
        if self.stack.len() > 1 {
            log::debug!("frame reset with {} unfinished framebuffer passes", self.stack.len() - 1);
        }
        self.vertices.clear();
        self.passes.truncate(1);
        self.passes[0].draws.clear();
        self.stack.clear();
        self.stack.push(0);
        self.completed.clear();
        self.state = PoolState::default();
    }

    fn current_pass(&mut self) -> &mut PassRecord {
        let idx = self.stack.last().copied().unwrap_or(0);
        &mut self.passes[idx]
    }

    #[allow(clippy::too_many_arguments)]
    fn emit(
        &mut self,
        vertices: &[Vertex],
        mode: DrawMode,
        transform: &Mat3,
        uv_scale: [f32; 2],
        color: [f32; 4],
        blend: BlendKey,
        source: TextureSource,
        clip: Option<Rect>,
    ) {
        let start = self.vertices.len() as u32;
        let identity = transform.is_identity();
        let convert = |v: &Vertex| {
            let pos = if identity {
                v.pos
            } else {
                let p = transform.transform_point(Vec2::new(v.pos[0], v.pos[1]));
                [p.x, p.y]
            };
            GpuVertex {
                pos,
                uv: [v.uv[0] * uv_scale[0], v.uv[1] * uv_scale[1]],
                color,
            }
        };

        match mode {
            DrawMode::Triangles => self.vertices.extend(vertices.iter().map(convert)),
            DrawMode::TriangleStrip => {
                for i in 0..vertices.len().saturating_sub(2) {
                    let (a, b) = if i % 2 == 0 { (i, i + 1) } else { (i + 1, i) };
                    self.vertices.push(convert(&vertices[a]));
                    self.vertices.push(convert(&vertices[b]));
                    self.vertices.push(convert(&vertices[i + 2]));
                }
            }
        }

        let end = self.vertices.len() as u32;
        if end == start {
            return;
        }

        let pass = self.current_pass();
        if let Some(last) = pass.draws.last_mut()
            && last.blend == blend
            && last.source == source
            && last.clip == clip
            && last.vertices.end == start
        {
            last.vertices.end = end;
            return;
        }
        pass.draws.push(DrawCall { blend, source, clip, vertices: start..end });
    }
}

impl Painter for FrameRecorder {
    fn set_state(&mut self, state: &PoolState) {
        if state.shader.is_some() && !self.warned_shader {
            log::debug!("FrameRecorder: custom shader programs unsupported; using the pool program");
            self.warned_shader = true;
        }
        self.state = state.clone();
    }

    fn draw_coords(&mut self, coords: &CoordsBuffer, mode: DrawMode) {
        if coords.is_empty() {
            return;
        }

        let (source, uv_scale) = match self.state.texture {
            None => (TextureSource::White, [0.0, 0.0]),
            Some(id) => match self.texture_sizes.get(&id) {
                Some(size) if !size.is_empty() => (
                    TextureSource::Texture(id),
                    [1.0 / size.width as f32, 1.0 / size.height as f32],
                ),
                _ => {
                    if !self.warned_texture {
                        log::debug!("FrameRecorder: texture {:?} not registered; draw skipped", id);
                        self.warned_texture = true;
                    }
                    return;
                }
            },
        };

        let state = &self.state;
        let color = state.color.faded(state.opacity).to_array();
        let blend = BlendKey {
            composition: state.composition_mode,
            equation: state.blend_equation,
        };
        let transform = state.transform;
        let clip = state.clip_rect;
        self.emit(coords.vertices(), mode, &transform, uv_scale, color, blend, source, clip);
    }

    fn begin_frame_buffer(&mut self, framebuffer: &FrameBuffer) {
        self.passes.push(PassRecord {
            target: PassTarget::FrameBuffer(framebuffer.clone()),
            draws: Vec::new(),
        });
        self.stack.push(self.passes.len() - 1);
    }

    fn end_frame_buffer(&mut self, framebuffer: &FrameBuffer) {
        debug_assert!(self.stack.len() > 1, "end_frame_buffer without begin");
        if self.stack.len() <= 1 {
            return;
        }
        if let Some(idx) = self.stack.pop() {
            debug_assert!(
                matches!(&self.passes[idx].target, PassTarget::FrameBuffer(fb) if fb.id() == framebuffer.id()),
                "unbalanced framebuffer passes"
            );
            self.completed.push(idx);
        }
    }

    fn draw_frame_buffer(&mut self, framebuffer: &FrameBuffer, composite: &Composite) {
        let size = framebuffer.size();
        if size.is_empty() || composite.color.is_transparent() || composite.dest.is_empty() {
            return;
        }

        let mut quad = CoordsBuffer::new();
        quad.add_rect(composite.dest, composite.src);
        self.emit(
            quad.vertices(),
            DrawMode::Triangles,
            &Mat3::IDENTITY,
            [1.0 / size.width as f32, 1.0 / size.height as f32],
            composite.color.to_array(),
            BlendKey::default(),
            TextureSource::FrameBuffer(framebuffer.id()),
            None,
        );
    }
}
