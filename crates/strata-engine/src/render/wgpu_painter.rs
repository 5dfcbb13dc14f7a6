use std::collections::HashMap;

use anyhow::{Context as _, ensure};

use crate::coords::{Size, Viewport};
use crate::draw::{Composite, CoordsBuffer, DrawMode, FrameBuffer, FrameBufferId, PoolState, TextureId};
use crate::render::{RenderCtx, RenderTarget};

use super::common::{
    VIEWPORT_SLOT_STRIDE, ViewportUniform, blend_state, logical_clip_to_scissor,
    viewport_ubo_min_binding_size,
};
use super::recorder::{BlendKey, FrameRecorder, GpuVertex, PassTarget, TextureSource};
use super::Painter;

struct TextureEntry {
    _texture: Option<wgpu::Texture>,
    bind_group: wgpu::BindGroup,
}

struct FrameBufferTarget {
    revision: u64,
    view: wgpu::TextureView,
    bind_group: wgpu::BindGroup,
    _texture: wgpu::Texture,
}

/// Painter that submits pool output with wgpu.
///
/// Draw calls are recorded into a [`FrameRecorder`] while the pools replay, then
/// [`submit`](Self::submit) uploads all vertices once and encodes one render pass
/// per framebuffer plus one for the surface.
///
/// Textures referenced by [`TextureId`] must be registered first. Custom shader
/// programs are not supported; such draws use the pool program.
#[derive(Default)]
pub struct WgpuPainter {
    recorder: FrameRecorder,

    pipeline_format: Option<wgpu::TextureFormat>,
    shader: Option<wgpu::ShaderModule>,
    globals_bgl: Option<wgpu::BindGroupLayout>,
    texture_bgl: Option<wgpu::BindGroupLayout>,
    pipeline_layout: Option<wgpu::PipelineLayout>,
    pipelines: HashMap<BlendKey, wgpu::RenderPipeline>,

    linear_sampler: Option<wgpu::Sampler>,
    nearest_sampler: Option<wgpu::Sampler>,

    white: Option<TextureEntry>,
    textures: HashMap<TextureId, TextureEntry>,
    framebuffers: HashMap<FrameBufferId, FrameBufferTarget>,

    viewport_ubo: Option<wgpu::Buffer>,
    viewport_slots: usize,
    globals_bind_group: Option<wgpu::BindGroup>,

    vbo: Option<wgpu::Buffer>,
    vbo_capacity: usize,
}

impl WgpuPainter {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn recorder(&self) -> &FrameRecorder {
        &self.recorder
    }

    /// Makes `texture` drawable under `id`, replacing any previous registration.
    pub fn register_texture(&mut self, ctx: &RenderCtx<'_>, id: TextureId, texture: &wgpu::Texture) {
        self.ensure_layouts(ctx);
        let size = Size::new(texture.width(), texture.height());
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        if let Some(bind_group) = self.texture_bind_group(ctx, &view, true, "strata pool texture bg") {
            self.textures.insert(id, TextureEntry { _texture: None, bind_group });
            self.recorder.set_texture_size(id, size);
        }
    }

    /// Creates a texture from premultiplied RGBA8 pixels and registers it under `id`.
    pub fn upload_texture(
        &mut self,
        ctx: &RenderCtx<'_>,
        id: TextureId,
        size: Size,
        rgba: &[u8],
    ) -> anyhow::Result<()> {
        ensure!(!size.is_empty(), "texture {id:?} has zero size");
        let expected = size.width as usize * size.height as usize * 4;
        ensure!(
            rgba.len() == expected,
            "texture {id:?}: expected {expected} bytes for {}x{}, got {}",
            size.width,
            size.height,
            rgba.len()
        );

        let texture = ctx.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("strata pool texture"),
            size: wgpu::Extent3d {
                width: size.width,
                height: size.height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        write_rgba(ctx, &texture, size, rgba);

        self.register_texture(ctx, id, &texture);
        let entry = self
            .textures
            .get_mut(&id)
            .with_context(|| format!("texture {id:?} could not be bound"))?;
        entry._texture = Some(texture);
        Ok(())
    }

    pub fn remove_texture(&mut self, id: TextureId) {
        self.textures.remove(&id);
        self.recorder.remove_texture(id);
    }

    /// Uploads and encodes everything recorded since the last submit.
    ///
    /// Framebuffer passes clear to transparent; the surface pass clears only when
    /// `target.clear` is set.
    pub fn submit(&mut self, ctx: &RenderCtx<'_>, target: &mut RenderTarget<'_>) -> anyhow::Result<()> {
        ensure!(ctx.viewport.is_valid(), "invalid viewport {:?}", ctx.viewport);

        self.ensure_layouts(ctx);
        self.ensure_samplers(ctx);
        self.ensure_white(ctx);
        self.ensure_framebuffers(ctx);
        self.ensure_pipelines(ctx);

        let pass_count = self.recorder.passes().count();
        self.ensure_viewport_slots(ctx, pass_count);
        self.write_viewports(ctx);
        self.upload_vertices(ctx);

        let globals = self.globals_bind_group.as_ref().context("viewport bind group missing")?;
        let white = self.white.as_ref().context("white texture missing")?;

        let surface_load = target.surface_load();
        for (slot, pass) in self.recorder.passes().enumerate() {
            let (view, load, viewport, scale) = match &pass.target {
                PassTarget::Surface => (
                    target.color_view,
                    surface_load,
                    ctx.viewport,
                    ctx.scale_factor,
                ),
                PassTarget::FrameBuffer(fb) => {
                    let Some(fbt) = self.framebuffers.get(&fb.id()) else { continue };
                    let vp = Viewport::from_physical(fb.size(), 1.0);
                    (&fbt.view, wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT), vp, 1.0)
                }
            };

            let mut rpass = target.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("strata pool pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load,
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });

            if pass.draws.is_empty() {
                continue;
            }
            let Some(vbo) = self.vbo.as_ref() else { continue };
            rpass.set_vertex_buffer(0, vbo.slice(..));
            rpass.set_bind_group(0, globals, &[(slot as u64 * VIEWPORT_SLOT_STRIDE) as u32]);

            for draw in &pass.draws {
                let Some(pipeline) = self.pipelines.get(&draw.blend) else { continue };
                let bind_group = match draw.source {
                    TextureSource::White => Some(&white.bind_group),
                    TextureSource::Texture(id) => self.textures.get(&id).map(|t| &t.bind_group),
                    TextureSource::FrameBuffer(id) => self.framebuffers.get(&id).map(|t| &t.bind_group),
                };
                let Some(bind_group) = bind_group else { continue };
                let Some((sx, sy, sw, sh)) = logical_clip_to_scissor(draw.clip, viewport, scale) else {
                    continue;
                };

                rpass.set_pipeline(pipeline);
                rpass.set_bind_group(1, bind_group, &[]);
                rpass.set_scissor_rect(sx, sy, sw, sh);
                rpass.draw(draw.vertices.clone(), 0..1);
            }
        }

        self.recorder.reset();
        Ok(())
    }

    fn ensure_layouts(&mut self, ctx: &RenderCtx<'_>) {
        if self.pipeline_layout.is_some() {
            return;
        }

        let globals_bgl = ctx.device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("strata pool globals bgl"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: true,
                    min_binding_size: viewport_ubo_min_binding_size(),
                },
                count: None,
            }],
        });

        let texture_bgl = ctx.device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("strata pool texture bgl"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let pipeline_layout = ctx.device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("strata pool pipeline layout"),
            bind_group_layouts: &[&globals_bgl, &texture_bgl],
            immediate_size: 0,
        });

        self.globals_bgl = Some(globals_bgl);
        self.texture_bgl = Some(texture_bgl);
        self.pipeline_layout = Some(pipeline_layout);
    }

    fn ensure_samplers(&mut self, ctx: &RenderCtx<'_>) {
        if self.linear_sampler.is_some() && self.nearest_sampler.is_some() {
            return;
        }
        let make = |label, filter| {
            ctx.device.create_sampler(&wgpu::SamplerDescriptor {
                label: Some(label),
                address_mode_u: wgpu::AddressMode::ClampToEdge,
                address_mode_v: wgpu::AddressMode::ClampToEdge,
                address_mode_w: wgpu::AddressMode::ClampToEdge,
                mag_filter: filter,
                min_filter: filter,
                mipmap_filter: wgpu::MipmapFilterMode::Nearest,
                ..Default::default()
            })
        };
        self.linear_sampler = Some(make("strata pool linear sampler", wgpu::FilterMode::Linear));
        self.nearest_sampler = Some(make("strata pool nearest sampler", wgpu::FilterMode::Nearest));
    }

    fn texture_bind_group(
        &mut self,
        ctx: &RenderCtx<'_>,
        view: &wgpu::TextureView,
        smooth: bool,
        label: &str,
    ) -> Option<wgpu::BindGroup> {
        self.ensure_samplers(ctx);
        let bgl = self.texture_bgl.as_ref()?;
        let sampler = if smooth { self.linear_sampler.as_ref()? } else { self.nearest_sampler.as_ref()? };

        Some(ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(label),
            layout: bgl,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(sampler),
                },
            ],
        }))
    }

    fn ensure_white(&mut self, ctx: &RenderCtx<'_>) {
        if self.white.is_some() {
            return;
        }
        let size = Size::new(1, 1);
        let texture = ctx.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("strata pool white"),
            size: wgpu::Extent3d { width: 1, height: 1, depth_or_array_layers: 1 },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8Unorm,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        write_rgba(ctx, &texture, size, &[255; 4]);

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        if let Some(bind_group) = self.texture_bind_group(ctx, &view, false, "strata pool white bg") {
            self.white = Some(TextureEntry { _texture: Some(texture), bind_group });
        }
    }

    /// (Re)allocates offscreen targets whose descriptor revision changed.
    fn ensure_framebuffers(&mut self, ctx: &RenderCtx<'_>) {
        let stale: Vec<FrameBuffer> = self
            .recorder
            .passes()
            .filter_map(|p| match &p.target {
                PassTarget::FrameBuffer(fb) => Some(fb.clone()),
                PassTarget::Surface => None,
            })
            .filter(|fb| !fb.size().is_empty())
            .filter(|fb| {
                self.framebuffers
                    .get(&fb.id())
                    .is_none_or(|t| t.revision != fb.revision())
            })
            .collect();

        for fb in stale {
            let size = fb.size();
            let texture = ctx.device.create_texture(&wgpu::TextureDescriptor {
                label: Some("strata pool framebuffer"),
                size: wgpu::Extent3d {
                    width: size.width,
                    height: size.height,
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: ctx.surface_format,
                usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
                view_formats: &[],
            });
            let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
            let Some(bind_group) = self.texture_bind_group(ctx, &view, fb.is_smooth(), "strata pool framebuffer bg")
            else {
                continue;
            };

            log::debug!(
                "framebuffer {:?} allocated at {}x{} (rev {})",
                fb.id(),
                size.width,
                size.height,
                fb.revision()
            );
            self.framebuffers.insert(
                fb.id(),
                FrameBufferTarget {
                    revision: fb.revision(),
                    view,
                    bind_group,
                    _texture: texture,
                },
            );
        }
    }

    fn ensure_pipelines(&mut self, ctx: &RenderCtx<'_>) {
        if self.pipeline_format != Some(ctx.surface_format) {
            self.pipelines.clear();
            self.pipeline_format = Some(ctx.surface_format);
        }

        let shader: &wgpu::ShaderModule = self.shader.get_or_insert_with(|| {
            ctx.device.create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some("strata pool shader"),
                source: wgpu::ShaderSource::Wgsl(include_str!("shaders/pool.wgsl").into()),
            })
        });
        let Some(layout) = self.pipeline_layout.as_ref() else { return };

        let needed: Vec<BlendKey> = self
            .recorder
            .passes()
            .flat_map(|p| p.draws.iter().map(|d| d.blend))
            .collect();

        for key in needed {
            if self.pipelines.contains_key(&key) {
                continue;
            }
            log::debug!("building pool pipeline for {:?}", key);
            let pipeline = ctx.device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some("strata pool pipeline"),
                layout: Some(layout),
                vertex: wgpu::VertexState {
                    module: shader,
                    entry_point: Some("vs_main"),
                    compilation_options: Default::default(),
                    buffers: &[GpuVertex::layout()],
                },
                fragment: Some(wgpu::FragmentState {
                    module: shader,
                    entry_point: Some("fs_main"),
                    compilation_options: Default::default(),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: ctx.surface_format,
                        blend: Some(blend_state(key.composition, key.equation)),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    strip_index_format: None,
                    front_face: wgpu::FrontFace::Ccw,
                    cull_mode: None,
                    polygon_mode: wgpu::PolygonMode::Fill,
                    unclipped_depth: false,
                    conservative: false,
                },
                depth_stencil: None,
                multisample: wgpu::MultisampleState::default(),
                multiview_mask: None,
                cache: None,
            });
            self.pipelines.insert(key, pipeline);
        }
    }

    fn ensure_viewport_slots(&mut self, ctx: &RenderCtx<'_>, required: usize) {
        if required <= self.viewport_slots && self.globals_bind_group.is_some() {
            return;
        }
        let Some(bgl) = self.globals_bgl.as_ref() else { return };

        let slots = required.next_power_of_two().max(4);
        let ubo = ctx.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("strata pool viewport ubo"),
            size: slots as u64 * VIEWPORT_SLOT_STRIDE,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let bind_group = ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("strata pool globals bg"),
            layout: bgl,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer: &ubo,
                    offset: 0,
                    size: viewport_ubo_min_binding_size(),
                }),
            }],
        });

        self.viewport_ubo = Some(ubo);
        self.globals_bind_group = Some(bind_group);
        self.viewport_slots = slots;
    }

    fn write_viewports(&self, ctx: &RenderCtx<'_>) {
        let Some(ubo) = self.viewport_ubo.as_ref() else { return };
        for (slot, pass) in self.recorder.passes().enumerate() {
            let viewport = match &pass.target {
                PassTarget::Surface => [ctx.viewport.width.max(1.0), ctx.viewport.height.max(1.0)],
                PassTarget::FrameBuffer(fb) => {
                    [fb.size().width.max(1) as f32, fb.size().height.max(1) as f32]
                }
            };
            let u = ViewportUniform { viewport, _pad: [0.0; 2] };
            ctx.queue.write_buffer(ubo, slot as u64 * VIEWPORT_SLOT_STRIDE, bytemuck::bytes_of(&u));
        }
    }

    fn upload_vertices(&mut self, ctx: &RenderCtx<'_>) {
        let vertices = self.recorder.vertices();
        if vertices.is_empty() {
            return;
        }

        if vertices.len() > self.vbo_capacity || self.vbo.is_none() {
            let new_cap = vertices.len().next_power_of_two().max(1024);
            self.vbo = Some(ctx.device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("strata pool vbo"),
                size: (new_cap * std::mem::size_of::<GpuVertex>()) as u64,
                usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            }));
            self.vbo_capacity = new_cap;
        }

        if let Some(vbo) = self.vbo.as_ref() {
            ctx.queue.write_buffer(vbo, 0, bytemuck::cast_slice(self.recorder.vertices()));
        }
    }
}

fn write_rgba(ctx: &RenderCtx<'_>, texture: &wgpu::Texture, size: Size, rgba: &[u8]) {
    ctx.queue.write_texture(
        wgpu::TexelCopyTextureInfo {
            texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        rgba,
        wgpu::TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(size.width * 4),
            rows_per_image: Some(size.height),
        },
        wgpu::Extent3d {
            width: size.width,
            height: size.height,
            depth_or_array_layers: 1,
        },
    );
}

impl Painter for WgpuPainter {
    fn set_state(&mut self, state: &PoolState) {
        self.recorder.set_state(state);
    }

    fn draw_coords(&mut self, coords: &CoordsBuffer, mode: DrawMode) {
        self.recorder.draw_coords(coords, mode);
    }

    fn begin_frame_buffer(&mut self, framebuffer: &FrameBuffer) {
        self.recorder.begin_frame_buffer(framebuffer);
    }

    fn end_frame_buffer(&mut self, framebuffer: &FrameBuffer) {
        self.recorder.end_frame_buffer(framebuffer);
    }

    fn draw_frame_buffer(&mut self, framebuffer: &FrameBuffer, composite: &Composite) {
        self.recorder.draw_frame_buffer(framebuffer, composite);
    }
}

#[cfg(test)]
mod tests {
    use crate::coords::Rect;
    use crate::device::{Gpu, GpuInit};
    use crate::draw::{DrawPoolManager, DrawPoolType};
    use crate::logging::{LoggingConfig, init_logging};
    use crate::paint::Color;

    use super::*;

    // Machines without any adapter skip; everything below the adapter is exercised.
    fn gpu() -> Option<Gpu> {
        init_logging(LoggingConfig::default());
        Gpu::new_blocking(GpuInit { size: Size::new(64, 64), ..GpuInit::default() }).ok()
    }

    #[test]
    fn upload_rejects_mismatched_pixels() {
        let Some(gpu) = gpu() else { return };
        let ctx = gpu.render_ctx(1.0);
        let mut painter = WgpuPainter::new();

        assert!(painter.upload_texture(&ctx, TextureId(1), Size::new(2, 2), &[0; 15]).is_err());
        assert!(painter.upload_texture(&ctx, TextureId(1), Size::new(0, 2), &[]).is_err());
        assert!(painter.upload_texture(&ctx, TextureId(1), Size::new(2, 2), &[255; 16]).is_ok());
        assert_eq!(painter.recorder().texture_size(TextureId(1)), Some(Size::new(2, 2)));

        painter.remove_texture(TextureId(1));
        assert_eq!(painter.recorder().texture_size(TextureId(1)), None);
    }

    #[test]
    fn submits_framed_and_plain_pools() {
        let Some(gpu) = gpu() else { return };
        let ctx = gpu.render_ctx(1.0);
        let mut painter = WgpuPainter::new();
        painter
            .upload_texture(&ctx, TextureId(7), Size::new(2, 2), &[255; 16])
            .expect("upload");

        let mut manager = DrawPoolManager::default();
        if let Some(map) = manager.framed_mut(DrawPoolType::Map) {
            map.resize(Size::new(32, 32));
        }
        let full = Rect::new(0.0, 0.0, 32.0, 32.0);
        manager.use_framed(DrawPoolType::Map, full, full, Color::white());
        manager.add_textured_rect(full, TextureId(7), Rect::new(0.0, 0.0, 2.0, 2.0), Color::white(), None);
        manager.add_filled_rect(Rect::new(4.0, 4.0, 8.0, 8.0), Color::white(), None);
        manager.repaint(DrawPoolType::Map);

        manager.use_pool(DrawPoolType::Text);
        manager.add_filled_rect(Rect::new(0.0, 0.0, 16.0, 16.0), Color::white().faded(0.5), None);

        manager.draw(&mut painter);
        assert!(painter.recorder().draw_call_count() >= 3);

        let mut frame = gpu.begin_frame();
        let mut target = frame.target(Some(Color::transparent()));
        painter.submit(&ctx, &mut target).expect("submit");
        gpu.submit(frame);

        assert_eq!(painter.recorder().draw_call_count(), 0);
    }
}
