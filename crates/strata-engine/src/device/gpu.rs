use anyhow::{Context, Result};

use crate::coords::{Size, Viewport};
use crate::paint::Color;
use crate::render::{RenderCtx, RenderTarget};

/// Initialization parameters for the GPU layer.
#[derive(Debug, Clone)]
pub struct GpuInit {
    /// Canvas size in physical pixels.
    pub size: Size,

    /// Use an sRGB canvas so linear colors are encoded on store.
    pub srgb: bool,

    /// Required wgpu features.
    ///
    /// Favor an empty set for portability unless a feature is strictly necessary.
    pub required_features: wgpu::Features,

    /// Limits requested from the adapter/device.
    pub required_limits: wgpu::Limits,
}

impl Default for GpuInit {
    fn default() -> Self {
        Self {
            size: Size::new(1280, 720),
            srgb: true,
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::default(),
        }
    }
}

/// Owns wgpu core objects and an offscreen canvas texture.
///
/// Windowing is left to the embedder; anything that can present a texture (or
/// read it back) can use the canvas.
pub struct Gpu {
    device: wgpu::Device,
    queue: wgpu::Queue,
    format: wgpu::TextureFormat,
    canvas: wgpu::Texture,
    size: Size,
}

/// A single frame's command encoder plus the canvas view it renders into.
pub struct GpuFrame {
    pub view: wgpu::TextureView,
    pub encoder: wgpu::CommandEncoder,
}

impl GpuFrame {
    /// Render target over the canvas, optionally cleared to `clear` first.
    pub fn target(&mut self, clear: Option<Color>) -> RenderTarget<'_> {
        let target = RenderTarget::new(&mut self.encoder, &self.view);
        match clear {
            Some(color) => target.with_clear(color),
            None => target,
        }
    }
}

impl Gpu {
    /// Creates a device without a surface.
    ///
    /// Adapter/device acquisition is asynchronous under wgpu.
    pub async fn new(init: GpuInit) -> Result<Self> {
        anyhow::ensure!(!init.size.is_empty(), "canvas has zero size");

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .context("failed to find a suitable GPU adapter")?;

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("strata-engine device"),
                required_features: init.required_features,
                required_limits: init.required_limits,
                experimental_features: wgpu::ExperimentalFeatures::disabled(),
                memory_hints: wgpu::MemoryHints::Performance,
                trace: wgpu::Trace::Off,
            })
            .await
            .context("failed to create wgpu device/queue")?;

        let format = if init.srgb {
            wgpu::TextureFormat::Rgba8UnormSrgb
        } else {
            wgpu::TextureFormat::Rgba8Unorm
        };
        let canvas = create_canvas(&device, format, init.size);
        log::debug!(
            "gpu ready on {:?}, canvas {}x{} {:?}",
            adapter.get_info().backend,
            init.size.width,
            init.size.height,
            format
        );

        Ok(Gpu {
            device,
            queue,
            format,
            canvas,
            size: init.size,
        })
    }

    /// Blocking form of [`Gpu::new`] for callers without an executor.
    pub fn new_blocking(init: GpuInit) -> Result<Self> {
        pollster::block_on(Self::new(init))
    }

    pub fn format(&self) -> wgpu::TextureFormat {
        self.format
    }

    pub fn size(&self) -> Size {
        self.size
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    pub fn canvas(&self) -> &wgpu::Texture {
        &self.canvas
    }

    /// Reallocates the canvas. A zero size only updates internal state.
    pub fn resize(&mut self, size: Size) {
        if size == self.size {
            return;
        }
        self.size = size;
        if size.is_empty() {
            return;
        }
        self.canvas = create_canvas(&self.device, self.format, size);
    }

    /// Context for painters drawing in logical pixels at `scale_factor`.
    pub fn render_ctx(&self, scale_factor: f32) -> RenderCtx<'_> {
        let scale = if scale_factor > 0.0 { scale_factor } else { 1.0 };
        let viewport = Viewport::from_physical(self.size, scale);
        RenderCtx::new(&self.device, &self.queue, self.format, viewport, scale)
    }

    pub fn begin_frame(&self) -> GpuFrame {
        let view = self.canvas.create_view(&wgpu::TextureViewDescriptor::default());
        let encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("strata frame encoder"),
            });
        GpuFrame { view, encoder }
    }

    pub fn submit(&self, frame: GpuFrame) {
        self.queue.submit(std::iter::once(frame.encoder.finish()));
    }
}

fn create_canvas(device: &wgpu::Device, format: wgpu::TextureFormat, size: Size) -> wgpu::Texture {
    device.create_texture(&wgpu::TextureDescriptor {
        label: Some("strata canvas"),
        size: wgpu::Extent3d {
            width: size.width,
            height: size.height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT
            | wgpu::TextureUsages::TEXTURE_BINDING
            | wgpu::TextureUsages::COPY_SRC,
        view_formats: &[],
    })
}
