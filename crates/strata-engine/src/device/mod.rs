//! Headless GPU device management.
//!
//! This module is responsible for:
//! - creating the wgpu Instance/Adapter/Device/Queue
//! - owning the offscreen canvas the painter renders into
//! - handing out encoders/views per frame

mod gpu;

pub use gpu::{Gpu, GpuFrame, GpuInit};
