//! Device-facing core types
//!
//! Provides:
//! - `GpuDevice`: the graphics API seam used by every pass
//! - `HeadlessDevice`: a recording implementation of it
//! - GPU-layout uniform blocks (camera, object, instance, call)

pub mod gpu;
pub mod headless;
pub mod uniforms;

pub use gpu::{
    BufferId, ClearFlags, DrawCall, GpuDevice, MaterialBind, NormRect, PixelFormat, PostEffect,
    Rect, RenderTargetHandle, SkyboxDesc, TextureDesc, TextureId, TextureUsage,
};
pub use headless::{DeviceCommand, HeadlessDevice};
pub use uniforms::{PerCallData, PerCameraData, PerInstanceData, PerObjectData};
