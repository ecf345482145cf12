//! Graphics Device Seam
//!
//! The compositor never talks to a graphics API directly. Everything it needs
//! from the GPU goes through [`GpuDevice`]: render target allocation, target
//! binding, clears, parameter uploads, draws and full-screen effects.
//!
//! The production backend lives in the device layer; [`HeadlessDevice`]
//! records the command stream instead of executing it.
//!
//! [`HeadlessDevice`]: super::headless::HeadlessDevice

use bitflags::bitflags;
use glam::Vec4;

use super::uniforms::{PerCallData, PerCameraData};
use crate::errors::Result;
use crate::resources::SubMesh;

/// Handle to a device texture.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, PartialOrd, Ord)]
pub struct TextureId(pub u32);

/// Handle to a device buffer.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct BufferId(pub u32);

/// Pixel formats used by the built-in passes.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum PixelFormat {
    Rgba8,
    Rgba16Float,
    Rg16Snorm,
    Depth32FloatStencil8,
}

impl PixelFormat {
    #[inline]
    #[must_use]
    pub fn is_depth(self) -> bool {
        matches!(self, Self::Depth32FloatStencil8)
    }
}

bitflags! {
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct TextureUsage: u32 {
        const RENDER_TARGET = 1 << 0;
        const DEPTH_STENCIL = 1 << 1;
        const SAMPLED       = 1 << 2;
    }
}

bitflags! {
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct ClearFlags: u32 {
        const COLOR   = 1 << 0;
        const DEPTH   = 1 << 1;
        const STENCIL = 1 << 2;
    }
}

/// Descriptor for a 2D render texture.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TextureDesc {
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
    pub usage: TextureUsage,
    pub samples: u32,
    pub label: &'static str,
}

impl TextureDesc {
    /// Color target that can also be sampled by later passes.
    #[must_use]
    pub fn color(label: &'static str, format: PixelFormat, width: u32, height: u32, samples: u32) -> Self {
        Self {
            width,
            height,
            format,
            usage: TextureUsage::RENDER_TARGET | TextureUsage::SAMPLED,
            samples,
            label,
        }
    }

    #[must_use]
    pub fn depth(label: &'static str, width: u32, height: u32, samples: u32) -> Self {
        Self {
            width,
            height,
            format: PixelFormat::Depth32FloatStencil8,
            usage: TextureUsage::DEPTH_STENCIL,
            samples,
            label,
        }
    }
}

/// The externally owned surface a view finally presents to.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct RenderTargetHandle {
    pub id: u32,
    pub width: u32,
    pub height: u32,
}

/// Normalized viewport rectangle in `[0, 1]`.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct NormRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Default for NormRect {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width: 1.0,
            height: 1.0,
        }
    }
}

/// Pixel rectangle.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl NormRect {
    /// Pixel area covered by this rectangle on a `width` × `height` target.
    #[must_use]
    pub fn to_pixels(&self, width: u32, height: u32) -> Rect {
        Rect {
            x: (self.x * width as f32).round() as i32,
            y: (self.y * height as f32).round() as i32,
            width: (self.width * width as f32).round() as u32,
            height: (self.height * height as f32).round() as u32,
        }
    }
}

/// How much material state a draw must (re)bind.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum MaterialBind {
    /// Material changed: bind everything including the camera block.
    Full,
    /// Same material as the previous draw: only refresh parameter blocks.
    ParamsOnly,
}

/// Full-screen effects dispatched by post-processing nodes.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum PostEffect {
    AmbientOcclusion,
    MotionBlur,
    Bloom,
    Tonemapping,
    GaussianDof,
    Fxaa,
}

/// One draw submission.
#[derive(Clone, Debug, PartialEq)]
pub struct DrawCall {
    pub mesh_id: u32,
    pub sub_mesh: SubMesh,
    pub material_id: u32,
    pub technique: u32,
    pub pass: u32,
    /// Whether the pass state must be applied before drawing.
    pub apply_pass: bool,
    pub bind: MaterialBind,
    /// Zero for non-instanced draws.
    pub instance_count: u32,
    pub instance_buffer: Option<BufferId>,
    /// Per-call transform; `None` for instanced draws that read it per instance.
    pub per_call: Option<PerCallData>,
}

/// Description of a skybox handed to the device.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct SkyboxDesc {
    pub texture: Option<TextureId>,
    pub brightness: f32,
    pub solid_color: Vec4,
}

/// Graphics API abstraction consumed by the compositor.
///
/// All calls happen on the frame thread. Allocation failures are reported as
/// [`RenderError::ResourceAllocation`](crate::errors::RenderError::ResourceAllocation)
/// and treated as fatal for the frame.
pub trait GpuDevice {
    fn create_texture(&mut self, desc: &TextureDesc) -> Result<TextureId>;

    fn destroy_texture(&mut self, texture: TextureId);

    /// Binds offscreen color attachments and an optional depth attachment.
    fn set_render_targets(&mut self, colors: &[TextureId], depth: Option<TextureId>);

    /// Binds the view's external output surface (`None` = default surface).
    fn set_output_target(&mut self, target: Option<RenderTargetHandle>);

    fn set_viewport(&mut self, area: NormRect);

    fn clear(&mut self, flags: ClearFlags, color: Vec4);

    fn bind_camera(&mut self, camera: &PerCameraData);

    /// Uploads a per-instance stream and returns its buffer.
    fn upload_instance_data(&mut self, data: &[u8]) -> Result<BufferId>;

    fn draw(&mut self, call: &DrawCall);

    fn draw_skybox(&mut self, skybox: &SkyboxDesc);

    /// Runs a full-screen effect reading `inputs` and writing `output`.
    fn apply_effect(&mut self, effect: PostEffect, inputs: &[TextureId], output: TextureId);

    /// Copies `source` to the output surface, optionally flipping vertically.
    fn blit(&mut self, source: TextureId, target: Option<RenderTargetHandle>, flip: bool);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn norm_rect_to_pixels() {
        let r = NormRect {
            x: 0.5,
            y: 0.0,
            width: 0.5,
            height: 1.0,
        };
        assert_eq!(
            r.to_pixels(1920, 1080),
            Rect {
                x: 960,
                y: 0,
                width: 960,
                height: 1080
            }
        );
    }
}
