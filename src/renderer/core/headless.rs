//! Headless Device
//!
//! A [`GpuDevice`] that records every call instead of talking to a GPU. Useful
//! for frame captures, deterministic tests and benchmarking the CPU side of the
//! compositor in isolation.
//!
//! An optional texture budget makes allocation fail once the number of live
//! textures reaches the limit, which exercises the resource error path.

use glam::Vec4;

use super::gpu::{
    BufferId, ClearFlags, DrawCall, GpuDevice, NormRect, PostEffect, RenderTargetHandle,
    SkyboxDesc, TextureDesc, TextureId,
};
use super::uniforms::{PerCameraData, PerInstanceData};
use crate::errors::{RenderError, Result};

/// A single recorded device call.
#[derive(Clone, Debug, PartialEq)]
pub enum DeviceCommand {
    CreateTexture { id: TextureId, desc: TextureDesc },
    DestroyTexture(TextureId),
    SetRenderTargets { colors: Vec<TextureId>, depth: Option<TextureId> },
    SetOutputTarget(Option<RenderTargetHandle>),
    SetViewport(NormRect),
    Clear { flags: ClearFlags, color: Vec4 },
    BindCamera(PerCameraData),
    /// Instance rows decoded from the uploaded bytes, in upload order.
    UploadInstanceData { buffer: BufferId, instances: Vec<PerInstanceData> },
    Draw(DrawCall),
    DrawSkybox(SkyboxDesc),
    ApplyEffect { effect: PostEffect, inputs: Vec<TextureId>, output: TextureId },
    Blit { source: TextureId, target: Option<RenderTargetHandle>, flip: bool },
}

/// Recording device.
#[derive(Debug, Default)]
pub struct HeadlessDevice {
    commands: Vec<DeviceCommand>,
    next_texture: u32,
    next_buffer: u32,
    live_textures: usize,
    texture_budget: Option<usize>,
}

impl HeadlessDevice {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fails texture creation once `budget` textures are alive.
    #[must_use]
    pub fn with_texture_budget(budget: usize) -> Self {
        Self {
            texture_budget: Some(budget),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn commands(&self) -> &[DeviceCommand] {
        &self.commands
    }

    /// Drains the recorded commands, keeping texture bookkeeping.
    pub fn take_commands(&mut self) -> Vec<DeviceCommand> {
        std::mem::take(&mut self.commands)
    }

    #[must_use]
    pub fn live_textures(&self) -> usize {
        self.live_textures
    }

    /// Iterates over recorded draw calls.
    pub fn draws(&self) -> impl Iterator<Item = &DrawCall> {
        self.commands.iter().filter_map(|cmd| match cmd {
            DeviceCommand::Draw(call) => Some(call),
            _ => None,
        })
    }

    #[must_use]
    pub fn draw_count(&self) -> usize {
        self.draws().count()
    }

    /// Instance rows uploaded into `buffer`, if it was recorded.
    #[must_use]
    pub fn instance_upload(&self, buffer: BufferId) -> Option<&[PerInstanceData]> {
        self.commands.iter().find_map(|cmd| match cmd {
            DeviceCommand::UploadInstanceData { buffer: b, instances } if *b == buffer => {
                Some(instances.as_slice())
            }
            _ => None,
        })
    }
}

impl GpuDevice for HeadlessDevice {
    fn create_texture(&mut self, desc: &TextureDesc) -> Result<TextureId> {
        if let Some(budget) = self.texture_budget
            && self.live_textures >= budget
        {
            return Err(RenderError::ResourceAllocation(format!(
                "texture budget of {budget} exhausted while creating \"{}\"",
                desc.label
            )));
        }

        let id = TextureId(self.next_texture);
        self.next_texture += 1;
        self.live_textures += 1;
        self.commands.push(DeviceCommand::CreateTexture {
            id,
            desc: desc.clone(),
        });
        Ok(id)
    }

    fn destroy_texture(&mut self, texture: TextureId) {
        self.live_textures = self.live_textures.saturating_sub(1);
        self.commands.push(DeviceCommand::DestroyTexture(texture));
    }

    fn set_render_targets(&mut self, colors: &[TextureId], depth: Option<TextureId>) {
        self.commands.push(DeviceCommand::SetRenderTargets {
            colors: colors.to_vec(),
            depth,
        });
    }

    fn set_output_target(&mut self, target: Option<RenderTargetHandle>) {
        self.commands.push(DeviceCommand::SetOutputTarget(target));
    }

    fn set_viewport(&mut self, area: NormRect) {
        self.commands.push(DeviceCommand::SetViewport(area));
    }

    fn clear(&mut self, flags: ClearFlags, color: Vec4) {
        self.commands.push(DeviceCommand::Clear { flags, color });
    }

    fn bind_camera(&mut self, camera: &PerCameraData) {
        self.commands.push(DeviceCommand::BindCamera(*camera));
    }

    fn upload_instance_data(&mut self, data: &[u8]) -> Result<BufferId> {
        let buffer = BufferId(self.next_buffer);
        self.next_buffer += 1;
        let instances = data
            .chunks_exact(std::mem::size_of::<PerInstanceData>())
            .map(bytemuck::pod_read_unaligned::<PerInstanceData>)
            .collect();
        self.commands.push(DeviceCommand::UploadInstanceData { buffer, instances });
        Ok(buffer)
    }

    fn draw(&mut self, call: &DrawCall) {
        self.commands.push(DeviceCommand::Draw(call.clone()));
    }

    fn draw_skybox(&mut self, skybox: &SkyboxDesc) {
        self.commands.push(DeviceCommand::DrawSkybox(*skybox));
    }

    fn apply_effect(&mut self, effect: PostEffect, inputs: &[TextureId], output: TextureId) {
        self.commands.push(DeviceCommand::ApplyEffect {
            effect,
            inputs: inputs.to_vec(),
            output,
        });
    }

    fn blit(&mut self, source: TextureId, target: Option<RenderTargetHandle>, flip: bool) {
        self.commands.push(DeviceCommand::Blit {
            source,
            target,
            flip,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::core::gpu::PixelFormat;

    #[test]
    fn budget_rejects_extra_textures() {
        let mut device = HeadlessDevice::with_texture_budget(1);
        let desc = TextureDesc::color("a", PixelFormat::Rgba8, 4, 4, 1);
        let first = device.create_texture(&desc);
        assert!(first.is_ok());
        assert!(matches!(
            device.create_texture(&desc),
            Err(RenderError::ResourceAllocation(_))
        ));

        if let Ok(id) = first {
            device.destroy_texture(id);
        }
        assert!(device.create_texture(&desc).is_ok());
    }
}
