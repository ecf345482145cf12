//! Per-View Render Settings
//!
//! [`RenderSettings`] is the mutable, user-facing configuration of a view. It is
//! what a settings UI edits: which effects run, how culling and instancing
//! behave and how render queues are sorted.
//!
//! Changing settings changes which node identifiers the built-in dependency
//! queries return, so [`RendererView::set_render_settings`] always rebuilds the
//! view's compositor.
//!
//! # Loading
//!
//! Every field has a default and the struct is `#[serde(default)]`, so partial
//! documents are valid:
//!
//! ```rust,ignore
//! let settings: RenderSettings = serde_json::from_str(r#"{ "bloom": { "enabled": true } }"#)?;
//! assert!(settings.tone_mapping.enabled);
//! ```
//!
//! [`RendererView::set_render_settings`]: crate::renderer::RendererView::set_render_settings

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Culling / Instancing / Sorting policies
// ---------------------------------------------------------------------------

bitflags! {
    /// Which culling methods a view applies.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct CullingFlags: u32 {
        const FRUSTUM   = 1 << 0;
        /// Reserved; occlusion queries are resolved by the device layer.
        const OCCLUSION = 1 << 1;
    }
}

impl Default for CullingFlags {
    fn default() -> Self {
        Self::FRUSTUM
    }
}

/// How identical renderables are batched into instanced draws.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum InstancingMode {
    /// Every renderable is drawn on its own.
    None,
    /// Renderables sharing mesh and materials are batched automatically.
    #[default]
    Automatic,
    /// Batches are formed by the application.
    Manual,
}

impl InstancingMode {
    #[inline]
    #[must_use]
    pub fn is_enabled(self) -> bool {
        !matches!(self, Self::None)
    }
}

/// Sort key policy for a render queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum StateReduction {
    /// Keep submission order.
    None,
    /// Group by material to minimize state changes.
    #[default]
    Material,
    /// Order by distance to the view origin.
    Distance,
}

// ---------------------------------------------------------------------------
// Effect settings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BloomSettings {
    pub enabled: bool,
    pub intensity: f32,
    pub threshold: f32,
}

impl Default for BloomSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            intensity: 0.5,
            threshold: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionBlurSettings {
    pub enabled: bool,
    pub sample_count: u32,
}

impl Default for MotionBlurSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            sample_count: 8,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AmbientOcclusionSettings {
    pub enabled: bool,
    pub radius: f32,
    pub intensity: f32,
}

impl Default for AmbientOcclusionSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            radius: 0.5,
            intensity: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DepthOfFieldSettings {
    pub enabled: bool,
    pub focal_distance: f32,
    pub focal_range: f32,
}

impl Default for DepthOfFieldSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            focal_distance: 10.0,
            focal_range: 5.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToneMappingSettings {
    pub enabled: bool,
    pub exposure: f32,
    pub gamma: f32,
}

impl Default for ToneMappingSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            exposure: 1.0,
            gamma: 2.2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FxaaSettings {
    pub enabled: bool,
}

impl Default for FxaaSettings {
    fn default() -> Self {
        Self { enabled: true }
    }
}

// ---------------------------------------------------------------------------
// RenderSettings
// ---------------------------------------------------------------------------

/// Render configuration of a single view.
///
/// | Field              | Description                                   | Default     |
/// |--------------------|-----------------------------------------------|-------------|
/// | `enable_skybox`    | Draw the scene skybox                         | `true`      |
/// | `overlay_only`     | Skip all 3D content (UI-only views)           | `false`     |
/// | `cull_distance`    | Base cull distance, scaled per renderable     | `1000.0`    |
/// | `culling`          | Culling methods                               | `FRUSTUM`   |
/// | `instancing`       | Instancing policy                             | `Automatic` |
/// | `state_reduction`  | Queue sort policy                             | `Material`  |
/// | effects            | Bloom, motion blur, SSAO, DOF, tone map, FXAA | see types   |
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderSettings {
    pub enable_skybox: bool,
    pub overlay_only: bool,
    pub cull_distance: f32,
    pub culling: CullingFlags,
    pub instancing: InstancingMode,
    pub state_reduction: StateReduction,

    pub bloom: BloomSettings,
    pub motion_blur: MotionBlurSettings,
    pub ambient_occlusion: AmbientOcclusionSettings,
    pub depth_of_field: DepthOfFieldSettings,
    pub tone_mapping: ToneMappingSettings,
    pub fxaa: FxaaSettings,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            enable_skybox: true,
            overlay_only: false,
            cull_distance: 1000.0,
            culling: CullingFlags::default(),
            instancing: InstancingMode::default(),
            state_reduction: StateReduction::default(),
            bloom: BloomSettings::default(),
            motion_blur: MotionBlurSettings::default(),
            ambient_occlusion: AmbientOcclusionSettings::default(),
            depth_of_field: DepthOfFieldSettings::default(),
            tone_mapping: ToneMappingSettings::default(),
            fxaa: FxaaSettings::default(),
        }
    }
}

impl RenderSettings {
    /// Settings for views that only draw overlays.
    #[must_use]
    pub fn overlay() -> Self {
        Self {
            overlay_only: true,
            ..Default::default()
        }
    }

    #[inline]
    #[must_use]
    pub fn frustum_culling(&self) -> bool {
        self.culling.contains(CullingFlags::FRUSTUM)
    }
}
