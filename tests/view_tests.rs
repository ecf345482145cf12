//! Renderer View Tests
//!
//! Tests for:
//! - On-demand redraw gating of execution
//! - Custom nodes plugged into the built-in graph
//! - Settings documents (serde)
//! - Transient pool trimming between frames

mod common;

use std::sync::Arc;

use common::{TARGET, forward_camera, init_logger};
use myth_compositor::errors::Result;
use myth_compositor::renderer::core::{HeadlessDevice, PostEffect, TextureId};
use myth_compositor::renderer::graph::passes::ForwardPass;
use myth_compositor::renderer::graph::{
    CompositorNode, NodeIdList, NodeInputs, NodeTypeRegistry, RenderNode, TransientTexturePool,
};
use myth_compositor::renderer::{
    FrameInfo, RedrawState, RenderSettings, RendererView, RendererViewDesc, SceneInfo,
    StateReduction,
};

fn registry() -> Arc<NodeTypeRegistry> {
    Arc::new(NodeTypeRegistry::with_default_nodes())
}

fn frame(delta: f32) -> FrameInfo {
    FrameInfo {
        time: 0.0,
        time_delta: delta,
        frame_number: 0,
    }
}

/// Runs a full frame and reports whether anything reached the device.
fn run_frame(view: &mut RendererView, device: &mut HeadlessDevice, pool: &TransientTexturePool) -> bool {
    let scene = SceneInfo::new();
    view.begin_frame(frame(0.016));
    view.execute(&scene, device, pool).expect("frame renders");
    view.end_frame();
    !device.take_commands().is_empty()
}

// ============================================================================
// Redraw gating
// ============================================================================

#[test]
fn on_demand_view_renders_only_when_requested() {
    init_logger();
    let desc = RendererViewDesc {
        on_demand: true,
        ..forward_camera()
    };
    let mut view = RendererView::new(&desc, RenderSettings::default(), registry());
    let mut device = HeadlessDevice::new();
    let pool = TransientTexturePool::new();

    assert!(!run_frame(&mut view, &mut device, &pool));
    assert_eq!(view.properties().frame_idx, 0);

    view.notify_needs_redraw();
    assert!(run_frame(&mut view, &mut device, &pool));
    assert_eq!(view.properties().frame_idx, 1);

    assert!(!run_frame(&mut view, &mut device, &pool));
    assert_eq!(view.redraw_state(), RedrawState::Idle);
}

#[test]
fn continuous_view_renders_every_frame() {
    let mut view = RendererView::new(&forward_camera(), RenderSettings::default(), registry());
    let mut device = HeadlessDevice::new();
    let pool = TransientTexturePool::new();

    for expected in 1..=3 {
        assert!(run_frame(&mut view, &mut device, &pool));
        assert_eq!(view.properties().frame_idx, expected);
    }
}

#[test]
fn set_view_preserves_frame_index() {
    let mut view = RendererView::new(&forward_camera(), RenderSettings::default(), registry());
    let mut device = HeadlessDevice::new();
    let pool = TransientTexturePool::new();
    run_frame(&mut view, &mut device, &pool);
    run_frame(&mut view, &mut device, &pool);

    view.set_view(&forward_camera());

    assert_eq!(view.properties().frame_idx, 2);
    assert_eq!(view.properties().target.target, Some(TARGET));
}

// ============================================================================
// Custom nodes
// ============================================================================

/// Edge-detect overlay drawn straight from the forward targets.
#[derive(Default)]
struct OutlinePass {
    source: Option<TextureId>,
}

impl RenderNode for OutlinePass {
    fn name(&self) -> &'static str {
        "Outline"
    }

    fn render(&mut self, inputs: &mut NodeInputs<'_>) -> Result<()> {
        let forward = inputs.input::<ForwardPass>(0);
        self.source = forward.and_then(ForwardPass::scene_color);
        if let (Some(color), Some(depth)) = (self.source, forward.and_then(ForwardPass::depth)) {
            inputs.device.apply_effect(PostEffect::Fxaa, &[depth], color);
        }
        Ok(())
    }

    fn clear(&mut self) {
        self.source = None;
    }

    fn output(&self) -> Option<TextureId> {
        self.source
    }
}

impl CompositorNode for OutlinePass {
    const ID: &'static str = "Outline";

    fn dependencies(_view: &RendererView) -> NodeIdList {
        NodeIdList::from_slice(&[ForwardPass::ID])
    }
}

#[test]
fn custom_final_node_reads_built_in_outputs() {
    let mut registry = NodeTypeRegistry::with_default_nodes();
    registry.register_node::<OutlinePass>();
    let mut view = RendererView::new(&forward_camera(), RenderSettings::default(), Arc::new(registry));

    view.build_compositor(OutlinePass::ID).expect("outline graph builds");
    assert_eq!(
        view.compositor().node_ids().collect::<Vec<_>>(),
        vec!["ForwardPass", "Outline"]
    );

    let mut device = HeadlessDevice::new();
    let pool = TransientTexturePool::new();
    assert!(run_frame(&mut view, &mut device, &pool));
    assert_eq!(pool.active_count(), 0);
}

#[test]
fn custom_final_node_survives_settings_change() {
    let mut registry = NodeTypeRegistry::with_default_nodes();
    registry.register_node::<OutlinePass>();
    let mut view = RendererView::new(&forward_camera(), RenderSettings::default(), Arc::new(registry));
    view.build_compositor(OutlinePass::ID).unwrap();

    let mut settings = view.render_settings().clone();
    settings.bloom.enabled = true;
    view.set_render_settings(settings);

    assert_eq!(view.compositor().node_ids().last(), Some("Outline"));
}

// ============================================================================
// Settings
// ============================================================================

#[test]
fn partial_settings_document_keeps_defaults() {
    let json = r#"{ "bloom": { "enabled": true }, "state_reduction": "Distance", "cull_distance": 250.0 }"#;
    let settings: RenderSettings = serde_json::from_str(json).expect("valid settings document");

    assert!(settings.bloom.enabled);
    assert!(settings.tone_mapping.enabled);
    assert!(settings.frustum_culling());
    assert_eq!(settings.state_reduction, StateReduction::Distance);
    assert!((settings.cull_distance - 250.0).abs() < f32::EPSILON);
}

#[test]
fn settings_round_trip_through_json() -> anyhow::Result<()> {
    let mut settings = RenderSettings::default();
    settings.motion_blur.enabled = true;
    settings.fxaa.enabled = false;

    let json = serde_json::to_string(&settings)?;
    let back: RenderSettings = serde_json::from_str(&json)?;

    assert_eq!(back, settings);
    Ok(())
}

// ============================================================================
// Transient pool
// ============================================================================

#[test]
fn trim_destroys_textures_idle_for_too_long() {
    let mut view = RendererView::new(&forward_camera(), RenderSettings::default(), registry());
    let mut device = HeadlessDevice::new();
    let pool = TransientTexturePool::new();

    run_frame(&mut view, &mut device, &pool);
    assert_eq!(device.live_textures(), 6);

    pool.trim(&mut device, 1);
    assert_eq!(pool.free_count(), 6);
    pool.trim(&mut device, 1);
    assert_eq!(pool.free_count(), 0);
    assert_eq!(device.live_textures(), 0);
}
