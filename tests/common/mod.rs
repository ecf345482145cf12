//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use glam::{Mat4, Vec3};
use parking_lot::Mutex;

use myth_compositor::errors::{RenderError, Result};
use myth_compositor::renderer::core::gpu::RenderTargetHandle;
use myth_compositor::renderer::graph::{NodeIdList, NodeInputs, NodeTypeDescriptor, RenderNode};
use myth_compositor::renderer::{RenderTargetDesc, RendererViewDesc};
use myth_compositor::resources::{Material, Mesh, ShaderFlags, SubMesh};
use myth_compositor::scene::Aabb;

pub const TARGET: RenderTargetHandle = RenderTargetHandle {
    id: 7,
    width: 320,
    height: 240,
};

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Unit cube with a single sub-mesh.
pub fn cube_mesh() -> Arc<Mesh> {
    Arc::new(Mesh::new(
        "cube",
        24,
        vec![SubMesh::new(0, 36)],
        Aabb::new(Vec3::splat(-0.5), Vec3::splat(0.5)),
    ))
}

pub fn opaque_material(name: &'static str) -> Arc<Material> {
    Arc::new(Material::new(name, ShaderFlags::FORWARD))
}

pub fn transparent_material(name: &'static str) -> Arc<Material> {
    Arc::new(Material::new(name, ShaderFlags::FORWARD | ShaderFlags::TRANSPARENT))
}

/// Camera at `eye` looking at `target`, rendering to [`TARGET`].
pub fn camera_desc(eye: Vec3, target: Vec3) -> RendererViewDesc {
    let view = Mat4::look_at_rh(eye, target, Vec3::Y);
    let proj = Mat4::perspective_rh(60f32.to_radians(), 4.0 / 3.0, 0.1, 500.0);
    RendererViewDesc {
        target: RenderTargetDesc::for_target(TARGET),
        view_origin: eye,
        view_direction: (target - eye).normalize(),
        view_transform: view,
        proj_transform: proj,
        ..RendererViewDesc::default()
    }
}

/// Camera at the origin looking down -Z.
pub fn forward_camera() -> RendererViewDesc {
    camera_desc(Vec3::ZERO, Vec3::NEG_Z)
}

pub fn at(x: f32, y: f32, z: f32) -> Mat4 {
    Mat4::from_translation(Vec3::new(x, y, z))
}

// ─── Recording nodes ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Render(&'static str),
    Clear(&'static str),
}

pub type EventLog = Arc<Mutex<Vec<Event>>>;

/// Node that records its render and clear calls.
pub struct RecordingNode {
    id: &'static str,
    log: EventLog,
    fail: bool,
}

impl RenderNode for RecordingNode {
    fn name(&self) -> &'static str {
        self.id
    }

    fn render(&mut self, _inputs: &mut NodeInputs<'_>) -> Result<()> {
        self.log.lock().push(Event::Render(self.id));
        if self.fail {
            return Err(RenderError::ResourceAllocation(format!("{} out of memory", self.id)));
        }
        Ok(())
    }

    fn clear(&mut self) {
        self.log.lock().push(Event::Clear(self.id));
    }
}

/// Descriptor for a [`RecordingNode`] with fixed dependencies.
pub fn recording(id: &'static str, deps: &'static [&'static str], log: &EventLog) -> NodeTypeDescriptor {
    recording_node(id, deps, log, false)
}

/// Like [`recording`], but the node fails every render.
pub fn failing(id: &'static str, deps: &'static [&'static str], log: &EventLog) -> NodeTypeDescriptor {
    recording_node(id, deps, log, true)
}

fn recording_node(
    id: &'static str,
    deps: &'static [&'static str],
    log: &EventLog,
    fail: bool,
) -> NodeTypeDescriptor {
    let log = log.clone();
    NodeTypeDescriptor::new(
        id,
        move || -> Box<dyn RenderNode> {
            Box::new(RecordingNode {
                id,
                log: log.clone(),
                fail,
            })
        },
        move |_| NodeIdList::from_slice(deps),
    )
}
