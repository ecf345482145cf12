//! CPU cost of compositor builds and full view frames on the headless device.

use std::hint::black_box;
use std::sync::Arc;

use criterion::{Criterion, criterion_group, criterion_main};
use glam::{Mat4, Vec3};

use myth_compositor::renderer::graph::{NodeTypeRegistry, RenderCompositor, TransientTexturePool};
use myth_compositor::renderer::{
    FrameInfo, RenderSettings, RenderTargetDesc, RendererRenderable, RendererView,
    RendererViewDesc, RendererViewGroup, SceneInfo,
};
use myth_compositor::renderer::core::{HeadlessDevice, RenderTargetHandle};
use myth_compositor::resources::{Material, Mesh, ShaderFlags, SubMesh};
use myth_compositor::scene::Aabb;

fn camera() -> RendererViewDesc {
    RendererViewDesc {
        target: RenderTargetDesc::for_target(RenderTargetHandle {
            id: 0,
            width: 1280,
            height: 720,
        }),
        view_transform: Mat4::look_at_rh(Vec3::new(0.0, 5.0, 20.0), Vec3::ZERO, Vec3::Y),
        proj_transform: Mat4::perspective_rh(60f32.to_radians(), 16.0 / 9.0, 0.1, 500.0),
        view_origin: Vec3::new(0.0, 5.0, 20.0),
        ..RendererViewDesc::default()
    }
}

fn all_effects() -> RenderSettings {
    let mut settings = RenderSettings::default();
    settings.ambient_occlusion.enabled = true;
    settings.motion_blur.enabled = true;
    settings.bloom.enabled = true;
    settings.depth_of_field.enabled = true;
    settings
}

/// Grid of cubes: a few shared materials so both batching and per-object
/// draws show up.
fn grid_scene(side: usize) -> SceneInfo {
    let mesh = Arc::new(Mesh::new(
        "cube",
        24,
        vec![SubMesh::new(0, 36)],
        Aabb::new(Vec3::splat(-0.5), Vec3::splat(0.5)),
    ));
    let materials: Vec<_> = (0..4)
        .map(|i| Arc::new(Material::new(format!("grid{i}"), ShaderFlags::FORWARD)))
        .collect();

    let mut scene = SceneInfo::new();
    for x in 0..side {
        for z in 0..side {
            let material = materials[(x + z) % materials.len()].clone();
            let world = Mat4::from_translation(Vec3::new(x as f32 * 2.0 - side as f32, 0.0, -(z as f32) * 2.0));
            scene.add_renderable(RendererRenderable::new(mesh.clone(), [material]), world, 1);
        }
    }
    scene
}

fn bench_compositor_build(c: &mut Criterion) {
    let registry = Arc::new(NodeTypeRegistry::with_default_nodes());
    let view = RendererView::new(&camera(), all_effects(), registry.clone());

    c.bench_function("compositor_build_all_effects", |b| {
        let mut compositor = RenderCompositor::new();
        b.iter(|| {
            compositor
                .build(&registry, &view, "FinalResolve")
                .expect("built-in graph builds");
            black_box(compositor.len());
        });
    });
}

fn bench_view_frame(c: &mut Criterion) {
    let registry = Arc::new(NodeTypeRegistry::with_default_nodes());
    let scene = grid_scene(32);

    let mut group = c.benchmark_group("view_frame");
    for (name, settings) in [("default", RenderSettings::default()), ("all_effects", all_effects())] {
        group.bench_function(name, |b| {
            let mut views = RendererViewGroup::new(vec![RendererView::new(&camera(), settings.clone(), registry.clone())]);
            let mut device = HeadlessDevice::new();
            let pool = TransientTexturePool::new();

            b.iter(|| {
                for view in views.views_mut() {
                    view.begin_frame(FrameInfo::default());
                }
                views.determine_visibility(&scene);
                views
                    .generate_render_queue(&scene, true, &mut device)
                    .expect("queues build");
                for view in views.views_mut() {
                    view.execute(&scene, &mut device, &pool).expect("frame renders");
                    view.end_frame();
                }
                black_box(device.take_commands().len());
            });
        });
    }
    group.finish();
}

criterion_group!(render_graph_benches, bench_compositor_build, bench_view_frame);
criterion_main!(render_graph_benches);
