//! Frame lifecycle scenarios of the debug drawer.
//!
//! Everything runs against the [`RecordingBackend`], so no GPU is needed.

mod common;

use collscope_core::{Matrix4x3, PackedColor};
use collscope_debug_drawer::{
    BoxBatch, DrawerConfig, DynamicBuffer, MeshBatch, MeshCapacity, RecordedOverlay, TriangleMesh,
};
use glam::{Vec2, Vec3, Vec4};
use rstest::rstest;

use common::{VIEWPORT, camera_at_origin, camera_looking_at, drawer, drawer_with};

// ============================================================================
// Overlay Tests
// ============================================================================

#[test]
fn point_in_front_of_camera_projects_to_center() {
    let mut drawer = drawer();
    let frame = drawer.begin_frame(&camera_at_origin(), Vec2::ZERO).unwrap();
    let screen = frame.camera().world_to_screen(Vec3::new(0.0, 0.0, -10.0), Vec2::ZERO);
    assert!((screen - Vec2::new(960.0, 540.0)).length() < 1e-2);
}

#[test]
fn sphere_emits_three_great_circles() {
    let config = DrawerConfig {
        circle_tolerance: 0.02,
        ..DrawerConfig::default()
    };
    let mut drawer = drawer_with(config);
    let eye = Vec3::new(0.0, 0.0, 10.0);
    let mut frame = drawer.begin_frame(&camera_looking_at(eye, Vec3::ZERO), Vec2::ZERO).unwrap();

    frame.draw_world_sphere(Vec3::ZERO, 1.0, PackedColor::WHITE);
    assert_eq!(frame.lines().len(), 48);
    assert!(frame.lines().iter().all(|l| l.color == PackedColor::WHITE));
}

#[test]
fn sphere_around_camera_loses_segments_behind_it() {
    let mut drawer = drawer();
    let mut frame = drawer.begin_frame(&camera_at_origin(), Vec2::ZERO).unwrap();
    frame.draw_world_sphere(Vec3::ZERO, 5.0, PackedColor::WHITE);

    let segments = collscope_core::curve::circle_segments(5.0, std::f32::consts::TAU, 0.1);
    assert!(!frame.lines().is_empty());
    assert!(frame.lines().len() < segments * 3);
}

#[rstest]
#[case::crossing(Vec3::new(0.0, 0.0, 5.0), Vec3::new(0.0, 1.0, -5.0), 1)]
#[case::in_front(Vec3::new(-1.0, 0.0, -5.0), Vec3::new(1.0, 0.0, -5.0), 1)]
#[case::behind(Vec3::new(-1.0, 0.0, 5.0), Vec3::new(1.0, 0.0, 5.0), 0)]
fn world_lines_are_clipped(#[case] a: Vec3, #[case] b: Vec3, #[case] expected: usize) {
    let mut drawer = drawer();
    let mut frame = drawer.begin_frame(&camera_at_origin(), Vec2::ZERO).unwrap();
    frame.draw_world_line(a, b, PackedColor::RED);
    assert_eq!(frame.lines().len(), expected);
    for line in frame.lines() {
        assert!(line.from.is_finite() && line.to.is_finite());
    }
}

#[test]
fn lines_are_offset_by_viewport_origin() {
    let origin = Vec2::new(100.0, 50.0);
    let mut drawer = drawer();
    let mut frame = drawer.begin_frame(&camera_at_origin(), origin).unwrap();
    frame.draw_world_line(Vec3::new(0.0, 0.0, -10.0), Vec3::new(0.0, 0.0, -20.0), PackedColor::RED);
    let line = frame.lines()[0];
    assert!((line.from - (VIEWPORT * 0.5 + origin)).length() < 1e-2);
}

#[test]
fn overlay_does_not_carry_over() {
    let mut drawer = drawer();
    let mut overlay = RecordedOverlay::default();

    let mut frame = drawer.begin_frame(&camera_at_origin(), Vec2::ZERO).unwrap();
    frame.draw_world_line(Vec3::new(0.0, 0.0, -5.0), Vec3::new(1.0, 0.0, -5.0), PackedColor::RED);
    frame.draw_world_point(Vec3::new(0.0, 0.0, -5.0), PackedColor::GREEN);
    let drawn = frame.lines().len();
    frame.end(&mut overlay).unwrap();
    assert_eq!(overlay.lines.len(), drawn);

    let frame = drawer.begin_frame(&camera_at_origin(), Vec2::ZERO).unwrap();
    assert!(frame.lines().is_empty());
    let mut second = RecordedOverlay::default();
    frame.end(&mut second).unwrap();
    assert!(second.lines.is_empty());
    assert_eq!(second.images.len(), 1);
}

#[test]
fn raycast_hit_triangle_uses_thick_lines() {
    let mut drawer = drawer();
    let mut frame = drawer.begin_frame(&camera_at_origin(), Vec2::ZERO).unwrap();
    frame.draw_world_triangle_thick(
        Vec3::new(0.0, 0.0, -5.0),
        Vec3::new(1.0, 0.0, -5.0),
        Vec3::new(0.0, 1.0, -5.0),
        PackedColor::RED,
        2.0,
    );
    assert_eq!(frame.lines().len(), 3);
    assert!(frame.lines().iter().all(|l| l.thickness == 2.0));
}

// ============================================================================
// Batch Tests
// ============================================================================

#[test]
fn batches_are_replaced_each_frame() {
    let mut drawer = drawer();
    let mut overlay = RecordedOverlay::default();
    let mesh = TriangleMesh {
        vertices: vec![Vec3::ZERO, Vec3::X, Vec3::Z],
        primitives: vec![[0, 1, 2]],
    };

    for instances in [3usize, 1] {
        let mut frame = drawer.begin_frame(&camera_at_origin(), Vec2::ZERO).unwrap();
        for i in 0..instances {
            let world = Matrix4x3::from_scale_translation(Vec3::ONE, Vec3::X * i as f32);
            frame.draw_mesh(&mesh, &world, Vec4::ONE);
            frame.draw_box_uniform(&world, Vec4::ONE);
        }
        frame.end(&mut overlay).unwrap();
    }

    let backend = drawer.backend();
    let mesh_instances: Vec<usize> = backend.submitted_meshes.iter().map(|s| s.instances).collect();
    assert_eq!(mesh_instances, vec![3, 1]);
    assert_eq!(backend.submitted_boxes, vec![3, 1]);
}

#[test]
fn instanced_meshes_share_geometry() {
    let mut drawer = drawer();
    let mesh = TriangleMesh {
        vertices: vec![Vec3::ZERO, Vec3::X, Vec3::Z],
        primitives: vec![[0, 1, 2]],
    };
    let instances: Vec<_> = (0..4)
        .map(|i| {
            collscope_debug_drawer::MeshInstance::new(
                &Matrix4x3::from_scale_translation(Vec3::ONE, Vec3::Y * i as f32),
                Vec4::ONE,
            )
        })
        .collect();

    let mut frame = drawer.begin_frame(&camera_at_origin(), Vec2::ZERO).unwrap();
    frame.draw_mesh_instances(&mesh, &instances);
    frame.end(&mut RecordedOverlay::default()).unwrap();

    let submitted = &drawer.backend().submitted_meshes[0];
    assert_eq!(submitted.draws, 1);
    assert_eq!(submitted.vertices, 3);
    assert_eq!(submitted.instances, 4);
}

#[test]
#[should_panic(expected = "opened twice")]
fn mesh_builder_cannot_be_opened_twice() {
    let capacity = MeshCapacity {
        vertices: 16,
        primitives: 16,
        instances: 16,
    };
    let mut buffer = DynamicBuffer::new("meshes", MeshBatch::new(capacity));
    buffer.open();
    buffer.open();
}

#[test]
fn closing_unopened_builder_is_noop() {
    let mut buffer = DynamicBuffer::new("boxes", BoxBatch::new(16));
    assert!(buffer.close().is_none());
    buffer.open();
    assert!(buffer.close().is_some());
    assert!(buffer.close().is_none());
}
