//! Shared fixtures for the debug drawer scenario tests.

#![allow(dead_code)]

use collscope_debug_drawer::{CameraInputs, DebugDrawer, DrawerConfig, RecordingBackend};
use glam::{Mat4, Vec2, Vec3};

pub const VIEWPORT: Vec2 = Vec2::new(1920.0, 1080.0);

/// Standard perspective projection for a 1920x1080 viewport.
pub fn projection() -> Mat4 {
    Mat4::perspective_rh(60f32.to_radians(), VIEWPORT.x / VIEWPORT.y, 0.1, 1000.0)
}

/// Camera at the world origin looking down -Z.
pub fn camera_at_origin() -> CameraInputs {
    let proj = projection();
    CameraInputs {
        view_proj: proj,
        proj,
        viewport_size: VIEWPORT,
    }
}

/// Camera at `eye` looking at `target`.
pub fn camera_looking_at(eye: Vec3, target: Vec3) -> CameraInputs {
    let proj = projection();
    let view = Mat4::look_at_rh(eye, target, Vec3::Y);
    CameraInputs {
        view_proj: proj * view,
        proj,
        viewport_size: VIEWPORT,
    }
}

pub fn drawer_with(config: DrawerConfig) -> DebugDrawer<RecordingBackend> {
    DebugDrawer::new(RecordingBackend::new(), config)
}

pub fn drawer() -> DebugDrawer<RecordingBackend> {
    drawer_with(DrawerConfig::default())
}
