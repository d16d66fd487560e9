use std::f32::consts::TAU;

use collscope_core::curve::{self, circle_segments, closed_loop_pairs};
use collscope_core::{Aabb, Matrix4x3, PackedColor};
use glam::{Vec3, Vec4};

use crate::backend::RenderBackend;
use crate::batch::{BoxBatch, MeshBatch, MeshGeometry};
use crate::drawer::Frame;
use crate::overlay::OverlayLine;
use crate::vertex::MeshInstance;

/// Thickness of overlay lines when none is given.
pub const DEFAULT_LINE_THICKNESS: f32 = 1.0;

// Corner pairs of a box outline, using the bit order of `Aabb::corners`.
const BOX_EDGES: [(usize, usize); 12] = [
    // Bottom face
    (0b000, 0b001),
    (0b001, 0b101),
    (0b101, 0b100),
    (0b100, 0b000),
    // Top face
    (0b010, 0b011),
    (0b011, 0b111),
    (0b111, 0b110),
    (0b110, 0b010),
    // Vertical edges
    (0b000, 0b010),
    (0b001, 0b011),
    (0b100, 0b110),
    (0b101, 0b111),
];

impl<B: RenderBackend> Frame<'_, B> {
    // ---- Batched geometry ----

    /// Draw one instance of a triangle mesh.
    pub fn draw_mesh(&mut self, mesh: &dyn MeshGeometry, world: &Matrix4x3, color: Vec4) {
        self.mesh_batch().add(mesh, world, color);
    }

    /// Draw several instances sharing the same geometry.
    pub fn draw_mesh_instances(&mut self, mesh: &dyn MeshGeometry, instances: &[MeshInstance]) {
        self.mesh_batch().add_instances(mesh, instances);
    }

    /// Draw the `[-1, 1]^3` cube under `world`.
    pub fn draw_box(&mut self, world: &Matrix4x3, color_top: Vec4, color_side: Vec4) {
        self.box_batch().add(world, color_top, color_side);
    }

    pub fn draw_box_uniform(&mut self, world: &Matrix4x3, color: Vec4) {
        self.draw_box(world, color, color);
    }

    /// Draw an axis-aligned box as a batched box instance.
    pub fn draw_aabb(&mut self, min: Vec3, max: Vec3, color: Vec4) {
        self.draw_aabb_two_tone(min, max, color, color);
    }

    pub fn draw_aabb_two_tone(&mut self, min: Vec3, max: Vec3, color_top: Vec4, color_side: Vec4) {
        let world = Aabb::new(min, max).unit_cube_transform();
        self.draw_box(&world, color_top, color_side);
    }

    // ---- Screen-space overlay ----

    /// Draw a world-space segment, clipped against the near plane.
    pub fn draw_world_line(&mut self, a: Vec3, b: Vec3, color: PackedColor) {
        self.draw_world_line_thick(a, b, color, DEFAULT_LINE_THICKNESS);
    }

    pub fn draw_world_line_thick(&mut self, a: Vec3, b: Vec3, color: PackedColor, thickness: f32) {
        let Some((a, b)) = self.camera.clip_to_near_plane(a, b) else {
            return;
        };
        let from = self.camera.world_to_screen(a, self.viewport_origin);
        let to = self.camera.world_to_screen(b, self.viewport_origin);
        self.drawer.lines.push(OverlayLine {
            from,
            to,
            color,
            thickness,
        });
    }

    /// Three great circles in the XZ, YZ and XY planes.
    pub fn draw_world_sphere(&mut self, center: Vec3, radius: f32, color: PackedColor) {
        let segments = circle_segments(radius, TAU, self.config().circle_tolerance);
        let mut prev = [
            center + Vec3::new(0.0, 0.0, radius),
            center + Vec3::new(0.0, radius, 0.0),
            center + Vec3::new(radius, 0.0, 0.0),
        ];
        for i in 1..=segments {
            let dir = curve::direction(i as f32 * TAU / segments as f32);
            let curr = [
                center + radius * Vec3::new(dir.x, 0.0, dir.y),
                center + radius * Vec3::new(0.0, dir.y, dir.x),
                center + radius * Vec3::new(dir.y, dir.x, 0.0),
            ];
            for (c, p) in curr.iter().zip(&prev) {
                self.draw_world_line(*c, *p, color);
            }
            prev = curr;
        }
    }

    pub fn draw_world_triangle(&mut self, v1: Vec3, v2: Vec3, v3: Vec3, color: PackedColor) {
        self.draw_world_triangle_thick(v1, v2, v3, color, DEFAULT_LINE_THICKNESS);
    }

    pub fn draw_world_triangle_thick(
        &mut self,
        v1: Vec3,
        v2: Vec3,
        v3: Vec3,
        color: PackedColor,
        thickness: f32,
    ) {
        self.draw_world_line_thick(v1, v2, color, thickness);
        self.draw_world_line_thick(v2, v3, color, thickness);
        self.draw_world_line_thick(v3, v1, color, thickness);
    }

    /// Small screen-space circle at the projected point. Nothing is drawn
    /// for points on or behind the near plane.
    pub fn draw_world_point(&mut self, p: Vec3, color: PackedColor) {
        if p.extend(1.0).dot(self.camera.near_plane()) <= 0.0 {
            return;
        }
        let center = self.camera.world_to_screen(p, self.viewport_origin);
        let (radius, tolerance) = (self.config().point_radius, self.config().point_tolerance);
        let points = curve::circle_points(center, radius, tolerance);
        self.drawer
            .lines
            .extend(closed_loop_pairs(&points).map(|(from, to)| OverlayLine {
                from,
                to,
                color,
                thickness: DEFAULT_LINE_THICKNESS,
            }));
    }

    /// Outline of a local-space box under a 4x3 transform (12 lines).
    pub fn draw_world_obb(&mut self, local: &Aabb, world: &Matrix4x3, color: PackedColor) {
        let corners = local.corners().map(|c| world.transform_coordinate(c));
        for (a, b) in BOX_EDGES {
            self.draw_world_line(corners[a], corners[b], color);
        }
    }

    /// Unit cylinder (radius 1 around Y, height `[-1, 1]`) under a 4x3 transform:
    /// two tessellated caps plus one side line per segment.
    pub fn draw_world_cylinder(&mut self, world: &Matrix4x3, color: PackedColor) {
        let segments = circle_segments(world.row0.length(), TAU, self.config().circle_tolerance);
        let mut prev_top = world.transform_coordinate(Vec3::new(0.0, 1.0, 1.0));
        let mut prev_bottom = world.transform_coordinate(Vec3::new(0.0, -1.0, 1.0));
        for i in 1..=segments {
            let dir = curve::direction(i as f32 * TAU / segments as f32);
            let top = world.transform_coordinate(Vec3::new(dir.x, 1.0, dir.y));
            let bottom = world.transform_coordinate(Vec3::new(dir.x, -1.0, dir.y));
            self.draw_world_line(top, prev_top, color);
            self.draw_world_line(bottom, prev_bottom, color);
            self.draw_world_line(top, bottom, color);
            prev_top = top;
            prev_bottom = bottom;
        }
    }

    /// The `[-1, 1]^2` quad in the local XY plane under a 4x3 transform.
    pub fn draw_world_quad(&mut self, world: &Matrix4x3, color: PackedColor) {
        let corners = [
            Vec3::new(-1.0, 1.0, 0.0),
            Vec3::new(-1.0, -1.0, 0.0),
            Vec3::new(1.0, -1.0, 0.0),
            Vec3::new(1.0, 1.0, 0.0),
        ]
        .map(|c| world.transform_coordinate(c));
        for i in 0..corners.len() {
            self.draw_world_line(corners[i], corners[(i + 1) % corners.len()], color);
        }
    }

    // Batches open lazily on first use in a frame.
    fn mesh_batch(&mut self) -> &mut MeshBatch {
        self.drawer.meshes.open_or_continue()
    }

    fn box_batch(&mut self) -> &mut BoxBatch {
        self.drawer.boxes.open_or_continue()
    }
}
