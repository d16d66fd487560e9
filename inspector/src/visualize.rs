//! Forwarding of hovered or selected objects to the debug drawer.

use collscope_core::{Aabb, Matrix4x3, PackedColor};
use collscope_debug_drawer::{Frame, RenderBackend};
use glam::{Vec3, Vec4};

use crate::bvh::{BvhNode, walk_preorder};
use crate::filter::SceneSummary;
use crate::layout::Primitive;
use crate::scene::{ColliderShape, ColliderView, MeshView};

/// Closed-form shapes (boxes, cylinders, spheres, planes).
pub const PRIMITIVE_COLOR: PackedColor = PackedColor::RED;
/// Bounding spheres and boxes.
pub const BOUNDS_COLOR: PackedColor = PackedColor::GREEN;
/// BVH nodes, vertices and triangles.
pub const NODE_COLOR: PackedColor = PackedColor::YELLOW;

/// Tint of a mesh collider: streamed member, simple mesh, no resource, or normal.
pub fn mesh_status_color(mesh: &MeshView, summary: &SceneSummary) -> PackedColor {
    if summary.is_streamed_mesh(mesh.ptr().addr()) {
        PackedColor::GREEN
    } else if mesh.is_simple() {
        PackedColor::RED
    } else if mesh.resource_ptr().is_null() {
        PackedColor::YELLOW
    } else {
        PackedColor::WHITE
    }
}

/// Tint of a collider row in the tree.
pub fn collider_color(collider: &ColliderView, summary: &SceneSummary) -> PackedColor {
    match collider.shape() {
        ColliderShape::Mesh(mesh) => mesh_status_color(mesh, summary),
        _ => PackedColor::WHITE,
    }
}

pub fn visualize_collider<B: RenderBackend>(
    frame: &mut Frame<'_, B>,
    collider: &ColliderView,
    summary: &SceneSummary,
) {
    match collider.shape() {
        ColliderShape::Streamed(streamed) => {
            for sub in streamed.sub_meshes() {
                if let Some(mesh) = sub.view() {
                    visualize_mesh(frame, &mesh, PackedColor::GREEN);
                }
            }
        }
        ColliderShape::Mesh(mesh) => {
            visualize_mesh(frame, mesh, mesh_status_color(mesh, summary));
        }
        ColliderShape::Box(transform) => {
            frame.draw_box_uniform(&transform.world, PRIMITIVE_COLOR.to_vec4());
        }
        ColliderShape::Cylinder { transform, .. } => {
            frame.draw_world_cylinder(&transform.world, PRIMITIVE_COLOR);
        }
        ColliderShape::Sphere(transform) => {
            frame.draw_world_sphere(transform.translation, transform.scale.x, PRIMITIVE_COLOR);
        }
        ColliderShape::Plane { transform, .. } => {
            frame.draw_world_quad(&transform.world, PRIMITIVE_COLOR);
        }
        ColliderShape::Unknown(kind) => {
            log::trace!("collider {:X} has unknown kind {kind}", collider.ptr());
        }
    }
}

/// Every BVH node of a mesh as one batched instance. Returns the number of nodes drawn.
pub fn visualize_mesh<B: RenderBackend>(
    frame: &mut Frame<'_, B>,
    mesh: &MeshView,
    color: PackedColor,
) -> usize {
    match mesh.root() {
        Some(root) => visualize_bvh(frame, &root, mesh.world(), color),
        None => 0,
    }
}

/// `node` and its whole subtree as batched instances.
pub fn visualize_bvh<B: RenderBackend>(
    frame: &mut Frame<'_, B>,
    node: &BvhNode,
    world: &Matrix4x3,
    color: PackedColor,
) -> usize {
    let tint: Vec4 = color.to_vec4();
    walk_preorder(node, &mut |n, _| frame.draw_mesh(n, world, tint))
}

pub fn visualize_sphere<B: RenderBackend>(frame: &mut Frame<'_, B>, sphere: Vec4, color: PackedColor) {
    frame.draw_world_sphere(sphere.truncate(), sphere.w, color);
}

pub fn visualize_vertex<B: RenderBackend>(
    frame: &mut Frame<'_, B>,
    world_pos: Vec3,
    radius: f32,
    color: PackedColor,
) {
    frame.draw_world_sphere(world_pos, radius, color);
}

/// Outline of a node triangle. Triangles referencing missing vertices are skipped.
pub fn visualize_triangle<B: RenderBackend>(
    frame: &mut Frame<'_, B>,
    node: &BvhNode,
    prim: &Primitive,
    world: &Matrix4x3,
    color: PackedColor,
) {
    let corners = [prim.v1, prim.v2, prim.v3].map(|i| node.vertex(i as usize));
    if let [Some(a), Some(b), Some(c)] = corners {
        frame.draw_world_triangle(
            world.transform_coordinate(a),
            world.transform_coordinate(b),
            world.transform_coordinate(c),
            color,
        );
    }
}

pub fn visualize_obb<B: RenderBackend>(
    frame: &mut Frame<'_, B>,
    local: &Aabb,
    world: &Matrix4x3,
    color: PackedColor,
) {
    frame.draw_world_obb(local, world, color);
}
