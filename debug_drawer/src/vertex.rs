use collscope_core::Matrix4x3;
use glam::{Mat4, Vec4};

/// One instance of a batched mesh: transposed 3x4 world transform + tint.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MeshInstance {
    pub world: [[f32; 4]; 3],
    pub color: [f32; 4],
}

impl MeshInstance {
    pub fn new(world: &Matrix4x3, color: Vec4) -> Self {
        Self {
            world: world.to_gpu_rows(),
            color: color.to_array(),
        }
    }
}

/// One instance of the unit cube `[-1, 1]^3`, with separate top and side colors.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct BoxInstance {
    pub world: [[f32; 4]; 3],
    pub color_top: [f32; 4],
    pub color_side: [f32; 4],
}

impl BoxInstance {
    pub fn new(world: &Matrix4x3, color_top: Vec4, color_side: Vec4) -> Self {
        Self {
            world: world.to_gpu_rows(),
            color_top: color_top.to_array(),
            color_side: color_side.to_array(),
        }
    }
}

/// Range of one mesh inside the staged mesh batch, drawn with a range of instances.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MeshDraw {
    pub first_vertex: u32,
    pub first_primitive: u32,
    pub primitive_count: u32,
    pub first_instance: u32,
    pub instance_count: u32,
}

/// Shader constants of the mesh effect.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MeshConstants {
    /// Column-major 4x4 view-projection matrix.
    pub view_proj: [[f32; 4]; 4],
    /// Cosine of the angle separating floors from walls in the lighting.
    pub lighting_world_y_threshold: f32,
    pub _padding: [f32; 3],
}

impl MeshConstants {
    pub fn new(view_proj: &Mat4, lighting_world_y_threshold: f32) -> Self {
        Self {
            view_proj: view_proj.to_cols_array_2d(),
            lighting_world_y_threshold,
            _padding: [0.0; 3],
        }
    }
}

/// Shader constants of the box effect.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct BoxConstants {
    /// Column-major 4x4 view-projection matrix.
    pub view_proj: [[f32; 4]; 4],
}

impl BoxConstants {
    pub fn new(view_proj: &Mat4) -> Self {
        Self {
            view_proj: view_proj.to_cols_array_2d(),
        }
    }
}
