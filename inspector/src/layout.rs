//! `#[repr(C)]` mirrors of the host's collision structures.
//!
//! These types are never constructed by the inspector outside of tests; they
//! are copied out of host memory through [`ForeignPtr::read`] and describe
//! exactly the fields the inspector looks at. Booleans are mirrored as `u8`
//! because the host may hold any byte there.

use bitflags::bitflags;
use collscope_core::{Aabb, ForeignPtr, Matrix4x3};
use glam::Vec3;

bitflags! {
    /// Per-collider visibility bits.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct VisibilityFlags: u32 {
        /// Eligible for raycasts.
        const RAYCAST = 1 << 0;
        /// Eligible for global visits.
        const GLOBAL_VISIT = 1 << 1;
    }
}

/// Discriminant stored in [`ColliderHeader::kind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColliderKind {
    Streamed,
    Mesh,
    Box,
    Cylinder,
    Sphere,
    Plane,
    PlaneTwoSided,
}

impl ColliderKind {
    pub fn from_raw(raw: u32) -> Option<Self> {
        Some(match raw {
            1 => Self::Streamed,
            2 => Self::Mesh,
            3 => Self::Box,
            4 => Self::Cylinder,
            5 => Self::Sphere,
            6 => Self::Plane,
            7 => Self::PlaneTwoSided,
            _ => return None,
        })
    }

    pub fn raw(self) -> u32 {
        match self {
            Self::Streamed => 1,
            Self::Mesh => 2,
            Self::Box => 3,
            Self::Cylinder => 4,
            Self::Sphere => 5,
            Self::Plane => 6,
            Self::PlaneTwoSided => 7,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Streamed => "Streamed",
            Self::Mesh => "Mesh",
            Self::Box => "Box",
            Self::Cylinder => "Cylinder",
            Self::Sphere => "Sphere",
            Self::Plane => "Plane",
            Self::PlaneTwoSided => "PlaneTwoSided",
        }
    }
}

// ---------------------------------------------------------------------------
// Colliders
// ---------------------------------------------------------------------------

/// Common prefix of every collider.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct ColliderHeader {
    pub vtable: ForeignPtr<u8>,
    pub layer_mask: u64,
    pub material_value: u64,
    pub material_mask: u64,
    pub visibility_flags: u32,
    pub num_refs: u32,
    pub kind: u32,
    pub _pad: u32,
}

impl ColliderHeader {
    pub fn kind(&self) -> Option<ColliderKind> {
        ColliderKind::from_raw(self.kind)
    }

    /// Known flag bits; unknown bits are dropped.
    pub fn flags(&self) -> VisibilityFlags {
        VisibilityFlags::from_bits_truncate(self.visibility_flags)
    }
}

/// Resource handle shared by mesh and streamed colliders.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct Resource {
    pub vtable: ForeignPtr<u8>,
    /// NUL-terminated path.
    pub path: ForeignPtr<u8>,
}

/// Transform block shared by the closed-form colliders.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct ColliderTransform {
    pub translation: Vec3,
    pub rotation: Vec3,
    pub scale: Vec3,
    pub world: Matrix4x3,
    pub inv_world: Matrix4x3,
}

/// Box, sphere and plane colliders.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct ColliderPrimitive {
    pub header: ColliderHeader,
    pub transform: ColliderTransform,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct ColliderCylinder {
    pub header: ColliderHeader,
    pub transform: ColliderTransform,
    pub radius: f32,
    pub _pad: u32,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct ColliderMesh {
    pub header: ColliderHeader,
    pub resource: ForeignPtr<Resource>,
    pub transform: ColliderTransform,
    /// Center xyz and radius.
    pub bounding_sphere: [f32; 4],
    pub world_bounding_box: Aabb,
    pub total_primitives: u32,
    pub total_children: u32,
    pub mesh_is_simple: u8,
    pub loaded: u8,
    pub _pad: [u8; 6],
    pub memory_data: ForeignPtr<u8>,
    pub mesh: ForeignPtr<MeshPcb>,
}

/// Header of a streamed collider's mesh table.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct StreamedHeader {
    pub num_meshes: u32,
    pub values: [f32; 7],
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct StreamedEntry {
    pub mesh_id: u32,
    pub bounds: Aabb,
    pub _unk: u32,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct StreamedElement {
    pub link: ForeignPtr<u8>,
    pub mesh: ForeignPtr<ColliderMesh>,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct ColliderStreamed {
    pub header: ColliderHeader,
    pub resource: ForeignPtr<Resource>,
    /// Two consecutive NUL-terminated strings: directory, then file.
    pub path_base: ForeignPtr<u8>,
    pub streamed_min_x: f32,
    pub streamed_min_z: f32,
    pub streamed_max_x: f32,
    pub streamed_max_z: f32,
    pub loaded: u8,
    pub _pad: [u8; 3],
    pub num_meshes_loading: u32,
    pub mesh_header: ForeignPtr<StreamedHeader>,
    pub entries: ForeignPtr<StreamedEntry>,
    pub elements: ForeignPtr<StreamedElement>,
}

// ---------------------------------------------------------------------------
// Mesh BVH
// ---------------------------------------------------------------------------

#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct MeshPcb {
    pub vtable: ForeignPtr<u8>,
    pub root_node: ForeignPtr<FileNode>,
}

/// One BVH node. The node is immediately followed in memory by
/// `num_verts_raw` raw vertices, `num_verts_compressed` compressed vertices
/// and `num_prims` primitives.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, bytemuck::Pod, bytemuck::Zeroable)]
pub struct FileNode {
    pub header: u64,
    /// Byte offset of the first child from this node, `0` for none.
    pub child1_offset: u32,
    pub child2_offset: u32,
    pub local_bounds: Aabb,
    pub num_verts_compressed: u16,
    pub num_prims: u16,
    pub num_verts_raw: u16,
    pub _pad: u16,
}

/// Raw vertex, in node-local space.
pub type RawVertex = [f32; 3];

/// Vertex quantized over the node's local bounds.
pub type CompressedVertex = [u16; 3];

/// Indexed triangle of a BVH node.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Primitive {
    pub v1: u8,
    pub v2: u8,
    pub v3: u8,
    pub _pad: u8,
    pub material: u32,
}

// ---------------------------------------------------------------------------
// Quadtree
// ---------------------------------------------------------------------------

#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct Quadtree {
    pub num_levels: i32,
    pub min_x: i32,
    pub max_x: i32,
    pub min_z: i32,
    pub max_z: i32,
    pub leaf_size_x: i32,
    pub leaf_size_z: i32,
    pub num_nodes: i32,
    /// All levels, coarsest first.
    pub nodes: ForeignPtr<QuadtreeNode>,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct QuadtreeNode {
    /// First link of the node's collider list, null when the cell is empty.
    pub first_link: ForeignPtr<ColliderLink>,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct ColliderLink {
    pub next: ForeignPtr<ColliderLink>,
    pub collider: ForeignPtr<ColliderHeader>,
}

// ---------------------------------------------------------------------------
// Scenes
// ---------------------------------------------------------------------------

#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct Scene {
    pub vtable: ForeignPtr<u8>,
    pub colliders: ForeignPtr<ForeignPtr<ColliderHeader>>,
    pub num_colliders: i32,
    pub num_loading: i32,
    pub streaming_sphere: [f32; 4],
    pub quadtree: ForeignPtr<Quadtree>,
}

/// The host's raycast entry point.
pub type RaycastFn = unsafe extern "C" fn(
    scene: *mut SceneWrapper,
    result: *mut RaycastHit,
    layer_mask: u64,
    params: *const RaycastParams,
) -> bool;

#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct SceneWrapperVTable {
    pub destructor: ForeignPtr<u8>,
    pub raycast: Option<RaycastFn>,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct SceneWrapper {
    pub vtable: ForeignPtr<SceneWrapperVTable>,
    pub scene: ForeignPtr<Scene>,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct SceneManager {
    pub vtable: ForeignPtr<u8>,
    pub scenes: ForeignPtr<ForeignPtr<SceneWrapper>>,
    pub num_scenes: i32,
    pub _pad: i32,
    pub streaming_sphere: [f32; 4],
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct CollisionModule {
    pub vtable: ForeignPtr<u8>,
    pub scene_manager: ForeignPtr<SceneManager>,
    pub load_in_progress_counter: i32,
    pub _pad: i32,
    pub forced_streaming_sphere: [f32; 4],
}

// ---------------------------------------------------------------------------
// Raycast arguments
// ---------------------------------------------------------------------------

#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MaterialFilter {
    pub value: u64,
    pub mask: u64,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct RaycastParams {
    pub algorithm: u32,
    pub _pad: u32,
    pub origin: ForeignPtr<Vec3>,
    pub direction: ForeignPtr<Vec3>,
    pub max_distance: ForeignPtr<f32>,
    pub max_plane_normal_y: f32,
    pub _pad2: u32,
    pub material_filter: ForeignPtr<MaterialFilter>,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct RaycastHit {
    pub point: Vec3,
    pub normal: Vec3,
    pub v1: Vec3,
    pub v2: Vec3,
    pub v3: Vec3,
    pub distance: f32,
    pub material: u64,
    pub object: ForeignPtr<ColliderHeader>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_roundtrip() {
        for raw in 1..=7 {
            let kind = ColliderKind::from_raw(raw).expect("known kind");
            assert_eq!(kind.raw(), raw);
        }
        assert_eq!(ColliderKind::from_raw(0), None);
        assert_eq!(ColliderKind::from_raw(42), None);
    }

    #[test]
    fn unknown_flag_bits_are_ignored() {
        let header = ColliderHeader {
            visibility_flags: 0xF1,
            ..Default::default()
        };
        assert_eq!(header.flags(), VisibilityFlags::RAYCAST);
    }

    #[test]
    fn node_payload_starts_after_header() {
        assert_eq!(size_of::<FileNode>(), 48);
        assert_eq!(size_of::<Primitive>(), 8);
    }
}
