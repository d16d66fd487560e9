//! Read views over the host's collision module, scenes and colliders.
//!
//! Each view copies its host structure out once when it is created and then
//! answers from the copy. Children are only read when asked for. Counts come
//! from memory the host keeps mutating, so every count is clamped before it
//! sizes a loop.

use std::mem::offset_of;

use collscope_core::foreign::{read_c_bytes, read_c_str};
use collscope_core::{Aabb, ForeignPtr, Matrix4x3};
use glam::{Vec3, Vec4};

use crate::bvh::BvhNode;
use crate::layout::{
    ColliderCylinder, ColliderHeader, ColliderKind, ColliderMesh, ColliderPrimitive,
    ColliderStreamed, ColliderTransform, CollisionModule, MeshPcb, Quadtree, RaycastFn, Resource,
    Scene, SceneManager, SceneWrapper, SceneWrapperVTable, StreamedEntry, StreamedHeader,
    VisibilityFlags,
};
use crate::quadtree::QuadtreeView;

pub const MAX_SCENES: usize = 64;
pub const MAX_COLLIDERS: usize = 65536;
pub const MAX_STREAMED_MESHES: usize = 4096;
/// Longest string read out of host memory.
pub const MAX_PATH_LEN: usize = 512;

/// Clamp a host-provided count to `[0, max]`, warning when it is out of range.
pub fn clamp_count(what: &str, raw: i64, max: usize) -> usize {
    if raw < 0 {
        log::warn!("negative {what} count {raw}; treating as empty");
        return 0;
    }
    if raw as u64 > max as u64 {
        log::warn!("{what} count {raw} exceeds {max}; truncated");
        return max;
    }
    raw as usize
}

unsafe fn read_string(ptr: ForeignPtr<u8>) -> Option<String> {
    // SAFETY: forwarded caller contract.
    unsafe { read_c_str(ptr, MAX_PATH_LEN) }
}

/// Path of a resource handle. `None` when the handle is null.
///
/// # Safety
///
/// A non-null `ptr` must point to a readable resource.
pub unsafe fn resource_path(ptr: ForeignPtr<Resource>) -> Option<String> {
    // SAFETY: forwarded caller contract.
    let resource = unsafe { ptr.read() }?;
    // SAFETY: the resource owns its path string.
    Some(unsafe { read_string(resource.path) }.unwrap_or_default())
}

// ---------------------------------------------------------------------------
// Module
// ---------------------------------------------------------------------------

/// The collision module singleton and its scene manager.
#[derive(Debug, Clone, Copy)]
pub struct ModuleView {
    ptr: ForeignPtr<CollisionModule>,
    module: CollisionModule,
    manager: Option<SceneManager>,
}

impl ModuleView {
    /// # Safety
    ///
    /// A non-null `ptr` must point to the host's collision module, and the
    /// whole scene graph reachable from it must stay readable while this view
    /// and anything derived from it are used.
    pub unsafe fn read(ptr: ForeignPtr<CollisionModule>) -> Option<Self> {
        // SAFETY: forwarded caller contract.
        let module = unsafe { ptr.read() }?;
        // SAFETY: as above.
        let manager = unsafe { module.scene_manager.read() };
        Some(Self {
            ptr,
            module,
            manager,
        })
    }

    pub fn ptr(&self) -> ForeignPtr<CollisionModule> {
        self.ptr
    }

    pub fn manager_ptr(&self) -> ForeignPtr<SceneManager> {
        self.module.scene_manager
    }

    pub fn load_in_progress(&self) -> i32 {
        self.module.load_in_progress_counter
    }

    pub fn forced_streaming_sphere(&self) -> Vec4 {
        Vec4::from_array(self.module.forced_streaming_sphere)
    }

    pub fn manager_streaming_sphere(&self) -> Option<Vec4> {
        self.manager.map(|m| Vec4::from_array(m.streaming_sphere))
    }

    /// Scene count as reported by the manager, unclamped.
    pub fn num_scenes(&self) -> i32 {
        self.manager.map_or(0, |m| m.num_scenes)
    }

    /// Scenes in storage order. Null slots are skipped.
    pub fn scenes(&self) -> Vec<SceneView> {
        let Some(manager) = self.manager else {
            return Vec::new();
        };
        let count = clamp_count("scene", manager.num_scenes as i64, MAX_SCENES);
        (0..count)
            .filter_map(|i| {
                // SAFETY: slot index below the clamped scene count.
                let wrapper = unsafe { manager.scenes.element(i).read() }?;
                // SAFETY: scene wrappers are part of the graph covered by `read`.
                unsafe { SceneView::read(i, wrapper) }
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Scene
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
pub struct SceneView {
    index: usize,
    wrapper_ptr: ForeignPtr<SceneWrapper>,
    raycast: Option<RaycastFn>,
    scene: Option<Scene>,
}

impl SceneView {
    /// # Safety
    ///
    /// A non-null `wrapper` must point to a readable scene wrapper whose
    /// vtable, scene, colliders and quadtree stay readable while the view is used.
    pub unsafe fn read(index: usize, wrapper: ForeignPtr<SceneWrapper>) -> Option<Self> {
        // SAFETY: forwarded caller contract.
        let raw = unsafe { wrapper.read() }?;
        // SAFETY: as above.
        let vtable: Option<SceneWrapperVTable> = unsafe { raw.vtable.read() };
        // SAFETY: as above.
        let scene = unsafe { raw.scene.read() };
        Some(Self {
            index,
            wrapper_ptr: wrapper,
            raycast: vtable.and_then(|v| v.raycast),
            scene,
        })
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn wrapper_ptr(&self) -> ForeignPtr<SceneWrapper> {
        self.wrapper_ptr
    }

    /// The scene's raycast entry point, if its vtable provides one.
    pub fn raycast_fn(&self) -> Option<RaycastFn> {
        self.raycast
    }

    pub fn has_scene(&self) -> bool {
        self.scene.is_some()
    }

    pub fn num_colliders(&self) -> i32 {
        self.scene.map_or(0, |s| s.num_colliders)
    }

    pub fn num_loading(&self) -> i32 {
        self.scene.map_or(0, |s| s.num_loading)
    }

    pub fn streaming_sphere(&self) -> Vec4 {
        self.scene
            .map_or(Vec4::ZERO, |s| Vec4::from_array(s.streaming_sphere))
    }

    /// Collider slots in storage order. Null slots are kept.
    pub fn collider_ptrs(&self) -> Vec<ForeignPtr<ColliderHeader>> {
        let Some(scene) = self.scene else {
            return Vec::new();
        };
        let count = clamp_count("collider", scene.num_colliders as i64, MAX_COLLIDERS);
        (0..count)
            // SAFETY: slot index below the clamped collider count.
            .map(|i| unsafe { scene.colliders.element(i).read() }.unwrap_or_default())
            .collect()
    }

    /// Readable colliders in storage order.
    pub fn colliders(&self) -> Vec<ColliderView> {
        self.collider_ptrs()
            .into_iter()
            // SAFETY: colliders are covered by the contract of `read`.
            .filter_map(|ptr| unsafe { ColliderView::read(ptr) })
            .collect()
    }

    pub fn quadtree_ptr(&self) -> ForeignPtr<Quadtree> {
        self.scene.map_or(ForeignPtr::null(), |s| s.quadtree)
    }

    pub fn quadtree(&self) -> Option<QuadtreeView> {
        // SAFETY: the quadtree is covered by the contract of `read`.
        unsafe { QuadtreeView::read(self.quadtree_ptr()) }
    }
}

// ---------------------------------------------------------------------------
// Colliders
// ---------------------------------------------------------------------------

/// Kind-specific part of a collider.
#[derive(Debug, Clone, Copy)]
pub enum ColliderShape {
    Streamed(StreamedView),
    Mesh(MeshView),
    Box(ColliderTransform),
    Cylinder {
        transform: ColliderTransform,
        radius: f32,
    },
    Sphere(ColliderTransform),
    Plane {
        transform: ColliderTransform,
        two_sided: bool,
    },
    /// Discriminant this build does not know about.
    Unknown(u32),
}

impl ColliderShape {
    pub fn transform(&self) -> Option<&ColliderTransform> {
        match self {
            Self::Mesh(mesh) => Some(mesh.transform()),
            Self::Box(t) | Self::Sphere(t) => Some(t),
            Self::Cylinder { transform, .. } | Self::Plane { transform, .. } => Some(transform),
            Self::Streamed(_) | Self::Unknown(_) => None,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ColliderView {
    ptr: ForeignPtr<ColliderHeader>,
    header: ColliderHeader,
    shape: ColliderShape,
}

impl ColliderView {
    /// # Safety
    ///
    /// A non-null `ptr` must point to a readable collider of the kind its
    /// header names, with its meshes and resources readable while the view is used.
    pub unsafe fn read(ptr: ForeignPtr<ColliderHeader>) -> Option<Self> {
        // SAFETY: forwarded caller contract.
        let header = unsafe { ptr.read() }?;
        let shape = match header.kind() {
            Some(ColliderKind::Streamed) => {
                // SAFETY: the header names a streamed collider.
                ColliderShape::Streamed(unsafe { StreamedView::read(ptr.cast()) }?)
            }
            // SAFETY: the header names a mesh collider.
            Some(ColliderKind::Mesh) => ColliderShape::Mesh(unsafe { MeshView::read(ptr.cast()) }?),
            Some(ColliderKind::Cylinder) => {
                // SAFETY: the header names a cylinder.
                let c: ColliderCylinder = unsafe { ptr.cast().read() }?;
                ColliderShape::Cylinder {
                    transform: c.transform,
                    radius: c.radius,
                }
            }
            Some(kind @ (ColliderKind::Box
            | ColliderKind::Sphere
            | ColliderKind::Plane
            | ColliderKind::PlaneTwoSided)) => {
                // SAFETY: these kinds share the primitive layout.
                let p: ColliderPrimitive = unsafe { ptr.cast().read() }?;
                match kind {
                    ColliderKind::Box => ColliderShape::Box(p.transform),
                    ColliderKind::Sphere => ColliderShape::Sphere(p.transform),
                    _ => ColliderShape::Plane {
                        transform: p.transform,
                        two_sided: kind == ColliderKind::PlaneTwoSided,
                    },
                }
            }
            None => ColliderShape::Unknown(header.kind),
        };
        Some(Self { ptr, header, shape })
    }

    pub fn ptr(&self) -> ForeignPtr<ColliderHeader> {
        self.ptr
    }

    pub fn addr(&self) -> usize {
        self.ptr.addr()
    }

    pub fn header(&self) -> &ColliderHeader {
        &self.header
    }

    pub fn shape(&self) -> &ColliderShape {
        &self.shape
    }

    pub fn kind(&self) -> Option<ColliderKind> {
        self.header.kind()
    }

    pub fn kind_name(&self) -> String {
        match self.kind() {
            Some(kind) => kind.name().to_owned(),
            None => format!("Unknown({})", self.header.kind),
        }
    }

    pub fn flags(&self) -> VisibilityFlags {
        self.header.flags()
    }

    /// Overwrite the collider's layer mask in host memory.
    ///
    /// # Safety
    ///
    /// The collider must still be alive and writable.
    pub unsafe fn set_layer_mask(&self, mask: u64) -> bool {
        let field = self
            .ptr
            .byte_offset::<u64>(offset_of!(ColliderHeader, layer_mask));
        // SAFETY: forwarded caller contract.
        unsafe { field.write(mask) }
    }

    /// Flip one visibility flag in host memory, re-reading the current value first.
    ///
    /// # Safety
    ///
    /// The collider must still be alive and writable.
    pub unsafe fn toggle_flag(&self, flag: VisibilityFlags) -> bool {
        let field = self
            .ptr
            .byte_offset::<u32>(offset_of!(ColliderHeader, visibility_flags));
        // SAFETY: forwarded caller contract.
        let Some(current) = (unsafe { field.read() }) else {
            return false;
        };
        // SAFETY: as above.
        unsafe { field.write(current ^ flag.bits()) }
    }
}

/// How a mesh collider stores its geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeshType {
    Simple,
    InMemory,
    FromFile,
}

impl MeshType {
    pub fn label(self) -> &'static str {
        match self {
            Self::Simple => "simple",
            Self::InMemory => "PCB in-memory",
            Self::FromFile => "PCB from file",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct MeshView {
    ptr: ForeignPtr<ColliderMesh>,
    mesh: ColliderMesh,
}

impl MeshView {
    /// # Safety
    ///
    /// A non-null `ptr` must point to a readable mesh collider whose resource
    /// and BVH stay readable while the view is used.
    pub unsafe fn read(ptr: ForeignPtr<ColliderMesh>) -> Option<Self> {
        // SAFETY: forwarded caller contract.
        let mesh = unsafe { ptr.read() }?;
        Some(Self { ptr, mesh })
    }

    pub fn ptr(&self) -> ForeignPtr<ColliderMesh> {
        self.ptr
    }

    pub fn collider(&self) -> ForeignPtr<ColliderHeader> {
        self.ptr.cast()
    }

    pub fn raw(&self) -> &ColliderMesh {
        &self.mesh
    }

    pub fn transform(&self) -> &ColliderTransform {
        &self.mesh.transform
    }

    pub fn world(&self) -> &Matrix4x3 {
        &self.mesh.transform.world
    }

    pub fn resource_ptr(&self) -> ForeignPtr<Resource> {
        self.mesh.resource
    }

    /// Resource path, `None` when the collider has no resource.
    pub fn resource_path(&self) -> Option<String> {
        // SAFETY: covered by the contract of `read`.
        unsafe { resource_path(self.mesh.resource) }
    }

    pub fn bounding_sphere(&self) -> Vec4 {
        Vec4::from_array(self.mesh.bounding_sphere)
    }

    pub fn world_bounding_box(&self) -> Aabb {
        self.mesh.world_bounding_box
    }

    pub fn is_simple(&self) -> bool {
        self.mesh.mesh_is_simple != 0
    }

    pub fn is_loaded(&self) -> bool {
        self.mesh.loaded != 0
    }

    pub fn mesh_type(&self) -> MeshType {
        if self.is_simple() {
            MeshType::Simple
        } else if !self.mesh.memory_data.is_null() {
            MeshType::InMemory
        } else {
            MeshType::FromFile
        }
    }

    /// Root of the BVH. `None` for simple meshes or when nothing is loaded yet.
    pub fn root(&self) -> Option<BvhNode> {
        if self.is_simple() {
            return None;
        }
        // SAFETY: covered by the contract of `read`.
        let pcb: MeshPcb = unsafe { self.mesh.mesh.read() }?;
        // SAFETY: as above.
        unsafe { BvhNode::read(pcb.root_node) }
    }
}

/// One sub-mesh slot of a streamed collider.
#[derive(Debug, Clone, Copy)]
pub struct StreamedSubMesh {
    pub index: usize,
    pub entry: StreamedEntry,
    /// Null while the sub-mesh is not streamed in.
    pub mesh: ForeignPtr<ColliderMesh>,
}

impl StreamedSubMesh {
    pub fn file_name(&self) -> String {
        format!("tr{:04}.pcb", self.entry.mesh_id)
    }

    pub fn view(&self) -> Option<MeshView> {
        // SAFETY: loaded sub-meshes are covered by `StreamedView::read`.
        unsafe { MeshView::read(self.mesh) }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct StreamedView {
    ptr: ForeignPtr<ColliderStreamed>,
    streamed: ColliderStreamed,
}

impl StreamedView {
    /// # Safety
    ///
    /// A non-null `ptr` must point to a readable streamed collider whose
    /// header, entry, element and loaded mesh tables stay readable while the
    /// view is used.
    pub unsafe fn read(ptr: ForeignPtr<ColliderStreamed>) -> Option<Self> {
        // SAFETY: forwarded caller contract.
        let streamed = unsafe { ptr.read() }?;
        Some(Self { ptr, streamed })
    }

    pub fn ptr(&self) -> ForeignPtr<ColliderStreamed> {
        self.ptr
    }

    pub fn raw(&self) -> &ColliderStreamed {
        &self.streamed
    }

    pub fn resource_ptr(&self) -> ForeignPtr<Resource> {
        self.streamed.resource
    }

    pub fn resource_path(&self) -> Option<String> {
        // SAFETY: covered by the contract of `read`.
        unsafe { resource_path(self.streamed.resource) }
    }

    /// Directory and file name stored back to back at the path base.
    pub fn path(&self) -> Option<(String, String)> {
        let base = self.streamed.path_base;
        // SAFETY: covered by the contract of `read`.
        let dir = unsafe { read_c_bytes(base, MAX_PATH_LEN) }?;
        // SAFETY: the file name follows the directory's terminator.
        let file = unsafe { read_string(base.byte_offset(dir.len() + 1)) }.unwrap_or_default();
        Some((String::from_utf8_lossy(&dir).into_owned(), file))
    }

    /// Streamed XZ rectangle as `(min, max)` with y = 0.
    pub fn streamed_bounds(&self) -> (Vec3, Vec3) {
        let s = &self.streamed;
        (
            Vec3::new(s.streamed_min_x, 0.0, s.streamed_min_z),
            Vec3::new(s.streamed_max_x, 0.0, s.streamed_max_z),
        )
    }

    pub fn is_loaded(&self) -> bool {
        self.streamed.loaded != 0
    }

    pub fn num_meshes_loading(&self) -> u32 {
        self.streamed.num_meshes_loading
    }

    pub fn header(&self) -> Option<StreamedHeader> {
        // SAFETY: covered by the contract of `read`.
        unsafe { self.streamed.mesh_header.read() }
    }

    /// Sub-mesh slots; empty unless the header and both tables are present.
    pub fn sub_meshes(&self) -> Vec<StreamedSubMesh> {
        let s = &self.streamed;
        if s.entries.is_null() || s.elements.is_null() {
            return Vec::new();
        }
        let Some(header) = self.header() else {
            return Vec::new();
        };
        let count = clamp_count(
            "streamed mesh",
            header.num_meshes as i64,
            MAX_STREAMED_MESHES,
        );
        (0..count)
            .map(|index| {
                // SAFETY: index below the clamped mesh count.
                let entry = unsafe { s.entries.element(index).read() }.unwrap_or_default();
                // SAFETY: as above.
                let element = unsafe { s.elements.element(index).read() }.unwrap_or_default();
                StreamedSubMesh {
                    index,
                    entry,
                    mesh: element.mesh,
                }
            })
            .collect()
    }
}
