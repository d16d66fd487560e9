//! Host memory fixtures for the inspector scenario tests.
//!
//! Every structure is leaked so that the addresses handed to the inspector
//! stay valid for the rest of the test binary, the way host memory outlives
//! an inspector session.

#![allow(dead_code)]

use std::sync::atomic::{AtomicU64, Ordering};

use collscope_core::{Aabb, ForeignPtr, Matrix4x3};
use collscope_debug_drawer::{CameraInputs, DebugDrawer, DrawerConfig, RecordingBackend};
use collscope_inspector::layout::*;
use glam::{Mat4, Vec2, Vec3};
use parking_lot::Mutex;

pub const VIEWPORT: Vec2 = Vec2::new(1920.0, 1080.0);

/// Serializes tests that construct an inspector, since only one raycast hook may exist.
pub static HOOK_LOCK: Mutex<()> = parking_lot::const_mutex(());

/// Calls that reached [`fake_raycast`].
pub static FAKE_RAYCASTS: AtomicU64 = AtomicU64::new(0);

pub fn leak<T>(value: T) -> ForeignPtr<T> {
    ForeignPtr::from_mut(Box::leak(Box::new(value)))
}

pub fn leak_slice<T>(values: Vec<T>) -> ForeignPtr<T> {
    let slice = Box::leak(values.into_boxed_slice());
    match slice.first_mut() {
        Some(first) => ForeignPtr::from_mut(first),
        None => ForeignPtr::null(),
    }
}

pub fn leak_c_str(s: &str) -> ForeignPtr<u8> {
    let mut bytes = s.as_bytes().to_vec();
    bytes.push(0);
    leak_slice(bytes)
}

/// Host raycast stand-in: hits the first collider of the scene 10 units along
/// the ray, misses when the scene has no collider.
///
/// # Safety
///
/// Arguments must be a fixture scene wrapper and valid params.
pub unsafe extern "C" fn fake_raycast(
    scene: *mut SceneWrapper,
    result: *mut RaycastHit,
    _layer_mask: u64,
    params: *const RaycastParams,
) -> bool {
    FAKE_RAYCASTS.fetch_add(1, Ordering::SeqCst);
    let wrapper: ForeignPtr<SceneWrapper> = ForeignPtr::from_addr(scene as usize);
    let target = unsafe { wrapper.read() }
        .and_then(|w| unsafe { w.scene.read() })
        .filter(|s| s.num_colliders > 0)
        .and_then(|s| unsafe { s.colliders.read() });
    let Some(object) = target.filter(|c| !c.is_null()) else {
        return false;
    };
    let params = unsafe { &*params };
    let origin = unsafe { params.origin.read() }.unwrap_or_default();
    let direction = unsafe { params.direction.read() }.unwrap_or(Vec3::NEG_Z);
    let point = origin + direction * 10.0;
    let hit = RaycastHit {
        point,
        normal: -direction,
        v1: point + Vec3::X,
        v2: point + Vec3::Y,
        v3: point - Vec3::X,
        distance: 10.0,
        material: 0,
        object,
    };
    unsafe { result.write(hit) };
    true
}

// ---------------------------------------------------------------------------
// Colliders
// ---------------------------------------------------------------------------

pub fn header(kind: ColliderKind, layer_mask: u64, material_value: u64, flags: u32) -> ColliderHeader {
    ColliderHeader {
        layer_mask,
        material_value,
        material_mask: material_value,
        visibility_flags: flags,
        num_refs: 1,
        kind: kind.raw(),
        ..Default::default()
    }
}

pub fn transform_at(translation: Vec3, scale: Vec3) -> ColliderTransform {
    ColliderTransform {
        translation,
        rotation: Vec3::ZERO,
        scale,
        world: Matrix4x3::from_scale_translation(scale, translation),
        inv_world: Matrix4x3::from_scale_translation(scale.recip(), -translation / scale),
    }
}

pub fn box_collider(layer_mask: u64, material_value: u64, flags: u32) -> ForeignPtr<ColliderHeader> {
    leak(ColliderPrimitive {
        header: header(ColliderKind::Box, layer_mask, material_value, flags),
        transform: transform_at(Vec3::new(0.0, 0.0, -20.0), Vec3::ONE),
    })
    .cast()
}

pub fn sphere_collider(layer_mask: u64, center: Vec3, radius: f32) -> ForeignPtr<ColliderHeader> {
    leak(ColliderPrimitive {
        header: header(ColliderKind::Sphere, layer_mask, 0, 0x3),
        transform: transform_at(center, Vec3::splat(radius)),
    })
    .cast()
}

/// BVH node followed by its payload, ready to be concatenated with children.
pub fn node_bytes(
    children: (u32, u32),
    raw: &[RawVertex],
    compressed: &[CompressedVertex],
    prims: &[Primitive],
) -> Vec<u8> {
    let node = FileNode {
        header: 0x0123_4567_89AB_CDEF,
        child1_offset: children.0,
        child2_offset: children.1,
        local_bounds: Aabb::new(Vec3::splat(-1.0), Vec3::splat(1.0)),
        num_verts_compressed: compressed.len() as u16,
        num_prims: prims.len() as u16,
        num_verts_raw: raw.len() as u16,
        _pad: 0,
    };
    let mut bytes = bytemuck::bytes_of(&node).to_vec();
    bytes.extend_from_slice(bytemuck::cast_slice(raw));
    bytes.extend_from_slice(bytemuck::cast_slice(compressed));
    bytes.extend_from_slice(bytemuck::cast_slice(prims));
    bytes
}

pub fn triangle(material: u32) -> Primitive {
    Primitive {
        v1: 0,
        v2: 1,
        v3: 2,
        _pad: 0,
        material,
    }
}

/// Root with two leaf children, each leaf holding one triangle.
pub fn three_node_bvh() -> Vec<u8> {
    let verts: [RawVertex; 3] = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]];
    let left = node_bytes((0, 0), &verts, &[], &[triangle(0x10)]);
    let right = node_bytes((0, 0), &[], &[[0, 0, 0], [65535, 0, 0], [0, 65535, 0]], &[triangle(0x20)]);
    let root_len = size_of::<FileNode>() as u32;
    let root = node_bytes((root_len, root_len + left.len() as u32), &[], &[], &[]);

    let mut bytes = root;
    bytes.extend(left);
    bytes.extend(right);
    bytes
}

/// Mesh collider whose BVH is `bvh`, or a mesh that is not loaded when `bvh` is `None`.
pub fn mesh_collider(layer_mask: u64, bvh: Option<Vec<u8>>) -> ForeignPtr<ColliderMesh> {
    let mesh = match bvh {
        Some(bytes) => leak(MeshPcb {
            vtable: ForeignPtr::null(),
            root_node: leak_slice(bytes).cast(),
        }),
        None => ForeignPtr::null(),
    };
    leak(ColliderMesh {
        header: header(ColliderKind::Mesh, layer_mask, 0, 0x1),
        resource: leak(Resource {
            vtable: ForeignPtr::null(),
            path: leak_c_str("bg/ffxiv/test/collision/tr0001.pcb"),
        }),
        transform: transform_at(Vec3::new(0.0, 0.0, -20.0), Vec3::ONE),
        bounding_sphere: [0.0, 0.0, -20.0, 2.0],
        world_bounding_box: Aabb::new(Vec3::new(-1.0, -1.0, -21.0), Vec3::new(1.0, 1.0, -19.0)),
        total_primitives: 2,
        total_children: 3,
        loaded: 1,
        mesh,
        ..Default::default()
    })
}

/// Streamed collider with one loaded and one missing sub-mesh.
pub fn streamed_collider(layer_mask: u64, loaded: ForeignPtr<ColliderMesh>) -> ForeignPtr<ColliderHeader> {
    let entry = |mesh_id| StreamedEntry {
        mesh_id,
        bounds: Aabb::new(Vec3::splat(-8.0), Vec3::splat(8.0)),
        _unk: 0,
    };
    let element = |mesh| StreamedElement {
        link: ForeignPtr::null(),
        mesh,
    };
    leak(ColliderStreamed {
        header: header(ColliderKind::Streamed, layer_mask, 0, 0x1),
        path_base: leak_slice(b"bg/ffxiv/test\0collision\0".to_vec()),
        streamed_min_x: -16.0,
        streamed_min_z: -16.0,
        streamed_max_x: 16.0,
        streamed_max_z: 16.0,
        loaded: 1,
        mesh_header: leak(StreamedHeader {
            num_meshes: 2,
            values: [0.0; 7],
        }),
        entries: leak_slice(vec![entry(1), entry(2)]),
        elements: leak_slice(vec![element(loaded), element(ForeignPtr::null())]),
        ..Default::default()
    })
    .cast()
}

// ---------------------------------------------------------------------------
// Scenes
// ---------------------------------------------------------------------------

/// Quadtree over `[0, 63] x [0, 63]` whose nodes hold the given collider lists.
pub fn quadtree(num_levels: i32, lists: Vec<Vec<ForeignPtr<ColliderHeader>>>) -> ForeignPtr<Quadtree> {
    let nodes: Vec<QuadtreeNode> = lists
        .into_iter()
        .map(|colliders| {
            let first_link = colliders
                .into_iter()
                .rev()
                .fold(ForeignPtr::null(), |next, collider| leak(ColliderLink { next, collider }));
            QuadtreeNode { first_link }
        })
        .collect();
    leak(Quadtree {
        num_levels,
        min_x: 0,
        max_x: 63,
        min_z: 0,
        max_z: 63,
        leaf_size_x: 32,
        leaf_size_z: 32,
        num_nodes: nodes.len() as i32,
        nodes: leak_slice(nodes),
    })
}

pub fn scene_wrapper(
    colliders: Vec<ForeignPtr<ColliderHeader>>,
    quadtree: ForeignPtr<Quadtree>,
    raycast: Option<RaycastFn>,
) -> ForeignPtr<SceneWrapper> {
    let scene = leak(Scene {
        vtable: ForeignPtr::null(),
        num_colliders: colliders.len() as i32,
        colliders: leak_slice(colliders),
        num_loading: 0,
        streaming_sphere: [0.0, 0.0, 0.0, 500.0],
        quadtree,
    });
    leak(SceneWrapper {
        vtable: leak(SceneWrapperVTable {
            destructor: ForeignPtr::null(),
            raycast,
        }),
        scene,
    })
}

pub fn module(scenes: Vec<ForeignPtr<SceneWrapper>>) -> ForeignPtr<CollisionModule> {
    let manager = leak(SceneManager {
        vtable: ForeignPtr::null(),
        num_scenes: scenes.len() as i32,
        scenes: leak_slice(scenes),
        _pad: 0,
        streaming_sphere: [1.0, 2.0, 3.0, 4.0],
    });
    leak(CollisionModule {
        vtable: ForeignPtr::null(),
        scene_manager: manager,
        load_in_progress_counter: 0,
        _pad: 0,
        forced_streaming_sphere: [0.0; 4],
    })
}

// ---------------------------------------------------------------------------
// Drawing
// ---------------------------------------------------------------------------

/// Camera at the world origin looking down -Z.
pub fn camera() -> CameraInputs {
    let proj = Mat4::perspective_rh(60f32.to_radians(), VIEWPORT.x / VIEWPORT.y, 0.1, 1000.0);
    CameraInputs {
        view_proj: proj,
        proj,
        viewport_size: VIEWPORT,
    }
}

pub fn drawer() -> DebugDrawer<RecordingBackend> {
    DebugDrawer::new(RecordingBackend::new(), DrawerConfig::default())
}
