//! Write-once-per-frame staging buffers for instanced geometry.
//!
//! A [`DynamicBuffer`] wraps one batch type ([`MeshBatch`] or [`BoxBatch`])
//! and enforces the map/build/unmap lifecycle:
//!
//! 1. [`open`](DynamicBuffer::open) starts a new generation and discards the previous one
//! 2. instances are appended through [`builder`](DynamicBuffer::builder)
//! 3. [`close`](DynamicBuffer::close) finalizes the generation for the backend
//!
//! Opening a buffer that is already open is a logic error and panics.

use collscope_core::Matrix4x3;
use glam::{Vec3, Vec4};

use crate::config::DrawerConfig;
use crate::vertex::{BoxInstance, MeshDraw, MeshInstance};

/// Indexed triangle geometry that can be copied into a [`MeshBatch`].
///
/// Implementors are usually thin views over memory someone else owns; the
/// batch copies what it needs during [`MeshBatch::add`] and keeps no reference.
pub trait MeshGeometry {
    fn vertex_count(&self) -> usize;
    fn vertex(&self, index: usize) -> Vec3;
    fn primitive_count(&self) -> usize;
    fn primitive(&self, index: usize) -> [u32; 3];
}

/// Owned triangle list.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TriangleMesh {
    pub vertices: Vec<Vec3>,
    pub primitives: Vec<[u32; 3]>,
}

impl MeshGeometry for TriangleMesh {
    fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    fn vertex(&self, index: usize) -> Vec3 {
        self.vertices[index]
    }

    fn primitive_count(&self) -> usize {
        self.primitives.len()
    }

    fn primitive(&self, index: usize) -> [u32; 3] {
        self.primitives[index]
    }
}

/// Staged contents of a buffer for one generation.
pub trait BatchData {
    /// Drop all staged data, keeping allocations.
    fn clear(&mut self);
    fn is_empty(&self) -> bool;
}

/// A staging buffer with an explicit open/close lifecycle.
#[derive(Debug)]
pub struct DynamicBuffer<D> {
    label: &'static str,
    data: D,
    open: bool,
    generation: u64,
}

impl<D: BatchData> DynamicBuffer<D> {
    pub fn new(label: &'static str, data: D) -> Self {
        Self {
            label,
            data,
            open: false,
            generation: 0,
        }
    }

    /// Begin a new generation, replacing everything staged before.
    ///
    /// # Panics
    ///
    /// If the buffer is already open.
    pub fn open(&mut self) -> &mut D {
        assert!(
            !self.open,
            "dynamic buffer '{}' opened twice without closing",
            self.label
        );
        self.open = true;
        self.generation += 1;
        self.data.clear();
        log::trace!("{}: opened generation {}", self.label, self.generation);
        &mut self.data
    }

    /// The open builder, opening a new generation first if needed.
    pub fn open_or_continue(&mut self) -> &mut D {
        if self.open {
            &mut self.data
        } else {
            self.open()
        }
    }

    /// The open builder, if any.
    pub fn builder(&mut self) -> Option<&mut D> {
        self.open.then_some(&mut self.data)
    }

    /// Finalize the open generation. Closing a buffer that is not open is a no-op.
    pub fn close(&mut self) -> Option<&D> {
        if !self.open {
            return None;
        }
        self.open = false;
        log::trace!("{}: closed generation {}", self.label, self.generation);
        Some(&self.data)
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Data of the latest generation.
    pub fn data(&self) -> &D {
        &self.data
    }

    pub fn label(&self) -> &'static str {
        self.label
    }
}

// ---------------------------------------------------------------------------
// Mesh batch
// ---------------------------------------------------------------------------

/// Capacity limits of a [`MeshBatch`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct MeshCapacity {
    pub vertices: usize,
    pub primitives: usize,
    pub instances: usize,
}

impl From<&DrawerConfig> for MeshCapacity {
    fn from(config: &DrawerConfig) -> Self {
        Self {
            vertices: config.mesh_vertex_capacity,
            primitives: config.mesh_primitive_capacity,
            instances: config.mesh_instance_capacity,
        }
    }
}

/// Copied mesh geometry plus instances, grouped into per-mesh draws.
#[derive(Debug)]
pub struct MeshBatch {
    capacity: MeshCapacity,
    vertices: Vec<[f32; 3]>,
    primitives: Vec<[u32; 3]>,
    instances: Vec<MeshInstance>,
    draws: Vec<MeshDraw>,
    overflowed: bool,
}

impl MeshBatch {
    pub fn new(capacity: MeshCapacity) -> Self {
        Self {
            capacity,
            vertices: Vec::new(),
            primitives: Vec::new(),
            instances: Vec::new(),
            draws: Vec::new(),
            overflowed: false,
        }
    }

    /// Stage one instance of `mesh`.
    pub fn add(&mut self, mesh: &dyn MeshGeometry, world: &Matrix4x3, color: Vec4) -> bool {
        self.add_instances(mesh, &[MeshInstance::new(world, color)])
    }

    /// Stage `mesh` once and draw it with every instance in `instances`.
    ///
    /// Returns `false` (and stages nothing) when the batch capacity would be exceeded.
    pub fn add_instances(&mut self, mesh: &dyn MeshGeometry, instances: &[MeshInstance]) -> bool {
        if instances.is_empty() {
            return true;
        }
        let vertex_count = mesh.vertex_count();
        let primitive_count = mesh.primitive_count();
        if self.vertices.len() + vertex_count > self.capacity.vertices
            || self.primitives.len() + primitive_count > self.capacity.primitives
            || self.instances.len() + instances.len() > self.capacity.instances
        {
            if !self.overflowed {
                log::warn!(
                    "mesh batch full ({} vertices, {} primitives, {} instances); dropping geometry",
                    self.vertices.len(),
                    self.primitives.len(),
                    self.instances.len()
                );
                self.overflowed = true;
            }
            return false;
        }

        let draw = MeshDraw {
            first_vertex: self.vertices.len() as u32,
            first_primitive: self.primitives.len() as u32,
            primitive_count: primitive_count as u32,
            first_instance: self.instances.len() as u32,
            instance_count: instances.len() as u32,
        };
        self.vertices
            .extend((0..vertex_count).map(|i| mesh.vertex(i).to_array()));
        self.primitives
            .extend((0..primitive_count).map(|i| mesh.primitive(i)));
        self.instances.extend_from_slice(instances);
        self.draws.push(draw);
        true
    }

    /// Vertices of all staged meshes; primitive indices are relative to each draw's `first_vertex`.
    pub fn vertices(&self) -> &[[f32; 3]] {
        &self.vertices
    }

    pub fn primitives(&self) -> &[[u32; 3]] {
        &self.primitives
    }

    pub fn instances(&self) -> &[MeshInstance] {
        &self.instances
    }

    pub fn draws(&self) -> &[MeshDraw] {
        &self.draws
    }

    /// Whether anything was dropped for lack of capacity this generation.
    pub fn overflowed(&self) -> bool {
        self.overflowed
    }
}

impl BatchData for MeshBatch {
    fn clear(&mut self) {
        self.vertices.clear();
        self.primitives.clear();
        self.instances.clear();
        self.draws.clear();
        self.overflowed = false;
    }

    fn is_empty(&self) -> bool {
        self.draws.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Box batch
// ---------------------------------------------------------------------------

/// Instances of the unit cube.
#[derive(Debug)]
pub struct BoxBatch {
    capacity: usize,
    instances: Vec<BoxInstance>,
    overflowed: bool,
}

impl BoxBatch {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            instances: Vec::new(),
            overflowed: false,
        }
    }

    pub fn add(&mut self, world: &Matrix4x3, color_top: Vec4, color_side: Vec4) -> bool {
        if self.instances.len() >= self.capacity {
            if !self.overflowed {
                log::warn!("box batch full ({} instances); dropping boxes", self.capacity);
                self.overflowed = true;
            }
            return false;
        }
        self.instances
            .push(BoxInstance::new(world, color_top, color_side));
        true
    }

    pub fn instances(&self) -> &[BoxInstance] {
        &self.instances
    }

    pub fn overflowed(&self) -> bool {
        self.overflowed
    }
}

impl BatchData for BoxBatch {
    fn clear(&mut self) {
        self.instances.clear();
        self.overflowed = false;
    }

    fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }
}
