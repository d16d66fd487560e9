//! Read access to mesh BVH nodes.
//!
//! A node is a [`FileNode`] header followed by its payload: raw vertices,
//! then compressed vertices, then primitives. Vertices of both encodings
//! share one index space: `i < num_verts_raw` is raw, anything above is
//! compressed.

use collscope_core::{Aabb, ForeignPtr};
use collscope_debug_drawer::MeshGeometry;
use glam::Vec3;

use crate::layout::{CompressedVertex, FileNode, Primitive, RawVertex};

/// Deepest recursion into a BVH before the walk gives up.
pub const MAX_BVH_DEPTH: usize = 64;

const COMPRESSED_RANGE: f32 = 65535.0;

/// Snapshot of one BVH node plus the address its payload is read from.
#[derive(Debug, Clone, Copy)]
pub struct BvhNode {
    ptr: ForeignPtr<FileNode>,
    node: FileNode,
}

impl BvhNode {
    /// Read the node at `ptr`. `None` for a null pointer.
    ///
    /// # Safety
    ///
    /// A non-null `ptr` must point to a readable node whose payload and
    /// children stay readable for as long as the returned view (or any node
    /// reached from it) is used.
    pub unsafe fn read(ptr: ForeignPtr<FileNode>) -> Option<Self> {
        // SAFETY: forwarded caller contract.
        let node = unsafe { ptr.read() }?;
        Some(Self { ptr, node })
    }

    pub fn ptr(&self) -> ForeignPtr<FileNode> {
        self.ptr
    }

    pub fn header(&self) -> u64 {
        self.node.header
    }

    pub fn local_bounds(&self) -> Aabb {
        self.node.local_bounds
    }

    pub fn num_verts_raw(&self) -> usize {
        self.node.num_verts_raw as usize
    }

    pub fn num_verts_compressed(&self) -> usize {
        self.node.num_verts_compressed as usize
    }

    pub fn num_prims(&self) -> usize {
        self.node.num_prims as usize
    }

    pub fn child1_offset(&self) -> u32 {
        self.node.child1_offset
    }

    pub fn child2_offset(&self) -> u32 {
        self.node.child2_offset
    }

    pub fn child1(&self) -> Option<BvhNode> {
        self.child_at(self.node.child1_offset)
    }

    pub fn child2(&self) -> Option<BvhNode> {
        self.child_at(self.node.child2_offset)
    }

    fn child_at(&self, offset: u32) -> Option<BvhNode> {
        if offset == 0 {
            return None;
        }
        // SAFETY: children are covered by the contract of `read`.
        unsafe { BvhNode::read(self.ptr.byte_offset(offset as usize)) }
    }

    /// Whether vertex `index` is stored uncompressed.
    pub fn is_raw(&self, index: usize) -> bool {
        index < self.num_verts_raw()
    }

    /// Vertex in node-local space, `None` past the end.
    pub fn vertex(&self, index: usize) -> Option<Vec3> {
        let raw = self.num_verts_raw();
        if index < raw {
            let base = self.ptr.byte_offset::<RawVertex>(size_of::<FileNode>());
            // SAFETY: within the payload covered by the contract of `read`.
            return unsafe { base.element(index).read() }.map(Vec3::from_array);
        }
        if index >= self.vertex_total() {
            return None;
        }
        let base = self
            .ptr
            .byte_offset::<CompressedVertex>(size_of::<FileNode>() + raw * size_of::<RawVertex>());
        // SAFETY: as above.
        let c = unsafe { base.element(index - raw).read() }?;
        Some(decompress(&self.node.local_bounds, c))
    }

    /// Primitive `index`, `None` past the end.
    pub fn primitive(&self, index: usize) -> Option<Primitive> {
        if index >= self.num_prims() {
            return None;
        }
        let offset = size_of::<FileNode>()
            + self.num_verts_raw() * size_of::<RawVertex>()
            + self.num_verts_compressed() * size_of::<CompressedVertex>();
        let base = self.ptr.byte_offset::<Primitive>(offset);
        // SAFETY: within the payload covered by the contract of `read`.
        unsafe { base.element(index).read() }
    }

    /// Local-space corners of primitive `index`.
    pub fn triangle(&self, index: usize) -> Option<[Vec3; 3]> {
        let prim = self.primitive(index)?;
        Some([
            self.vertex(prim.v1 as usize)?,
            self.vertex(prim.v2 as usize)?,
            self.vertex(prim.v3 as usize)?,
        ])
    }

    fn vertex_total(&self) -> usize {
        self.num_verts_raw() + self.num_verts_compressed()
    }
}

/// Decode a vertex quantized over `bounds`.
pub fn decompress(bounds: &Aabb, c: CompressedVertex) -> Vec3 {
    let t = Vec3::new(c[0] as f32, c[1] as f32, c[2] as f32) / COMPRESSED_RANGE;
    bounds.min + (bounds.max - bounds.min) * t
}

impl MeshGeometry for BvhNode {
    fn vertex_count(&self) -> usize {
        self.vertex_total()
    }

    fn vertex(&self, index: usize) -> Vec3 {
        BvhNode::vertex(self, index).unwrap_or(Vec3::ZERO)
    }

    fn primitive_count(&self) -> usize {
        self.num_prims()
    }

    fn primitive(&self, index: usize) -> [u32; 3] {
        let count = self.vertex_total();
        match BvhNode::primitive(self, index) {
            Some(p) if [p.v1, p.v2, p.v3].iter().all(|&v| (v as usize) < count) => {
                [p.v1 as u32, p.v2 as u32, p.v3 as u32]
            }
            // Degenerate triangle for indices outside the node.
            _ => [0, 0, 0],
        }
    }
}

/// Pre-order walk: node, then the subtree of child 1, then child 2.
///
/// `visit` receives each node and its depth (root = 0). Returns the number of
/// nodes visited. Subtrees deeper than [`MAX_BVH_DEPTH`] are skipped.
pub fn walk_preorder(root: &BvhNode, visit: &mut dyn FnMut(&BvhNode, usize)) -> usize {
    walk(root, 0, visit)
}

fn walk(node: &BvhNode, depth: usize, visit: &mut dyn FnMut(&BvhNode, usize)) -> usize {
    if depth >= MAX_BVH_DEPTH {
        log::warn!(
            "BVH at {:X} deeper than {MAX_BVH_DEPTH} levels; not descending further",
            node.ptr()
        );
        return 0;
    }
    visit(node, depth);
    let mut visited = 1;
    if let Some(child) = node.child1() {
        visited += walk(&child, depth + 1, visit);
    }
    if let Some(child) = node.child2() {
        visited += walk(&child, depth + 1, visit);
    }
    visited
}

/// Number of nodes in the tree rooted at `root`.
pub fn count_nodes(root: &BvhNode) -> usize {
    walk_preorder(root, &mut |_, _| {})
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node_bytes(
        bounds: Aabb,
        children: (u32, u32),
        raw: &[RawVertex],
        compressed: &[CompressedVertex],
        prims: &[Primitive],
    ) -> Vec<u8> {
        let header = FileNode {
            header: 0xC0FFEE,
            child1_offset: children.0,
            child2_offset: children.1,
            local_bounds: bounds,
            num_verts_compressed: compressed.len() as u16,
            num_prims: prims.len() as u16,
            num_verts_raw: raw.len() as u16,
            _pad: 0,
        };
        let mut bytes = bytemuck::bytes_of(&header).to_vec();
        bytes.extend_from_slice(bytemuck::cast_slice(raw));
        bytes.extend_from_slice(bytemuck::cast_slice(compressed));
        bytes.extend_from_slice(bytemuck::cast_slice(prims));
        bytes
    }

    fn unit_bounds() -> Aabb {
        Aabb::new(Vec3::ZERO, Vec3::new(2.0, 4.0, 8.0))
    }

    #[test]
    fn vertices_span_both_encodings() {
        let prims = [Primitive {
            v1: 0,
            v2: 1,
            v3: 2,
            _pad: 0,
            material: 0x40,
        }];
        let bytes = node_bytes(
            unit_bounds(),
            (0, 0),
            &[[1.0, 2.0, 3.0]],
            &[[0, 0, 0], [65535, 65535, 65535]],
            &prims,
        );
        let node = unsafe { BvhNode::read(ForeignPtr::from_ref(&bytes[0]).cast()) }.unwrap();

        assert_eq!(node.vertex_count(), 3);
        assert!(node.is_raw(0) && !node.is_raw(1));
        assert_eq!(BvhNode::vertex(&node, 0), Some(Vec3::new(1.0, 2.0, 3.0)));
        assert_eq!(BvhNode::vertex(&node, 1), Some(Vec3::ZERO));
        assert_eq!(BvhNode::vertex(&node, 2), Some(Vec3::new(2.0, 4.0, 8.0)));
        assert_eq!(BvhNode::vertex(&node, 3), None);

        assert_eq!(BvhNode::primitive(&node, 0), Some(prims[0]));
        assert_eq!(BvhNode::primitive(&node, 1), None);
        assert_eq!(MeshGeometry::primitive(&node, 0), [0, 1, 2]);
        assert_eq!(node.triangle(0).unwrap()[0], Vec3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn out_of_range_indices_become_degenerate() {
        let prims = [Primitive {
            v1: 0,
            v2: 9,
            v3: 1,
            _pad: 0,
            material: 0,
        }];
        let bytes = node_bytes(unit_bounds(), (0, 0), &[[0.0; 3], [1.0; 3]], &[], &prims);
        let node = unsafe { BvhNode::read(ForeignPtr::from_ref(&bytes[0]).cast()) }.unwrap();
        assert_eq!(MeshGeometry::primitive(&node, 0), [0, 0, 0]);
        assert!(node.triangle(0).is_none());
    }

    #[test]
    fn children_follow_byte_offsets() {
        // root -> (a -> (c), b)
        let leaf = |id| {
            let mut b = node_bytes(unit_bounds(), (0, 0), &[], &[], &[]);
            b[0] = id;
            b
        };
        let c = leaf(3);
        let b = leaf(2);
        let node_len = size_of::<FileNode>() as u32;
        let mut a = node_bytes(unit_bounds(), (node_len, 0), &[], &[], &[]);
        a[0] = 1;
        let mut root = node_bytes(unit_bounds(), (node_len, 3 * node_len), &[], &[], &[]);
        root[0] = 0;

        let mut bytes = root;
        bytes.extend(a);
        bytes.extend(c);
        bytes.extend(b);

        let node = unsafe { BvhNode::read(ForeignPtr::from_ref(&bytes[0]).cast()) }.unwrap();
        let mut order = Vec::new();
        let visited = walk_preorder(&node, &mut |n, depth| order.push((n.header() & 0xFF, depth)));
        assert_eq!(visited, 4);
        assert_eq!(order, vec![(0, 0), (1, 1), (3, 2), (2, 1)]);
        assert_eq!(count_nodes(&node), 4);
    }

    #[test]
    fn null_root_reads_none() {
        assert!(unsafe { BvhNode::read(ForeignPtr::null()) }.is_none());
    }

    #[test]
    fn overly_deep_chain_is_cut_off() {
        let node_len = size_of::<FileNode>() as u32;
        let mut bytes = Vec::new();
        for i in 0..(MAX_BVH_DEPTH + 8) {
            let mut n = node_bytes(unit_bounds(), (node_len, 0), &[], &[], &[]);
            n[0] = i as u8;
            bytes.extend(n);
        }
        // Terminate the chain.
        let last = (MAX_BVH_DEPTH + 7) * node_len as usize;
        bytes[last + 8..last + 12].copy_from_slice(&0u32.to_ne_bytes());

        let node = unsafe { BvhNode::read(ForeignPtr::from_ref(&bytes[0]).cast()) }.unwrap();
        assert_eq!(count_nodes(&node), MAX_BVH_DEPTH);
    }
}
