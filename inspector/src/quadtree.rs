//! Leveled quadtree of a scene.
//!
//! Level `L` splits the tree extent into `2^L x 2^L` cells. Nodes of all
//! levels are stored back to back, coarsest first, so level `L` starts at
//! `(4^L - 1) / 3`. Inside a level, a cell's node index is the Morton code of
//! its coordinates: bits of `x` on even positions, bits of `z` on odd ones.
//!
//! [`QuadtreeView::cells`] lists cells in that storage (Morton) order, not
//! row-major `(x, z)` order: on level 1 the sequence is `(0,0) (1,0) (0,1)
//! (1,1)`, and on level 2 `(2,0)` comes after `(1,1)`.

use collscope_core::ForeignPtr;

use crate::layout::{ColliderHeader, ColliderLink, Quadtree, QuadtreeNode};
use crate::scene::clamp_count;

/// Levels beyond this are not listed.
pub const MAX_QUADTREE_LEVELS: usize = 10;

/// Cap on the length of a cell's collider list.
pub const MAX_LINKED_COLLIDERS: usize = 65536;

pub fn num_nodes_at_level(level: u32) -> usize {
    1 << (2 * level)
}

pub fn starting_node_for_level(level: u32) -> usize {
    (num_nodes_at_level(level) - 1) / 3
}

/// Spread the low 16 bits of `v` onto the even bit positions.
fn spread_bits(v: u32) -> u32 {
    let mut v = v & 0xFFFF;
    v = (v | (v << 8)) & 0x00FF_00FF;
    v = (v | (v << 4)) & 0x0F0F_0F0F;
    v = (v | (v << 2)) & 0x3333_3333;
    (v | (v << 1)) & 0x5555_5555
}

/// Gather the even bit positions of `v` into the low 16 bits.
fn compact_bits(v: u32) -> u32 {
    let mut v = v & 0x5555_5555;
    v = (v | (v >> 1)) & 0x3333_3333;
    v = (v | (v >> 2)) & 0x0F0F_0F0F;
    v = (v | (v >> 4)) & 0x00FF_00FF;
    (v | (v >> 8)) & 0xFFFF
}

/// Node index within a level of the cell at `(x, z)`.
pub fn cell_index(x: u32, z: u32) -> u32 {
    spread_bits(x) | (spread_bits(z) << 1)
}

/// Cell coordinates `(x, z)` of the node at `index` within a level.
pub fn cell_coords(index: u32) -> (u32, u32) {
    (compact_bits(index), compact_bits(index >> 1))
}

/// One level of the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelInfo {
    pub level: u32,
    pub cell_size_x: i32,
    pub cell_size_z: i32,
    pub first_node: usize,
    pub node_count: usize,
}

/// A cell together with its world-space XZ rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellInfo {
    pub index: usize,
    pub x: u32,
    pub z: u32,
    pub min_x: i32,
    pub min_z: i32,
    pub max_x: i32,
    pub max_z: i32,
    pub first_link: ForeignPtr<ColliderLink>,
}

impl CellInfo {
    pub fn is_empty(&self) -> bool {
        self.first_link.is_null()
    }
}

/// Snapshot of a scene's quadtree.
#[derive(Debug, Clone, Copy)]
pub struct QuadtreeView {
    ptr: ForeignPtr<Quadtree>,
    tree: Quadtree,
}

impl QuadtreeView {
    /// # Safety
    ///
    /// A non-null `ptr` must point to a readable quadtree whose node storage
    /// and collider links stay readable while the view is used.
    pub unsafe fn read(ptr: ForeignPtr<Quadtree>) -> Option<Self> {
        // SAFETY: forwarded caller contract.
        let tree = unsafe { ptr.read() }?;
        Some(Self { ptr, tree })
    }

    pub fn ptr(&self) -> ForeignPtr<Quadtree> {
        self.ptr
    }

    pub fn raw(&self) -> &Quadtree {
        &self.tree
    }

    /// Level count, clamped to [`MAX_QUADTREE_LEVELS`].
    pub fn num_levels(&self) -> usize {
        clamp_count(
            "quadtree levels",
            self.tree.num_levels as i64,
            MAX_QUADTREE_LEVELS,
        )
    }

    pub fn level(&self, level: u32) -> LevelInfo {
        let extent_x = self.tree.max_x as i64 - self.tree.min_x as i64 + 1;
        let extent_z = self.tree.max_z as i64 - self.tree.min_z as i64 + 1;
        LevelInfo {
            level,
            cell_size_x: (extent_x / (1i64 << level)) as i32,
            cell_size_z: (extent_z / (1i64 << level)) as i32,
            first_node: starting_node_for_level(level),
            node_count: num_nodes_at_level(level),
        }
    }

    /// Cells of a level in storage order. Nodes past the tree's node count are omitted.
    pub fn cells(&self, level: &LevelInfo) -> Vec<CellInfo> {
        let stored = self.tree.num_nodes.max(0) as usize;
        let available = stored.saturating_sub(level.first_node).min(level.node_count);
        if available < level.node_count {
            log::warn!(
                "quadtree {:X}: level {} needs {} nodes, only {} stored",
                self.ptr,
                level.level,
                level.node_count,
                available
            );
        }
        (0..available)
            .map(|i| {
                let node_ptr = self.tree.nodes.element(level.first_node + i);
                // SAFETY: index below the stored node count; readable per the `read` contract.
                let node: QuadtreeNode = unsafe { node_ptr.read() }.unwrap_or_default();
                let (x, z) = cell_coords(i as u32);
                let min_x = self.tree.min_x + x as i32 * level.cell_size_x;
                let min_z = self.tree.min_z + z as i32 * level.cell_size_z;
                CellInfo {
                    index: i,
                    x,
                    z,
                    min_x,
                    min_z,
                    max_x: min_x + level.cell_size_x,
                    max_z: min_z + level.cell_size_z,
                    first_link: node.first_link,
                }
            })
            .collect()
    }

    /// Colliders linked from a cell, in list order.
    pub fn colliders(&self, cell: &CellInfo) -> Vec<ForeignPtr<ColliderHeader>> {
        // SAFETY: links are covered by the `read` contract.
        unsafe { linked_colliders(cell.first_link) }
    }
}

/// Follow a collider list, stopping after [`MAX_LINKED_COLLIDERS`] links.
///
/// # Safety
///
/// Every link reachable from `first` must be readable.
pub unsafe fn linked_colliders(first: ForeignPtr<ColliderLink>) -> Vec<ForeignPtr<ColliderHeader>> {
    let mut colliders = Vec::new();
    let mut current = first;
    while !current.is_null() {
        if colliders.len() == MAX_LINKED_COLLIDERS {
            log::warn!(
                "collider list at {first:X} longer than {MAX_LINKED_COLLIDERS}; truncated"
            );
            break;
        }
        // SAFETY: forwarded caller contract.
        let Some(link) = (unsafe { current.read() }) else {
            break;
        };
        if !link.collider.is_null() {
            colliders.push(link.collider);
        }
        current = link.next;
    }
    colliders
}
