//! Immediate-mode tree contract used by the inspector.
//!
//! The inspector only talks to [`TreeUi`]; [`EguiTree`] renders it with egui
//! and [`ScriptedTree`] records it for tests.

mod egui_tree;
mod scripted;

use collscope_core::PackedColor;
use glam::Vec2;

pub use egui_tree::{EguiTree, TreeState};
pub use scripted::{RecordedRow, ScriptedTree};

/// One row of the tree.
#[derive(Debug, Clone, Copy)]
pub struct TreeRow<'a> {
    /// Key that identifies the row among its siblings; defaults to the label.
    pub key: Option<&'a str>,
    pub label: &'a str,
    pub color: PackedColor,
    /// Leaves cannot be expanded.
    pub leaf: bool,
}

impl<'a> TreeRow<'a> {
    pub fn node(label: &'a str) -> Self {
        Self {
            key: None,
            label,
            color: PackedColor::WHITE,
            leaf: false,
        }
    }

    pub fn leaf(label: &'a str) -> Self {
        Self {
            leaf: true,
            ..Self::node(label)
        }
    }

    pub fn key(mut self, key: &'a str) -> Self {
        self.key = Some(key);
        self
    }

    pub fn color(mut self, color: PackedColor) -> Self {
        self.color = color;
        self
    }

    /// Turn the row into a leaf when `leaf` is true.
    pub fn leaf_if(mut self, leaf: bool) -> Self {
        self.leaf |= leaf;
        self
    }

    pub fn id_key(&self) -> &'a str {
        self.key.unwrap_or(self.label)
    }
}

/// Interaction state of a row after it was drawn.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NodeState {
    /// Children should be emitted, followed by [`TreeUi::pop`].
    pub opened: bool,
    pub selected_or_hovered: bool,
}

pub trait TreeUi {
    /// Emit a row. When the returned state is `opened`, the caller emits the
    /// children and then calls [`pop`](Self::pop).
    fn node(&mut self, row: TreeRow<'_>) -> NodeState;

    fn pop(&mut self);

    /// Emit a plain leaf row.
    fn leaf(&mut self, label: &str) -> NodeState {
        self.node(TreeRow::leaf(label))
    }

    /// Returns `true` when the value was changed this frame.
    fn checkbox(&mut self, label: &str, value: &mut bool) -> bool;

    fn text(&mut self, text: &str);

    /// Combo box whose popup is filled by `contents` while open.
    fn combo(&mut self, label: &str, preview: &str, contents: &mut dyn FnMut(&mut dyn TreeUi));

    /// Context menu of the last emitted row, filled by `contents` while open.
    fn context_menu(&mut self, contents: &mut dyn FnMut(&mut dyn TreeUi));

    /// Mouse position in screen coordinates, if the pointer is known.
    fn pointer_position(&self) -> Option<Vec2>;
}

/// Emit a row and, if it is open, its children.
pub fn subtree(
    tree: &mut dyn TreeUi,
    row: TreeRow<'_>,
    children: impl FnOnce(&mut dyn TreeUi),
) -> NodeState {
    let state = tree.node(row);
    if state.opened {
        children(tree);
        tree.pop();
    }
    state
}
