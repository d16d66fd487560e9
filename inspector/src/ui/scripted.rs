use collscope_core::PackedColor;
use glam::Vec2;

use super::{NodeState, TreeRow, TreeUi};

/// A row as seen by [`ScriptedTree`].
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRow {
    /// Keys of the ancestors and the row itself, joined by `/`.
    pub path: String,
    pub label: String,
    pub color: PackedColor,
    pub leaf: bool,
    pub depth: usize,
    pub opened: bool,
    pub selected_or_hovered: bool,
}

/// [`TreeUi`] driven by a script instead of a user, recording everything it is given.
///
/// Rows are matched by label prefix: a node whose label starts with one of
/// the `expand` prefixes is opened, one matching a `hover` prefix reports
/// itself as hovered. Combo popups are always open.
#[derive(Debug, Default)]
pub struct ScriptedTree {
    pub rows: Vec<RecordedRow>,
    pub texts: Vec<String>,
    pub checkboxes: Vec<String>,
    /// `(label, preview)` of every combo.
    pub combos: Vec<(String, String)>,
    pub pointer: Option<Vec2>,
    expand_all: bool,
    expand: Vec<String>,
    hover: Vec<String>,
    checks: Vec<(String, bool)>,
    context_menus: Vec<String>,
    stack: Vec<String>,
    last_row: Option<String>,
}

impl ScriptedTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn expand_all(mut self) -> Self {
        self.expand_all = true;
        self
    }

    pub fn expand(mut self, prefix: &str) -> Self {
        self.expand.push(prefix.to_owned());
        self
    }

    pub fn hover(mut self, prefix: &str) -> Self {
        self.hover.push(prefix.to_owned());
        self
    }

    /// Force the checkbox with this exact label to `value`.
    pub fn check(mut self, label: &str, value: bool) -> Self {
        self.checks.push((label.to_owned(), value));
        self
    }

    /// Open the context menu of rows whose label starts with `prefix`.
    pub fn open_context_menu(mut self, prefix: &str) -> Self {
        self.context_menus.push(prefix.to_owned());
        self
    }

    pub fn pointer_at(mut self, pointer: Vec2) -> Self {
        self.pointer = Some(pointer);
        self
    }

    /// First row whose label starts with `prefix`.
    pub fn find(&self, prefix: &str) -> Option<&RecordedRow> {
        self.rows.iter().find(|r| r.label.starts_with(prefix))
    }

    pub fn rows_starting_with(&self, prefix: &str) -> Vec<&RecordedRow> {
        self.rows
            .iter()
            .filter(|r| r.label.starts_with(prefix))
            .collect()
    }

    fn matches(patterns: &[String], label: &str) -> bool {
        patterns.iter().any(|p| label.starts_with(p.as_str()))
    }
}

impl TreeUi for ScriptedTree {
    fn node(&mut self, row: TreeRow<'_>) -> NodeState {
        let mut path = self.stack.join("/");
        if !path.is_empty() {
            path.push('/');
        }
        path.push_str(row.id_key());

        let opened = !row.leaf && (self.expand_all || Self::matches(&self.expand, row.label));
        let selected_or_hovered = Self::matches(&self.hover, row.label);
        self.rows.push(RecordedRow {
            path,
            label: row.label.to_owned(),
            color: row.color,
            leaf: row.leaf,
            depth: self.stack.len(),
            opened,
            selected_or_hovered,
        });
        self.last_row = Some(row.label.to_owned());
        if opened {
            self.stack.push(row.id_key().to_owned());
        }
        NodeState {
            opened,
            selected_or_hovered,
        }
    }

    fn pop(&mut self) {
        self.stack.pop();
    }

    fn checkbox(&mut self, label: &str, value: &mut bool) -> bool {
        self.checkboxes.push(label.to_owned());
        match self.checks.iter().find(|(l, _)| l == label) {
            Some(&(_, wanted)) if wanted != *value => {
                *value = wanted;
                true
            }
            _ => false,
        }
    }

    fn text(&mut self, text: &str) {
        self.texts.push(text.to_owned());
    }

    fn combo(&mut self, label: &str, preview: &str, contents: &mut dyn FnMut(&mut dyn TreeUi)) {
        self.combos.push((label.to_owned(), preview.to_owned()));
        contents(self);
    }

    fn context_menu(&mut self, contents: &mut dyn FnMut(&mut dyn TreeUi)) {
        let open = self
            .last_row
            .as_deref()
            .is_some_and(|label| Self::matches(&self.context_menus, label));
        if open {
            contents(self);
        }
    }

    fn pointer_position(&self) -> Option<Vec2> {
        self.pointer
    }
}
