use std::collections::HashSet;

use collscope_core::PackedColor;
use glam::Vec2;

use super::{NodeState, TreeRow, TreeUi};

/// Indentation per tree level, in points.
const INDENT: f32 = 16.0;

/// Expand / select state of the tree, kept across frames by the host.
#[derive(Debug, Default)]
pub struct TreeState {
    expanded: HashSet<egui::Id>,
    selected: Option<egui::Id>,
}

impl TreeState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_expanded(&self, id: egui::Id) -> bool {
        self.expanded.contains(&id)
    }

    pub fn toggle_expanded(&mut self, id: egui::Id) {
        if !self.expanded.remove(&id) {
            self.expanded.insert(id);
        }
    }

    pub fn selected(&self) -> Option<egui::Id> {
        self.selected
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
    }
}

fn to_color32(color: PackedColor) -> egui::Color32 {
    egui::Color32::from_rgba_unmultiplied(color.r(), color.g(), color.b(), color.a())
}

/// [`TreeUi`] over an egui `Ui`.
///
/// Rows are laid out flat with an indent per depth; row ids are derived from
/// the keys of all ancestors so identical labels under different parents
/// keep separate expand state.
pub struct EguiTree<'a> {
    ui: &'a mut egui::Ui,
    state: &'a mut TreeState,
    ids: Vec<egui::Id>,
    last_response: Option<egui::Response>,
}

impl<'a> EguiTree<'a> {
    pub fn new(ui: &'a mut egui::Ui, state: &'a mut TreeState) -> Self {
        Self {
            ui,
            state,
            ids: vec![egui::Id::new("collscope_tree")],
            last_response: None,
        }
    }

    fn depth(&self) -> usize {
        self.ids.len() - 1
    }

    fn parent_id(&self) -> egui::Id {
        self.ids
            .last()
            .copied()
            .unwrap_or_else(|| egui::Id::new("collscope_tree"))
    }
}

impl TreeUi for EguiTree<'_> {
    fn node(&mut self, row: TreeRow<'_>) -> NodeState {
        let id = self.parent_id().with(row.id_key());
        let expanded = !row.leaf && self.state.is_expanded(id);
        let selected = self.state.selected == Some(id);

        let mut text = egui::RichText::new(row.label);
        if row.color != PackedColor::WHITE {
            text = text.color(to_color32(row.color));
        }
        let indent = INDENT * self.depth() as f32;

        let mut toggled = false;
        let response = self
            .ui
            .horizontal(|ui| {
                ui.add_space(indent);
                if row.leaf {
                    ui.add_space(20.0); // width of the toggle button
                } else {
                    let toggle_text = if expanded { "v" } else { ">" };
                    toggled = ui.small_button(toggle_text).clicked();
                }
                ui.add(egui::Button::selectable(selected, text))
            })
            .inner;

        if toggled {
            self.state.toggle_expanded(id);
        }
        if response.clicked() {
            self.state.selected = if selected { None } else { Some(id) };
        }

        let opened = !row.leaf && self.state.is_expanded(id);
        if opened {
            self.ids.push(id);
        }
        let state = NodeState {
            opened,
            selected_or_hovered: selected || response.hovered(),
        };
        self.last_response = Some(response);
        state
    }

    fn pop(&mut self) {
        if self.ids.len() > 1 {
            self.ids.pop();
        }
    }

    fn checkbox(&mut self, label: &str, value: &mut bool) -> bool {
        let response = self.ui.checkbox(value, label);
        let changed = response.changed();
        self.last_response = Some(response);
        changed
    }

    fn text(&mut self, text: &str) {
        self.last_response = Some(self.ui.label(text));
    }

    fn combo(&mut self, label: &str, preview: &str, contents: &mut dyn FnMut(&mut dyn TreeUi)) {
        let state = &mut *self.state;
        let ids = self.ids.clone();
        let response = egui::ComboBox::from_label(label)
            .selected_text(preview)
            .show_ui(self.ui, |ui| {
                contents(&mut EguiTree {
                    ui,
                    state,
                    ids,
                    last_response: None,
                });
            })
            .response;
        self.last_response = Some(response);
    }

    fn context_menu(&mut self, contents: &mut dyn FnMut(&mut dyn TreeUi)) {
        let Some(response) = self.last_response.take() else {
            return;
        };
        let state = &mut *self.state;
        let ids = self.ids.clone();
        response.context_menu(|ui| {
            contents(&mut EguiTree {
                ui,
                state,
                ids,
                last_response: None,
            });
        });
        self.last_response = Some(response);
    }

    fn pointer_position(&self) -> Option<Vec2> {
        self.ui
            .ctx()
            .pointer_latest_pos()
            .map(|p| Vec2::new(p.x, p.y))
    }
}
