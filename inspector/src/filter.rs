//! Which colliders are listed.
//!
//! Filters only decide what can be browsed in the tree. Anything that is
//! hovered or selected is still visualized, whether it passes or not.

use std::collections::HashSet;

use collscope_core::BitMask;

use crate::layout::{ColliderHeader, VisibilityFlags};
use crate::scene::{ColliderShape, SceneView};

/// Interactive filter settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterState {
    pub shown_layers: BitMask,
    pub required_materials: BitMask,
    pub require_raycast_flag: bool,
    pub require_global_visit_flag: bool,
    pub show_zero_layer: bool,
}

impl Default for FilterState {
    fn default() -> Self {
        Self {
            shown_layers: BitMask::ALL,
            required_materials: BitMask::NONE,
            require_raycast_flag: false,
            require_global_visit_flag: false,
            show_zero_layer: true,
        }
    }
}

impl FilterState {
    /// Required material bits that some collider actually has.
    pub fn effective_material_filter(&self, available_materials: BitMask) -> BitMask {
        self.required_materials & available_materials
    }

    pub fn is_eligible(&self, header: &ColliderHeader, available_materials: BitMask) -> bool {
        let layer_ok = if header.layer_mask == 0 {
            self.show_zero_layer
        } else {
            self.shown_layers.intersects(header.layer_mask)
        };
        if !layer_ok {
            return false;
        }
        let flags = header.flags();
        if self.require_raycast_flag && !flags.contains(VisibilityFlags::RAYCAST) {
            return false;
        }
        if self.require_global_visit_flag && !flags.contains(VisibilityFlags::GLOBAL_VISIT) {
            return false;
        }
        let materials = self.effective_material_filter(available_materials);
        materials.none() || materials.intersects(header.material_value)
    }

    /// Preview of the "Shown layers" combo.
    pub fn layers_preview(&self, available_layers: BitMask) -> String {
        let shown = available_layers & self.shown_layers;
        if shown == available_layers {
            "All".to_owned()
        } else if shown.none() {
            "None".to_owned()
        } else {
            shown.to_string()
        }
    }

    /// Preview of the "Material filter" combo.
    pub fn materials_preview(&self, available_materials: BitMask) -> String {
        let filter = self.effective_material_filter(available_materials);
        if filter.none() {
            "None".to_owned()
        } else {
            format!("{:X}", filter.0)
        }
    }

    /// Preview of the "Flag filter" combo.
    pub fn flags_preview(&self) -> &'static str {
        match (self.require_raycast_flag, self.require_global_visit_flag) {
            (true, true) => "Only when both flags are set",
            (true, false) => "Only if raycast flag is set",
            (false, true) => "Only if global visit flag is set",
            (false, false) => "Show everything",
        }
    }
}

/// Human-readable visibility flags of a collider row.
pub fn flags_text(flags: VisibilityFlags) -> &'static str {
    match (
        flags.contains(VisibilityFlags::RAYCAST),
        flags.contains(VisibilityFlags::GLOBAL_VISIT),
    ) {
        (true, true) => "raycast, global visit",
        (true, false) => "raycast",
        (false, true) => "global visit",
        (false, false) => "none",
    }
}

/// Facts collected over every scene once per frame, before anything is listed.
#[derive(Debug, Clone, Default)]
pub struct SceneSummary {
    pub available_layers: BitMask,
    pub available_materials: BitMask,
    /// Addresses of meshes that belong to a streamed collider.
    pub streamed_meshes: HashSet<usize>,
}

impl SceneSummary {
    pub fn gather(scenes: &[SceneView]) -> Self {
        let mut summary = Self::default();
        for scene in scenes {
            for collider in scene.colliders() {
                let header = collider.header();
                summary.available_layers |= BitMask(header.layer_mask);
                summary.available_materials |= BitMask(header.material_value);
                if let ColliderShape::Streamed(streamed) = collider.shape() {
                    summary.streamed_meshes.extend(
                        streamed
                            .sub_meshes()
                            .iter()
                            .filter(|m| !m.mesh.is_null())
                            .map(|m| m.mesh.addr()),
                    );
                }
            }
        }
        log::trace!(
            "gathered layers={} materials={:X} streamed meshes={}",
            summary.available_layers,
            summary.available_materials.0,
            summary.streamed_meshes.len()
        );
        summary
    }

    pub fn is_streamed_mesh(&self, addr: usize) -> bool {
        self.streamed_meshes.contains(&addr)
    }
}
