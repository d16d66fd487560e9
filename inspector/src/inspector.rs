//! The collision inspector panel.
//!
//! Each frame [`CollisionInspector::draw`] walks the host's scenes into a
//! [`TreeUi`]. What is listed is decided by the [`FilterState`]. What is
//! drawn into the [`Frame`] is decided by hover and selection alone.

use collscope_core::{BitMask, ForeignPtr, Matrix4x3, PackedColor};
use collscope_debug_drawer::{Frame, RenderBackend};
use glam::{Vec3, Vec4};

use crate::bvh::{BvhNode, MAX_BVH_DEPTH};
use crate::config::InspectorConfig;
use crate::error::HookError;
use crate::filter::{FilterState, SceneSummary, flags_text};
use crate::layout::{
    ColliderHeader, ColliderTransform, CollisionModule, Resource, VisibilityFlags,
};
use crate::quadtree::QuadtreeView;
use crate::raycast::{HookInstaller, RaycastHook, cast_ray, mouse_ray};
use crate::scene::{ColliderShape, ColliderView, MeshView, ModuleView, SceneView, StreamedView};
use crate::ui::{TreeRow, TreeUi, subtree};
use crate::visualize::{
    BOUNDS_COLOR, NODE_COLOR, collider_color, mesh_status_color, visualize_bvh,
    visualize_collider, visualize_mesh, visualize_obb, visualize_sphere, visualize_triangle,
    visualize_vertex,
};

/// Thickness of the raycast hit triangle outline.
const HIT_TRIANGLE_THICKNESS: f32 = 2.0;

fn vec3_str(v: Vec3) -> String {
    format!("[{:.3}, {:.3}, {:.3}]", v.x, v.y, v.z)
}

fn sphere_str(s: Vec4) -> String {
    format!("[{:.3}, {:.3}, {:.3}] R{:.3}", s.x, s.y, s.z, s.w)
}

fn aabb_str(min: Vec3, max: Vec3) -> String {
    format!("{} - {}", vec3_str(min), vec3_str(max))
}

pub struct CollisionInspector {
    module: ForeignPtr<CollisionModule>,
    config: InspectorConfig,
    filter: FilterState,
    summary: SceneSummary,
    raycast_hook: Option<RaycastHook>,
}

impl CollisionInspector {
    /// Create the inspector and hook the raycast entry point of the first
    /// scene that has one. A failed hook only hides the "Log raycasts" toggle.
    ///
    /// # Safety
    ///
    /// `module` must be the host's collision module. The scene graph
    /// reachable from it must stay readable, and colliders writable, for as
    /// long as the inspector is drawn; scene raycast entry points must be
    /// callable from the frame thread.
    pub unsafe fn new(
        module: ForeignPtr<CollisionModule>,
        config: InspectorConfig,
        installer: &mut dyn HookInstaller,
    ) -> Self {
        let raycast_hook = match Self::install_hook(module, installer, config.raycast_log_capacity)
        {
            Ok(hook) => Some(hook),
            Err(e) => {
                log::warn!("raycast logging unavailable: {e}");
                None
            }
        };
        Self {
            module,
            config,
            filter: FilterState::default(),
            summary: SceneSummary::default(),
            raycast_hook,
        }
    }

    fn install_hook(
        module: ForeignPtr<CollisionModule>,
        installer: &mut dyn HookInstaller,
        log_capacity: usize,
    ) -> Result<RaycastHook, HookError> {
        // SAFETY: covered by the contract of `new`.
        let view = unsafe { ModuleView::read(module) }.ok_or(HookError::NoEntryPoint)?;
        let target = view
            .scenes()
            .iter()
            .find_map(SceneView::raycast_fn)
            .ok_or(HookError::NoEntryPoint)?;
        RaycastHook::install(target, installer, log_capacity)
    }

    pub fn config(&self) -> &InspectorConfig {
        &self.config
    }

    pub fn filter(&self) -> &FilterState {
        &self.filter
    }

    pub fn filter_mut(&mut self) -> &mut FilterState {
        &mut self.filter
    }

    /// Facts gathered by the last [`draw`](Self::draw).
    pub fn summary(&self) -> &SceneSummary {
        &self.summary
    }

    pub fn raycast_hook(&self) -> Option<&RaycastHook> {
        self.raycast_hook.as_ref()
    }

    /// Whether the "Log raycasts" toggle is offered.
    pub fn can_log_raycasts(&self) -> bool {
        self.raycast_hook.is_some()
    }

    /// List the module into `tree` and visualize whatever is hovered or selected.
    pub fn draw<B: RenderBackend>(&mut self, tree: &mut dyn TreeUi, frame: &mut Frame<'_, B>) {
        self.draw_raycast_log(tree);

        // SAFETY: covered by the contract of `new`.
        let Some(module) = (unsafe { ModuleView::read(self.module) }) else {
            tree.text("Module: null");
            return;
        };
        tree.text(&format!(
            "Module: {:X}->{:X} ({} scenes, {} loads)",
            module.ptr(),
            module.manager_ptr(),
            module.num_scenes(),
            module.load_in_progress()
        ));
        tree.text(&format!(
            "Streaming: {} / {}",
            sphere_str(module.forced_streaming_sphere()),
            module
                .manager_streaming_sphere()
                .map_or_else(|| "null".to_owned(), sphere_str)
        ));

        let scenes = module.scenes();
        self.summary = SceneSummary::gather(&scenes);
        draw_settings(tree, &mut self.filter, &self.summary);

        let mut traversal = Traversal {
            filter: &self.filter,
            summary: &self.summary,
            config: &self.config,
            frame,
        };
        for scene in &scenes {
            traversal.scene_colliders(tree, scene);
            traversal.scene_quadtree(tree, scene);
            traversal.scene_raycasts(tree, scene);
        }
    }

    fn draw_raycast_log(&mut self, tree: &mut dyn TreeUi) {
        let Some(hook) = self.raycast_hook.as_mut() else {
            return;
        };
        let mut enabled = hook.is_enabled();
        if tree.checkbox("Log raycasts", &mut enabled)
            && let Err(e) = hook.set_enabled(enabled)
        {
            log::warn!("raycast logging unavailable: {e}");
            self.raycast_hook = None;
            return;
        }

        let recent = hook.recent();
        let label = format!("Intercepted raycasts: {}", hook.calls());
        subtree(
            tree,
            TreeRow::node(&label)
                .key("raycast_log")
                .leaf_if(recent.is_empty()),
            |tree| {
                for record in recent.iter().rev() {
                    tree.leaf(&format!("Raycast: {record}"));
                }
            },
        );
    }
}

fn draw_settings(tree: &mut dyn TreeUi, filter: &mut FilterState, summary: &SceneSummary) {
    subtree(tree, TreeRow::node("Settings"), |tree| {
        tree.checkbox("Show objects with zero layer", &mut filter.show_zero_layer);

        let preview = filter.layers_preview(summary.available_layers);
        tree.combo("Shown layers", &preview, &mut |tree| {
            for i in summary.available_layers.set_bits() {
                let mut shown = filter.shown_layers.get(i);
                if tree.checkbox(&format!("Layer {i}"), &mut shown) {
                    filter.shown_layers.set(i, shown);
                }
            }
        });

        let preview = filter.materials_preview(summary.available_materials);
        tree.combo("Material filter", &preview, &mut |tree| {
            for i in summary.available_materials.set_bits() {
                let mut required = filter.required_materials.get(i);
                if tree.checkbox(&format!("Material {:016X}", 1u64 << i), &mut required) {
                    filter.required_materials.set(i, required);
                }
            }
        });

        let preview = filter.flags_preview();
        tree.combo("Flag filter", preview, &mut |tree| {
            tree.checkbox(
                "Hide objects without raycast flag (0x1)",
                &mut filter.require_raycast_flag,
            );
            tree.checkbox(
                "Hide objects without global visit flag (0x2)",
                &mut filter.require_global_visit_flag,
            );
        });
    });
}

/// Layer and flag toggles of a collider's context menu. These are the only
/// writes into host memory.
fn collider_context_menu(tree: &mut dyn TreeUi, collider: &ColliderView, available_layers: BitMask) {
    let mut active = BitMask(collider.header().layer_mask);
    for i in available_layers.set_bits() {
        let mut on = active.get(i);
        if tree.checkbox(&format!("Layer {i}"), &mut on) {
            active.set(i, on);
            // SAFETY: colliders are writable per the contract of `CollisionInspector::new`.
            if !unsafe { collider.set_layer_mask(active.0) } {
                log::warn!("collider {:X}: layer mask not written", collider.ptr());
            }
        }
    }

    for (label, flag) in [
        ("Flag: raycast", VisibilityFlags::RAYCAST),
        ("Flag: global visit", VisibilityFlags::GLOBAL_VISIT),
    ] {
        let mut set = collider.flags().contains(flag);
        // SAFETY: as above.
        if tree.checkbox(label, &mut set) && !unsafe { collider.toggle_flag(flag) } {
            log::warn!("collider {:X}: flag not written", collider.ptr());
        }
    }
}

fn transform_rows(tree: &mut dyn TreeUi, transform: &ColliderTransform, radius: Option<f32>) {
    tree.leaf(&format!("Translation: {}", vec3_str(transform.translation)));
    tree.leaf(&format!("Rotation: {}", vec3_str(transform.rotation)));
    tree.leaf(&format!("Scale: {}", vec3_str(transform.scale)));
    if let Some(radius) = radius {
        tree.leaf(&format!("Radius: {radius:.3}"));
    }
    matrix_rows(tree, "World", &transform.world);
    matrix_rows(tree, "InvWorld", &transform.inv_world);
}

fn matrix_rows(tree: &mut dyn TreeUi, tag: &str, m: &Matrix4x3) {
    for (i, row) in [m.row0, m.row1, m.row2, m.row3].into_iter().enumerate() {
        tree.leaf(&format!("{tag} R{i}: {}", vec3_str(row)));
    }
}

fn resource_row(tree: &mut dyn TreeUi, ptr: ForeignPtr<Resource>, path: Option<String>) {
    match path {
        Some(path) => tree.leaf(&format!("Resource: {ptr:X} '{path}'")),
        None => tree.leaf("Resource: null"),
    };
}

/// One frame's walk over the scenes.
struct Traversal<'a, 'f, B: RenderBackend> {
    filter: &'a FilterState,
    summary: &'a SceneSummary,
    config: &'a InspectorConfig,
    frame: &'a mut Frame<'f, B>,
}

impl<B: RenderBackend> Traversal<'_, '_, B> {
    fn is_eligible(&self, header: &ColliderHeader) -> bool {
        self.filter
            .is_eligible(header, self.summary.available_materials)
    }

    fn scene_colliders(&mut self, tree: &mut dyn TreeUi, scene: &SceneView) {
        let index = scene.index();
        let label = format!(
            "Scene {index}: {} colliders, {} loading, streaming={}",
            scene.num_colliders(),
            scene.num_loading(),
            sphere_str(scene.streaming_sphere())
        );
        let key = format!("scene_{index}");
        let state = tree.node(TreeRow::node(&label).key(&key));

        if state.selected_or_hovered {
            for collider in scene.colliders() {
                if self.is_eligible(collider.header()) {
                    visualize_collider(self.frame, &collider, self.summary);
                }
            }
        }
        if !state.opened {
            return;
        }
        for ptr in scene.collider_ptrs() {
            // SAFETY: covered by the contract of `CollisionInspector::new`.
            match unsafe { ColliderView::read(ptr) } {
                Some(collider) => self.collider(tree, &collider),
                None => {
                    tree.leaf("Collider: null");
                }
            }
        }
        tree.pop();
    }

    /// Row of an eligible collider with its details; ineligible colliders are not listed.
    fn collider(&mut self, tree: &mut dyn TreeUi, collider: &ColliderView) {
        if !self.is_eligible(collider.header()) {
            return;
        }
        let header = collider.header();
        let label = format!(
            "{} {:X}, layers={:08X}, refs={}, material={:X}/{:X}, flags={}",
            collider.kind_name(),
            collider.addr(),
            header.layer_mask,
            header.num_refs,
            header.material_value,
            header.material_mask,
            flags_text(collider.flags())
        );
        let key = format!("{:X}", collider.addr());
        let color = collider_color(collider, self.summary);
        let state = tree.node(TreeRow::node(&label).key(&key).color(color));

        let available_layers = self.summary.available_layers;
        tree.context_menu(&mut |tree| collider_context_menu(tree, collider, available_layers));

        if state.selected_or_hovered {
            visualize_collider(self.frame, collider, self.summary);
        }
        if !state.opened {
            return;
        }

        tree.leaf(&format!("Raw flags: {:X}", header.visibility_flags));
        match collider.shape() {
            ColliderShape::Streamed(streamed) => self.streamed_details(tree, streamed),
            ColliderShape::Mesh(mesh) => self.mesh_details(tree, mesh),
            ColliderShape::Cylinder { transform, radius } => {
                transform_rows(tree, transform, Some(*radius));
            }
            ColliderShape::Box(transform)
            | ColliderShape::Sphere(transform)
            | ColliderShape::Plane { transform, .. } => transform_rows(tree, transform, None),
            ColliderShape::Unknown(kind) => {
                tree.leaf(&format!("Unknown collider kind {kind}"));
            }
        }
        tree.pop();
    }

    fn streamed_details(&mut self, tree: &mut dyn TreeUi, streamed: &StreamedView) {
        resource_row(tree, streamed.resource_ptr(), streamed.resource_path());
        match streamed.path() {
            Some((dir, file)) => tree.leaf(&format!("Path: {dir}/{file}")),
            None => tree.leaf("Path: null"),
        };
        let (min, max) = streamed.streamed_bounds();
        tree.leaf(&format!(
            "Streamed: [{:.3}x{:.3}] - [{:.3}x{:.3}]",
            min.x, min.z, max.x, max.z
        ));
        tree.leaf(&format!(
            "Loaded: {} ({} meshes load in progress)",
            streamed.is_loaded(),
            streamed.num_meshes_loading()
        ));

        let Some(header) = streamed.header() else {
            tree.leaf("Header: null");
            return;
        };
        let u = header.values;
        tree.leaf(&format!(
            "Header: meshes={}, u={:.3} {:.3} {:.3} {:.3} {:.3} {:.3} {:.3}",
            header.num_meshes, u[0], u[1], u[2], u[3], u[4], u[5], u[6]
        ));

        for sub in streamed.sub_meshes() {
            let bounds = sub.entry.bounds;
            let label = format!(
                "Mesh {}: file={}, bounds={} == {:X}",
                sub.index,
                sub.file_name(),
                aabb_str(bounds.min, bounds.max),
                sub.mesh
            );
            let key = format!("mesh_{}", sub.index);
            let state = tree.node(TreeRow::node(&label).key(&key).leaf_if(sub.mesh.is_null()));
            let mesh = sub.view();
            if state.selected_or_hovered
                && let Some(mesh) = &mesh
            {
                visualize_mesh(self.frame, mesh, mesh_status_color(mesh, self.summary));
            }
            if state.opened {
                if let Some(mesh) = &mesh {
                    self.mesh_details(tree, mesh);
                }
                tree.pop();
            }
        }
    }

    fn mesh_details(&mut self, tree: &mut dyn TreeUi, mesh: &MeshView) {
        resource_row(tree, mesh.resource_ptr(), mesh.resource_path());
        transform_rows(tree, mesh.transform(), None);

        let sphere = mesh.bounding_sphere();
        if tree
            .leaf(&format!("Bounding sphere: {}", sphere_str(sphere)))
            .selected_or_hovered
        {
            visualize_sphere(self.frame, sphere, BOUNDS_COLOR);
        }
        let bounds = mesh.world_bounding_box();
        if tree
            .leaf(&format!("Bounding box: {}", aabb_str(bounds.min, bounds.max)))
            .selected_or_hovered
        {
            visualize_obb(self.frame, &bounds, &Matrix4x3::IDENTITY, BOUNDS_COLOR);
        }
        let raw = mesh.raw();
        tree.leaf(&format!(
            "Total size: {} prims, {} nodes",
            raw.total_primitives, raw.total_children
        ));
        let loading = if mesh.is_loaded() { "" } else { " (loading)" };
        tree.leaf(&format!("Mesh type: {}{loading}", mesh.mesh_type().label()));

        if mesh.is_simple() {
            return;
        }
        if raw.mesh.is_null() {
            tree.leaf("Mesh: not loaded");
            return;
        }
        match mesh.root() {
            Some(root) => self.bvh_node(tree, "Root", &root, mesh.world(), 0),
            None => {
                tree.leaf("BVH: none");
            }
        }
    }

    fn bvh_node(
        &mut self,
        tree: &mut dyn TreeUi,
        tag: &str,
        node: &BvhNode,
        world: &Matrix4x3,
        depth: usize,
    ) {
        if depth >= MAX_BVH_DEPTH {
            tree.leaf(&format!("{tag}: deeper than {MAX_BVH_DEPTH} levels"));
            return;
        }
        let state = tree.node(TreeRow::node(tag));
        if state.selected_or_hovered {
            visualize_bvh(self.frame, node, world, NODE_COLOR);
        }
        if !state.opened {
            return;
        }

        tree.leaf(&format!("Header: {:016X}", node.header()));
        let local = node.local_bounds();
        if tree
            .leaf(&format!("AABB: {}", aabb_str(local.min, local.max)))
            .selected_or_hovered
        {
            visualize_obb(self.frame, &local, world, BOUNDS_COLOR);
        }

        let (raw, compressed) = (node.num_verts_raw(), node.num_verts_compressed());
        let label = format!("Vertices: {raw}+{compressed}");
        let radius = self.config.vertex_sphere_radius;
        subtree(
            tree,
            TreeRow::node(&label).leaf_if(raw + compressed == 0),
            |tree| {
                for i in 0..raw + compressed {
                    let Some(v) = node.vertex(i) else {
                        tree.leaf(&format!("[{i}]: unreadable"));
                        continue;
                    };
                    let encoding = if node.is_raw(i) { 'r' } else { 'c' };
                    if tree
                        .leaf(&format!("[{i}] ({encoding}): {}", vec3_str(v)))
                        .selected_or_hovered
                    {
                        visualize_vertex(self.frame, world.transform_coordinate(v), radius, NODE_COLOR);
                    }
                }
            },
        );

        let label = format!("Primitives: {}", node.num_prims());
        subtree(
            tree,
            TreeRow::node(&label).leaf_if(node.num_prims() == 0),
            |tree| {
                for i in 0..node.num_prims() {
                    let Some(prim) = node.primitive(i) else {
                        tree.leaf(&format!("[{i}]: unreadable"));
                        continue;
                    };
                    let row = format!(
                        "[{i}]: {}x{}x{}, material={:08X}",
                        prim.v1, prim.v2, prim.v3, prim.material
                    );
                    if tree.leaf(&row).selected_or_hovered {
                        visualize_triangle(self.frame, node, &prim, world, NODE_COLOR);
                    }
                }
            },
        );

        if let Some(child) = node.child1() {
            let tag = format!("Child 1 (+{})", node.child1_offset());
            self.bvh_node(tree, &tag, &child, world, depth + 1);
        }
        if let Some(child) = node.child2() {
            let tag = format!("Child 2 (+{})", node.child2_offset());
            self.bvh_node(tree, &tag, &child, world, depth + 1);
        }
        tree.pop();
    }

    fn scene_quadtree(&mut self, tree: &mut dyn TreeUi, scene: &SceneView) {
        let index = scene.index();
        let key = format!("tree_{index}");
        let Some(quadtree) = scene.quadtree() else {
            tree.node(TreeRow::leaf(&format!("Quadtree {index}: null")).key(&key));
            return;
        };
        let t = quadtree.raw();
        let label = format!(
            "Quadtree {index}: {} levels ([{}, {}]x[{}, {}], leaf {}x{}), {} nodes",
            t.num_levels, t.min_x, t.max_x, t.min_z, t.max_z, t.leaf_size_x, t.leaf_size_z, t.num_nodes
        );
        subtree(tree, TreeRow::node(&label).key(&key), |tree| {
            for level in 0..quadtree.num_levels() as u32 {
                self.quadtree_level(tree, &quadtree, level);
            }
        });
    }

    fn quadtree_level(&mut self, tree: &mut dyn TreeUi, quadtree: &QuadtreeView, level: u32) {
        let info = quadtree.level(level);
        let label = format!(
            "Level {level}, {}x{} cells ({} nodes starting at {})",
            info.cell_size_x, info.cell_size_z, info.node_count, info.first_node
        );
        subtree(tree, TreeRow::node(&label), |tree| {
            for cell in quadtree.cells(&info) {
                let label = format!(
                    "[{}, {}] ([{}x{}]-[{}x{}])",
                    cell.x, cell.z, cell.min_x, cell.min_z, cell.max_x, cell.max_z
                );
                let key = format!("node_{level}_{}", cell.index);
                let state = tree.node(TreeRow::node(&label).key(&key).leaf_if(cell.is_empty()));
                if !state.opened && !state.selected_or_hovered {
                    continue;
                }
                let colliders: Vec<ColliderView> = quadtree
                    .colliders(&cell)
                    .into_iter()
                    // SAFETY: covered by the contract of `CollisionInspector::new`.
                    .filter_map(|ptr| unsafe { ColliderView::read(ptr) })
                    .collect();
                if state.opened {
                    for collider in &colliders {
                        self.collider(tree, collider);
                    }
                    tree.pop();
                }
                if state.selected_or_hovered {
                    for collider in &colliders {
                        visualize_collider(self.frame, collider, self.summary);
                    }
                }
            }
        });
    }

    fn scene_raycasts(&mut self, tree: &mut dyn TreeUi, scene: &SceneView) {
        let index = scene.index();
        let label = format!("Scene {index}: raycasts");
        let key = format!("raycasts_{index}");
        subtree(tree, TreeRow::node(&label).key(&key), |tree| {
            self.mouse_raycast(tree, scene);
        });
    }

    fn mouse_raycast(&mut self, tree: &mut dyn TreeUi, scene: &SceneView) {
        let ray = tree
            .pointer_position()
            .and_then(|p| mouse_ray(self.frame.camera(), p, self.frame.viewport_origin()));
        let Some(ray) = ray else {
            tree.leaf("Mouse is outside window");
            return;
        };
        tree.leaf(&format!(
            "Mouse pos: screen={}, clip={}, dir={}",
            ray.screen, ray.clip, ray.direction
        ));

        let Some(raycast) = scene.raycast_fn() else {
            tree.leaf("Raycast: no entry point");
            return;
        };
        let max_distance = self.config.mouse_raycast_max_distance;
        // SAFETY: the entry point belongs to this scene, which is live per the
        // contract of `CollisionInspector::new`.
        let Some(hit) = (unsafe { cast_ray(raycast, scene.wrapper_ptr(), &ray, max_distance) })
        else {
            tree.leaf("Raycast: N/A");
            return;
        };
        tree.leaf(&format!(
            "Raycast: {} + {:.3} = {}",
            vec3_str(ray.origin),
            hit.distance,
            vec3_str(hit.point)
        ));
        // SAFETY: the hit object is a collider of this scene.
        match unsafe { ColliderView::read(hit.object) } {
            Some(collider) => {
                self.collider(tree, &collider);
                visualize_collider(self.frame, &collider, self.summary);
            }
            None => {
                tree.leaf("Hit collider: null");
            }
        }
        self.frame.draw_world_triangle_thick(
            hit.v1,
            hit.v2,
            hit.v3,
            PackedColor::RED,
            HIT_TRIANGLE_THICKNESS,
        );
    }
}
