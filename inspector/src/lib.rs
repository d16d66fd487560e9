//! # collscope inspector
//!
//! Live inspector for the collision scenes of a host engine.
//!
//! ## Reading the host
//!
//! - [`layout`] - `#[repr(C)]` mirrors of the host's collision structures
//! - [`ModuleView`] / [`SceneView`] / [`ColliderView`] - validated snapshots of module, scenes and colliders
//! - [`BvhNode`] - mesh BVH nodes with their trailing vertex and primitive payload
//! - [`QuadtreeView`] - per-scene spatial index in Morton order
//!
//! ## Presenting it
//!
//! - [`CollisionInspector`] - per-frame tree listing plus hover visualization
//! - [`FilterState`] - which colliders are listed
//! - [`TreeUi`] - tree contract, rendered by [`EguiTree`] or recorded by [`ScriptedTree`]
//!
//! ## Raycast interception
//!
//! - [`RaycastHook`] - detour around the host's raycast entry point that logs every call
//! - [`log_capture`] - `env_logger` wrapper keeping recent collscope records in memory

pub mod bvh;
pub mod config;
pub mod error;
pub mod filter;
mod inspector;
pub mod layout;
pub mod log_capture;
pub mod quadtree;
pub mod raycast;
pub mod scene;
pub mod ui;
pub mod visualize;

pub use bvh::BvhNode;
pub use config::InspectorConfig;
pub use error::{ConfigError, HookError};
pub use filter::{FilterState, SceneSummary};
pub use inspector::CollisionInspector;
pub use quadtree::QuadtreeView;
pub use raycast::{
    HookInstaller, InstalledHook, ManualInstaller, MouseRay, RaycastHook, RaycastRecord,
};
pub use scene::{ColliderShape, ColliderView, MeshView, ModuleView, SceneView, StreamedView};
pub use ui::{EguiTree, NodeState, RecordedRow, ScriptedTree, TreeRow, TreeState, TreeUi};
