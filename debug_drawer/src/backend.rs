//! Contract between the frame accumulator and the GPU layer.
//!
//! The drawer never allocates GPU resources itself. It asks a [`RenderBackend`]
//! for a render target matching the viewport, uploads shader constants, hands
//! over the closed batches and finally asks the backend to execute them.

use glam::UVec2;

use crate::batch::{BoxBatch, MeshBatch};
use crate::error::DrawError;
use crate::vertex::{BoxConstants, MeshConstants};

/// Off-screen color target the 3D batches are rendered into.
pub trait RenderTarget {
    /// Size in pixels.
    fn size(&self) -> UVec2;

    /// Texture to composite over the viewport, if the target is visible to the UI layer.
    fn overlay_texture(&self) -> Option<egui::TextureId>;
}

/// GPU resource layer used by [`DebugDrawer`](crate::DebugDrawer).
pub trait RenderBackend {
    type Target: RenderTarget;

    /// Create a render target covering a viewport of `size` pixels.
    fn create_target(&mut self, size: UVec2) -> Result<Self::Target, DrawError>;

    /// Make `target` the destination of subsequent draws.
    fn bind_target(&mut self, target: &Self::Target);

    fn update_mesh_constants(&mut self, constants: &MeshConstants);

    fn update_box_constants(&mut self, constants: &BoxConstants);

    /// Queue the closed mesh batch for drawing.
    fn submit_meshes(&mut self, batch: &MeshBatch);

    /// Queue the closed box batch for drawing.
    fn submit_boxes(&mut self, batch: &BoxBatch);

    /// Flush everything submitted since the last call.
    fn execute(&mut self) -> Result<(), DrawError>;
}

/// Target created by [`RecordingBackend`].
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedTarget {
    pub id: u64,
    pub size: UVec2,
}

impl RenderTarget for RecordedTarget {
    fn size(&self) -> UVec2 {
        self.size
    }

    fn overlay_texture(&self) -> Option<egui::TextureId> {
        Some(egui::TextureId::User(self.id))
    }
}

/// Summary of one submitted mesh batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmittedMeshes {
    pub draws: usize,
    pub vertices: usize,
    pub primitives: usize,
    pub instances: usize,
}

/// Backend that performs no GPU work and records every call.
///
/// Used by tests and by hosts without a GPU layer.
#[derive(Debug, Default)]
pub struct RecordingBackend {
    pub targets_created: Vec<UVec2>,
    pub binds: usize,
    pub mesh_constants: Option<MeshConstants>,
    pub box_constants: Option<BoxConstants>,
    pub submitted_meshes: Vec<SubmittedMeshes>,
    pub submitted_boxes: Vec<usize>,
    pub executions: usize,
    /// Makes the next [`create_target`](RenderBackend::create_target) fail with this reason.
    pub fail_next_target: Option<String>,
    next_id: u64,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(&self) -> &'static str {
        "Recording Backend"
    }
}

impl RenderBackend for RecordingBackend {
    type Target = RecordedTarget;

    fn create_target(&mut self, size: UVec2) -> Result<RecordedTarget, DrawError> {
        if let Some(reason) = self.fail_next_target.take() {
            return Err(DrawError::TargetCreation {
                width: size.x,
                height: size.y,
                reason,
            });
        }
        log::trace!("RecordingBackend: creating target {}x{}", size.x, size.y);
        self.next_id += 1;
        self.targets_created.push(size);
        Ok(RecordedTarget {
            id: self.next_id,
            size,
        })
    }

    fn bind_target(&mut self, _target: &RecordedTarget) {
        self.binds += 1;
    }

    fn update_mesh_constants(&mut self, constants: &MeshConstants) {
        self.mesh_constants = Some(*constants);
    }

    fn update_box_constants(&mut self, constants: &BoxConstants) {
        self.box_constants = Some(*constants);
    }

    fn submit_meshes(&mut self, batch: &MeshBatch) {
        self.submitted_meshes.push(SubmittedMeshes {
            draws: batch.draws().len(),
            vertices: batch.vertices().len(),
            primitives: batch.primitives().len(),
            instances: batch.instances().len(),
        });
    }

    fn submit_boxes(&mut self, batch: &BoxBatch) {
        self.submitted_boxes.push(batch.instances().len());
    }

    fn execute(&mut self) -> Result<(), DrawError> {
        self.executions += 1;
        Ok(())
    }
}
