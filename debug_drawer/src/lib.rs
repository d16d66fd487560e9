//! Frame-scoped debug drawing for the collscope collision inspector.
//!
//! Converts world-space primitives into screen-space overlay lines and into
//! instanced mesh / box batches for a GPU backend. Single-threaded, one frame
//! in flight at a time.
//!
//! # Architecture
//!
//! - [`DebugDrawer`] - Owns the render target, the batches and the overlay line list
//! - [`Frame`] - Drawing scope returned by [`DebugDrawer::begin_frame`]
//! - [`DynamicBuffer`] - Open/close staging buffer behind each batch
//! - [`RenderBackend`] - GPU layer the batches are submitted to
//! - [`OverlayPainter`] - Immediate-mode sink for lines and the composited target (egui)
//!
//! # Usage
//!
//! ```ignore
//! // Setup (once)
//! let camera = unsafe { EngineCoreCamera::new(singleton) };
//! let mut drawer = DebugDrawer::new(backend, DrawerConfig::default());
//!
//! // Each frame:
//! let mut frame = drawer.begin_frame(&camera, viewport_origin)?;
//! frame.draw_world_line(a, b, PackedColor::GREEN);
//! frame.draw_world_sphere(center, 1.0, PackedColor::RED);
//! frame.draw_mesh(&mesh, &world, Vec4::ONE);
//! frame.end(&mut overlay_painter(ctx))?;
//! ```

mod backend;
mod batch;
mod camera;
mod config;
mod draw_api;
mod drawer;
mod error;
mod overlay;
mod vertex;

pub use backend::{RecordedTarget, RecordingBackend, RenderBackend, RenderTarget, SubmittedMeshes};
pub use batch::{
    BatchData, BoxBatch, DynamicBuffer, MeshBatch, MeshCapacity, MeshGeometry, TriangleMesh,
};
pub use camera::{CameraInputs, CameraSource, EngineCoreCamera};
pub use config::DrawerConfig;
pub use draw_api::DEFAULT_LINE_THICKNESS;
pub use drawer::{DebugDrawer, Frame};
pub use error::DrawError;
pub use overlay::{OverlayLine, OverlayPainter, RecordedOverlay, overlay_painter};
pub use vertex::{BoxConstants, BoxInstance, MeshConstants, MeshDraw, MeshInstance};
