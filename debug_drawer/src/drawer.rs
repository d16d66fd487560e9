use collscope_core::CameraState;
use glam::{UVec2, Vec2};

use crate::backend::{RenderBackend, RenderTarget};
use crate::batch::{BoxBatch, DynamicBuffer, MeshBatch, MeshCapacity};
use crate::camera::CameraSource;
use crate::config::DrawerConfig;
use crate::error::DrawError;
use crate::overlay::{OverlayLine, OverlayPainter};
use crate::vertex::{BoxConstants, MeshConstants};

/// Frame-scoped debug drawing accumulator.
///
/// Owns the render target, the two instance batches and the screen-space
/// line list. All drawing happens through a [`Frame`] obtained from
/// [`begin_frame`](Self::begin_frame); the frame borrows the drawer mutably,
/// so there is never more than one frame in flight and nothing can be drawn
/// outside of one.
pub struct DebugDrawer<B: RenderBackend> {
    backend: B,
    config: DrawerConfig,
    target: Option<B::Target>,
    pub(crate) meshes: DynamicBuffer<MeshBatch>,
    pub(crate) boxes: DynamicBuffer<BoxBatch>,
    pub(crate) lines: Vec<OverlayLine>,
    frame_index: u64,
}

impl<B: RenderBackend> DebugDrawer<B> {
    pub fn new(backend: B, config: DrawerConfig) -> Self {
        let meshes = MeshBatch::new(MeshCapacity::from(&config));
        let boxes = BoxBatch::new(config.box_instance_capacity);
        Self {
            backend,
            config,
            target: None,
            meshes: DynamicBuffer::new("debug_meshes", meshes),
            boxes: DynamicBuffer::new("debug_boxes", boxes),
            lines: Vec::new(),
            frame_index: 0,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn config(&self) -> &DrawerConfig {
        &self.config
    }

    /// Current render target, created on the first frame.
    pub fn target(&self) -> Option<&B::Target> {
        self.target.as_ref()
    }

    /// Number of frames begun so far.
    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    /// Start a frame.
    ///
    /// Reads the camera, makes sure the render target matches the viewport,
    /// binds it and uploads the per-frame shader constants.
    pub fn begin_frame(
        &mut self,
        source: &dyn CameraSource,
        viewport_origin: Vec2,
    ) -> Result<Frame<'_, B>, DrawError> {
        let inputs = source.read_camera().ok_or(DrawError::CameraUnavailable)?;
        let camera = CameraState::new(inputs.view_proj, inputs.proj, inputs.viewport_size);

        let size = UVec2::new(
            inputs.viewport_size.x.max(0.0) as u32,
            inputs.viewport_size.y.max(0.0) as u32,
        );
        if self.target.as_ref().is_none_or(|t| t.size() != size) {
            // Release the old target before asking for a new one.
            self.target = None;
            log::trace!("debug drawer: (re)creating render target {}x{}", size.x, size.y);
            self.target = Some(self.backend.create_target(size)?);
        }
        if let Some(target) = &self.target {
            self.backend.bind_target(target);
        }

        self.backend.update_box_constants(&BoxConstants::new(&camera.view_proj));
        self.backend.update_mesh_constants(&MeshConstants::new(
            &camera.view_proj,
            self.config.lighting_threshold_cos(),
        ));

        debug_assert!(self.lines.is_empty(), "overlay lines leaked from a previous frame");
        self.lines.clear();
        self.frame_index += 1;

        Ok(Frame {
            drawer: self,
            camera,
            viewport_origin,
            finished: false,
        })
    }
}

/// Drawing scope of a single frame.
///
/// Finish it with [`end`](Self::end) to submit the batches and paint the
/// overlay. A frame dropped without `end` closes its batches and discards
/// everything drawn into it.
pub struct Frame<'a, B: RenderBackend> {
    pub(crate) drawer: &'a mut DebugDrawer<B>,
    pub(crate) camera: CameraState,
    pub(crate) viewport_origin: Vec2,
    finished: bool,
}

impl<B: RenderBackend> Frame<'_, B> {
    pub fn camera(&self) -> &CameraState {
        &self.camera
    }

    /// Screen position of the viewport's top-left corner.
    pub fn viewport_origin(&self) -> Vec2 {
        self.viewport_origin
    }

    pub fn config(&self) -> &DrawerConfig {
        &self.drawer.config
    }

    /// Overlay lines accumulated so far this frame.
    pub fn lines(&self) -> &[OverlayLine] {
        &self.drawer.lines
    }

    /// Submit batches, execute them and paint the overlay.
    ///
    /// The overlay line list is cleared even when the backend fails.
    pub fn end(mut self, painter: &mut dyn OverlayPainter) -> Result<(), DrawError> {
        self.finished = true;
        let drawer = &mut *self.drawer;

        if let Some(boxes) = drawer.boxes.close() {
            drawer.backend.submit_boxes(boxes);
        }
        if let Some(meshes) = drawer.meshes.close() {
            drawer.backend.submit_meshes(meshes);
        }

        let executed = drawer.backend.execute();

        for line in drawer.lines.drain(..) {
            painter.overlay_line(&line);
        }
        executed?;

        if let Some(target) = &drawer.target
            && let Some(texture) = target.overlay_texture()
        {
            painter.overlay_image(texture, self.viewport_origin, target.size().as_vec2());
        }
        Ok(())
    }
}

impl<B: RenderBackend> Drop for Frame<'_, B> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        self.drawer.boxes.close();
        self.drawer.meshes.close();
        if !self.drawer.lines.is_empty() {
            log::warn!(
                "debug frame dropped without end(); discarding {} overlay lines",
                self.drawer.lines.len()
            );
        }
        self.drawer.lines.clear();
    }
}

#[cfg(test)]
mod tests {
    use glam::{Mat4, Vec3, Vec4};

    use super::*;
    use crate::backend::RecordingBackend;
    use crate::camera::CameraInputs;
    use crate::overlay::RecordedOverlay;

    fn camera(width: f32, height: f32) -> CameraInputs {
        let proj = Mat4::perspective_rh(60f32.to_radians(), width / height, 0.1, 1000.0);
        let view = Mat4::look_at_rh(Vec3::new(0.0, 2.0, 5.0), Vec3::ZERO, Vec3::Y);
        CameraInputs {
            view_proj: proj * view,
            proj,
            viewport_size: Vec2::new(width, height),
        }
    }

    fn drawer() -> DebugDrawer<RecordingBackend> {
        DebugDrawer::new(RecordingBackend::new(), DrawerConfig::default())
    }

    #[test]
    fn target_follows_viewport_size() {
        let mut drawer = drawer();
        let mut overlay = RecordedOverlay::default();

        drawer.begin_frame(&camera(1920.0, 1080.0), Vec2::ZERO).unwrap().end(&mut overlay).unwrap();
        drawer.begin_frame(&camera(1920.0, 1080.0), Vec2::ZERO).unwrap().end(&mut overlay).unwrap();
        drawer.begin_frame(&camera(1280.0, 720.0), Vec2::ZERO).unwrap().end(&mut overlay).unwrap();

        let backend = drawer.backend();
        assert_eq!(
            backend.targets_created,
            vec![UVec2::new(1920, 1080), UVec2::new(1280, 720)]
        );
        assert_eq!(backend.binds, 3);
        assert_eq!(backend.executions, 3);
        assert_eq!(drawer.frame_index(), 3);
    }

    #[test]
    fn unavailable_camera_skips_frame() {
        struct NoCamera;
        impl CameraSource for NoCamera {
            fn read_camera(&self) -> Option<CameraInputs> {
                None
            }
        }

        let mut drawer = drawer();
        let err = drawer.begin_frame(&NoCamera, Vec2::ZERO).err();
        assert_eq!(err, Some(DrawError::CameraUnavailable));
        assert!(drawer.backend().targets_created.is_empty());
    }

    #[test]
    fn target_creation_failure_is_reported() {
        let mut drawer = drawer();
        drawer.backend_mut().fail_next_target = Some("out of memory".into());
        let err = drawer.begin_frame(&camera(64.0, 64.0), Vec2::ZERO).err();
        assert!(matches!(err, Some(DrawError::TargetCreation { width: 64, .. })));

        // Next frame retries.
        assert!(drawer.begin_frame(&camera(64.0, 64.0), Vec2::ZERO).is_ok());
        assert!(drawer.target().is_some());
    }

    #[test]
    fn constants_are_uploaded_every_frame() {
        let mut drawer = drawer();
        let inputs = camera(800.0, 600.0);
        drawer.begin_frame(&inputs, Vec2::ZERO).unwrap().end(&mut RecordedOverlay::default()).unwrap();

        let backend = drawer.backend();
        let mesh = backend.mesh_constants.expect("mesh constants uploaded");
        assert_eq!(mesh.view_proj, inputs.view_proj.to_cols_array_2d());
        assert!((mesh.lighting_world_y_threshold - 45f32.to_radians().cos()).abs() < 1e-6);
        assert!(backend.box_constants.is_some());
    }

    #[test]
    fn end_paints_lines_then_target() {
        let mut drawer = drawer();
        let mut overlay = RecordedOverlay::default();
        let origin = Vec2::new(10.0, 20.0);

        let mut frame = drawer.begin_frame(&camera(800.0, 600.0), origin).unwrap();
        frame.draw_world_line(Vec3::ZERO, Vec3::X, collscope_core::PackedColor::WHITE);
        frame.end(&mut overlay).unwrap();

        assert_eq!(overlay.lines.len(), 1);
        assert_eq!(overlay.images.len(), 1);
        let (_, min, size) = overlay.images[0];
        assert_eq!(min, origin);
        assert_eq!(size, Vec2::new(800.0, 600.0));
    }

    #[test]
    fn dropped_frame_discards_lines_and_closes_batches() {
        let mut drawer = drawer();
        {
            let mut frame = drawer.begin_frame(&camera(800.0, 600.0), Vec2::ZERO).unwrap();
            frame.draw_world_line(Vec3::ZERO, Vec3::X, collscope_core::PackedColor::WHITE);
            frame.draw_aabb(Vec3::ZERO, Vec3::ONE, Vec4::ONE);
        }
        assert!(drawer.lines.is_empty());
        assert!(!drawer.boxes.is_open());
        assert!(drawer.backend().submitted_boxes.is_empty());

        // The next frame starts cleanly.
        let mut overlay = RecordedOverlay::default();
        drawer.begin_frame(&camera(800.0, 600.0), Vec2::ZERO).unwrap().end(&mut overlay).unwrap();
        assert!(overlay.lines.is_empty());
    }
}
