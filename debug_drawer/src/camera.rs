//! Per-frame camera inputs read from the host.

use collscope_core::ForeignPtr;
use collscope_core::math::mat4_from_host;
use glam::{Mat4, Vec2};

/// The raw values a frame's [`CameraState`](collscope_core::CameraState) is derived from.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct CameraInputs {
    pub view_proj: Mat4,
    pub proj: Mat4,
    pub viewport_size: Vec2,
}

/// Anything that can provide the camera matrices for the current frame.
pub trait CameraSource {
    /// `None` when the source is not reachable this frame.
    fn read_camera(&self) -> Option<CameraInputs>;
}

impl CameraSource for CameraInputs {
    fn read_camera(&self) -> Option<CameraInputs> {
        Some(*self)
    }
}

/// Reads the camera from the host's engine-core singleton at fixed offsets.
#[derive(Copy, Clone, Debug)]
pub struct EngineCoreCamera {
    singleton: ForeignPtr<u8>,
}

impl EngineCoreCamera {
    pub const PROJ_OFFSET: usize = 0x174;
    pub const VIEW_PROJ_OFFSET: usize = 0x1B4;
    pub const VIEWPORT_SIZE_OFFSET: usize = 0x1F4;

    /// # Safety
    ///
    /// `singleton` must be null or the address of the host's engine-core
    /// singleton, which stays alive for as long as this reader is used.
    pub unsafe fn new(singleton: ForeignPtr<u8>) -> Self {
        Self { singleton }
    }

    pub fn singleton(&self) -> ForeignPtr<u8> {
        self.singleton
    }
}

impl CameraSource for EngineCoreCamera {
    fn read_camera(&self) -> Option<CameraInputs> {
        // SAFETY: the constructor contract keeps the singleton readable.
        unsafe {
            let view_proj = self
                .singleton
                .byte_offset::<[f32; 16]>(Self::VIEW_PROJ_OFFSET)
                .read()?;
            let proj = self
                .singleton
                .byte_offset::<[f32; 16]>(Self::PROJ_OFFSET)
                .read()?;
            let viewport = self
                .singleton
                .byte_offset::<[f32; 2]>(Self::VIEWPORT_SIZE_OFFSET)
                .read()?;
            Some(CameraInputs {
                view_proj: mat4_from_host(&view_proj),
                proj: mat4_from_host(&proj),
                viewport_size: Vec2::from_array(viewport),
            })
        }
    }
}
