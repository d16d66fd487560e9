//! Raycast interception and the one-shot mouse raycast.
//!
//! The host's raycast entry point is patched once, by a [`HookInstaller`] the
//! embedding application provides, to jump to [`raycast_detour`]. While the
//! hook is enabled the detour logs every call with its arguments and then
//! forwards it unchanged to the original function. The detour runs on the
//! host's query threads, so everything it touches is atomic or behind a
//! `parking_lot` lock.

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use collscope_core::math::screen_to_clip;
use collscope_core::{CameraState, ForeignPtr};
use glam::{Vec2, Vec3};
use parking_lot::{Mutex, RwLock};

use crate::error::HookError;
use crate::layout::{MaterialFilter, RaycastFn, RaycastHit, RaycastParams, SceneWrapper};

/// Log target of intercepted raycasts.
pub const RAYCAST_LOG_TARGET: &str = "collscope::raycast";

/// Arguments of one intercepted raycast. Pointer arguments the caller left
/// null are `None`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RaycastRecord {
    pub layer_mask: u64,
    pub algorithm: u32,
    pub origin: Option<Vec3>,
    pub direction: Option<Vec3>,
    pub max_distance: Option<f32>,
    pub max_plane_normal_y: f32,
    pub material_filter: Option<MaterialFilter>,
}

impl RaycastRecord {
    /// Copy the arguments out. A null `params` yields a record with only the mask.
    ///
    /// # Safety
    ///
    /// A non-null `params`, and every non-null pointer inside it, must be readable.
    pub unsafe fn read(layer_mask: u64, params: ForeignPtr<RaycastParams>) -> Self {
        // SAFETY: forwarded caller contract.
        let Some(p) = (unsafe { params.read() }) else {
            return Self {
                layer_mask,
                algorithm: 0,
                origin: None,
                direction: None,
                max_distance: None,
                max_plane_normal_y: 0.0,
                material_filter: None,
            };
        };
        // SAFETY: as above, for each pointer field.
        unsafe {
            Self {
                layer_mask,
                algorithm: p.algorithm,
                origin: p.origin.read(),
                direction: p.direction.read(),
                max_distance: p.max_distance.read(),
                max_plane_normal_y: p.max_plane_normal_y,
                material_filter: p.material_filter.read(),
            }
        }
    }
}

struct OrNull<T>(Option<T>);

impl<T: fmt::Display> fmt::Display for OrNull<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Some(v) => v.fmt(f),
            None => f.write_str("null"),
        }
    }
}

impl fmt::Display for RaycastRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "layer={:X}, algo={}, origin={}, dir={}, maxnorm={}, maxdist={}, filter=",
            self.layer_mask,
            self.algorithm,
            OrNull(self.origin),
            OrNull(self.direction),
            self.max_plane_normal_y,
            OrNull(self.max_distance),
        )?;
        match self.material_filter {
            Some(m) => write!(f, "{:X}/{:X}", m.value, m.mask),
            None => f.write_str("null"),
        }
    }
}

// ---------------------------------------------------------------------------
// Installation
// ---------------------------------------------------------------------------

/// A patched entry point, as handed back by a [`HookInstaller`].
pub trait InstalledHook: Send + Sync {
    /// Trampoline to the unpatched function.
    fn original(&self) -> Option<RaycastFn>;
    fn enable(&self) -> Result<(), HookError>;
    fn disable(&self) -> Result<(), HookError>;
}

/// Patches `target` so that calls land in `detour`.
pub trait HookInstaller {
    fn install(
        &mut self,
        target: RaycastFn,
        detour: RaycastFn,
    ) -> Result<Box<dyn InstalledHook>, HookError>;
}

/// Installer for hosts that route raycasts through
/// [`RaycastHook::entry_point`] themselves instead of patching code.
#[derive(Debug, Default, Clone, Copy)]
pub struct ManualInstaller;

struct ManualHook {
    original: RaycastFn,
}

impl InstalledHook for ManualHook {
    fn original(&self) -> Option<RaycastFn> {
        Some(self.original)
    }

    fn enable(&self) -> Result<(), HookError> {
        Ok(())
    }

    fn disable(&self) -> Result<(), HookError> {
        Ok(())
    }
}

impl HookInstaller for ManualInstaller {
    fn install(
        &mut self,
        target: RaycastFn,
        _detour: RaycastFn,
    ) -> Result<Box<dyn InstalledHook>, HookError> {
        Ok(Box::new(ManualHook { original: target }))
    }
}

// ---------------------------------------------------------------------------
// Shared state and the detour
// ---------------------------------------------------------------------------

struct HookShared {
    original: RaycastFn,
    enabled: AtomicBool,
    calls: AtomicU64,
    recent: Mutex<VecDeque<RaycastRecord>>,
    capacity: usize,
}

impl HookShared {
    fn record(&self, record: RaycastRecord) {
        self.calls.fetch_add(1, Ordering::Relaxed);
        if self.capacity == 0 {
            return;
        }
        let mut recent = self.recent.lock();
        if recent.len() >= self.capacity {
            recent.pop_front();
        }
        recent.push_back(record);
    }
}

static ACTIVE: RwLock<Option<Arc<HookShared>>> = parking_lot::const_rwlock(None);

/// Original of the most recent installation. Outlives the hook, since a host
/// may keep calling the detour after it was unregistered.
static LAST_ORIGINAL: RwLock<Option<RaycastFn>> = parking_lot::const_rwlock(None);

/// Replacement for the host's raycast entry point.
///
/// Calls are always forwarded to the original function, also after the
/// [`RaycastHook`] was dropped; only the logging stops.
///
/// # Safety
///
/// Same contract as the original function.
pub unsafe extern "C" fn raycast_detour(
    scene: *mut SceneWrapper,
    result: *mut RaycastHit,
    layer_mask: u64,
    params: *const RaycastParams,
) -> bool {
    let original = match ACTIVE.read().clone() {
        Some(shared) => {
            if shared.enabled.load(Ordering::Relaxed) {
                // SAFETY: the host passes valid arguments to its own entry point.
                let record =
                    unsafe { RaycastRecord::read(layer_mask, ForeignPtr::from_addr(params as usize)) };
                log::debug!(target: RAYCAST_LOG_TARGET, "Raycast: {record}");
                shared.record(record);
            }
            shared.original
        }
        None => match *LAST_ORIGINAL.read() {
            Some(original) => original,
            None => {
                log::warn!(target: RAYCAST_LOG_TARGET, "raycast reached the detour before any hook was installed");
                return false;
            }
        },
    };
    // SAFETY: arguments are forwarded untouched to the function they were meant for.
    unsafe { original(scene, result, layer_mask, params) }
}

/// The installed raycast interception.
///
/// At most one exists at a time. Dropping it disables and unregisters the
/// detour.
pub struct RaycastHook {
    shared: Arc<HookShared>,
    installed: Box<dyn InstalledHook>,
}

impl RaycastHook {
    /// Patch `target` through `installer`. The hook starts disabled.
    pub fn install(
        target: RaycastFn,
        installer: &mut dyn HookInstaller,
        log_capacity: usize,
    ) -> Result<Self, HookError> {
        let mut active = ACTIVE.write();
        if active.is_some() {
            return Err(HookError::AlreadyInstalled);
        }
        let installed = installer.install(target, raycast_detour)?;
        let original = installed.original().ok_or(HookError::MissingOriginal)?;
        let shared = Arc::new(HookShared {
            original,
            enabled: AtomicBool::new(false),
            calls: AtomicU64::new(0),
            recent: Mutex::new(VecDeque::with_capacity(log_capacity.min(1024))),
            capacity: log_capacity,
        });
        *active = Some(shared.clone());
        *LAST_ORIGINAL.write() = Some(original);
        log::info!("raycast interception installed at {:#x}", target as usize);
        Ok(Self { shared, installed })
    }

    /// The function hosts without code patching should call instead of the original.
    pub fn entry_point() -> RaycastFn {
        raycast_detour
    }

    pub fn is_enabled(&self) -> bool {
        self.shared.enabled.load(Ordering::Relaxed)
    }

    pub fn set_enabled(&mut self, enabled: bool) -> Result<(), HookError> {
        if enabled == self.is_enabled() {
            return Ok(());
        }
        if enabled {
            self.installed.enable()?;
        } else {
            self.installed.disable()?;
        }
        self.shared.enabled.store(enabled, Ordering::Relaxed);
        log::debug!(
            "raycast logging {}",
            if enabled { "enabled" } else { "disabled" }
        );
        Ok(())
    }

    /// Calls logged while enabled.
    pub fn calls(&self) -> u64 {
        self.shared.calls.load(Ordering::Relaxed)
    }

    /// Most recent logged calls, oldest first.
    pub fn recent(&self) -> Vec<RaycastRecord> {
        self.shared.recent.lock().iter().copied().collect()
    }

    /// Call the original function, bypassing the detour.
    ///
    /// # Safety
    ///
    /// Same contract as the host's raycast entry point.
    pub unsafe fn call_original(
        &self,
        scene: *mut SceneWrapper,
        result: *mut RaycastHit,
        layer_mask: u64,
        params: *const RaycastParams,
    ) -> bool {
        // SAFETY: forwarded caller contract.
        unsafe { (self.shared.original)(scene, result, layer_mask, params) }
    }
}

impl Drop for RaycastHook {
    fn drop(&mut self) {
        if let Err(e) = self.installed.disable() {
            log::warn!("failed to disable raycast interception: {e}");
        }
        let mut active = ACTIVE.write();
        if active
            .as_ref()
            .is_some_and(|a| Arc::ptr_eq(a, &self.shared))
        {
            *active = None;
        }
    }
}

impl fmt::Debug for RaycastHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RaycastHook")
            .field("enabled", &self.is_enabled())
            .field("calls", &self.calls())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Mouse raycast
// ---------------------------------------------------------------------------

/// A ray through the mouse cursor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MouseRay {
    /// Cursor relative to the viewport origin.
    pub screen: Vec2,
    pub clip: Vec3,
    pub origin: Vec3,
    pub direction: Vec3,
}

/// Ray from the camera through `pointer`. `None` when the pointer is outside the viewport.
pub fn mouse_ray(camera: &CameraState, pointer: Vec2, viewport_origin: Vec2) -> Option<MouseRay> {
    let screen = pointer - viewport_origin;
    let size = camera.viewport_size;
    if screen.x < 0.0 || screen.x > size.x || screen.y < 0.0 || screen.y > size.y {
        return None;
    }
    let (origin, direction) = camera.screen_ray(screen);
    Some(MouseRay {
        screen,
        clip: screen_to_clip(screen, size),
        origin,
        direction,
    })
}

/// Issue one raycast against `scene` with every layer and no material filter.
///
/// # Safety
///
/// `raycast` must be the entry point belonging to `scene`, and `scene` must be live.
pub unsafe fn cast_ray(
    raycast: RaycastFn,
    scene: ForeignPtr<SceneWrapper>,
    ray: &MouseRay,
    max_distance: f32,
) -> Option<RaycastHit> {
    let origin = ray.origin;
    let direction = ray.direction;
    let filter = MaterialFilter::default();
    let params = RaycastParams {
        origin: ForeignPtr::from_ref(&origin),
        direction: ForeignPtr::from_ref(&direction),
        max_distance: ForeignPtr::from_ref(&max_distance),
        material_filter: ForeignPtr::from_ref(&filter),
        ..Default::default()
    };
    let mut hit = RaycastHit::default();
    // SAFETY: forwarded caller contract; every pointer in `params` outlives the call.
    let found = unsafe {
        raycast(
            scene.addr() as *mut SceneWrapper,
            &mut hit,
            u64::MAX,
            &params,
        )
    };
    found.then_some(hit)
}
