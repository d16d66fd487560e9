//! Handles into memory owned by the host process.
//!
//! Everything the inspector looks at (scenes, colliders, meshes, the camera
//! singleton) lives in structures the host allocates, mutates and frees on
//! its own schedule. [`ForeignPtr`] is the only way the rest of the workspace
//! touches that memory: it is a plain address with a type tag, it never owns
//! anything, and every dereference is an explicit `unsafe` read or write that
//! copies the value out.
//!
//! `ForeignPtr<T>` has the size and alignment of a pointer, so it can appear
//! directly as a field of `#[repr(C)]` mirrors of host structures.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

#[repr(transparent)]
pub struct ForeignPtr<T> {
    addr: usize,
    _marker: PhantomData<fn() -> T>,
}

impl<T> ForeignPtr<T> {
    pub const fn null() -> Self {
        Self::from_addr(0)
    }

    pub const fn from_addr(addr: usize) -> Self {
        Self {
            addr,
            _marker: PhantomData,
        }
    }

    pub fn from_ref(value: &T) -> Self {
        Self::from_addr(value as *const T as usize)
    }

    /// Handle that may later be used for [`write`](Self::write).
    pub fn from_mut(value: &mut T) -> Self {
        Self::from_addr(value as *mut T as usize)
    }

    #[inline]
    pub const fn addr(self) -> usize {
        self.addr
    }

    #[inline]
    pub const fn is_null(self) -> bool {
        self.addr == 0
    }

    pub const fn cast<U>(self) -> ForeignPtr<U> {
        ForeignPtr::from_addr(self.addr)
    }

    /// Handle at a byte offset from this one. Null stays null.
    pub fn byte_offset<U>(self, offset: usize) -> ForeignPtr<U> {
        if self.is_null() {
            return ForeignPtr::null();
        }
        ForeignPtr::from_addr(self.addr.wrapping_add(offset))
    }

    /// Handle to the `index`-th element of an array starting here.
    pub fn element(self, index: usize) -> Self {
        self.byte_offset(index.wrapping_mul(size_of::<T>()))
    }

    /// Copy the value out of host memory, `None` for a null handle.
    ///
    /// # Safety
    ///
    /// A non-null handle must point to readable memory holding at least
    /// `size_of::<T>()` bytes, and every bit pattern of those bytes must be a
    /// valid `T`. The host may be writing the same memory concurrently; the
    /// caller accepts torn values.
    #[inline]
    pub unsafe fn read(self) -> Option<T>
    where
        T: Copy,
    {
        if self.is_null() {
            return None;
        }
        // SAFETY: non-null and readable per the caller contract.
        Some(unsafe { std::ptr::read_unaligned(self.addr as *const T) })
    }

    /// Overwrite the value in host memory. Returns `false` for a null handle.
    ///
    /// # Safety
    ///
    /// A non-null handle must point to writable memory of at least
    /// `size_of::<T>()` bytes that the host tolerates being modified.
    pub unsafe fn write(self, value: T) -> bool {
        if self.is_null() {
            return false;
        }
        // SAFETY: non-null and writable per the caller contract.
        unsafe { std::ptr::write_unaligned(self.addr as *mut T, value) };
        true
    }
}

/// Read the raw bytes of a NUL-terminated string, without the terminator.
///
/// Returns `None` for a null handle; an unterminated string is cut at `max_len`.
///
/// # Safety
///
/// A non-null handle must point to readable memory up to the terminator or
/// `max_len` bytes, whichever comes first.
pub unsafe fn read_c_bytes(ptr: ForeignPtr<u8>, max_len: usize) -> Option<Vec<u8>> {
    if ptr.is_null() {
        return None;
    }
    let mut bytes = Vec::new();
    for i in 0..max_len {
        // SAFETY: within the readable range promised by the caller.
        let byte = unsafe { ptr.element(i).read() }.unwrap_or(0);
        if byte == 0 {
            break;
        }
        bytes.push(byte);
    }
    Some(bytes)
}

/// Read a NUL-terminated string of at most `max_len` bytes (lossy UTF-8).
///
/// # Safety
///
/// Same contract as [`read_c_bytes`].
pub unsafe fn read_c_str(ptr: ForeignPtr<u8>, max_len: usize) -> Option<String> {
    // SAFETY: forwarded caller contract.
    let bytes = unsafe { read_c_bytes(ptr, max_len) }?;
    Some(String::from_utf8_lossy(&bytes).into_owned())
}

impl<T> Clone for ForeignPtr<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for ForeignPtr<T> {}

impl<T> Default for ForeignPtr<T> {
    fn default() -> Self {
        Self::null()
    }
}

impl<T> PartialEq for ForeignPtr<T> {
    fn eq(&self, other: &Self) -> bool {
        self.addr == other.addr
    }
}

impl<T> Eq for ForeignPtr<T> {}

impl<T> Hash for ForeignPtr<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.addr.hash(state);
    }
}

impl<T> fmt::Debug for ForeignPtr<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ForeignPtr({:#X})", self.addr)
    }
}

impl<T> fmt::UpperHex for ForeignPtr<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::UpperHex::fmt(&self.addr, f)
    }
}
