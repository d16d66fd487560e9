//! # collscope core
//!
//! Leaf utilities shared by the debug drawer and the collision inspector:
//!
//! - [`math`] - camera decomposition, projection, near-plane clipping, host 4x3 matrices
//! - [`curve`] - circle tessellation for world and screen-space outlines
//! - [`color`] - packed `0xAABBGGRR` colors used by the overlay
//! - [`bitmask`] - 64-bit index masks for layers and materials
//! - [`foreign`] - read/write handles into memory owned by the host process

pub mod bitmask;
pub mod color;
pub mod curve;
pub mod foreign;
pub mod math;

pub use bitmask::BitMask;
pub use color::PackedColor;
pub use foreign::ForeignPtr;
pub use math::{Aabb, CameraState, Matrix4x3};

/// Core library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
