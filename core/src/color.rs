//! Packed colors in the overlay's `0xAABBGGRR` layout.

use glam::Vec4;

/// 32-bit color with red in the low byte and alpha in the high byte.
#[repr(transparent)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, bytemuck::Pod, bytemuck::Zeroable)]
pub struct PackedColor(pub u32);

impl PackedColor {
    pub const WHITE: Self = Self(0xffff_ffff);
    pub const RED: Self = Self(0xff00_00ff);
    pub const GREEN: Self = Self(0xff00_ff00);
    pub const YELLOW: Self = Self(0xff00_ffff);

    pub const fn from_rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self((a as u32) << 24 | (b as u32) << 16 | (g as u32) << 8 | r as u32)
    }

    pub const fn r(self) -> u8 {
        self.0 as u8
    }

    pub const fn g(self) -> u8 {
        (self.0 >> 8) as u8
    }

    pub const fn b(self) -> u8 {
        (self.0 >> 16) as u8
    }

    pub const fn a(self) -> u8 {
        (self.0 >> 24) as u8
    }

    /// Normalized `[r, g, b, a]` as consumed by the instanced shaders.
    pub fn to_vec4(self) -> Vec4 {
        Vec4::new(
            self.r() as f32,
            self.g() as f32,
            self.b() as f32,
            self.a() as f32,
        ) / 255.0
    }
}

impl From<PackedColor> for Vec4 {
    fn from(color: PackedColor) -> Self {
        color.to_vec4()
    }
}
