//! 64-bit masks addressed by bit index (collider layers, material bits).

use std::fmt;
use std::ops::{BitAnd, BitAndAssign, BitOr, BitOrAssign, Not};

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct BitMask(pub u64);

impl BitMask {
    pub const NONE: Self = Self(0);
    pub const ALL: Self = Self(u64::MAX);

    #[inline]
    pub fn get(self, index: u32) -> bool {
        index < 64 && self.0 & (1 << index) != 0
    }

    /// Set or clear a bit; indices past 63 are ignored.
    pub fn set(&mut self, index: u32, value: bool) {
        if index >= 64 {
            return;
        }
        if value {
            self.0 |= 1 << index;
        } else {
            self.0 &= !(1 << index);
        }
    }

    pub fn any(self) -> bool {
        self.0 != 0
    }

    pub fn none(self) -> bool {
        self.0 == 0
    }

    pub fn reset(&mut self) {
        self.0 = 0;
    }

    pub fn intersects(self, raw: u64) -> bool {
        self.0 & raw != 0
    }

    /// Indices of set bits in ascending order.
    pub fn set_bits(self) -> SetBits {
        SetBits(self.0)
    }
}

/// Iterator returned by [`BitMask::set_bits`].
#[derive(Clone, Debug)]
pub struct SetBits(u64);

impl Iterator for SetBits {
    type Item = u32;

    fn next(&mut self) -> Option<u32> {
        if self.0 == 0 {
            return None;
        }
        let index = self.0.trailing_zeros();
        self.0 &= self.0 - 1;
        Some(index)
    }
}

impl fmt::Display for BitMask {
    /// Comma separated list of set bit indices.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, bit) in self.set_bits().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{bit}")?;
        }
        Ok(())
    }
}

impl BitOr for BitMask {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for BitMask {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for BitMask {
    type Output = Self;
    fn bitand(self, rhs: Self) -> Self {
        Self(self.0 & rhs.0)
    }
}

impl BitAndAssign for BitMask {
    fn bitand_assign(&mut self, rhs: Self) {
        self.0 &= rhs.0;
    }
}

impl Not for BitMask {
    type Output = Self;
    fn not(self) -> Self {
        Self(!self.0)
    }
}
