//! The `Colix` color handle.

use core::fmt::{self, Debug, Formatter};

use super::{Error, Result};

/// A 16-bit handle to a color in a [`ColorTable`][super::ColorTable].
///
/// # Layout
///
/// ```text
/// bit  15      14          13..0
///     [indirect][translucent][index]
/// ```
///
/// Indices 0 to 3 are reserved sentinels that do not name a color of
/// their own; see [`Colix::INHERIT`] and friends. When the indirect bit is
/// set, the index is a slot in the table's indirection list rather than a
/// color index, so callers can change a color after handing out the colix.
#[derive(Copy, Clone, Default, Eq, PartialEq, Hash, Ord, PartialOrd)]
#[repr(transparent)]
pub struct Colix(u16);

impl Colix {
    /// Use the parent object's color unchanged.
    pub const INHERIT: Self = Self(0);
    /// Use the parent object's color, made translucent.
    pub const TRANSLUCENT_INHERIT: Self = Self(1);
    /// Use the parent object's color, made opaque.
    pub const OPAQUE_INHERIT: Self = Self(2);
    /// Returned for color names and strings that could not be parsed.
    pub const UNRECOGNIZED: Self = Self(3);

    pub const TRANSLUCENT_BIT: u16 = 1 << 14;
    pub const INDIRECT_BIT: u16 = 1 << 15;
    pub const INDEX_MASK: u16 = 0x3FFF;

    /// The number of reserved sentinel indices.
    pub const SPECIAL_COUNT: u16 = 4;

    /// Returns the colix with the given raw bits, without validation.
    #[inline]
    pub const fn from_bits(bits: u16) -> Self {
        Self(bits)
    }

    /// Returns the raw bits of `self`.
    #[inline]
    pub const fn to_bits(self) -> u16 {
        self.0
    }

    /// Returns an opaque, direct colix for the given table index.
    ///
    /// # Panics
    /// If `index` does not fit in the 14-bit index field.
    pub const fn from_index(index: usize) -> Self {
        assert!(index <= Self::INDEX_MASK as usize, "colix index overflow");
        Self(index as u16)
    }

    /// Returns an indirect colix referring to the given slot.
    ///
    /// # Panics
    /// If `slot` does not fit in the 14-bit index field.
    pub const fn from_slot(slot: usize) -> Self {
        assert!(slot <= Self::INDEX_MASK as usize, "colix slot overflow");
        Self(Self::INDIRECT_BIT | slot as u16)
    }

    /// Returns the table index (or indirection slot) of `self`.
    #[inline]
    pub const fn index(self) -> usize {
        (self.0 & Self::INDEX_MASK) as usize
    }

    #[inline]
    pub const fn is_translucent(self) -> bool {
        self.0 & Self::TRANSLUCENT_BIT != 0
    }

    #[inline]
    pub const fn is_indirect(self) -> bool {
        self.0 & Self::INDIRECT_BIT != 0
    }

    /// Returns whether `self` is one of the four reserved sentinels,
    /// ignoring translucency.
    #[inline]
    pub const fn is_special(self) -> bool {
        !self.is_indirect() && self.index() < Self::SPECIAL_COUNT as usize
    }

    /// Returns `self` with the translucent bit set or cleared.
    ///
    /// Indirect colixes carry the translucency of their target and are
    /// returned unchanged.
    #[inline]
    pub const fn translucent(self, on: bool) -> Self {
        if self.is_indirect() {
            self
        } else if on {
            Self(self.0 | Self::TRANSLUCENT_BIT)
        } else {
            Self(self.0 & !Self::TRANSLUCENT_BIT)
        }
    }

    /// Returns `self` without the translucent bit.
    #[inline]
    pub const fn opaque(self) -> Self {
        self.translucent(false)
    }

    /// Resolves the inherit sentinels against the color of a parent object.
    ///
    /// Any other colix, including `UNRECOGNIZED`, is returned unchanged.
    pub const fn inherit(self, parent: Self) -> Self {
        match self {
            Self::INHERIT => parent,
            Self::TRANSLUCENT_INHERIT => parent.translucent(true),
            Self::OPAQUE_INHERIT => parent.opaque(),
            other => other,
        }
    }
}

impl TryFrom<u16> for Colix {
    type Error = Error;

    /// Validates a raw colix bit pattern.
    fn try_from(bits: u16) -> Result<Self> {
        let both = Self::INDIRECT_BIT | Self::TRANSLUCENT_BIT;
        if bits & both == both {
            Err(Error::InvalidBits(bits))
        } else {
            Ok(Self(bits))
        }
    }
}

impl Debug for Colix {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match *self {
            Self::INHERIT => f.write_str("Colix(inherit)"),
            Self::TRANSLUCENT_INHERIT => f.write_str("Colix(translucent inherit)"),
            Self::OPAQUE_INHERIT => f.write_str("Colix(opaque inherit)"),
            Self::UNRECOGNIZED => f.write_str("Colix(unrecognized)"),
            c => write!(
                f,
                "Colix({}{}{})",
                if c.is_indirect() { "*" } else { "" },
                c.index(),
                if c.is_translucent() { "t" } else { "" },
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bit_fields() {
        let c = Colix::from_index(42);
        assert_eq!(c.index(), 42);
        assert!(!c.is_translucent());
        assert!(!c.is_indirect());

        let t = c.translucent(true);
        assert!(t.is_translucent());
        assert_eq!(t.index(), 42);
        assert_eq!(t.opaque(), c);

        let i = Colix::from_slot(3);
        assert!(i.is_indirect());
        assert!(!i.is_special());
        assert_eq!(i.translucent(true), i);
    }

    #[test]
    fn sentinels_are_special() {
        assert!(Colix::INHERIT.is_special());
        assert!(Colix::UNRECOGNIZED.is_special());
        assert!(Colix::TRANSLUCENT_INHERIT.translucent(true).is_special());
        assert!(!Colix::from_index(4).is_special());
    }

    #[test]
    fn inherit_resolves_sentinels() {
        let parent = Colix::from_index(10).translucent(true);
        assert_eq!(Colix::INHERIT.inherit(parent), parent);
        assert_eq!(Colix::OPAQUE_INHERIT.inherit(parent), Colix::from_index(10));
        assert_eq!(
            Colix::TRANSLUCENT_INHERIT.inherit(Colix::from_index(10)),
            parent
        );
        assert_eq!(Colix::UNRECOGNIZED.inherit(parent), Colix::UNRECOGNIZED);
        assert_eq!(Colix::from_index(7).inherit(parent), Colix::from_index(7));
    }

    #[test]
    fn try_from_rejects_translucent_indirect() {
        assert_eq!(Colix::try_from(0x0005), Ok(Colix::from_index(5)));
        assert_eq!(Colix::try_from(0xC005), Err(Error::InvalidBits(0xC005)));
    }

    #[test]
    #[should_panic]
    fn index_overflow_panics() {
        let _ = Colix::from_index(0x4000);
    }
}
