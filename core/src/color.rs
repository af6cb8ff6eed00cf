//! Color handles, named colors, and the per-context color table.
//!
//! Colors are passed around the renderer as [`Colix`] handles: small
//! indices into a [`ColorTable`] that deduplicates ARGB values and caches a
//! 64-entry shade ramp for each of them.

use core::fmt::{self, Display, Formatter};

pub use colix::Colix;
pub use named::NAMED_COLORS;
pub use table::ColorTable;

pub mod colix;
pub mod named;
pub mod table;

/// Errors produced when parsing colors or colix bit patterns.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Error {
    /// The input string was empty.
    Empty,
    /// No named color matches the input.
    UnknownName,
    /// A hex color had the wrong length or a non-hex digit.
    InvalidHex,
    /// A raw colix had both the indirect and translucent bits set.
    InvalidBits(u16),
}

pub type Result<T> = core::result::Result<T, Error>;

#[cfg(feature = "std")]
impl std::error::Error for Error {}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Error::Empty => f.write_str("empty color string"),
            Error::UnknownName => f.write_str("unknown color name"),
            Error::InvalidHex => f.write_str("invalid hex color"),
            Error::InvalidBits(b) => write!(f, "invalid colix bits {b:#06x}"),
        }
    }
}

/// Returns a fully opaque ARGB value with the given channels.
#[inline]
pub const fn argb(r: u32, g: u32, b: u32) -> u32 {
    0xFF00_0000 | (r & 0xFF) << 16 | (g & 0xFF) << 8 | (b & 0xFF)
}

/// Returns the red, green, and blue channels of `argb`.
#[inline]
pub const fn channels(argb: u32) -> [u32; 3] {
    [(argb >> 16) & 0xFF, (argb >> 8) & 0xFF, argb & 0xFF]
}

/// Returns the greyscale equivalent of `argb`, using ITU-R BT.601 luma
/// weights. The alpha channel is preserved.
pub const fn greyscale(argb: u32) -> u32 {
    let [r, g, b] = channels(argb);
    let grey = (2989 * r + 5870 * g + 1140 * b + 5000) / 10000;
    (argb & 0xFF00_0000) | grey << 16 | grey << 8 | grey
}

/// Returns the per-channel mean of two colors, fully opaque.
pub const fn mean(a: u32, b: u32) -> u32 {
    let [ra, ga, ba] = channels(a);
    let [rb, gb, bb] = channels(b);
    argb((ra + rb) / 2, (ga + gb) / 2, (ba + bb) / 2)
}

/// An RGB color in 8.8 fixed point per channel, for Gouraud interpolation.
///
/// Each channel holds the 8-bit value in its high byte and a fraction in
/// its low byte; freshly set channels start at one half so that truncation
/// rounds to nearest.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct Rgb16 {
    pub r: i32,
    pub g: i32,
    pub b: i32,
}

impl Rgb16 {
    /// Returns the fixed-point form of `argb`.
    pub const fn from_argb(argb: u32) -> Self {
        let argb = argb as i32;
        Self {
            r: ((argb >> 8) & 0xFF00) | 0x80,
            g: (argb & 0xFF00) | 0x80,
            b: ((argb << 8) & 0xFF00) | 0x80,
        }
    }

    /// Returns the per-row increment that takes `from` to `to` in `steps`.
    pub const fn step(from: &Self, to: &Self, steps: i32) -> Self {
        Self {
            r: (to.r - from.r) / steps,
            g: (to.g - from.g) / steps,
            b: (to.b - from.b) / steps,
        }
    }

    /// Adds `inc` to `self` channel-wise.
    #[inline]
    pub fn add(&mut self, inc: &Self) {
        self.r += inc.r;
        self.g += inc.g;
        self.b += inc.b;
    }

    /// Returns `self` truncated to an opaque ARGB value.
    #[inline]
    pub const fn to_argb(&self) -> u32 {
        0xFF00_0000
            | ((self.r << 8) & 0x00FF_0000) as u32
            | (self.g & 0x0000_FF00) as u32
            | ((self.b >> 8) & 0xFF) as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn greyscale_of_primaries() {
        assert_eq!(greyscale(0xFFFF_0000), 0xFF4C_4C4C);
        assert_eq!(greyscale(0xFF00_FF00), 0xFF96_9696);
        assert_eq!(greyscale(0xFFFF_FFFF), 0xFFFF_FFFF);
        assert_eq!(greyscale(0xFF00_0000), 0xFF00_0000);
    }

    #[test]
    fn mean_is_symmetric_and_opaque() {
        assert_eq!(mean(0xFF00_0000, 0xFFFF_FFFF), 0xFF7F_7F7F);
        assert_eq!(mean(0x8010_2030, 0xFF30_2010), mean(0xFF30_2010, 0x8010_2030));
        assert_eq!(mean(0x8010_2030, 0x8030_2010) >> 24, 0xFF);
    }

    #[test]
    fn rgb16_round_trips_argb() {
        for c in [0xFF00_0000, 0xFF12_3456, 0xFFFF_FFFF, 0xFF80_7F01] {
            assert_eq!(Rgb16::from_argb(c).to_argb(), c);
        }
    }

    #[test]
    fn rgb16_steps_between_colors() {
        let a = Rgb16::from_argb(0xFF00_0000);
        let b = Rgb16::from_argb(0xFF40_8000);
        let inc = Rgb16::step(&a, &b, 4);
        let mut c = a;
        for _ in 0..4 {
            c.add(&inc);
        }
        assert_eq!(c.to_argb(), 0xFF40_8000);
    }
}
