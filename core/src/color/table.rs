//! The color table: colix allocation, mixing, and shade ramp caching.

use alloc::{boxed::Box, collections::BTreeMap, vec::Vec};

use log::debug;

use crate::render::light::{Lighting, SHADE_COUNT, ShadeRamp};

use super::{Colix, Result, greyscale, mean, named};

/// Maps ARGB colors to [`Colix`] handles and caches a shade ramp per color.
///
/// A new table contains the four sentinels followed by every entry of
/// [`NAMED_COLORS`][super::NAMED_COLORS] in order, so named colors have the
/// same colix in every table.
#[derive(Clone, Debug)]
pub struct ColorTable {
    argbs: Vec<u32>,
    shades: Vec<Option<Box<ShadeRamp>>>,
    grey_shades: Vec<Option<Box<ShadeRamp>>>,
    by_argb: BTreeMap<u32, u16>,
    mixes: BTreeMap<u32, Colix>,
    indirect: Vec<Colix>,
    greyscale: bool,
}

const ZERO_RAMP: ShadeRamp = [0; SHADE_COUNT];

impl ColorTable {
    /// Returns a new table holding the sentinels and the named colors.
    pub fn new() -> Self {
        let n = Colix::SPECIAL_COUNT as usize;
        let mut t = Self {
            argbs: alloc::vec![0; n],
            shades: alloc::vec![None; n],
            grey_shades: alloc::vec![None; n],
            by_argb: BTreeMap::new(),
            mixes: BTreeMap::new(),
            indirect: Vec::new(),
            greyscale: false,
        };
        for &(_, argb) in named::NAMED_COLORS {
            t.colix(argb);
        }
        t
    }

    /// Returns the number of color entries, sentinels included.
    pub fn len(&self) -> usize {
        self.argbs.len()
    }

    /// Returns whether the table holds only the sentinels.
    pub fn is_empty(&self) -> bool {
        self.len() <= Colix::SPECIAL_COUNT as usize
    }

    /// Returns the colix of `argb`, allocating a new entry if needed.
    ///
    /// A zero `argb` yields [`Colix::INHERIT`]. Any alpha other than `0xFF`
    /// makes the result translucent; the stored color is always opaque.
    ///
    /// # Panics
    /// If the alpha channel is zero but the color channels are not, or if
    /// the table is full.
    pub fn colix(&mut self, argb: u32) -> Colix {
        if argb == 0 {
            return Colix::INHERIT;
        }
        let alpha = argb >> 24;
        assert!(alpha != 0, "zero alpha with nonzero rgb {argb:#010x}");
        let translucent = alpha != 0xFF;
        let opaque = argb | 0xFF00_0000;
        let index = match self.by_argb.get(&opaque) {
            Some(&i) => i as usize,
            None => self.allocate(opaque),
        };
        Colix::from_index(index).translucent(translucent)
    }

    /// Returns the colix of an RGB value, treating it as fully opaque.
    pub fn colix_rgb(&mut self, rgb: u32) -> Colix {
        self.colix(rgb | 0xFF00_0000)
    }

    /// Returns the colix for a color name or hex string, or
    /// [`Colix::UNRECOGNIZED`] if the string cannot be parsed.
    pub fn colix_from_name(&mut self, name: &str) -> Colix {
        self.parse(name).unwrap_or(Colix::UNRECOGNIZED)
    }

    /// Parses a color name or hex string into a colix.
    pub fn parse(&mut self, s: &str) -> Result<Colix> {
        named::parse(s).map(|argb| self.colix(argb))
    }

    fn allocate(&mut self, argb: u32) -> usize {
        let index = self.argbs.len();
        // Panics on overflow of the 14-bit index
        let colix = Colix::from_index(index);
        self.argbs.push(argb);
        self.shades.push(None);
        self.grey_shades.push(None);
        self.by_argb.insert(argb, colix.index() as u16);
        index
    }

    /// Returns the colix of the per-channel mean of `a` and `b`.
    ///
    /// The result is opaque and cached, and does not depend on the order
    /// of the arguments.
    pub fn mix(&mut self, a: Colix, b: Colix) -> Colix {
        let (a, b) = (self.resolve(a).opaque(), self.resolve(b).opaque());
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        let key = (lo.to_bits() as u32) << 16 | hi.to_bits() as u32;
        if let Some(&c) = self.mixes.get(&key) {
            return c;
        }
        let argb = mean(self.argbs[lo.index()], self.argbs[hi.index()]);
        let c = self.colix(argb);
        self.mixes.insert(key, c);
        c
    }

    /// Allocates a new indirection slot pointing to `target`.
    pub fn indirect(&mut self, target: Colix) -> Colix {
        assert!(!target.is_indirect(), "indirect colix cannot be a target");
        let c = Colix::from_slot(self.indirect.len());
        self.indirect.push(target);
        c
    }

    /// Redirects an indirect colix to a new target.
    ///
    /// # Panics
    /// If `slot` is not an indirect colix allocated by `self`, or if
    /// `target` is itself indirect.
    pub fn set_indirect(&mut self, slot: Colix, target: Colix) {
        assert!(slot.is_indirect(), "{slot:?} is not indirect");
        assert!(!target.is_indirect(), "indirect colix cannot be a target");
        self.indirect[slot.index()] = target;
    }

    /// Follows the indirection of `c`, if any.
    pub fn resolve(&self, c: Colix) -> Colix {
        if c.is_indirect() {
            self.indirect[c.index()]
        } else {
            c
        }
    }

    /// Returns the opaque ARGB value of `c`, or its greyscale equivalent
    /// in greyscale mode. Sentinels map to zero.
    pub fn argb(&self, c: Colix) -> u32 {
        let argb = self.argbs[self.resolve(c).index()];
        if self.greyscale && argb != 0 {
            greyscale(argb)
        } else {
            argb
        }
    }

    /// Returns the stored ARGB value of `c`, ignoring greyscale mode.
    pub fn true_argb(&self, c: Colix) -> u32 {
        self.argbs[self.resolve(c).index()]
    }

    /// Returns the shade ramp of `c`, building and caching it if needed.
    ///
    /// Sentinels have an all-zero ramp.
    pub fn shades(&mut self, c: Colix, lighting: &Lighting) -> &ShadeRamp {
        let i = self.resolve(c).index();
        if i < Colix::SPECIAL_COUNT as usize {
            return &ZERO_RAMP;
        }
        let argb = self.argbs[i];
        let cache = if self.greyscale {
            &mut self.grey_shades
        } else {
            &mut self.shades
        };
        let grey = self.greyscale;
        cache[i].get_or_insert_with(|| {
            let mut ramp = lighting.shade_ramp(argb);
            if grey {
                ramp.iter_mut().for_each(|s| *s = greyscale(*s));
            }
            Box::new(ramp)
        })
    }

    /// Discards every cached shade ramp.
    ///
    /// Must be called whenever the lighting parameters change.
    pub fn flush_shades(&mut self) {
        debug!("flushing shade ramps of {} colors", self.len());
        self.shades.iter_mut().for_each(|s| *s = None);
        self.grey_shades.iter_mut().for_each(|s| *s = None);
    }

    pub fn set_greyscale(&mut self, on: bool) {
        self.greyscale = on;
    }

    pub fn is_greyscale(&self) -> bool {
        self.greyscale
    }
}

impl Default for ColorTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use crate::color::{Error, NAMED_COLORS};
    use crate::math::rand::{Distrib, Uniform, Xorshift64};

    use super::*;

    #[test]
    fn colix_is_idempotent() {
        let mut t = ColorTable::new();
        let a = t.colix(0xFF12_3456);
        let n = t.len();
        assert_eq!(t.colix(0xFF12_3456), a);
        assert_eq!(t.len(), n);
    }

    #[test]
    fn named_colors_have_fixed_low_indices() {
        let mut t = ColorTable::new();
        assert_eq!(t.colix_from_name("black").index(), 4);
        assert_eq!(t.colix_from_name("white").index(), 5);
        assert_eq!(t.colix_from_name("red").index(), 6);
        assert_eq!(t.colix_from_name("aqua"), t.colix_from_name("cyan"));

        let mut u = ColorTable::new();
        for &(name, _) in NAMED_COLORS {
            assert_eq!(t.colix_from_name(name), u.colix_from_name(name));
        }
    }

    #[test]
    fn rgb_round_trips() {
        let mut t = ColorTable::new();
        let rng = Xorshift64::default();
        for rgb in Uniform(0..0x100_0000).iter(rng).take(500) {
            let rgb = rgb as u32;
            let c = t.colix_rgb(rgb);
            assert_eq!(t.argb(c), rgb | 0xFF00_0000);
        }
        let black = t.colix_rgb(0);
        assert_eq!(t.argb(black), 0xFF00_0000);
    }

    #[test]
    fn translucent_alpha_sets_bit() {
        let mut t = ColorTable::new();
        let c = t.colix(0x80FF_0000);
        assert!(c.is_translucent());
        assert_eq!(c.opaque(), t.colix_from_name("red"));
        assert_eq!(t.argb(c), 0xFFFF_0000);
    }

    #[test]
    fn zero_is_inherit() {
        let mut t = ColorTable::new();
        assert_eq!(t.colix(0), Colix::INHERIT);
    }

    #[test]
    #[should_panic]
    fn zero_alpha_with_rgb_panics() {
        ColorTable::new().colix(0x0012_3456);
    }

    #[test]
    fn unrecognized_names() {
        let mut t = ColorTable::new();
        assert_eq!(t.colix_from_name("nope"), Colix::UNRECOGNIZED);
        assert_eq!(t.parse(""), Err(Error::Empty));
        assert_eq!(t.colix_from_name("#00ff00"), t.colix_from_name("lime"));
    }

    #[test]
    fn mix_is_symmetric_and_cached() {
        let mut t = ColorTable::new();
        let red = t.colix_from_name("red");
        let blue = t.colix_from_name("blue").translucent(true);
        let ab = t.mix(red, blue);
        let n = t.len();
        assert_eq!(t.mix(blue, red), ab);
        assert_eq!(t.len(), n);
        assert_eq!(t.argb(ab), 0xFF7F_007F);
        assert!(!ab.is_translucent());
    }

    #[test]
    fn indirect_follows_target() {
        let mut t = ColorTable::new();
        let red = t.colix_from_name("red");
        let blue = t.colix_from_name("blue");
        let c = t.indirect(red);
        assert_eq!(t.argb(c), 0xFFFF_0000);
        t.set_indirect(c, blue);
        assert_eq!(t.argb(c), 0xFF00_00FF);
        assert_eq!(t.resolve(c), blue);
    }

    #[test]
    fn greyscale_mode() {
        let mut t = ColorTable::new();
        let l = Lighting::default();
        let red = t.colix_from_name("red");
        let ramp = *t.shades(red, &l);
        t.set_greyscale(true);
        assert_eq!(t.argb(red), 0xFF4C_4C4C);
        assert_eq!(t.true_argb(red), 0xFFFF_0000);
        let grey = *t.shades(red, &l);
        for (g, c) in grey.iter().zip(&ramp) {
            assert_eq!(*g, greyscale(*c));
        }
    }

    #[test]
    fn shades_of_sentinels_are_zero() {
        let mut t = ColorTable::new();
        let l = Lighting::default();
        assert_eq!(t.shades(Colix::INHERIT, &l), &[0; SHADE_COUNT]);
    }

    #[test]
    fn flush_rebuilds_with_new_lighting() {
        let mut t = ColorTable::new();
        let red = t.colix_from_name("red");
        let dim = *t.shades(red, &Lighting::default());
        let bright = Lighting { ambient_percent: 90, ..Lighting::default() };
        assert_eq!(t.shades(red, &bright), &dim);
        t.flush_shades();
        assert_ne!(t.shades(red, &bright)[0], dim[0]);
    }
}
