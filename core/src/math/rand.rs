//! Pseudo-random number generation.
//!
//! Two generators live here. [`Randu`] is the cheap 31-bit multiplicative
//! generator that drives lighting dither; its output is part of the
//! rendered image, so it is owned by each render context and reseeded
//! deterministically. [`Xorshift64`] is a higher-quality generator for
//! sampling test inputs and demo scenes.

use core::{fmt::Debug, ops::Range};

use super::vec::{Vec3, vec3};

//
// Traits and types
//

pub type DefaultRng = Xorshift64;

/// Trait for generating values sampled from a probability distribution.
pub trait Distrib<R = DefaultRng>: Clone {
    /// The type of the elements of the sample space of `Self`.
    type Sample;

    /// Returns a pseudo-random value sampled from `self`.
    fn sample(&self, rng: &mut R) -> Self::Sample;

    /// Returns an iterator that yields samples from `self`.
    fn iter(&self, rng: R) -> Iter<Self, R> {
        Iter(self.clone(), rng)
    }
}

/// A 31-bit multiplicative congruential generator,
/// x<sub>n+1</sub> = 65539 x<sub>n</sub> mod 2<sup>31</sup>.
///
/// Statistically poor but very fast, and good enough to break up banding
/// between adjacent shade levels. The low bit of the seed must be set for
/// the generator to reach its full period.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[repr(transparent)]
pub struct Randu(u32);

/// A pseudo-random number generator (PRNG) that uses a [Xorshift algorithm][^1]
/// to generate 64 bits of randomness at a time, represented by a `u64`.
///
/// [^1]: Marsaglia, G. (2003). Xorshift RNGs. Journal of Statistical Software,
///     8(14), 1–6. <https://doi.org/10.18637/jss.v008.i14>
#[derive(Copy, Clone, Debug)]
#[repr(transparent)]
pub struct Xorshift64(pub u64);

/// A uniform distribution of values in the given range.
#[derive(Clone, Debug)]
pub struct Uniform<T>(pub Range<T>);

/// A uniform distribution of 3-vectors on the (surface of) the unit sphere.
#[derive(Copy, Clone, Debug, Default)]
pub struct UnitSphere;

/// Iterator returned by the [`Distrib::iter`] method.
pub struct Iter<D, R>(D, R);

//
// Inherent impls
//

impl Randu {
    /// The seed used by [`Randu::default()`].
    pub const DEFAULT_SEED: u32 = 0x1234_5679;

    /// Returns a new generator with the given seed.
    ///
    /// Only the low 31 bits of `seed` are used, and the lowest bit is
    /// forced on.
    pub const fn from_seed(seed: u32) -> Self {
        Self((seed & 0x7FFF_FFFF) | 1)
    }

    /// Returns the raw 31-bit state of `self`.
    #[inline]
    pub const fn state(&self) -> u32 {
        self.0
    }

    /// Advances the generator and returns the new 31-bit state.
    #[inline]
    pub fn next_state(&mut self) -> u32 {
        self.0 = Self::step(self.0);
        self.0
    }

    /// Advances the generator and returns its top 8 bits, in `0..256`.
    #[inline]
    pub fn next_8bit(&mut self) -> u32 {
        self.next_state() >> 23
    }

    /// One step of the generator, `65539 x mod 2^31`, on an arbitrary state.
    ///
    /// Span fillers use this to derive a per-scanline dither sequence from
    /// screen coordinates without touching any shared generator.
    #[inline]
    pub const fn step(x: u32) -> u32 {
        x.wrapping_mul(65539) & 0x7FFF_FFFF
    }
}

impl Xorshift64 {
    /// A random 64-bit prime, used to initialize the generator returned by
    /// [`Xorshift64::default()`].
    pub const DEFAULT_SEED: u64 = 378682147834061;

    /// Returns a new `Xorshift64` seeded by the given number.
    ///
    /// # Panics
    ///
    /// If `seed` equals 0.
    pub fn from_seed(seed: u64) -> Self {
        assert_ne!(seed, 0, "xorshift seed cannot be zero");
        Self(seed)
    }

    /// Returns 64 bits of pseudo-randomness.
    pub fn next_bits(&mut self) -> u64 {
        let Self(x) = self;
        *x ^= *x << 13;
        *x ^= *x >> 7;
        *x ^= *x << 17;
        *x
    }
}

//
// Foreign trait impls
//

impl Default for Randu {
    fn default() -> Self {
        Self::from_seed(Self::DEFAULT_SEED)
    }
}

impl Default for Xorshift64 {
    fn default() -> Self {
        Self::from_seed(Self::DEFAULT_SEED)
    }
}

impl<D: Distrib> Iterator for Iter<D, DefaultRng> {
    type Item = D::Sample;

    fn next(&mut self) -> Option<Self::Item> {
        Some(self.0.sample(&mut self.1))
    }
}

//
// Local trait impls
//

impl Distrib for Uniform<i32> {
    type Sample = i32;

    /// Returns a uniformly distributed `i32` in the given range.
    fn sample(&self, rng: &mut DefaultRng) -> i32 {
        let bits = (rng.next_bits() >> 33) as i32;
        bits.rem_euclid(self.0.end - self.0.start) + self.0.start
    }
}

impl Distrib for Uniform<f32> {
    type Sample = f32;

    /// Returns a uniformly distributed `f32` in the given range.
    fn sample(&self, rng: &mut DefaultRng) -> f32 {
        let Range { start, end } = self.0;
        // Bit repr of a random f32 in range 1.0..2.0
        let bits = 127 << 23 | rng.next_bits() >> 41;
        let unit = f32::from_bits(bits as u32) - 1.0;
        unit * (end - start) + start
    }
}

impl Distrib for UnitSphere {
    type Sample = Vec3;

    /// Returns a vector uniformly distributed on the unit sphere.
    ///
    /// Uses rejection sampling from the unit ball so that the directions
    /// are not biased toward the corners of the cube.
    fn sample(&self, rng: &mut DefaultRng) -> Vec3 {
        let d = Uniform(-1.0f32..1.0);
        loop {
            let v = vec3(d.sample(rng), d.sample(rng), d.sample(rng));
            let len_sqr = v.len_sqr();
            if len_sqr <= 1.0 && len_sqr > 1e-6 {
                return v.normalize();
            }
        }
    }
}
