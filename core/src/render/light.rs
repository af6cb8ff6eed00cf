//! Lighting model and shade ramps.
//!
//! The renderer uses a single directional light fixed in screen space and
//! a viewer looking down the negative z axis. Instead of computing a color
//! per pixel, every surface point is reduced to an *intensity* in `0..64`
//! that indexes a 64-entry [`ShadeRamp`] of its base color.

use alloc::boxed::Box;

use crate::math::{
    Randu,
    float::{f32 as fp, floor_i32},
    vec::Vec3,
};

/// The number of entries in a shade ramp.
pub const SHADE_COUNT: usize = 64;
/// The index of the brightest shade.
pub const SHADE_LAST: u8 = 63;
/// The index of the unmodified base color in a shade ramp.
pub const SHADE_NORMAL: u8 = 52;
/// Upper bound for flat surfaces, so that large planar areas never
/// saturate into the specular highlight.
pub const SPECULAR_SURFACE_LIMIT: u8 = SHADE_NORMAL + 4;
/// The intensity used for the null normal.
pub const NULL_NORMIX_SHADE: u8 = 50;

/// A 64-entry ARGB gradient from ambient shadow to specular highlight.
pub type ShadeRamp = [u32; SHADE_COUNT];

/// The unit vector toward the light source, `(-1, -1, 2.5)` normalized.
///
/// Screen y grows downward, so the light is up and to the left of the
/// viewer.
pub const LIGHT: Vec3 = Vec3([-0.348_155_3, -0.348_155_3, 0.870_388_3]);

/// Lighting parameters.
///
/// Percentages are in `0..=100`. Changing any field invalidates shade
/// ramps and normal intensities built with the previous values.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Lighting {
    /// Brightness of the darkest shade as a percentage of the base color.
    pub ambient_percent: u8,
    /// Weight of the diffuse (Lambertian) term.
    pub diffuse_percent: u8,
    /// Whether the specular term is added.
    pub specular: bool,
    /// Weight of the specular term.
    pub specular_percent: u8,
    /// How far toward white the brightest shade goes.
    pub specular_power: u8,
    /// The specular falloff as a power of two: the reflection term is
    /// squared this many times.
    pub specular_exponent: u8,
    /// If set, the reflection term is raised to this power instead.
    pub phong_exponent: Option<f32>,
    /// Exponent of the depth-cueing falloff.
    pub z_shade_power: u8,
}

impl Default for Lighting {
    /// Returns the default lighting:
    /// ```text
    /// ambient  45%   diffuse 84%
    /// specular 22%   power   40%   exponent 6 (phong 64)
    /// ```
    fn default() -> Self {
        Self {
            ambient_percent: 45,
            diffuse_percent: 84,
            specular: true,
            specular_percent: 22,
            specular_power: 40,
            specular_exponent: 6,
            phong_exponent: None,
            z_shade_power: 3,
        }
    }
}

impl Lighting {
    /// Returns a lighting with no diffuse or specular term and full
    /// ambient light, which renders every surface in its base color.
    pub fn flat() -> Self {
        Self {
            ambient_percent: 100,
            diffuse_percent: 0,
            specular: false,
            ..Self::default()
        }
    }

    /// Returns the intensity in `0.0..=1.0` of a surface with unit
    /// normal `(x, y, z)`.
    pub fn float_intensity_normalized(&self, x: f32, y: f32, z: f32) -> f32 {
        let [lx, ly, lz] = LIGHT.0;
        let n_dot_l = x * lx + y * ly + z * lz;
        if !(n_dot_l > 0.0) {
            return 0.0;
        }
        let mut i = n_dot_l * self.diffuse_percent as f32 / 100.0;
        if self.specular {
            // z component of the reflection vector; the viewer is at +z
            let mut k = 2.0 * n_dot_l * z - lz;
            if k > 0.0 {
                if let Some(e) = self.phong_exponent {
                    k = fp::powf(k, e);
                } else {
                    for _ in 0..self.specular_exponent {
                        if k <= 0.0001 {
                            break;
                        }
                        k *= k;
                    }
                }
                i += k * self.specular_percent as f32 / 100.0;
            }
        }
        i.min(1.0)
    }

    /// Returns the shade index of a surface with normal `(x, y, z)`.
    ///
    /// The normal need not be unit length; a zero normal has intensity 0.
    pub fn intensity(&self, x: f32, y: f32, z: f32) -> u8 {
        let f = self.unit_intensity(x, y, z);
        (f * SHADE_LAST as f32 + 0.5) as u8
    }

    /// Returns the shade index of a surface with unit normal `(x, y, z)`.
    pub fn intensity_normalized(&self, x: f32, y: f32, z: f32) -> u8 {
        let f = self.float_intensity_normalized(x, y, z);
        (f * SHADE_LAST as f32 + 0.5) as u8
    }

    /// Returns the shade index of a surface with normal `(x, y, z)` in
    /// 8.8 fixed point.
    pub fn fp8_intensity(&self, x: f32, y: f32, z: f32) -> i32 {
        let f = self.unit_intensity(x, y, z);
        (f * SHADE_LAST as f32 * 256.0) as i32
    }

    fn unit_intensity(&self, x: f32, y: f32, z: f32) -> f32 {
        let mag = fp::sqrt(x * x + y * y + z * z);
        if mag > 0.0 {
            self.float_intensity_normalized(x / mag, y / mag, z / mag)
        } else {
            0.0
        }
    }

    /// Returns the shade index of a point `(x, y, z)` on a sphere of
    /// radius `r`, with random dither to break up banding.
    ///
    /// The fractional part of the intensity rounds up with a probability
    /// proportional to its size, and one third of the time each the
    /// result is nudged one step down or up.
    pub fn dithered_intensity(
        &self,
        x: f32,
        y: f32,
        z: f32,
        r: f32,
        rng: &mut Randu,
    ) -> u8 {
        let f = self.float_intensity_normalized(x / r, y / r, z / r);
        let fp8 = (f * SHADE_LAST as f32 * 256.0) as i32;
        let mut i = fp8 >> 8;
        if (fp8 & 0xFF) as u32 > rng.next_8bit() {
            i += 1;
        }
        let r16 = rng.state() & 0xFFFF;
        if r16 < 65536 / 3 && i > 0 {
            i -= 1;
        } else if r16 > 65536 * 2 / 3 && i < SHADE_LAST as i32 {
            i += 1;
        }
        i as u8
    }

    /// Returns the flat shade index of the triangle `abc`, given in screen
    /// coordinates.
    ///
    /// The face normal is oriented toward the viewer, so the result does
    /// not depend on the winding. The index is capped at
    /// [`SPECULAR_SURFACE_LIMIT`].
    pub fn surface_shade(&self, a: Vec3, b: Vec3, c: Vec3) -> u8 {
        let n = (b - a).cross(&(c - a));
        let [x, y, z] = n.0;
        let i = if z >= 0.0 {
            self.intensity(-x, -y, z)
        } else {
            self.intensity(x, y, -z)
        };
        i.min(SPECULAR_SURFACE_LIMIT)
    }

    /// Builds the shade ramp of the opaque color `argb`.
    ///
    /// Entries `0..52` rise linearly from the ambient-darkened color to
    /// the base color at [`SHADE_NORMAL`]; entries `53..64` rise from
    /// there toward white, covering the fraction of the distance given by
    /// `specular_power`. A zero color has an all-zero ramp.
    pub fn shade_ramp(&self, argb: u32) -> ShadeRamp {
        let mut ramp = [0; SHADE_COUNT];
        if argb == 0 {
            return ramp;
        }
        let ambient = self.ambient_percent as f32 / 100.0;
        let intense = self.specular_power as f32 / 100.0;
        let normal = SHADE_NORMAL as usize;

        let mut c = [(argb >> 16) & 0xFF, (argb >> 8) & 0xFF, argb & 0xFF]
            .map(|ch| ch as f32);
        let f = (1.0 - ambient) / normal as f32;
        let step = c.map(|ch| ch * f);
        c = c.map(|ch| ch * ambient + 0.5);
        for shade in &mut ramp[..normal] {
            *shade = pack(c);
            for (ch, st) in c.iter_mut().zip(&step) {
                *ch += st;
            }
        }
        ramp[normal] = argb | 0xFF00_0000;

        let f = intense / (SHADE_COUNT - normal - 1) as f32;
        let step = c.map(|ch| (255.5 - ch) * f);
        for shade in &mut ramp[normal + 1..] {
            for (ch, st) in c.iter_mut().zip(&step) {
                *ch += st;
            }
            *shade = pack(c);
        }
        ramp
    }
}

fn pack([r, g, b]: [f32; 3]) -> u32 {
    let ch = |x: f32| (x as u32).min(0xFF);
    0xFF00_0000 | ch(r) << 16 | ch(g) << 8 | ch(b)
}

/// Precomputed dithered intensities of a viewer-facing hemisphere.
///
/// Large spheres look up their shading here instead of evaluating the
/// lighting model per pixel. The table samples a sphere of radius 130 on
/// a 256 × 256 grid.
#[derive(Clone)]
pub struct SphereIntensities(Box<[u8]>);

impl SphereIntensities {
    const SIZE: usize = 256;
    const RADIUS: f32 = 130.0;

    /// Builds the table for the given lighting, drawing dither from `rng`.
    pub fn new(lighting: &Lighting, rng: &mut Randu) -> Self {
        let mut tbl = alloc::vec![0u8; Self::SIZE * Self::SIZE];
        let r = Self::RADIUS;
        for i in 0..Self::SIZE {
            let x = i as f32 - 127.5;
            for j in 0..Self::SIZE {
                let y = j as f32 - 127.5;
                let z2 = r * r - x * x - y * y;
                if z2 > 0.0 {
                    let z = fp::sqrt(z2);
                    tbl[(j << 8) + i] =
                        lighting.dithered_intensity(x, y, z, r, rng);
                }
            }
        }
        Self(tbl.into_boxed_slice())
    }

    /// Returns the intensity at offset `(x, y)` from the center of a
    /// sphere of radius `r`.
    pub fn get(&self, x: i32, y: i32, r: i32) -> u8 {
        let d = 2 * r + 1;
        let idx = |v: i32| (((v + r).max(0) << 8) / d).min(0xFF) as usize;
        self.0[(idx(y) << 8) + idx(x)]
    }

    /// Returns the intensity in direction `(x, y, z)`, with `z` toward
    /// the viewer. Only the direction of the vector matters.
    pub fn get_dir(&self, x: f32, y: f32, z: f32) -> u8 {
        let mag = fp::sqrt(x * x + y * y + z * z);
        if !(mag > 0.0) {
            return 0;
        }
        // Sample just inside the rim of the table sphere
        let s = 127.0 / mag;
        let xi = floor_i32(x * s + 128.0).clamp(0, 255) as usize;
        let yi = floor_i32(y * s + 128.0).clamp(0, 255) as usize;
        self.0[(yi << 8) + xi]
    }
}

impl core::fmt::Debug for SphereIntensities {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("SphereIntensities(..)")
    }
}

#[cfg(test)]
mod tests {
    use crate::assert_approx_eq;
    use crate::math::vec::vec3;

    use super::*;

    #[test]
    fn light_is_unit_length() {
        assert_approx_eq!(LIGHT.len(), 1.0);
        assert_approx_eq!(LIGHT, vec3(-1.0, -1.0, 2.5).normalize());
    }

    #[test]
    fn intensities_of_axes() {
        let l = Lighting::default();
        assert_eq!(l.intensity(0.0, 0.0, 1.0), 46);
        assert_eq!(l.intensity(-1.0, -1.0, 2.5), 53);
        assert_eq!(l.intensity(-1.0, 0.0, 0.0), 18);
        assert_eq!(l.intensity(1.0, 0.0, 0.0), 0);
        assert_eq!(l.intensity(0.0, 0.0, -1.0), 0);
        assert_eq!(l.intensity(0.0, 0.0, 0.0), 0);
    }

    #[test]
    fn intensity_ignores_magnitude() {
        let l = Lighting::default();
        assert_eq!(l.intensity(0.0, 0.0, 10.0), l.intensity(0.0, 0.0, 1.0));
        assert_eq!(l.intensity(-3.0, 2.0, 7.0), l.intensity(-6.0, 4.0, 14.0));
    }

    #[test]
    fn fp8_agrees_with_rounded_intensity() {
        let l = Lighting::default();
        for v in [(0.0, 0.0, 1.0), (-1.0, 0.5, 2.0), (0.3, -0.7, 0.2)] {
            let fp8 = l.fp8_intensity(v.0, v.1, v.2);
            let i = l.intensity(v.0, v.1, v.2) as i32;
            assert!((fp8 + 128) >> 8 == i, "{fp8} vs {i}");
        }
    }

    #[test]
    fn flat_lighting_has_no_specular() {
        let l = Lighting::flat();
        assert_eq!(l.intensity(-1.0, -1.0, 2.5), 0);
        assert_eq!(l.shade_ramp(0xFF80_4020)[0], 0xFF80_4020);
    }

    #[test]
    fn phong_exponent_replaces_squaring() {
        let mut l = Lighting::default();
        let a = l.float_intensity_normalized(0.0, 0.0, 1.0);
        l.phong_exponent = Some(64.0);
        let b = l.float_intensity_normalized(0.0, 0.0, 1.0);
        assert_approx_eq!(a, b, eps = 1e-4);
    }

    #[test]
    fn dither_stays_in_range_and_near_exact() {
        let l = Lighting::default();
        let mut rng = Randu::default();
        let exact = l.fp8_intensity(-1.0, -1.0, 2.5) >> 8;
        // Rounds up by at most one, then nudged by at most one either way
        let near = exact - 1..=exact + 2;
        for _ in 0..1000 {
            let i = l.dithered_intensity(-1.0, -1.0, 2.5, 2.872_281_3, &mut rng);
            assert!(near.contains(&(i as i32)), "{i} vs {exact}");
            let i = l.dithered_intensity(1.0, 0.0, 0.0, 1.0, &mut rng);
            assert!(i <= 1, "{i}");
        }
    }

    #[test]
    fn surface_shade_ignores_winding() {
        let l = Lighting::default();
        let (a, b, c) = (vec3(0.0, 0.0, 0.0), vec3(10.0, 0.0, 0.0), vec3(0.0, 10.0, 0.0));
        assert_eq!(l.surface_shade(a, b, c), l.surface_shade(a, c, b));
        assert_eq!(l.surface_shade(a, b, c), 46);
    }

    #[test]
    fn surface_shade_is_capped() {
        let l = Lighting { specular_exponent: 0, ..Lighting::default() };
        let a = vec3(0.0, 0.0, 0.0);
        let n = vec3(1.0, 1.0, 2.5);
        // Two edges perpendicular to the light direction
        let b = vec3(1.0, -1.0, 0.0);
        let c = n.cross(&b);
        assert!(l.intensity(-1.0, -1.0, 2.5) > SPECULAR_SURFACE_LIMIT);
        assert_eq!(l.surface_shade(a, b, c), SPECULAR_SURFACE_LIMIT);
    }

    #[test]
    fn ramp_of_zero_is_zero() {
        assert_eq!(Lighting::default().shade_ramp(0), [0; SHADE_COUNT]);
    }

    #[test]
    fn ramp_shape() {
        let l = Lighting::default();
        let ramp = l.shade_ramp(0xFF40_80C0);
        assert_eq!(ramp[SHADE_NORMAL as usize], 0xFF40_80C0);
        // 45% ambient, rounded
        assert_eq!(ramp[0], 0xFF1D_3A56);
        for w in ramp.windows(2) {
            for sh in [0, 8, 16] {
                assert!((w[0] >> sh) & 0xFF <= (w[1] >> sh) & 0xFF);
            }
        }
        assert!(ramp.iter().all(|&s| s >> 24 == 0xFF));
    }

    #[test]
    fn full_specular_power_reaches_white() {
        let l = Lighting { specular_power: 100, ..Lighting::default() };
        assert_eq!(l.shade_ramp(0xFF00_0000)[63], 0xFFFF_FFFF);
        assert_eq!(l.shade_ramp(0xFF12_3456)[63], 0xFFFF_FFFF);
    }

    #[test]
    fn sphere_table_is_lit_toward_light() {
        let l = Lighting::default();
        let t = SphereIntensities::new(&l, &mut Randu::default());
        let toward = t.get(-40, -40, 100);
        let away = t.get(80, 50, 100);
        assert!(toward > away, "{toward} <= {away}");
        assert_eq!(t.get(-200, -200, 100), 0);
    }
}
