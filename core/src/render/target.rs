//! The frame buffer and the pixel writers every primitive draws through.
//!
//! A [`FrameBuffer`] pairs an ARGB color plane with an integer depth
//! plane. Smaller z is nearer; [`Z_BACKGROUND`] marks a pixel nothing has
//! been drawn to. All writes are depth tested against the buffer and then
//! handed to the current [`Pixelator`], which decides what to store.

use alloc::{boxed::Box, vec, vec::Vec};
use core::fmt::{self, Debug, Formatter};

use log::debug;

use crate::color::{argb, channels, Rgb16};
use crate::math::rand::Randu;
use crate::math::vec::Point3i;

use super::clip::ClipVolume;
use super::light::{ShadeRamp, SHADE_LAST};
use super::stats::Throughput;

/// Depth of a pixel that has not been drawn to.
pub const Z_BACKGROUND: i32 = i32::MAX;

/// The color and depth planes of a frame buffer.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Planes {
    pub pixels: Vec<u32>,
    pub zbuf: Vec<i32>,
    pub width: usize,
    pub height: usize,
}

/// A pixel write strategy.
///
/// Called only for pixels that have already passed the depth test and
/// the translucency screen; `offset` is a valid index into both planes.
pub trait Pixelator {
    fn write_pixel(&self, planes: &mut Planes, offset: usize, z: i32, argb: u32);
}

/// Stores the color and depth as given.
#[derive(Copy, Clone, Debug, Default)]
pub struct Plain;

/// Depth-cueing parameters.
///
/// Between `z_slab` and `z_depth` colors fade toward the background by
/// the factor `((z - z_slab) / (z_depth - z_slab)) ^ power`.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct DepthCue {
    pub z_slab: i32,
    pub z_depth: i32,
    pub power: u8,
}

/// A pixelator that depth-cues colors before passing them to `inner`.
#[derive(Copy, Clone, Debug)]
pub struct Cued<P = Plain> {
    pub cue: DepthCue,
    pub background: u32,
    pub inner: P,
}

/// How the pixels of a horizontal span are colored.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Paint {
    /// Every pixel gets the same color.
    Flat(u32),
    /// The base color, dithered one shade up or down on a pseudo-random
    /// quarter of the pixels.
    Noisy { base: u32, up: u32, down: u32 },
    /// Colors interpolated from the left to the right end.
    Gouraud(Rgb16, Rgb16),
}

/// A z-buffered ARGB frame buffer.
pub struct FrameBuffer {
    planes: Planes,
    window_width: i32,
    window_height: i32,
    antialias: bool,
    oversampled: bool,
    clip: ClipVolume,
    background: u32,
    translucent: bool,
    depth_cue: Option<DepthCue>,
    pixelator: Box<dyn Pixelator>,
    frags: Throughput,
}

//
// Inherent impls
//

impl Planes {
    /// Returns planes of the given size, cleared to `background`.
    pub fn new(width: usize, height: usize, background: u32) -> Self {
        Self {
            pixels: vec![background; width * height],
            zbuf: vec![Z_BACKGROUND; width * height],
            width,
            height,
        }
    }

    /// Returns whether the pixel at `offset` is on the drawn half of the
    /// translucency checkerboard.
    #[inline]
    pub fn is_screen_open(&self, offset: usize) -> bool {
        let (x, y) = (offset % self.width, offset / self.width);
        (x ^ y) & 1 == 0
    }
}

impl DepthCue {
    /// Returns whether the cue has any effect.
    pub fn is_enabled(&self) -> bool {
        self.z_slab < self.z_depth
    }

    /// Returns the fade factor at depth `z`, in 0.0..=1.0.
    pub fn factor(&self, z: i32) -> f32 {
        if !self.is_enabled() || z <= self.z_slab {
            return 0.0;
        }
        if z >= self.z_depth {
            return 1.0;
        }
        let t = (z - self.z_slab) as f32 / (self.z_depth - self.z_slab) as f32;
        (0..self.power).fold(1.0, |acc, _| acc * t)
    }

    /// Returns `argb` faded toward `background` for depth `z`.
    pub fn blend(&self, argb: u32, background: u32, z: i32) -> u32 {
        let f = self.factor(z);
        if f <= 0.0 {
            return argb;
        }
        let [r0, g0, b0] = channels(argb);
        let [r1, g1, b1] = channels(background);
        let mix = |c0: u32, c1: u32| {
            let c = c0 as f32 + (c1 as f32 - c0 as f32) * f;
            (c + 0.5) as u32
        };
        argb_opaque(mix(r0, r1), mix(g0, g1), mix(b0, b1))
    }
}

impl Paint {
    /// Returns noisy paint around entry `shade` of `ramp`.
    pub fn noisy(ramp: &ShadeRamp, shade: u8) -> Self {
        let i = shade.min(SHADE_LAST) as usize;
        Self::Noisy {
            base: ramp[i],
            up: ramp[(i + 1).min(SHADE_LAST as usize)],
            down: ramp[i.saturating_sub(1)],
        }
    }
}

impl FrameBuffer {
    /// Returns a new buffer of the given window size, cleared to black.
    pub fn new(width: i32, height: i32) -> Self {
        assert!(width > 0 && height > 0, "invalid size {width}x{height}");
        let background = 0xFF00_0000;
        Self {
            planes: Planes::new(width as usize, height as usize, background),
            window_width: width,
            window_height: height,
            antialias: false,
            oversampled: false,
            clip: ClipVolume {
                width,
                height,
                slab: 0,
                depth: i32::MAX - 1,
            },
            background,
            translucent: false,
            depth_cue: None,
            pixelator: Box::new(Plain),
            frags: Throughput::default(),
        }
    }

    /// Sets the window size and whether frames may be oversampled.
    ///
    /// Takes effect at the next [`begin`][Self::begin].
    ///
    /// # Panics
    /// If `width` or `height` is not positive.
    pub fn set_window_size(&mut self, width: i32, height: i32, antialias: bool) {
        assert!(width > 0 && height > 0, "invalid size {width}x{height}");
        self.window_width = width;
        self.window_height = height;
        self.antialias = antialias;
    }

    /// Starts a frame, reallocating the planes if the size changed and
    /// clearing them to the background.
    ///
    /// If `oversample` is set and the window allows it, the planes are
    /// allocated at twice the window size, and callers are expected to
    /// scale all coordinates by two.
    pub fn begin(&mut self, oversample: bool) {
        self.oversampled = oversample && self.antialias;
        let k = if self.oversampled { 2 } else { 1 };
        let (w, h) = (self.window_width * k, self.window_height * k);
        let (w_us, h_us) = (w as usize, h as usize);
        if self.planes.width != w_us || self.planes.height != h_us {
            let Planes { pixels, zbuf, width, height } = &mut self.planes;
            if w_us * h_us > pixels.capacity() {
                debug!("allocating {w}x{h} frame buffer");
            }
            (*width, *height) = (w_us, h_us);
            pixels.clear();
            pixels.resize(w_us * h_us, self.background);
            zbuf.clear();
            zbuf.resize(w_us * h_us, Z_BACKGROUND);
        } else {
            self.clear();
        }
        self.clip.width = w;
        self.clip.height = h;
    }

    /// Ends a frame, downsampling the planes to window size if the frame
    /// was oversampled.
    pub fn end(&mut self) {
        if self.oversampled {
            self.downsample();
            self.oversampled = false;
            self.clip.width = self.window_width;
            self.clip.height = self.window_height;
        }
    }

    /// Resets every pixel to the background color and infinite depth.
    pub fn clear(&mut self) {
        self.planes.pixels.fill(self.background);
        self.planes.zbuf.fill(Z_BACKGROUND);
    }

    /// Returns the current width of the planes.
    pub fn width(&self) -> i32 {
        self.planes.width as i32
    }
    /// Returns the current height of the planes.
    pub fn height(&self) -> i32 {
        self.planes.height as i32
    }
    pub fn window_width(&self) -> i32 {
        self.window_width
    }
    pub fn window_height(&self) -> i32 {
        self.window_height
    }
    /// Returns whether the current frame is drawn at twice window size.
    pub fn is_oversampled(&self) -> bool {
        self.oversampled
    }

    /// Returns the clip volume of the current frame.
    pub fn clip(&self) -> &ClipVolume {
        &self.clip
    }

    /// Sets the near and far clip planes.
    pub fn set_slab_depth(&mut self, slab: i32, depth: i32) {
        self.clip.slab = slab;
        self.clip.depth = depth;
    }

    pub fn background(&self) -> u32 {
        self.background
    }

    /// Sets the background color, used by [`clear`][Self::clear] and by
    /// depth-cueing.
    pub fn set_background(&mut self, argb: u32) {
        self.background = argb | 0xFF00_0000;
        self.set_depth_cue(self.depth_cue);
    }

    /// Installs a depth-cueing pixelator, or the plain one if `cue` is
    /// `None` or disabled.
    pub fn set_depth_cue(&mut self, cue: Option<DepthCue>) {
        self.depth_cue = cue;
        self.pixelator = match cue {
            Some(cue) if cue.is_enabled() => Box::new(Cued {
                cue,
                background: self.background,
                inner: Plain,
            }),
            _ => Box::new(Plain),
        };
    }

    /// Replaces the pixel writer.
    ///
    /// Stays in effect until the next call to this method,
    /// [`set_depth_cue`][Self::set_depth_cue], or
    /// [`set_background`][Self::set_background].
    pub fn set_pixelator(&mut self, p: impl Pixelator + 'static) {
        self.pixelator = Box::new(p);
    }

    /// Sets whether subsequent writes are screened by the translucency
    /// checkerboard.
    pub fn set_translucent(&mut self, translucent: bool) {
        self.translucent = translucent;
    }
    pub fn is_translucent(&self) -> bool {
        self.translucent
    }

    /// Returns the color plane, row-major.
    pub fn pixels(&self) -> &[u32] {
        &self.planes.pixels
    }
    /// Returns the depth plane, row-major.
    pub fn zbuf(&self) -> &[i32] {
        &self.planes.zbuf
    }
    pub fn planes(&self) -> &Planes {
        &self.planes
    }

    /// Returns the color at `(x, y)`.
    ///
    /// # Panics
    /// If `(x, y)` is outside the buffer.
    pub fn pixel(&self, x: i32, y: i32) -> u32 {
        self.planes.pixels[self.checked_offset(x, y)]
    }
    /// Returns the depth at `(x, y)`.
    ///
    /// # Panics
    /// If `(x, y)` is outside the buffer.
    pub fn z(&self, x: i32, y: i32) -> i32 {
        self.planes.zbuf[self.checked_offset(x, y)]
    }

    /// Returns the count of pixels submitted and written so far.
    pub fn frags(&self) -> Throughput {
        self.frags
    }

    /// Returns and resets the count of pixels submitted and written.
    pub fn take_frags(&mut self) -> Throughput {
        core::mem::take(&mut self.frags)
    }

    /// Returns the plane offset of `(x, y)`, which must be inside.
    #[inline]
    pub fn offset(&self, x: i32, y: i32) -> usize {
        y as usize * self.planes.width + x as usize
    }

    fn checked_offset(&self, x: i32, y: i32) -> usize {
        assert!(
            !self.clip.is_clipped_xy(x, y),
            "pixel ({x}, {y}) outside {}x{} buffer",
            self.width(),
            self.height()
        );
        self.offset(x, y)
    }

    /// Depth-tests and writes one pixel at a valid offset.
    #[inline]
    pub fn put(&mut self, offset: usize, z: i32, argb: u32) {
        self.frags.i += 1;
        if z < self.planes.zbuf[offset] {
            self.write(offset, z, argb);
        }
    }

    /// Depth-tests a pixel at a valid offset, computing its color only if
    /// the test passes.
    #[inline]
    pub fn put_with(&mut self, offset: usize, z: i32, argb: impl FnOnce() -> u32) {
        self.frags.i += 1;
        if z < self.planes.zbuf[offset] {
            self.write(offset, z, argb());
        }
    }

    /// Writes a pixel that has passed the depth test.
    #[inline]
    fn write(&mut self, offset: usize, z: i32, argb: u32) {
        if self.translucent && !self.planes.is_screen_open(offset) {
            return;
        }
        self.frags.o += 1;
        self.pixelator.write_pixel(&mut self.planes, offset, z, argb);
    }

    /// Plots a pixel if it is inside the clip volume.
    #[inline]
    pub fn plot_pixel(&mut self, x: i32, y: i32, z: i32, argb: u32) {
        if self.clip.contains(x, y, z) {
            let o = self.offset(x, y);
            self.put(o, z, argb);
        }
    }

    /// Plots a pixel known to be inside the buffer.
    #[inline]
    pub fn plot_pixel_unclipped(&mut self, x: i32, y: i32, z: i32, argb: u32) {
        debug_assert!(!self.clip.is_clipped_xy(x, y));
        let o = self.offset(x, y);
        self.put(o, z, argb);
    }

    /// Plots `count` pixels of constant depth starting at `(x, y)`,
    /// clipped to the volume.
    pub fn plot_pixels(&mut self, argb: u32, count: i32, x: i32, y: i32, z: i32) {
        let clip = self.clip;
        if y < 0 || y >= clip.height || x >= clip.width {
            return;
        }
        if z < clip.slab || z > clip.depth {
            return;
        }
        let x0 = x.max(0);
        let x1 = (x + count).min(clip.width);
        if x1 > x0 {
            self.plot_pixels_unclipped(argb, x1 - x0, x0, y, z);
        }
    }

    /// Plots `count` pixels of constant depth starting at `(x, y)`,
    /// all known to be inside the buffer.
    pub fn plot_pixels_unclipped(
        &mut self,
        argb: u32,
        count: i32,
        x: i32,
        y: i32,
        z: i32,
    ) {
        let o = self.offset(x, y);
        for o in o..o + count.max(0) as usize {
            self.put(o, z, argb);
        }
    }

    /// Plots a raster span: `count` pixels from `(x, y)` rightward, z
    /// interpolated from `z_left` at the first pixel toward `z_right`
    /// one past the last.
    ///
    /// If `clipped`, pixels outside the clip volume are skipped;
    /// otherwise the whole span must lie inside the buffer. Both forms
    /// write identical pixels where the span is inside.
    #[allow(clippy::too_many_arguments)]
    pub fn plot_span(
        &mut self,
        x: i32,
        y: i32,
        count: i32,
        z_left: i32,
        z_right: i32,
        paint: &Paint,
        clipped: bool,
    ) {
        if count <= 0 {
            return;
        }
        let clip = self.clip;
        if clipped
            && (y < 0
                || y >= clip.height
                || x >= clip.width
                || (z_left < clip.slab && z_right < clip.slab)
                || (z_left > clip.depth && z_right > clip.depth))
        {
            return;
        }

        let mut seed = Randu::step(
            ((x as u32) << 16).wrapping_add((y as u32) << 1) ^ 0x3333_3333,
        );
        let mut z = ((z_left as i64) << 10) + (1 << 9);
        let dz = z_right as i64 - z_left as i64;
        let n = count as i64;
        let round = if dz >= 0 { n / 2 } else { -(n / 2) };
        let z_inc = ((dz << 10) + round) / n;

        let (mut rgb, rgb_inc) = match *paint {
            Paint::Gouraud(l, r) => {
                let start = Rgb16 { r: l.r << 8, g: l.g, b: l.b };
                let inc = Rgb16 {
                    r: ((r.r - l.r) << 8) / count,
                    g: (r.g - l.g) / count,
                    b: (r.b - l.b) / count,
                };
                (start, inc)
            }
            _ => Default::default(),
        };

        let (mut x, mut count) = (x, count);
        if clipped {
            if x < 0 {
                let skip = -x;
                count -= skip;
                if count <= 0 {
                    return;
                }
                z += z_inc * skip as i64;
                rgb.r += rgb_inc.r * skip;
                rgb.g += rgb_inc.g * skip;
                rgb.b += rgb_inc.b * skip;
                x = 0;
            }
            count = count.min(clip.width - x);
        }

        let (slab, depth) =
            if clipped { (clip.slab, clip.depth) } else { (i32::MIN, i32::MAX) };
        let mut o = self.offset(x, y);
        for _ in 0..count {
            let zz = (z >> 10) as i32;
            self.frags.i += 1;
            if zz >= slab && zz <= depth && zz < self.planes.zbuf[o] {
                let c = match *paint {
                    Paint::Flat(c) => c,
                    Paint::Noisy { base, up, down } => {
                        seed = Randu::step(seed);
                        match (seed >> 16) & 0x07 {
                            0 => down,
                            1 => up,
                            _ => base,
                        }
                    }
                    Paint::Gouraud(..) => {
                        0xFF00_0000
                            | (rgb.r & 0xFF_0000) as u32
                            | (rgb.g & 0xFF00) as u32
                            | ((rgb.b >> 8) & 0xFF) as u32
                    }
                };
                self.write(o, zz, c);
            }
            o += 1;
            z += z_inc;
            rgb.add(&rgb_inc);
        }
    }

    /// Plots each point, and when oversampled, the 2×2 block it covers.
    pub fn plot_points(&mut self, points: &[Point3i], dx: i32, dy: i32, argb: u32) {
        for p in points {
            let [x, y, z] = p.0;
            let (x, y) = (x + dx, y + dy);
            self.plot_pixel(x, y, z, argb);
            if self.oversampled {
                self.plot_pixel(x + 1, y, z, argb);
                self.plot_pixel(x + 1, y + 1, z, argb);
                self.plot_pixel(x, y + 1, z, argb);
            }
        }
    }

    /// Fills the axis-aligned rectangle with top left corner `(x, y)`.
    pub fn fill_rect(&mut self, x: i32, y: i32, z: i32, w: i32, h: i32, argb: u32) {
        let (y0, y1) = (y.max(0), (y + h).min(self.clip.height));
        for yy in y0..y1 {
            self.plot_pixels(argb, w, x, yy, z);
        }
    }

    /// Outlines the axis-aligned rectangle with top left corner `(x, y)`.
    pub fn draw_rect(&mut self, x: i32, y: i32, z: i32, w: i32, h: i32, argb: u32) {
        if w <= 0 || h <= 0 {
            return;
        }
        self.plot_pixels(argb, w, x, y, z);
        if h > 1 {
            self.plot_pixels(argb, w, x, y + h - 1, z);
        }
        for yy in y + 1..y + h - 1 {
            self.plot_pixel(x, yy, z, argb);
            if w > 1 {
                self.plot_pixel(x + w - 1, yy, z, argb);
            }
        }
    }

    /// Plots a pixel of partial coverage `cov / 8`, blended with the
    /// current pixel color. Full coverage writes `argb` as is.
    pub fn plot_coverage(&mut self, x: i32, y: i32, z: i32, argb: u32, cov: u8) {
        if cov == 0 || !self.clip.contains(x, y, z) {
            return;
        }
        let o = self.offset(x, y);
        if cov >= 8 {
            return self.put(o, z, argb);
        }
        let [r0, g0, b0] = channels(self.planes.pixels[o]);
        let [r1, g1, b1] = channels(argb);
        let c = cov as u32;
        let mix = |a: u32, b: u32| (a * (8 - c) + b * c) / 8;
        self.put(o, z, argb_opaque(mix(r0, r1), mix(g0, g1), mix(b0, b1)));
    }

    /// Averages each 2×2 block of the planes into one pixel, halving
    /// both dimensions.
    ///
    /// Depth takes the nearest of the four samples, scaled by one half.
    fn downsample(&mut self) {
        let (w, h) = (self.window_width as usize, self.window_height as usize);
        let bg = self.background;
        let Planes { pixels, zbuf, width: w2, .. } = &mut self.planes;
        let w2 = *w2;
        let quarter = |p: u32| {
            let p = if p == 0 { bg } else { p };
            (p >> 2) & 0x3F3F_3F3F
        };

        for y in 0..h {
            let row = 2 * y * w2;
            for x in 0..w {
                let [a, b] = [row + 2 * x, row + 2 * x + 1];
                let [c, d] = [a + w2, b + w2];
                let mut sum = quarter(pixels[a])
                    + quarter(pixels[b])
                    + quarter(pixels[c])
                    + quarter(pixels[d]);
                sum += (sum & 0xC0C0_C0C0) >> 6;
                let z = zbuf[a].min(zbuf[b]).min(zbuf[c]).min(zbuf[d]);

                let o = y * w + x;
                pixels[o] = sum | 0xFF00_0000;
                zbuf[o] = if z == Z_BACKGROUND { z } else { z >> 1 };
            }
        }
        pixels.truncate(w * h);
        zbuf.truncate(w * h);
        self.planes.width = w;
        self.planes.height = h;
    }
}

#[inline]
fn argb_opaque(r: u32, g: u32, b: u32) -> u32 {
    argb(r.min(0xFF), g.min(0xFF), b.min(0xFF))
}

//
// Trait impls
//

impl Pixelator for Plain {
    #[inline]
    fn write_pixel(&self, planes: &mut Planes, offset: usize, z: i32, argb: u32) {
        planes.pixels[offset] = argb;
        planes.zbuf[offset] = z;
    }
}

impl<P: Pixelator> Pixelator for Cued<P> {
    #[inline]
    fn write_pixel(&self, planes: &mut Planes, offset: usize, z: i32, argb: u32) {
        let argb = self.cue.blend(argb, self.background, z);
        self.inner.write_pixel(planes, offset, z, argb);
    }
}

impl<F> Pixelator for F
where
    F: Fn(&mut Planes, usize, i32, u32),
{
    #[inline]
    fn write_pixel(&self, planes: &mut Planes, offset: usize, z: i32, argb: u32) {
        self(planes, offset, z, argb);
    }
}

impl Debug for FrameBuffer {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameBuffer")
            .field("width", &self.planes.width)
            .field("height", &self.planes.height)
            .field("clip", &self.clip)
            .field("background", &format_args!("{:#010X}", self.background))
            .field("translucent", &self.translucent)
            .field("depth_cue", &self.depth_cue)
            .finish_non_exhaustive()
    }
}
