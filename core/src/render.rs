//! Turning screen-space primitives into z-buffered pixels.
//!
//! Every primitive renderer writes through the [`FrameBuffer`] of
//! [`target`]: [lines][line], [triangles][raster], [cylinders and
//! cones][cylinder], [spheres and ellipsoids][sphere], and [text]. Their
//! colors come from the shade ramps of [`light`], and their normals are
//! quantized by [`normix`]. [`RenderContext`] ties all of these together.

pub use clip::{ClipVolume, Outcode};
pub use ctx::RenderContext;
pub use cylinder::Endcap;
pub use light::{Lighting, ShadeRamp};
pub use normix::Normix;
pub use stats::{Stats, Throughput};
pub use target::{DepthCue, FrameBuffer, Pixelator};

pub mod clip;
pub mod ctx;
pub mod cylinder;
pub mod light;
pub mod line;
pub mod normix;
pub mod raster;
pub mod sphere;
pub mod stats;
pub mod target;
pub mod text;

/// Returns the pixels of `fb` as text, one line per row, with each color
/// in `legend` shown as its character and every other color as `.`.
#[cfg(test)]
pub(crate) fn ascii(fb: &FrameBuffer, legend: &[(u32, char)]) -> alloc::string::String {
    let mut s = alloc::string::String::new();
    for y in 0..fb.height() {
        for x in 0..fb.width() {
            let p = fb.pixel(x, y);
            let c = legend.iter().find(|(argb, _)| *argb == p).map_or('.', |l| l.1);
            s.push(c);
        }
        s.push('\n');
    }
    s
}
