//! Utilities at the edges of the renderer.

pub mod pnm;
