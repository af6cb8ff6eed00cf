//! Renders a molecule without a window and writes it as a PPM image.
//!
//! Usage: `snapshot [OUTPUT] [SIZE]`, by default `molecule.ppm` at 400
//! pixels square.

use std::{env, fs::File, io::BufWriter};

use anyhow::Context;
use log::info;

use rm::math::mat::{rotate_x, rotate_y};
use rm::prelude::*;
use rastermol_demos::{Molecule, Style, draw};

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let mut args = env::args().skip(1);
    let path = args.next().unwrap_or_else(|| "molecule.ppm".into());
    let size: i32 = match args.next() {
        Some(s) => s.parse().with_context(|| format!("invalid size {s:?}"))?,
        None => 400,
    };
    anyhow::ensure!(size > 0, "size must be positive");

    let mut ctx = RenderContext::new(size, size);
    ctx.set_window_size(size, size, true);
    ctx.set_background_argb(0xFFFF_FFFF);
    ctx.set_specular_percent(30);

    let style = Style {
        endcap: Endcap::Flat,
        ..Style::default()
    };
    let rotation = rotate_x(0.6).then(&rotate_y(-0.4));
    draw(&mut ctx, &Molecule::aniline(), &style, &rotation, true);

    let out = File::create(&path).with_context(|| format!("creating {path}"))?;
    ctx.snapshot_ppm(BufWriter::new(out))
        .with_context(|| format!("writing {path}"))?;
    info!("{}", ctx.stats());
    eprintln!("wrote {path}");
    Ok(())
}
