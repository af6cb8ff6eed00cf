//! Spins a molecule in a window. Space toggles antialiasing, and `C`
//! cycles through the bond end caps.

use std::ops::ControlFlow::Continue;

use minifb::{Key, KeyRepeat};

use rm::math::mat::{rotate_x, rotate_y};
use rm::prelude::*;
use rm_front::minifb::Window;
use rastermol_demos::{Molecule, Style, draw};

fn main() -> anyhow::Result<()> {
    env_logger::init();
    eprintln!("Press Space to toggle antialiasing, C to change bond caps...");

    let mut win = Window::builder()
        .title("rastermol//molecule")
        .dims((640, 480))
        .antialias(true)
        .build()?;
    let mut ctx = win.context();
    ctx.set_background_argb(0xFF10_1020);

    let mol = Molecule::aniline();
    let mut style = Style::default();
    let mut antialias = false;

    win.run(&mut ctx, |frame| {
        let imp = &frame.win.imp;
        if imp.is_key_pressed(Key::Space, KeyRepeat::No) {
            antialias = !antialias;
        }
        if imp.is_key_pressed(Key::C, KeyRepeat::No) {
            style.endcap = match style.endcap {
                Endcap::Open => Endcap::Flat,
                Endcap::Flat => Endcap::Spherical,
                _ => Endcap::Open,
            };
        }
        let secs = frame.t.as_secs_f32();
        let rotation = rotate_y(secs).then(&rotate_x(secs * 0.7));
        draw(frame.ctx, &mol, &style, &rotation, antialias);
        Continue(())
    });
    Ok(())
}
