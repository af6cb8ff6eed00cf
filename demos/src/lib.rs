//! A small ball-and-stick scene shared by the demo programs.

use rm::prelude::*;

/// An atom of a molecule, with its position in ångströms.
#[derive(Copy, Clone, Debug)]
pub struct Atom {
    pub element: Element,
    pub pos: Vec3,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Element {
    H,
    C,
    N,
    O,
}

impl Element {
    /// Returns the drawn radius in ångströms.
    pub fn radius(self) -> f32 {
        match self {
            Element::H => 0.25,
            Element::C => 0.4,
            Element::N => 0.38,
            Element::O => 0.36,
        }
    }

    /// Returns the name of the conventional color of the element.
    pub fn color(self) -> &'static str {
        match self {
            Element::H => "white",
            Element::C => "gray",
            Element::N => "blue",
            Element::O => "red",
        }
    }
}

/// Atoms and the bonds between them.
#[derive(Clone, Debug, Default)]
pub struct Molecule {
    pub name: &'static str,
    pub atoms: Vec<Atom>,
    pub bonds: Vec<(usize, usize)>,
}

/// Bonds longer than this are not inferred.
const MAX_BOND: f32 = 1.6;

impl Molecule {
    /// Returns a benzene ring with one hydrogen replaced by an amine
    /// group.
    pub fn aniline() -> Self {
        use Element::*;
        let mut atoms = Vec::new();
        for i in 0..6 {
            let (s, c) = (i as f32 * std::f32::consts::FRAC_PI_3).sin_cos();
            atoms.push(Atom { element: C, pos: vec3(1.39 * c, 1.39 * s, 0.0) });
            let (element, r) = if i == 0 { (N, 2.79) } else { (H, 2.47) };
            atoms.push(Atom { element, pos: vec3(r * c, r * s, 0.0) });
        }
        for dy in [-0.84, 0.84] {
            atoms.push(Atom { element: H, pos: vec3(3.3, dy, 0.3) });
        }
        let mut mol = Self { name: "aniline", atoms, bonds: Vec::new() };
        mol.infer_bonds();
        mol
    }

    /// Connects every pair of atoms closer than a typical bond length,
    /// except pairs of hydrogens.
    pub fn infer_bonds(&mut self) {
        self.bonds.clear();
        for (i, a) in self.atoms.iter().enumerate() {
            for (j, b) in self.atoms.iter().enumerate().skip(i + 1) {
                if a.element == Element::H && b.element == Element::H {
                    continue;
                }
                if (a.pos - b.pos).len_sqr() < MAX_BOND * MAX_BOND {
                    self.bonds.push((i, j));
                }
            }
        }
    }

    /// Returns the distance from the origin to the far side of the
    /// farthest atom.
    pub fn extent(&self) -> f32 {
        self.atoms
            .iter()
            .map(|a| a.pos.len() + a.element.radius())
            .fold(0.0, f32::max)
    }
}

/// How a molecule is drawn.
#[derive(Clone, Debug)]
pub struct Style {
    /// Bond diameter in ångströms.
    pub bond_diameter: f32,
    pub endcap: Endcap,
    pub labels: bool,
}

impl Default for Style {
    fn default() -> Self {
        Self {
            bond_diameter: 0.3,
            endcap: Endcap::Open,
            labels: true,
        }
    }
}

/// Draws one frame of `mol` turned by `rotation`.
pub fn draw(
    ctx: &mut RenderContext,
    mol: &Molecule,
    style: &Style,
    rotation: &Mat3,
    antialias: bool,
) {
    ctx.begin_rendering(rotation, antialias);
    let (w, h) = (ctx.width(), ctx.height());
    let extent = mol.extent().max(1.0);
    let scale = w.min(h) as f32 / (2.2 * extent);
    let center = vec3(w as f32 / 2.0, h as f32 / 2.0, 2.0 * w.max(h) as f32);
    let depth = extent * scale;
    ctx.set_z_extent((center.z() - depth) as i32, (center.z() + depth) as i32);

    // Model y is up and z toward the viewer
    let project = |p: Vec3| {
        let v = rotation.apply(&p);
        (vec3(v.x(), -v.y(), -v.z()) * scale + center).to_point_round()
    };
    let screen: Vec<_> = mol.atoms.iter().map(|a| project(a.pos)).collect();
    let colixes: Vec<_> = mol
        .atoms
        .iter()
        .map(|a| ctx.colix_from_name(a.element.color()))
        .collect();

    for (i, a) in mol.atoms.iter().enumerate() {
        let d = (2.0 * a.element.radius() * scale) as i32;
        ctx.fill_sphere(colixes[i], d, screen[i]);
    }
    let d = (style.bond_diameter * scale) as i32;
    for &(i, j) in &mol.bonds {
        let (ci, cj) = (colixes[i], colixes[j]);
        if d <= 1 {
            ctx.draw_line(ci, cj, screen[i], screen[j]);
        } else {
            ctx.fill_cylinder(ci, cj, style.endcap, d, screen[i], screen[j]);
        }
    }

    if style.labels {
        let font = BitmapFont::builtin();
        let k = if ctx.is_oversampled() { 2 } else { 1 };
        let ink = ctx.colix_from_name("yellow");
        let text = format!(
            "{}\n{} atoms, {} bonds",
            mol.name,
            mol.atoms.len(),
            mol.bonds.len()
        );
        ctx.draw_string(ink, &font, &text, 4 * k, 4 * k + font.ascent(), 1);
    }
    ctx.end_rendering();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aniline_bonds() {
        let mol = Molecule::aniline();
        assert_eq!(mol.atoms.len(), 14);
        // Six ring bonds, five C-H, one C-N, two N-H
        assert_eq!(mol.bonds.len(), 14);
    }

    #[test]
    fn frame_has_atoms_and_label() {
        let mut ctx = RenderContext::new(64, 48);
        let mol = Molecule::aniline();
        draw(&mut ctx, &mol, &Style::default(), &Mat3::IDENTITY, false);
        let bg = ctx.frame_buffer().background();
        assert!(ctx.pixels().iter().any(|&p| p != bg));
        assert_eq!(ctx.stats().frames, 1.0);
    }
}
