//! Bitmap text drawn into the frame buffer.
//!
//! Glyph shapes come from a [`Font`], usually supplied by the platform.
//! [`BitmapFont`] is a simple implementation backed by a 1-bit glyph
//! atlas laid out as a grid of 16 glyphs per row, indexed by code point.

use crate::util::pnm::{self, Bitmap};

use super::target::FrameBuffer;

/// Glyph metrics and coverage.
///
/// Glyph cells are `height()` pixels tall, with the baseline `ascent()`
/// pixels below the top of the cell.
pub trait Font {
    /// Returns the distance from the top of a glyph cell to the baseline.
    fn ascent(&self) -> i32;

    /// Returns the height of a glyph cell, and the distance between
    /// successive baselines.
    fn height(&self) -> i32;

    /// Returns the horizontal advance of `c`.
    fn advance(&self, c: char) -> i32;

    /// Returns the coverage of pixel `(x, y)` of the cell of `c`, in the
    /// range 0..=8 where 0 is empty and 8 is solid.
    fn coverage(&self, c: char, x: i32, y: i32) -> u8;

    /// Returns the width of the widest line of `s`.
    fn width(&self, s: &str) -> i32 {
        s.split('\n')
            .map(|line| line.chars().map(|c| self.advance(c)).sum())
            .max()
            .unwrap_or(0)
    }
}

/// A monospace font whose glyphs are cells of a 1-bit atlas image.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BitmapFont {
    atlas: Bitmap,
    cell: (u32, u32),
    ascent: i32,
    fold_case: bool,
}

/// The built-in 3x5 glyphs, one bit per pixel, row-major with the top left
/// pixel in the most significant of the 15 bits.
const TINY_GLYPHS: &[(char, u16)] = &[
    (' ', 0b000_000_000_000_000),
    ('!', 0b010_010_010_000_010),
    ('#', 0b101_111_101_111_101),
    ('%', 0b101_001_010_100_101),
    ('\'', 0b010_010_000_000_000),
    ('(', 0b010_100_100_100_010),
    (')', 0b010_001_001_001_010),
    ('*', 0b000_101_010_101_000),
    ('+', 0b000_010_111_010_000),
    (',', 0b000_000_000_010_100),
    ('-', 0b000_000_111_000_000),
    ('.', 0b000_000_000_000_010),
    ('/', 0b001_001_010_100_100),
    ('0', 0b111_101_101_101_111),
    ('1', 0b010_110_010_010_111),
    ('2', 0b110_001_010_100_111),
    ('3', 0b110_001_010_001_110),
    ('4', 0b101_101_111_001_001),
    ('5', 0b111_100_110_001_110),
    ('6', 0b011_100_111_101_111),
    ('7', 0b111_001_010_010_010),
    ('8', 0b111_101_111_101_111),
    ('9', 0b111_101_111_001_110),
    (':', 0b000_010_000_010_000),
    ('=', 0b000_111_000_111_000),
    ('?', 0b110_001_010_000_010),
    ('A', 0b010_101_111_101_101),
    ('B', 0b110_101_110_101_110),
    ('C', 0b011_100_100_100_011),
    ('D', 0b110_101_101_101_110),
    ('E', 0b111_100_110_100_111),
    ('F', 0b111_100_110_100_100),
    ('G', 0b011_100_101_101_011),
    ('H', 0b101_101_111_101_101),
    ('I', 0b111_010_010_010_111),
    ('J', 0b001_001_001_101_010),
    ('K', 0b101_101_110_101_101),
    ('L', 0b100_100_100_100_111),
    ('M', 0b101_111_111_101_101),
    ('N', 0b110_101_101_101_101),
    ('O', 0b010_101_101_101_010),
    ('P', 0b110_101_110_100_100),
    ('Q', 0b010_101_101_110_011),
    ('R', 0b110_101_110_101_101),
    ('S', 0b011_100_010_001_110),
    ('T', 0b111_010_010_010_010),
    ('U', 0b101_101_101_101_111),
    ('V', 0b101_101_101_101_010),
    ('W', 0b101_101_111_111_101),
    ('X', 0b101_101_010_101_101),
    ('Y', 0b101_101_010_010_010),
    ('Z', 0b111_001_010_100_111),
    ('_', 0b000_000_000_000_111),
];

const GLYPHS_PER_ROW: u32 = 16;

impl BitmapFont {
    /// Creates a font from a glyph atlas with cells of `cell_w` by
    /// `cell_h` pixels.
    ///
    /// The glyph of code point `i` occupies the cell in column `i % 16`
    /// and row `i / 16` of the atlas. Code points past the end of the
    /// atlas are blank.
    ///
    /// # Panics
    /// If either cell dimension is zero.
    pub fn new(atlas: Bitmap, cell_w: u32, cell_h: u32, ascent: i32) -> Self {
        assert!(cell_w > 0 && cell_h > 0, "empty glyph cell");
        Self {
            atlas,
            cell: (cell_w, cell_h),
            ascent,
            fold_case: false,
        }
    }

    /// Decodes a font from a PBM image of its glyph atlas.
    ///
    /// # Errors
    /// Returns [`pnm::Error`] if the image cannot be decoded.
    pub fn from_pbm(
        src: impl IntoIterator<Item = u8>,
        cell_w: u32,
        cell_h: u32,
        ascent: i32,
    ) -> pnm::Result<Self> {
        Ok(Self::new(pnm::read_pbm(src)?, cell_w, cell_h, ascent))
    }

    /// Returns a tiny uppercase font with 3x5 pixel glyphs in 4x6 cells.
    ///
    /// Lowercase letters are drawn as uppercase.
    pub fn builtin() -> Self {
        let (w, h) = (4, 6);
        let mut atlas = Bitmap::new(GLYPHS_PER_ROW * w, 8 * h);
        for &(c, bits) in TINY_GLYPHS {
            let (cx, cy) = cell_origin(c as u32, (w, h));
            for i in 0..15 {
                let ink = bits >> (14 - i) & 1 == 1;
                atlas.set(cx + i % 3, cy + i / 3, ink);
            }
        }
        Self {
            fold_case: true,
            ..Self::new(atlas, w, h, 5)
        }
    }

    fn glyph(&self, c: char) -> char {
        if self.fold_case {
            c.to_ascii_uppercase()
        } else {
            c
        }
    }
}

fn cell_origin(i: u32, (w, h): (u32, u32)) -> (u32, u32) {
    (i % GLYPHS_PER_ROW * w, i / GLYPHS_PER_ROW * h)
}

impl Font for BitmapFont {
    fn ascent(&self) -> i32 {
        self.ascent
    }
    fn height(&self) -> i32 {
        self.cell.1 as i32
    }
    fn advance(&self, _: char) -> i32 {
        self.cell.0 as i32
    }
    fn coverage(&self, c: char, x: i32, y: i32) -> u8 {
        let (w, h) = self.cell;
        if x < 0 || y < 0 || x as u32 >= w || y as u32 >= h {
            return 0;
        }
        let (cx, cy) = cell_origin(self.glyph(c) as u32, self.cell);
        // Atlas lookups past the end read as unset
        let ink = cx
            .checked_add(x as u32)
            .zip(cy.checked_add(y as u32))
            .is_some_and(|(ax, ay)| self.atlas.get(ax, ay));
        if ink { 8 } else { 0 }
    }
}

/// Draws `text` with its first baseline starting at `(x, y)`, at depth `z`.
///
/// Each line feed starts a new line `font.height()` pixels lower. Partial
/// coverage blends with the pixel underneath; all pixels are depth tested.
pub fn draw_string(
    fb: &mut FrameBuffer,
    font: &dyn Font,
    argb: u32,
    text: &str,
    x: i32,
    y: i32,
    z: i32,
) {
    let (h, mut top) = (font.height(), y - font.ascent());
    for line in text.split('\n') {
        let mut left = x;
        for c in line.chars() {
            let adv = font.advance(c);
            for gy in 0..h {
                for gx in 0..adv {
                    let cov = font.coverage(c, gx, gy);
                    fb.plot_coverage(left + gx, top + gy, z, argb, cov);
                }
            }
            left += adv;
        }
        top += h;
    }
}

#[cfg(test)]
mod tests {
    use crate::render::ascii;

    use super::*;

    const INK: u32 = 0xFFFF_FFFF;

    fn draw(w: i32, h: i32, text: &str, x: i32, y: i32) -> FrameBuffer {
        let mut fb = FrameBuffer::new(w, h);
        fb.begin(false);
        draw_string(&mut fb, &BitmapFont::builtin(), INK, text, x, y, 10);
        fb
    }

    #[test]
    fn builtin_glyph_sits_on_baseline() {
        let fb = draw(5, 7, "A", 1, 6);
        assert_eq!(
            ascii(&fb, &[(INK, '#')]),
            "\
.....
..#..
.#.#.
.###.
.#.#.
.#.#.
.....
"
        );
    }

    #[test]
    fn builtin_folds_case() {
        let upper = draw(12, 6, "HI!", 0, 5);
        let lower = draw(12, 6, "hi!", 0, 5);
        assert_eq!(upper.pixels(), lower.pixels());
        assert_eq!(
            ascii(&upper, &[(INK, '#')]),
            "\
#.#.###..#..
#.#..#...#..
###..#...#..
#.#..#......
#.#.###..#..
............
"
        );
    }

    #[test]
    fn unknown_glyph_is_blank() {
        let fb = draw(4, 6, "\u{263A}", 0, 5);
        assert!(fb.zbuf().iter().all(|&z| z == i32::MAX));
    }

    #[test]
    fn width_of_widest_line() {
        let font = BitmapFont::builtin();
        assert_eq!(font.width("Hi!"), 12);
        assert_eq!(font.width("a\nbcd\n"), 12);
        assert_eq!(font.width(""), 0);
    }

    #[test]
    fn line_feed_moves_down_one_cell() {
        let fb = draw(4, 12, ".\n.", 0, 5);
        assert_eq!(
            ascii(&fb, &[(INK, '#')]),
            "\
....
....
....
....
.#..
....
....
....
....
....
.#..
....
"
        );
    }

    #[test]
    fn text_is_depth_tested() {
        let mut fb = FrameBuffer::new(4, 6);
        fb.begin(false);
        fb.fill_rect(0, 0, 5, 4, 6, 0xFF00_00FF);
        draw_string(&mut fb, &BitmapFont::builtin(), INK, "8", 0, 5, 10);
        assert!(fb.pixels().iter().all(|&p| p == 0xFF00_00FF));

        draw_string(&mut fb, &BitmapFont::builtin(), INK, "8", 0, 5, 1);
        assert_eq!(fb.pixel(1, 1), 0xFF00_00FF);
        assert_eq!(fb.pixel(0, 0), INK);
        assert_eq!(fb.z(0, 0), 1);
    }

    #[test]
    fn font_from_pbm_atlas() {
        // A 2x2 cell atlas 32 pixels wide: glyph 0x11 is in column 1, row 1
        let mut pbm = alloc::vec::Vec::from(*b"P4 32 4\n");
        let mut rows = [[0u8; 4]; 4];
        rows[2][0] = 0b0010_0000;
        rows[3][0] = 0b0001_0000;
        pbm.extend(rows.iter().flatten());

        let font = BitmapFont::from_pbm(pbm, 2, 2, 2).unwrap();
        let c = '\u{11}';
        assert_eq!(font.coverage(c, 0, 0), 8);
        assert_eq!(font.coverage(c, 1, 0), 0);
        assert_eq!(font.coverage(c, 0, 1), 0);
        assert_eq!(font.coverage(c, 1, 1), 8);
        assert_eq!(font.coverage('a', 0, 0), 0, "beyond atlas");
        assert_eq!(font.coverage(c, 2, 0), 0, "outside cell");
    }
}
