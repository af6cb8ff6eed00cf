//! PNM, also known as NetPBM, file format support.
//!
//! Two corners of the family are used here: monochrome bitmaps (PBM)
//! hold glyph atlases for bitmap fonts, and binary pixmaps (PPM)
//! receive frame buffer snapshots.
//!
//! Type  | Magic | Pixel format      | Support
//! ----- | ------| ----------------- | -------
//! PBM   | P1/P4 | 1 bpp monochrome  | read
//! PGM   | P2/P5 | 8 bpp grayscale   | none
//! PPM   | P3/P6 | 3x8 bpp RGB       | write (P6)

use alloc::{string::String, vec, vec::Vec};
use core::{
    fmt::{self, Debug, Display, Formatter},
    num::{IntErrorKind, ParseIntError},
    str::FromStr,
};
#[cfg(feature = "std")]
use std::{
    fs::File,
    io::{self, BufReader, BufWriter, Read, Write},
    path::Path,
};

use Error::*;
use Format::*;

/// The header of a PNM image
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
struct Header {
    format: Format,
    width: u32,
    height: u32,
    max: u16,
}

/// The format of a PNM image.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[repr(u16)]
enum Format {
    /// 1-bit monochrome image, text encoding.
    TextBitmap = magic(b"P1"),
    /// 1-bit monochrome image, packed binary encoding.
    BinaryBitmap = magic(b"P4"),
    /// RGB image, binary encoding. 3 bytes per pixel.
    BinaryPixmap = magic(b"P6"),
}

const fn magic(bytes: &[u8; 2]) -> u16 {
    u16::from_be_bytes(*bytes)
}

impl Display for Format {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "P{}", *self as u8 as char)
    }
}

impl TryFrom<[u8; 2]> for Format {
    type Error = Error;
    fn try_from(magic: [u8; 2]) -> Result<Self> {
        Ok(match &magic {
            b"P1" => TextBitmap,
            b"P4" => BinaryBitmap,
            b"P6" => BinaryPixmap,
            other => Err(Unsupported(*other))?,
        })
    }
}

// Error during loading or decoding a PNM file.
#[derive(Debug, Eq, PartialEq)]
pub enum Error {
    /// An I/O error occurred.
    #[cfg(feature = "std")]
    Io(io::ErrorKind),
    /// Unsupported magic number.
    Unsupported([u8; 2]),
    /// Unexpected end of input while decoding.
    UnexpectedEnd,
    /// Invalid numeric value encountered.
    InvalidNumber,
}

/// Result of loading or decoding a PNM file.
pub type Result<T> = core::result::Result<T, Error>;

#[cfg(feature = "std")]
impl std::error::Error for Error {}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "error decoding pnm image: {self:?}")
    }
}

impl From<ParseIntError> for Error {
    fn from(e: ParseIntError) -> Self {
        if *e.kind() == IntErrorKind::Empty {
            UnexpectedEnd
        } else {
            InvalidNumber
        }
    }
}

#[cfg(feature = "std")]
impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Io(e.kind())
    }
}

impl Header {
    /// Attempts to parse a PNM header from `src`.
    fn parse(src: impl IntoIterator<Item = u8>) -> Result<Self> {
        let mut it = src.into_iter();
        let magic = [
            it.next().ok_or(UnexpectedEnd)?,
            it.next().ok_or(UnexpectedEnd)?,
        ];
        let format = magic.try_into()?;
        let width: u32 = parse_num(&mut it)?;
        let height: u32 = parse_num(&mut it)?;
        let max: u16 = match &format {
            TextBitmap | BinaryBitmap => 1,
            _ => parse_num(&mut it)?,
        };
        Ok(Self { format, width, height, max })
    }
    /// Writes `self` to `dest` as a valid PNM header,
    /// including a trailing newline.
    #[cfg(feature = "std")]
    fn write(&self, mut dest: impl Write) -> io::Result<()> {
        let Self { format, width, height, max } = *self;
        let max: &dyn Display = match format {
            TextBitmap | BinaryBitmap => &"",
            _ => &max,
        };
        writeln!(dest, "{} {} {} {}", format, width, height, max)
    }
}

/// A 1-bit image. Set bits are "ink", black in PBM convention.
#[derive(Clone, Eq, PartialEq)]
pub struct Bitmap {
    width: u32,
    height: u32,
    bits: Vec<bool>,
}

impl Bitmap {
    /// Returns a blank bitmap of the given size.
    pub fn new(width: u32, height: u32) -> Self {
        let bits = vec![false; width as usize * height as usize];
        Self { width, height, bits }
    }
    pub fn width(&self) -> u32 {
        self.width
    }
    pub fn height(&self) -> u32 {
        self.height
    }
    /// Returns whether the bit at (x, y) is set. Out of bounds is unset.
    pub fn get(&self, x: u32, y: u32) -> bool {
        x < self.width
            && y < self.height
            && self.bits[(y * self.width + x) as usize]
    }
    /// Sets the bit at (x, y). Out of bounds writes are ignored.
    pub fn set(&mut self, x: u32, y: u32, ink: bool) {
        if x < self.width && y < self.height {
            self.bits[(y * self.width + x) as usize] = ink;
        }
    }
}

impl Debug for Bitmap {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        writeln!(f, "Bitmap {}x{}", self.width, self.height)?;
        for y in 0..self.height {
            let row: String = (0..self.width)
                .map(|x| if self.get(x, y) { '#' } else { '.' })
                .collect();
            writeln!(f, "{row}")?;
        }
        Ok(())
    }
}

/// Loads a PBM image from a path.
///
/// # Errors
/// Returns [`pnm::Error`][Error] in case of an I/O error or invalid image.
#[cfg(feature = "std")]
pub fn load_pbm(path: impl AsRef<Path>) -> Result<Bitmap> {
    let r = &mut BufReader::new(File::open(path)?);
    read_pbm(r.bytes().map_while(io::Result::ok))
}

/// Attempts to decode a PBM image, P1 or P4, from an iterator of bytes.
///
/// # Errors
/// Returns [`pnm::Error`][Error] if the input is truncated, malformed, or
/// in some other PNM format.
pub fn read_pbm(src: impl IntoIterator<Item = u8>) -> Result<Bitmap> {
    let mut it = src.into_iter();
    let h = Header::parse(&mut it)?;
    let mut bmp = Bitmap::new(h.width, h.height);

    match h.format {
        TextBitmap => {
            // Digits need not be separated by whitespace
            let mut in_comment = false;
            let mut digits = it.filter_map(|b| match b {
                b'#' => {
                    in_comment = true;
                    None
                }
                b'\n' => {
                    in_comment = false;
                    None
                }
                b'0' | b'1' if !in_comment => Some(Ok(b == b'1')),
                _ if in_comment || b.is_ascii_whitespace() => None,
                _ => Some(Err(InvalidNumber)),
            });
            for bit in bmp.bits.iter_mut() {
                *bit = digits.next().ok_or(UnexpectedEnd)??;
            }
        }
        BinaryBitmap => {
            // Each row is padded to a whole byte
            let row_bytes = h.width.div_ceil(8) as usize;
            for y in 0..h.height {
                for i in 0..row_bytes {
                    let byte = it.next().ok_or(UnexpectedEnd)?;
                    for b in 0..8 {
                        let x = (i * 8 + b) as u32;
                        bmp.set(x, y, (byte >> (7 - b)) & 1 == 1);
                    }
                }
            }
        }
        BinaryPixmap => return Err(Unsupported(*b"P6")),
    }
    Ok(bmp)
}

/// Writes ARGB pixels to a file in PPM format, P6 sub-format
/// (binary 8-bits-per-channel RGB). Alpha is dropped.
///
/// Caution: This function overwrites the file if it already exists.
/// Use [`write_ppm`] for more control over file creation.
///
/// # Errors
/// Returns [`std::io::Error`] if an error occurs while writing.
#[cfg(feature = "std")]
pub fn save_ppm(
    path: impl AsRef<Path>,
    width: u32,
    height: u32,
    argb: &[u32],
) -> io::Result<()> {
    let out = BufWriter::new(File::create(path)?);
    write_ppm(out, width, height, argb)
}

/// Writes ARGB pixels to `out` in PPM format, P6 sub-format
/// (binary 8-bits-per-channel RGB). Alpha is dropped.
///
/// # Errors
/// Returns [`std::io::Error`] if an error occurs while writing, or
/// [`InvalidInput`][io::ErrorKind::InvalidInput] if `argb` holds fewer
/// than `width * height` pixels.
#[cfg(feature = "std")]
pub fn write_ppm(
    mut out: impl Write,
    width: u32,
    height: u32,
    argb: &[u32],
) -> io::Result<()> {
    let count = width as usize * height as usize;
    let Some(pixels) = argb.get(..count) else {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "pixel slice shorter than image",
        ));
    };
    Header {
        format: BinaryPixmap,
        width,
        height,
        max: 255,
    }
    .write(&mut out)?;

    pixels
        .iter()
        .try_for_each(|&c| out.write_all(&c.to_be_bytes()[1..]))?;
    out.flush()
}

/// Parses a numeric value from `src`, skipping whitespace and comments.
fn parse_num<T>(src: impl IntoIterator<Item = u8>) -> Result<T>
where
    T: FromStr,
    Error: From<T::Err>,
{
    // Skip whitespace and comments
    let mut in_comment = false;
    let mut whitespace_or_comment = |b| match b {
        b'#' => {
            in_comment = true;
            true
        }
        b'\n' => {
            in_comment = false;
            true
        }
        _ => in_comment || b.is_ascii_whitespace(),
    };

    let str = src
        .into_iter()
        .skip_while(|&b| whitespace_or_comment(b))
        .take_while(|&b| !b.is_ascii_whitespace())
        .map(char::from)
        .collect::<String>();

    Ok(str.parse()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_header_with_comment() {
        let hdr = Header::parse(*b"P4 # glyphs\n 48 16\n").unwrap();
        assert_eq!(hdr.format, BinaryBitmap);
        assert_eq!((hdr.width, hdr.height, hdr.max), (48, 16, 1));
    }

    #[test]
    fn parse_unsupported_magic() {
        let p5 = read_pbm(*b"P5 2 2 255\n\x01\x23");
        assert_eq!(p5.err(), Some(Unsupported(*b"P5")));
        let p6 = read_pbm(*b"P6 1 1 255\n\0\0\0");
        assert_eq!(p6.err(), Some(Unsupported(*b"P6")));
    }

    #[test]
    fn parse_pbm_truncated() {
        assert_eq!(read_pbm(*b"P1 2 2\n 0 1 1").err(), Some(UnexpectedEnd));
        assert_eq!(read_pbm(*b"P4 4 2\n\x69").err(), Some(UnexpectedEnd));
    }

    #[test]
    fn parse_header_bad_number() {
        assert_eq!(read_pbm(*b"P1 2x 2\n").err(), Some(InvalidNumber));
    }

    #[cfg(feature = "std")]
    #[test]
    fn write_header_p1() {
        let mut out = Vec::new();
        let hdr = Header {
            format: TextBitmap,
            width: 16,
            height: 32,
            max: 1,
        };
        hdr.write(&mut out).unwrap();
        assert_eq!(&out, b"P1 16 32 \n");
    }

    #[cfg(feature = "std")]
    #[test]
    fn write_header_p6() {
        let mut out = Vec::new();
        let hdr = Header {
            format: BinaryPixmap,
            width: 64,
            height: 16,
            max: 4,
        };
        hdr.write(&mut out).unwrap();
        assert_eq!(&out, b"P6 64 16 4\n");
    }

    #[test]
    fn read_pbm_p1() {
        let bmp = read_pbm(*b"P1\n# tiny\n3 2\n1 0 1\n010").unwrap();

        assert_eq!((bmp.width(), bmp.height()), (3, 2));
        assert!(bmp.get(0, 0) && !bmp.get(1, 0) && bmp.get(2, 0));
        assert!(!bmp.get(0, 1) && bmp.get(1, 1) && !bmp.get(2, 1));
        assert!(!bmp.get(3, 0), "out of bounds reads as unset");
    }

    #[test]
    fn read_pbm_p4_pads_rows() {
        // 0x69 == 0b0110_1001, 0xA0 == 0b1010_0000
        let bmp = read_pbm(*b"P4 4 2\n\x69\xA0").unwrap();

        assert_eq!((bmp.width(), bmp.height()), (4, 2));
        let row = |y| (0..4).map(|x| bmp.get(x, y)).collect::<Vec<_>>();
        assert_eq!(row(0), [false, true, true, false]);
        assert_eq!(row(1), [true, false, true, false]);
    }

    #[test]
    fn bitmap_debug_shows_ink() {
        let mut bmp = Bitmap::new(3, 1);
        bmp.set(1, 0, true);
        bmp.set(5, 5, true);
        assert_eq!(alloc::format!("{bmp:?}"), "Bitmap 3x1\n.#.\n");
    }

    #[cfg(feature = "std")]
    #[test]
    fn write_ppm_drops_alpha() {
        let argb = [0xFF_FF0000, 0x00_00FF00, 0x80_0000FF, 0xFF_FFFF00];

        let mut out = vec![];
        super::write_ppm(&mut out, 2, 2, &argb).unwrap();

        assert_eq!(
            &out,
            b"P6 2 2 255\n\
              \xFF\x00\x00\
              \x00\xFF\x00\
              \x00\x00\xFF\
              \xFF\xFF\x00"
        );
    }

    #[cfg(feature = "std")]
    #[test]
    fn write_ppm_short_slice() {
        let mut out = vec![];
        let res = super::write_ppm(&mut out, 2, 2, &[0; 3]);
        assert_eq!(res.unwrap_err().kind(), io::ErrorKind::InvalidInput);
        assert!(out.is_empty());
    }
}
