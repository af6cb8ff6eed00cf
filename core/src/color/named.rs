//! Named colors and textual color parsing.

use super::{Error, Result};

/// Named colors, in the order they are entered into a new color table.
///
/// The names are the CSS/X11 set. Lookup is case-insensitive.
pub const NAMED_COLORS: &[(&str, u32)] = &[
    ("black", 0xFF000000),
    ("white", 0xFFFFFFFF),
    ("red", 0xFFFF0000),
    ("green", 0xFF008000),
    ("blue", 0xFF0000FF),
    ("yellow", 0xFFFFFF00),
    ("cyan", 0xFF00FFFF),
    ("magenta", 0xFFFF00FF),
    ("orange", 0xFFFFA500),
    ("pink", 0xFFFFC0CB),
    ("gray", 0xFF808080),
    ("grey", 0xFF808080),
    ("aliceblue", 0xFFF0F8FF),
    ("antiquewhite", 0xFFFAEBD7),
    ("aqua", 0xFF00FFFF),
    ("aquamarine", 0xFF7FFFD4),
    ("azure", 0xFFF0FFFF),
    ("beige", 0xFFF5F5DC),
    ("bisque", 0xFFFFE4C4),
    ("blanchedalmond", 0xFFFFEBCD),
    ("blueviolet", 0xFF8A2BE2),
    ("brown", 0xFFA52A2A),
    ("burlywood", 0xFFDEB887),
    ("cadetblue", 0xFF5F9EA0),
    ("chartreuse", 0xFF7FFF00),
    ("chocolate", 0xFFD2691E),
    ("coral", 0xFFFF7F50),
    ("cornflowerblue", 0xFF6495ED),
    ("cornsilk", 0xFFFFF8DC),
    ("crimson", 0xFFDC143C),
    ("darkblue", 0xFF00008B),
    ("darkcyan", 0xFF008B8B),
    ("darkgoldenrod", 0xFFB8860B),
    ("darkgray", 0xFFA9A9A9),
    ("darkgreen", 0xFF006400),
    ("darkkhaki", 0xFFBDB76B),
    ("darkmagenta", 0xFF8B008B),
    ("darkolivegreen", 0xFF556B2F),
    ("darkorange", 0xFFFF8C00),
    ("darkorchid", 0xFF9932CC),
    ("darkred", 0xFF8B0000),
    ("darksalmon", 0xFFE9967A),
    ("darkseagreen", 0xFF8FBC8F),
    ("darkslateblue", 0xFF483D8B),
    ("darkslategray", 0xFF2F4F4F),
    ("darkturquoise", 0xFF00CED1),
    ("darkviolet", 0xFF9400D3),
    ("deeppink", 0xFFFF1493),
    ("deepskyblue", 0xFF00BFFF),
    ("dimgray", 0xFF696969),
    ("dodgerblue", 0xFF1E90FF),
    ("firebrick", 0xFFB22222),
    ("floralwhite", 0xFFFFFAF0),
    ("forestgreen", 0xFF228B22),
    ("fuchsia", 0xFFFF00FF),
    ("gainsboro", 0xFFDCDCDC),
    ("ghostwhite", 0xFFF8F8FF),
    ("gold", 0xFFFFD700),
    ("goldenrod", 0xFFDAA520),
    ("greenyellow", 0xFFADFF2F),
    ("honeydew", 0xFFF0FFF0),
    ("hotpink", 0xFFFF69B4),
    ("indianred", 0xFFCD5C5C),
    ("indigo", 0xFF4B0082),
    ("ivory", 0xFFFFFFF0),
    ("khaki", 0xFFF0E68C),
    ("lavender", 0xFFE6E6FA),
    ("lavenderblush", 0xFFFFF0F5),
    ("lawngreen", 0xFF7CFC00),
    ("lemonchiffon", 0xFFFFFACD),
    ("lightblue", 0xFFADD8E6),
    ("lightcoral", 0xFFF08080),
    ("lightcyan", 0xFFE0FFFF),
    ("lightgoldenrodyellow", 0xFFFAFAD2),
    ("lightgreen", 0xFF90EE90),
    ("lightgrey", 0xFFD3D3D3),
    ("lightgray", 0xFFD3D3D3),
    ("lightpink", 0xFFFFB6C1),
    ("lightsalmon", 0xFFFFA07A),
    ("lightseagreen", 0xFF20B2AA),
    ("lightskyblue", 0xFF87CEFA),
    ("lightslategray", 0xFF778899),
    ("lightsteelblue", 0xFFB0C4DE),
    ("lightyellow", 0xFFFFFFE0),
    ("lime", 0xFF00FF00),
    ("limegreen", 0xFF32CD32),
    ("linen", 0xFFFAF0E6),
    ("maroon", 0xFF800000),
    ("mediumaquamarine", 0xFF66CDAA),
    ("mediumblue", 0xFF0000CD),
    ("mediumorchid", 0xFFBA55D3),
    ("mediumpurple", 0xFF9370DB),
    ("mediumseagreen", 0xFF3CB371),
    ("mediumslateblue", 0xFF7B68EE),
    ("mediumspringgreen", 0xFF00FA9A),
    ("mediumturquoise", 0xFF48D1CC),
    ("mediumvioletred", 0xFFC71585),
    ("midnightblue", 0xFF191970),
    ("mintcream", 0xFFF5FFFA),
    ("mistyrose", 0xFFFFE4E1),
    ("moccasin", 0xFFFFE4B5),
    ("navajowhite", 0xFFFFDEAD),
    ("navy", 0xFF000080),
    ("oldlace", 0xFFFDF5E6),
    ("olive", 0xFF808000),
    ("olivedrab", 0xFF6B8E23),
    ("orangered", 0xFFFF4500),
    ("orchid", 0xFFDA70D6),
    ("palegoldenrod", 0xFFEEE8AA),
    ("palegreen", 0xFF98FB98),
    ("paleturquoise", 0xFFAFEEEE),
    ("palevioletred", 0xFFDB7093),
    ("papayawhip", 0xFFFFEFD5),
    ("peachpuff", 0xFFFFDAB9),
    ("peru", 0xFFCD853F),
    ("plum", 0xFFDDA0DD),
    ("powderblue", 0xFFB0E0E6),
    ("purple", 0xFF800080),
    ("rosybrown", 0xFFBC8F8F),
    ("royalblue", 0xFF4169E1),
    ("saddlebrown", 0xFF8B4513),
    ("salmon", 0xFFFA8072),
    ("sandybrown", 0xFFF4A460),
    ("seagreen", 0xFF2E8B57),
    ("seashell", 0xFFFFF5EE),
    ("sienna", 0xFFA0522D),
    ("silver", 0xFFC0C0C0),
    ("skyblue", 0xFF87CEEB),
    ("slateblue", 0xFF6A5ACD),
    ("slategray", 0xFF708090),
    ("snow", 0xFFFFFAFA),
    ("springgreen", 0xFF00FF7F),
    ("steelblue", 0xFF4682B4),
    ("tan", 0xFFD2B48C),
    ("teal", 0xFF008080),
    ("thistle", 0xFFD8BFD8),
    ("tomato", 0xFFFF6347),
    ("turquoise", 0xFF40E0D0),
    ("violet", 0xFFEE82EE),
    ("wheat", 0xFFF5DEB3),
    ("whitesmoke", 0xFFF5F5F5),
    ("yellowgreen", 0xFF9ACD32),
];

/// Returns the ARGB value of a named color, ignoring ASCII case.
pub fn lookup(name: &str) -> Option<u32> {
    NAMED_COLORS
        .iter()
        .find(|(n, _)| n.eq_ignore_ascii_case(name))
        .map(|&(_, argb)| argb)
}

/// Parses a color string into an opaque ARGB value.
///
/// Accepts a color name, or six hex digits written as `#RRGGBB`,
/// `0xRRGGBB`, or `[xRRGGBB]`. Leading and trailing whitespace is ignored.
///
/// # Errors
/// [`Error::Empty`] if `s` is blank, [`Error::InvalidHex`] if a hex prefix
/// is not followed by exactly six hex digits, and [`Error::UnknownName`]
/// otherwise.
pub fn parse(s: &str) -> Result<u32> {
    let s = s.trim();
    if s.is_empty() {
        return Err(Error::Empty);
    }
    let hex = s
        .strip_prefix('#')
        .or_else(|| s.strip_prefix("0x"))
        .or_else(|| s.strip_prefix("0X"))
        .or_else(|| {
            s.strip_prefix("[x")
                .or_else(|| s.strip_prefix("[X"))
                .and_then(|h| h.strip_suffix(']'))
        });
    match hex {
        Some(h) => parse_hex6(h),
        None => lookup(s).ok_or(Error::UnknownName),
    }
}

fn parse_hex6(h: &str) -> Result<u32> {
    if h.len() != 6 || !h.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(Error::InvalidHex);
    }
    u32::from_str_radix(h, 16)
        .map(|rgb| 0xFF00_0000 | rgb)
        .map_err(|_| Error::InvalidHex)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_case_insensitive() {
        assert_eq!(lookup("Red"), Some(0xFFFF0000));
        assert_eq!(lookup("CORNFLOWERBLUE"), Some(0xFF6495ED));
        assert_eq!(lookup("nosuchcolor"), None);
    }

    #[test]
    fn names_are_lowercase_and_unique() {
        for (i, (a, _)) in NAMED_COLORS.iter().enumerate() {
            assert!(!a.bytes().any(|b| b.is_ascii_uppercase()));
            for (b, _) in &NAMED_COLORS[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn hex_forms() {
        assert_eq!(parse("#12ab34"), Ok(0xFF12AB34));
        assert_eq!(parse("0x12AB34"), Ok(0xFF12AB34));
        assert_eq!(parse("[x12ab34]"), Ok(0xFF12AB34));
        assert_eq!(parse("  navy "), Ok(0xFF000080));
    }

    #[test]
    fn parse_errors() {
        assert_eq!(parse(""), Err(Error::Empty));
        assert_eq!(parse("   "), Err(Error::Empty));
        assert_eq!(parse("#12345"), Err(Error::InvalidHex));
        assert_eq!(parse("#12345g"), Err(Error::InvalidHex));
        assert_eq!(parse("[x123456"), Err(Error::UnknownName));
        assert_eq!(parse("purplish"), Err(Error::UnknownName));
    }
}
