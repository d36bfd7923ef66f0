//! Color literal detection and presentation.

use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;
use tower_lsp::lsp_types::Color;

const NAMED_COLORS: &[(&str, [u8; 3])] = &[
    ("aqua", [0, 255, 255]),
    ("black", [0, 0, 0]),
    ("blue", [0, 0, 255]),
    ("brown", [165, 42, 42]),
    ("coral", [255, 127, 80]),
    ("crimson", [220, 20, 60]),
    ("cyan", [0, 255, 255]),
    ("darkblue", [0, 0, 139]),
    ("darkgray", [169, 169, 169]),
    ("darkgreen", [0, 100, 0]),
    ("darkred", [139, 0, 0]),
    ("fuchsia", [255, 0, 255]),
    ("gold", [255, 215, 0]),
    ("gray", [128, 128, 128]),
    ("green", [0, 128, 0]),
    ("grey", [128, 128, 128]),
    ("indigo", [75, 0, 130]),
    ("ivory", [255, 255, 240]),
    ("lightblue", [173, 216, 230]),
    ("lightgray", [211, 211, 211]),
    ("lime", [0, 255, 0]),
    ("magenta", [255, 0, 255]),
    ("maroon", [128, 0, 0]),
    ("navy", [0, 0, 128]),
    ("olive", [128, 128, 0]),
    ("orange", [255, 165, 0]),
    ("pink", [255, 192, 203]),
    ("purple", [128, 0, 128]),
    ("rebeccapurple", [102, 51, 153]),
    ("red", [255, 0, 0]),
    ("salmon", [250, 128, 114]),
    ("silver", [192, 192, 192]),
    ("teal", [0, 128, 128]),
    ("tomato", [255, 99, 71]),
    ("violet", [238, 130, 238]),
    ("white", [255, 255, 255]),
    ("yellow", [255, 255, 0]),
];

static COLOR_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"#[0-9a-fA-F]+\b|(?i:rgba?)\([^)]*\)|[a-zA-Z][a-zA-Z-]*").unwrap()
});

pub fn color_names() -> impl Iterator<Item = &'static str> {
    NAMED_COLORS.iter().map(|(name, _)| *name)
}

fn from_rgb(rgb: [u8; 3], alpha: f32) -> Color {
    Color {
        red: rgb[0] as f32 / 255.0,
        green: rgb[1] as f32 / 255.0,
        blue: rgb[2] as f32 / 255.0,
        alpha,
    }
}

pub fn named_color(name: &str) -> Option<Color> {
    let name = name.to_ascii_lowercase();
    NAMED_COLORS
        .iter()
        .find(|(n, _)| *n == name)
        .map(|(_, rgb)| from_rgb(*rgb, 1.0))
}

/// Parse `#rgb`, `#rgba`, `#rrggbb` or `#rrggbbaa`.
pub fn parse_hex(token: &str) -> Option<Color> {
    let digits = token.strip_prefix('#').filter(|d| d.is_ascii())?;
    let nibble = |i: usize| u8::from_str_radix(&digits[i..i + 1], 16).ok();
    let byte = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16).ok();

    let (rgb, alpha) = match digits.len() {
        3 | 4 => {
            let rgb = [nibble(0)? * 17, nibble(1)? * 17, nibble(2)? * 17];
            let alpha = if digits.len() == 4 { nibble(3)? * 17 } else { 255 };
            (rgb, alpha)
        }
        6 | 8 => {
            let rgb = [byte(0)?, byte(2)?, byte(4)?];
            let alpha = if digits.len() == 8 { byte(6)? } else { 255 };
            (rgb, alpha)
        }
        _ => return None,
    };
    Some(from_rgb(rgb, alpha as f32 / 255.0))
}

/// Parse `rgb(r, g, b)` or `rgba(r, g, b, a)` with comma or space separators.
pub fn parse_rgb_function(token: &str) -> Option<Color> {
    let open = token.find('(')?;
    let args = token[open + 1..].strip_suffix(')')?;
    let parts: Vec<&str> = args
        .split(|c: char| c == ',' || c == '/' || c.is_whitespace())
        .filter(|p| !p.is_empty())
        .collect();
    if parts.len() != 3 && parts.len() != 4 {
        return None;
    }

    let channel = |p: &str| -> Option<u8> {
        match p.strip_suffix('%') {
            Some(pct) => Some((pct.parse::<f32>().ok()?.clamp(0.0, 100.0) * 2.55).round() as u8),
            None => Some(p.parse::<f32>().ok()?.clamp(0.0, 255.0).round() as u8),
        }
    };
    let rgb = [channel(parts[0])?, channel(parts[1])?, channel(parts[2])?];
    let alpha = match parts.get(3) {
        Some(p) => match p.strip_suffix('%') {
            Some(pct) => pct.parse::<f32>().ok()? / 100.0,
            None => p.parse::<f32>().ok()?,
        },
        None => 1.0,
    };
    Some(from_rgb(rgb, alpha.clamp(0.0, 1.0)))
}

/// Find color literals in a declaration value. Spans are relative to `value`.
///
/// Named colors are only reported when `include_named` is set, so keywords of
/// properties that never take a color are left alone.
pub fn find_colors(value: &str, include_named: bool) -> Vec<(Range<usize>, Color)> {
    COLOR_TOKEN
        .find_iter(value)
        .filter_map(|m| {
            let token = m.as_str();
            let color = if token.starts_with('#') {
                parse_hex(token)
            } else if token.ends_with(')') {
                parse_rgb_function(token)
            } else if include_named {
                named_color(token)
            } else {
                None
            }?;
            Some((m.range(), color))
        })
        .collect()
}

fn to_byte(channel: f32) -> u8 {
    (channel.clamp(0.0, 1.0) * 255.0).round() as u8
}

fn format_alpha(alpha: f32) -> String {
    let rounded = (alpha * 100.0).round() / 100.0;
    format!("{}", rounded)
}

fn to_hsl(color: &Color) -> (f32, f32, f32) {
    let (r, g, b) = (color.red, color.green, color.blue);
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let lightness = (max + min) / 2.0;
    let delta = max - min;
    if delta == 0.0 {
        return (0.0, 0.0, lightness);
    }

    let saturation = delta / (1.0 - (2.0 * lightness - 1.0).abs());
    let hue = if max == r {
        60.0 * (((g - b) / delta).rem_euclid(6.0))
    } else if max == g {
        60.0 * ((b - r) / delta + 2.0)
    } else {
        60.0 * ((r - g) / delta + 4.0)
    };
    (hue, saturation, lightness)
}

/// Textual forms offered for a picked color: rgb, hex, hsl.
pub fn presentations(color: &Color) -> Vec<String> {
    let (r, g, b) = (to_byte(color.red), to_byte(color.green), to_byte(color.blue));
    let opaque = color.alpha >= 1.0;
    let alpha = format_alpha(color.alpha);

    let rgb = if opaque {
        format!("rgb({r}, {g}, {b})")
    } else {
        format!("rgba({r}, {g}, {b}, {alpha})")
    };
    let hex = if opaque {
        format!("#{r:02x}{g:02x}{b:02x}")
    } else {
        format!("#{r:02x}{g:02x}{b:02x}{:02x}", to_byte(color.alpha))
    };
    let (h, s, l) = to_hsl(color);
    let (h, s, l) = (h.round(), (s * 100.0).round(), (l * 100.0).round());
    let hsl = if opaque {
        format!("hsl({h}, {s}%, {l}%)")
    } else {
        format!("hsla({h}, {s}%, {l}%, {alpha})")
    };

    vec![rgb, hex, hsl]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rgb_bytes(color: &Color) -> [u8; 4] {
        [
            to_byte(color.red),
            to_byte(color.green),
            to_byte(color.blue),
            to_byte(color.alpha),
        ]
    }

    #[test]
    fn parses_hex_forms() {
        assert_eq!(rgb_bytes(&parse_hex("#f00").unwrap()), [255, 0, 0, 255]);
        assert_eq!(rgb_bytes(&parse_hex("#00ff0080").unwrap()), [0, 255, 0, 128]);
        assert!(parse_hex("#12345").is_none());
        assert!(parse_hex("#zzz").is_none());
    }

    #[test]
    fn parses_rgb_functions() {
        let c = parse_rgb_function("rgba(10, 20, 30, 0.5)").unwrap();
        assert_eq!(rgb_bytes(&c), [10, 20, 30, 128]);
        let c = parse_rgb_function("rgb(100% 0% 0%)").unwrap();
        assert_eq!(rgb_bytes(&c), [255, 0, 0, 255]);
        assert!(parse_rgb_function("rgb(1, 2)").is_none());
    }

    #[test]
    fn finds_colors_in_value() {
        let found = find_colors("1px solid #fff, red", true);
        let spans: Vec<_> = found.iter().map(|(r, _)| r.clone()).collect();
        assert_eq!(spans, vec![10..14, 16..19]);
    }

    #[test]
    fn ignores_non_color_words() {
        assert!(find_colors("solid 1px", true).is_empty());
        assert_eq!(find_colors("red #000", false).len(), 1);
    }

    #[test]
    fn presents_opaque_red() {
        let red = named_color("red").unwrap();
        assert_eq!(
            presentations(&red),
            vec!["rgb(255, 0, 0)", "#ff0000", "hsl(0, 100%, 50%)"]
        );
    }
}
