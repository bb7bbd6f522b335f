use crate::foundation::core::Rgba8Premul;

/// Straight-alpha color with components in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorDef {
    pub r: f64,
    pub g: f64,
    pub b: f64,
    pub a: f64,
}

impl ColorDef {
    pub fn rgba(r: f64, g: f64, b: f64, a: f64) -> Self {
        Self { r, g, b, a }
    }

    pub fn to_rgba8_premul(self) -> Rgba8Premul {
        fn to_u8(x: f64) -> u8 {
            (x.clamp(0.0, 1.0) * 255.0).round() as u8
        }

        let a = self.a.clamp(0.0, 1.0);
        let r = (self.r.clamp(0.0, 1.0) * a).clamp(0.0, 1.0);
        let g = (self.g.clamp(0.0, 1.0) * a).clamp(0.0, 1.0);
        let b = (self.b.clamp(0.0, 1.0) * a).clamp(0.0, 1.0);

        Rgba8Premul {
            r: to_u8(r),
            g: to_u8(g),
            b: to_u8(b),
            a: to_u8(a),
        }
    }

    pub fn is_transparent(self) -> bool {
        self.a <= 0.0
    }

    /// Parse a CSS color string as emitted by the editor.
    ///
    /// Accepts `#rgb`, `#rgba`, `#rrggbb`, `#rrggbbaa`, `rgb()`/`rgba()`, `hsl()`/`hsla()`,
    /// `transparent` and CSS named colors.
    pub fn parse(s: &str) -> Result<Self, String> {
        let s = s.trim();
        if s.is_empty() {
            return Err("empty color string".to_owned());
        }
        if let Some(hex) = s.strip_prefix('#') {
            return parse_hex(hex);
        }

        let lower = s.to_ascii_lowercase();
        if let Some(args) = function_args(&lower, &["rgba", "rgb"]) {
            return parse_rgb_args(args);
        }
        if let Some(args) = function_args(&lower, &["hsla", "hsl"]) {
            return parse_hsl_args(args);
        }
        if lower == "transparent" {
            return Ok(Self::rgba(0.0, 0.0, 0.0, 0.0));
        }
        named_color(&lower)
            .map(|[r, g, b]| Self::rgba(unit(r), unit(g), unit(b), 1.0))
            .ok_or_else(|| format!("unknown color \"{s}\""))
    }
}

/// Deserialize a paint value leniently: strings are parsed as CSS colors, anything else
/// (gradients, patterns, `null`, unparseable strings) resolves to `None`.
pub(crate) fn deserialize_paint<'de, D>(deserializer: D) -> Result<Option<ColorDef>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let v = <serde_json::Value as serde::Deserialize>::deserialize(deserializer)?;
    Ok(match v {
        serde_json::Value::String(s) => match ColorDef::parse(&s) {
            Ok(c) => Some(c),
            Err(e) => {
                tracing::debug!("ignoring paint value: {e}");
                None
            }
        },
        _ => None,
    })
}

fn unit(c: u8) -> f64 {
    f64::from(c) / 255.0
}

fn function_args<'a>(s: &'a str, names: &[&str]) -> Option<&'a str> {
    for name in names {
        if let Some(rest) = s.strip_prefix(name) {
            let rest = rest.trim_start();
            if let Some(inner) = rest.strip_prefix('(').and_then(|r| r.strip_suffix(')')) {
                return Some(inner);
            }
        }
    }
    None
}

fn split_args(args: &str) -> Vec<&str> {
    // Both `rgb(1, 2, 3)` and `rgb(1 2 3 / 0.5)` forms.
    args.split([',', '/', ' '])
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect()
}

fn parse_channel(p: &str) -> Result<f64, String> {
    if let Some(pct) = p.strip_suffix('%') {
        let v: f64 = pct
            .parse()
            .map_err(|_| format!("invalid percentage \"{p}\""))?;
        return Ok((v / 100.0).clamp(0.0, 1.0));
    }
    let v: f64 = p.parse().map_err(|_| format!("invalid channel \"{p}\""))?;
    Ok((v / 255.0).clamp(0.0, 1.0))
}

fn parse_alpha(p: &str) -> Result<f64, String> {
    if let Some(pct) = p.strip_suffix('%') {
        let v: f64 = pct
            .parse()
            .map_err(|_| format!("invalid alpha \"{p}\""))?;
        return Ok((v / 100.0).clamp(0.0, 1.0));
    }
    let v: f64 = p.parse().map_err(|_| format!("invalid alpha \"{p}\""))?;
    Ok(v.clamp(0.0, 1.0))
}

fn parse_rgb_args(args: &str) -> Result<ColorDef, String> {
    let parts = split_args(args);
    match parts.as_slice() {
        [r, g, b] => Ok(ColorDef::rgba(
            parse_channel(r)?,
            parse_channel(g)?,
            parse_channel(b)?,
            1.0,
        )),
        [r, g, b, a] => Ok(ColorDef::rgba(
            parse_channel(r)?,
            parse_channel(g)?,
            parse_channel(b)?,
            parse_alpha(a)?,
        )),
        _ => Err(format!("rgb() expects 3 or 4 components, got \"{args}\"")),
    }
}

fn parse_hsl_args(args: &str) -> Result<ColorDef, String> {
    let parts = split_args(args);
    let pct = |p: &str| -> Result<f64, String> {
        let raw = p.strip_suffix('%').unwrap_or(p);
        let v: f64 = raw
            .parse()
            .map_err(|_| format!("invalid hsl component \"{p}\""))?;
        Ok(v / 100.0)
    };
    let hue = |p: &str| -> Result<f64, String> {
        let raw = p.strip_suffix("deg").unwrap_or(p);
        raw.parse::<f64>()
            .map_err(|_| format!("invalid hue \"{p}\""))
    };
    match parts.as_slice() {
        [h, s, l] => Ok(hsla_to_rgba(hue(h)?, pct(s)?, pct(l)?, 1.0)),
        [h, s, l, a] => Ok(hsla_to_rgba(hue(h)?, pct(s)?, pct(l)?, parse_alpha(a)?)),
        _ => Err(format!("hsl() expects 3 or 4 components, got \"{args}\"")),
    }
}

fn parse_hex(s: &str) -> Result<ColorDef, String> {
    fn hex_byte(pair: &str) -> Result<u8, String> {
        u8::from_str_radix(pair, 16).map_err(|_| format!("invalid hex byte \"{pair}\""))
    }
    fn hex_nibble(c: &str) -> Result<u8, String> {
        let v = u8::from_str_radix(c, 16).map_err(|_| format!("invalid hex digit \"{c}\""))?;
        Ok(v * 17)
    }

    if !s.is_ascii() {
        return Err("hex color must be ascii".to_owned());
    }

    let (r, g, b, a) = match s.len() {
        3 => (
            hex_nibble(&s[0..1])?,
            hex_nibble(&s[1..2])?,
            hex_nibble(&s[2..3])?,
            255,
        ),
        4 => (
            hex_nibble(&s[0..1])?,
            hex_nibble(&s[1..2])?,
            hex_nibble(&s[2..3])?,
            hex_nibble(&s[3..4])?,
        ),
        6 => (
            hex_byte(&s[0..2])?,
            hex_byte(&s[2..4])?,
            hex_byte(&s[4..6])?,
            255,
        ),
        8 => (
            hex_byte(&s[0..2])?,
            hex_byte(&s[2..4])?,
            hex_byte(&s[4..6])?,
            hex_byte(&s[6..8])?,
        ),
        _ => {
            return Err("hex color must be #RGB, #RGBA, #RRGGBB or #RRGGBBAA".to_owned());
        }
    };

    Ok(ColorDef::rgba(unit(r), unit(g), unit(b), unit(a)))
}

fn hsla_to_rgba(h: f64, s: f64, l: f64, a: f64) -> ColorDef {
    let h = (h % 360.0 + 360.0) % 360.0 / 360.0;
    let s = s.clamp(0.0, 1.0);
    let l = l.clamp(0.0, 1.0);

    if s == 0.0 {
        return ColorDef::rgba(l, l, l, a);
    }

    fn hue_to_rgb(p: f64, q: f64, mut t: f64) -> f64 {
        if t < 0.0 {
            t += 1.0;
        }
        if t > 1.0 {
            t -= 1.0;
        }
        if t < 1.0 / 6.0 {
            return p + (q - p) * 6.0 * t;
        }
        if t < 1.0 / 2.0 {
            return q;
        }
        if t < 2.0 / 3.0 {
            return p + (q - p) * (2.0 / 3.0 - t) * 6.0;
        }
        p
    }

    let q = if l < 0.5 {
        l * (1.0 + s)
    } else {
        l + s - l * s
    };
    let p = 2.0 * l - q;

    ColorDef::rgba(
        hue_to_rgb(p, q, h + 1.0 / 3.0),
        hue_to_rgb(p, q, h),
        hue_to_rgb(p, q, h - 1.0 / 3.0),
        a,
    )
}

fn named_color(name: &str) -> Option<[u8; 3]> {
    let rgb = match name {
        "black" => [0, 0, 0],
        "white" => [255, 255, 255],
        "red" => [255, 0, 0],
        "lime" => [0, 255, 0],
        "green" => [0, 128, 0],
        "blue" => [0, 0, 255],
        "yellow" => [255, 255, 0],
        "cyan" | "aqua" => [0, 255, 255],
        "magenta" | "fuchsia" => [255, 0, 255],
        "silver" => [192, 192, 192],
        "gray" | "grey" => [128, 128, 128],
        "darkgray" | "darkgrey" => [169, 169, 169],
        "lightgray" | "lightgrey" => [211, 211, 211],
        "maroon" => [128, 0, 0],
        "olive" => [128, 128, 0],
        "purple" => [128, 0, 128],
        "teal" => [0, 128, 128],
        "navy" => [0, 0, 128],
        "orange" => [255, 165, 0],
        "pink" => [255, 192, 203],
        "brown" => [165, 42, 42],
        "gold" => [255, 215, 0],
        "indigo" => [75, 0, 130],
        "violet" => [238, 130, 238],
        "coral" => [255, 127, 80],
        "salmon" => [250, 128, 114],
        "tomato" => [255, 99, 71],
        "crimson" => [220, 20, 60],
        "turquoise" => [64, 224, 208],
        "skyblue" => [135, 206, 235],
        "steelblue" => [70, 130, 180],
        "royalblue" => [65, 105, 225],
        "darkblue" => [0, 0, 139],
        "darkgreen" => [0, 100, 0],
        "darkred" => [139, 0, 0],
        "beige" => [245, 245, 220],
        "ivory" => [255, 255, 240],
        "khaki" => [240, 230, 140],
        "lavender" => [230, 230, 250],
        "whitesmoke" => [245, 245, 245],
        "gainsboro" => [220, 220, 220],
        _ => return None,
    };
    Some(rgb)
}

#[cfg(test)]
#[path = "../../tests/unit/scene/color.rs"]
mod tests;
