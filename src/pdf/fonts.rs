//! Standard PDF Type1 faces, family resolution and AFM string metrics.
//!
//! The faces are never embedded: every conforming reader ships them. Widths
//! come from the Adobe core AFM files for the printable ASCII range; other
//! WinAnsi codes use a per-face average advance.

/// One of the standard Type1 faces the text layer can reference.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum StandardFace {
    Helvetica,
    HelveticaBold,
    TimesRoman,
    TimesBold,
    Courier,
    CourierBold,
    HelveticaOblique,
    HelveticaBoldOblique,
    TimesItalic,
    TimesBoldItalic,
    CourierOblique,
    CourierBoldOblique,
}

impl StandardFace {
    pub const ALL: [StandardFace; 12] = [
        Self::Helvetica,
        Self::HelveticaBold,
        Self::TimesRoman,
        Self::TimesBold,
        Self::Courier,
        Self::CourierBold,
        Self::HelveticaOblique,
        Self::HelveticaBoldOblique,
        Self::TimesItalic,
        Self::TimesBoldItalic,
        Self::CourierOblique,
        Self::CourierBoldOblique,
    ];

    pub fn base_font(self) -> &'static str {
        match self {
            Self::Helvetica => "Helvetica",
            Self::HelveticaBold => "Helvetica-Bold",
            Self::TimesRoman => "Times-Roman",
            Self::TimesBold => "Times-Bold",
            Self::Courier => "Courier",
            Self::CourierBold => "Courier-Bold",
            Self::HelveticaOblique => "Helvetica-Oblique",
            Self::HelveticaBoldOblique => "Helvetica-BoldOblique",
            Self::TimesItalic => "Times-Italic",
            Self::TimesBoldItalic => "Times-BoldItalic",
            Self::CourierOblique => "Courier-Oblique",
            Self::CourierBoldOblique => "Courier-BoldOblique",
        }
    }

    /// Name of the face in the page's `/Font` resource dictionary.
    pub fn resource_name(self) -> &'static str {
        match self {
            Self::Helvetica => "F1",
            Self::HelveticaBold => "F2",
            Self::TimesRoman => "F3",
            Self::TimesBold => "F4",
            Self::Courier => "F5",
            Self::CourierBold => "F6",
            Self::HelveticaOblique => "F7",
            Self::HelveticaBoldOblique => "F8",
            Self::TimesItalic => "F9",
            Self::TimesBoldItalic => "F10",
            Self::CourierOblique => "F11",
            Self::CourierBoldOblique => "F12",
        }
    }

    /// The face of the same family with the requested weight and slant.
    fn styled(self, bold: bool, italic: bool) -> Self {
        use StandardFace::*;

        let family = match self {
            Helvetica | HelveticaBold | HelveticaOblique | HelveticaBoldOblique => 0,
            TimesRoman | TimesBold | TimesItalic | TimesBoldItalic => 1,
            Courier | CourierBold | CourierOblique | CourierBoldOblique => 2,
        };
        match (family, bold, italic) {
            (0, false, false) => Helvetica,
            (0, true, false) => HelveticaBold,
            (0, false, true) => HelveticaOblique,
            (0, true, true) => HelveticaBoldOblique,
            (1, false, false) => TimesRoman,
            (1, true, false) => TimesBold,
            (1, false, true) => TimesItalic,
            (1, true, true) => TimesBoldItalic,
            (_, false, false) => Courier,
            (_, true, false) => CourierBold,
            (_, false, true) => CourierOblique,
            (_, true, true) => CourierBoldOblique,
        }
    }

    /// Ascender in 1/1000 em.
    pub fn ascender(self) -> f64 {
        match self {
            Self::Helvetica
            | Self::HelveticaBold
            | Self::HelveticaOblique
            | Self::HelveticaBoldOblique => 718.0,
            Self::TimesRoman | Self::TimesBold | Self::TimesItalic | Self::TimesBoldItalic => 683.0,
            Self::Courier | Self::CourierBold | Self::CourierOblique | Self::CourierBoldOblique => {
                629.0
            }
        }
    }

    /// Advance of one WinAnsi code in 1/1000 em.
    pub fn advance(self, code: u8) -> u16 {
        // Oblique Helvetica shares the upright metrics; Times italics have their own.
        let (table, fallback) = match self {
            Self::Helvetica | Self::HelveticaOblique => (&HELVETICA, 556),
            Self::HelveticaBold | Self::HelveticaBoldOblique => (&HELVETICA_BOLD, 556),
            Self::TimesRoman => (&TIMES_ROMAN, 500),
            Self::TimesBold => (&TIMES_BOLD, 500),
            Self::TimesItalic => (&TIMES_ITALIC, 500),
            Self::TimesBoldItalic => (&TIMES_BOLD_ITALIC, 500),
            Self::Courier | Self::CourierBold | Self::CourierOblique | Self::CourierBoldOblique => {
                return 600;
            }
        };
        match code {
            32..=126 => table[usize::from(code - 32)],
            // Non-breaking space.
            0xA0 => table[0],
            _ => fallback,
        }
    }

    /// Width in points of WinAnsi-encoded `bytes` at `size`, with `char_spacing`
    /// points of extra advance between glyphs.
    pub fn string_width(self, bytes: &[u8], size: f64, char_spacing: f64) -> f64 {
        if bytes.is_empty() {
            return 0.0;
        }
        let units: u32 = bytes.iter().map(|&b| u32::from(self.advance(b))).sum();
        f64::from(units) * size / 1000.0 + char_spacing * (bytes.len() - 1) as f64
    }
}

/// Map a CSS-ish `fontFamily` plus weight and slant to a standard face. Always
/// succeeds: unknown families fall back to Helvetica with a warning.
pub fn resolve_font(family: Option<&str>, bold: bool, italic: bool) -> StandardFace {
    let requested = family
        .and_then(|f| f.split(',').next())
        .map(|f| f.trim().trim_matches(|c| c == '"' || c == '\'').trim())
        .filter(|f| !f.is_empty());

    let Some(name) = requested else {
        return StandardFace::Helvetica.styled(bold, italic);
    };

    let lower = name.to_ascii_lowercase();
    let (stem, named_bold, named_italic) = split_style_suffix(&lower);

    let face = match stem {
        "helvetica" | "arial" | "sans-serif" | "helvetica neue" | "liberation sans" => {
            StandardFace::Helvetica
        }
        "times" | "times-roman" | "times new roman" | "serif" | "liberation serif" => {
            StandardFace::TimesRoman
        }
        "courier" | "courier new" | "monospace" | "liberation mono" => StandardFace::Courier,
        _ => {
            tracing::warn!(family = name, "font unavailable, falling back to Helvetica");
            StandardFace::Helvetica
        }
    };
    face.styled(bold || named_bold, italic || named_italic)
}

/// `"times-bolditalic"` -> `("times", true, true)`.
fn split_style_suffix(name: &str) -> (&str, bool, bool) {
    const SUFFIXES: [(&str, bool, bool); 5] = [
        ("-bolditalic", true, true),
        ("-boldoblique", true, true),
        ("-bold", true, false),
        ("-italic", false, true),
        ("-oblique", false, true),
    ];
    SUFFIXES
        .iter()
        .find_map(|&(suffix, b, i)| name.strip_suffix(suffix).map(|stem| (stem, b, i)))
        .unwrap_or((name, false, false))
}

/// Encode `s` for a WinAnsi simple font; unmappable characters become `?`.
pub fn encode_win_ansi(s: &str) -> Vec<u8> {
    s.chars().map(win_ansi_code).collect()
}

fn win_ansi_code(c: char) -> u8 {
    let cp = u32::from(c);
    match cp {
        0x20..=0x7E | 0xA0..=0xFF => cp as u8,
        0x09 => b' ',
        _ => match c {
            '€' => 0x80,
            '‚' => 0x82,
            'ƒ' => 0x83,
            '„' => 0x84,
            '…' => 0x85,
            '†' => 0x86,
            '‡' => 0x87,
            'ˆ' => 0x88,
            '‰' => 0x89,
            'Š' => 0x8A,
            '‹' => 0x8B,
            'Œ' => 0x8C,
            'Ž' => 0x8E,
            '\u{2018}' => 0x91,
            '\u{2019}' => 0x92,
            '\u{201C}' => 0x93,
            '\u{201D}' => 0x94,
            '•' => 0x95,
            '\u{2013}' => 0x96,
            '\u{2014}' => 0x97,
            '˜' => 0x98,
            '™' => 0x99,
            'š' => 0x9A,
            '›' => 0x9B,
            'œ' => 0x9C,
            'ž' => 0x9E,
            'Ÿ' => 0x9F,
            _ => b'?',
        },
    }
}

// Advances for codes 32..=126.
#[rustfmt::skip]
const HELVETICA: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556,
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556,
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556,
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584,
];

#[rustfmt::skip]
const HELVETICA_BOLD: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611,
    975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556,
    333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611,
    611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584,
];

#[rustfmt::skip]
const TIMES_ROMAN: [u16; 95] = [
    250, 333, 408, 500, 500, 833, 778, 180, 333, 333, 500, 564, 250, 333, 250, 278,
    500, 500, 500, 500, 500, 500, 500, 500, 500, 500, 278, 278, 564, 564, 564, 444,
    921, 722, 667, 667, 722, 611, 556, 722, 722, 333, 389, 722, 611, 889, 722, 722,
    556, 722, 667, 556, 611, 722, 722, 944, 722, 722, 611, 333, 278, 333, 469, 500,
    333, 444, 500, 444, 500, 444, 333, 500, 500, 278, 278, 500, 278, 778, 500, 500,
    500, 500, 333, 389, 278, 500, 500, 722, 500, 500, 444, 480, 200, 480, 541,
];

#[rustfmt::skip]
const TIMES_BOLD: [u16; 95] = [
    250, 333, 555, 500, 500, 1000, 833, 278, 333, 333, 500, 570, 250, 333, 250, 278,
    500, 500, 500, 500, 500, 500, 500, 500, 500, 500, 333, 333, 570, 570, 570, 500,
    930, 722, 667, 722, 722, 667, 611, 778, 778, 389, 500, 778, 667, 944, 722, 778,
    611, 778, 722, 556, 667, 722, 722, 1000, 722, 722, 667, 333, 278, 333, 581, 500,
    333, 500, 556, 444, 556, 444, 333, 500, 556, 278, 333, 556, 278, 833, 556, 500,
    556, 556, 444, 389, 333, 556, 500, 722, 500, 500, 444, 394, 220, 394, 520,
];

#[rustfmt::skip]
const TIMES_ITALIC: [u16; 95] = [
    250, 333, 420, 500, 500, 833, 778, 214, 333, 333, 500, 675, 250, 333, 250, 278,
    500, 500, 500, 500, 500, 500, 500, 500, 500, 500, 333, 333, 675, 675, 675, 500,
    920, 611, 611, 667, 722, 611, 611, 722, 722, 333, 444, 667, 556, 833, 667, 722,
    611, 722, 611, 500, 556, 722, 611, 833, 611, 556, 556, 389, 278, 389, 422, 500,
    333, 500, 500, 444, 500, 444, 278, 500, 500, 278, 278, 444, 278, 722, 500, 500,
    500, 500, 389, 389, 278, 500, 444, 667, 444, 444, 389, 400, 275, 400, 541,
];

#[rustfmt::skip]
const TIMES_BOLD_ITALIC: [u16; 95] = [
    250, 389, 555, 500, 500, 833, 778, 278, 333, 333, 500, 570, 250, 333, 250, 278,
    500, 500, 500, 500, 500, 500, 500, 500, 500, 500, 333, 333, 570, 570, 570, 500,
    832, 667, 667, 667, 722, 667, 667, 722, 778, 389, 500, 667, 611, 889, 722, 722,
    611, 722, 667, 556, 611, 722, 667, 889, 667, 611, 611, 333, 278, 333, 570, 500,
    333, 500, 500, 444, 500, 444, 333, 500, 556, 278, 278, 500, 278, 778, 556, 500,
    500, 500, 389, 389, 278, 556, 444, 667, 500, 444, 389, 348, 220, 348, 570,
];

#[cfg(test)]
#[path = "../../tests/unit/pdf/fonts.rs"]
mod tests;
