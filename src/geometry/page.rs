use std::{fmt, str::FromStr};

use crate::foundation::error::{PrintError, PrintResult};

/// PDF points per millimetre.
pub const PT_PER_MM: f64 = 2.834645669;
/// PDF points per inch.
pub const PT_PER_INCH: f64 = 72.0;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum PageFormat {
    #[default]
    A4,
    A3,
    Letter,
    Legal,
}

impl PageFormat {
    /// Portrait `(width, height)` in millimetres.
    pub fn size_mm(self) -> (f64, f64) {
        match self {
            Self::A4 => (210.0, 297.0),
            Self::A3 => (297.0, 420.0),
            Self::Letter => (216.0, 279.0),
            Self::Legal => (216.0, 356.0),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::A4 => "a4",
            Self::A3 => "a3",
            Self::Letter => "letter",
            Self::Legal => "legal",
        }
    }
}

impl FromStr for PageFormat {
    type Err = PrintError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "a4" => Ok(Self::A4),
            "a3" => Ok(Self::A3),
            "letter" => Ok(Self::Letter),
            "legal" => Ok(Self::Legal),
            other => Err(PrintError::validation(format!(
                "unknown page format \"{other}\" (expected a4, a3, letter or legal)"
            ))),
        }
    }
}

impl fmt::Display for PageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Orientation {
    Portrait,
    #[default]
    Landscape,
}

impl Orientation {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Portrait => "portrait",
            Self::Landscape => "landscape",
        }
    }
}

impl FromStr for Orientation {
    type Err = PrintError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "portrait" => Ok(Self::Portrait),
            "landscape" => Ok(Self::Landscape),
            other => Err(PrintError::validation(format!(
                "unknown orientation \"{other}\" (expected portrait or landscape)"
            ))),
        }
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

macro_rules! deserialize_from_str {
    ($ty:ty) => {
        impl<'de> serde::Deserialize<'de> for $ty {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                let s = <String as serde::Deserialize>::deserialize(deserializer)?;
                s.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

deserialize_from_str!(PageFormat);
deserialize_from_str!(Orientation);

/// Per-request print settings. Missing fields take the service defaults.
#[derive(Clone, Copy, Debug, PartialEq, serde::Deserialize)]
#[serde(default)]
pub struct RenderSettings {
    pub format: PageFormat,
    pub orientation: Orientation,
    pub dpi: f64,
    /// Millimetres.
    pub bleed: f64,
    /// Millimetres.
    pub margin: f64,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            format: PageFormat::A4,
            orientation: Orientation::Landscape,
            dpi: 300.0,
            bleed: 3.0,
            margin: 5.0,
        }
    }
}

impl RenderSettings {
    pub fn validate(&self) -> PrintResult<()> {
        if !self.dpi.is_finite() || self.dpi <= 0.0 {
            return Err(PrintError::validation(format!(
                "dpi must be a positive number, got {}",
                self.dpi
            )));
        }
        for (name, v) in [("bleed", self.bleed), ("margin", self.margin)] {
            if !v.is_finite() || v < 0.0 {
                return Err(PrintError::validation(format!(
                    "{name} must be a non-negative number of millimetres, got {v}"
                )));
            }
        }
        Ok(())
    }

    /// Trim-size page `(width, height)` in millimetres after orientation.
    pub fn page_size_mm(&self) -> (f64, f64) {
        let (w, h) = self.format.size_mm();
        match self.orientation {
            Orientation::Portrait => (w, h),
            Orientation::Landscape => (h, w),
        }
    }

    /// `print-ready-<format>-<orientation>.pdf`
    pub fn attachment_filename(&self) -> String {
        format!("print-ready-{}-{}.pdf", self.format, self.orientation)
    }
}

/// Resolved page layout. All lengths are PDF points unless named otherwise.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PageGeometry {
    pub doc_width: f64,
    pub doc_height: f64,
    /// Trim size.
    pub page_width_pts: f64,
    pub page_height_pts: f64,
    pub bleed_pts: f64,
    pub margin_pts: f64,
    pub scale: f64,
    pub render_width: f64,
    pub render_height: f64,
    /// Top-left of the placed render, measured from the media box's top-left corner.
    pub offset_x: f64,
    pub offset_y: f64,
    pub pixel_width: u32,
    pub pixel_height: u32,
    /// Design pixels to raster pixels: `dpi / 72 * scale`.
    pub final_scale: f64,
}

impl PageGeometry {
    pub fn resolve(settings: &RenderSettings, doc_width: f64, doc_height: f64) -> PrintResult<Self> {
        settings.validate()?;
        if !(doc_width.is_finite() && doc_height.is_finite() && doc_width > 0.0 && doc_height > 0.0)
        {
            return Err(PrintError::validation(format!(
                "design size must be positive, got {doc_width}x{doc_height}"
            )));
        }

        let (page_w_mm, page_h_mm) = settings.page_size_mm();
        let page_width_pts = page_w_mm * PT_PER_MM;
        let page_height_pts = page_h_mm * PT_PER_MM;
        let margin_pts = settings.margin * PT_PER_MM;
        let bleed_pts = settings.bleed * PT_PER_MM;

        let print_w = page_width_pts - 2.0 * margin_pts;
        let print_h = page_height_pts - 2.0 * margin_pts;
        if print_w <= 0.0 || print_h <= 0.0 {
            return Err(PrintError::validation(format!(
                "margin of {}mm leaves no printable area on a {page_w_mm}x{page_h_mm}mm page",
                settings.margin
            )));
        }

        let scale = (print_w / doc_width).min(print_h / doc_height);
        let render_width = doc_width * scale;
        let render_height = doc_height * scale;

        let px = |pts: f64| (pts / PT_PER_INCH * settings.dpi).round();
        let (pw, ph) = (px(render_width), px(render_height));
        if pw < 1.0 || ph < 1.0 || pw > f64::from(u32::MAX) || ph > f64::from(u32::MAX) {
            return Err(PrintError::validation(format!(
                "raster size {pw}x{ph} is out of range"
            )));
        }

        Ok(Self {
            doc_width,
            doc_height,
            page_width_pts,
            page_height_pts,
            bleed_pts,
            margin_pts,
            scale,
            render_width,
            render_height,
            offset_x: bleed_pts + margin_pts + (print_w - render_width) / 2.0,
            offset_y: bleed_pts + margin_pts + (print_h - render_height) / 2.0,
            pixel_width: pw as u32,
            pixel_height: ph as u32,
            final_scale: settings.dpi / PT_PER_INCH * scale,
        })
    }

    /// Media box size: trim size plus bleed on every side.
    pub fn media_size(&self) -> (f64, f64) {
        (
            self.page_width_pts + 2.0 * self.bleed_pts,
            self.page_height_pts + 2.0 * self.bleed_pts,
        )
    }

    /// Reject rasters the surface cannot address or that exceed `max_megapixels`.
    pub fn check_raster_limits(&self, max_megapixels: f64) -> PrintResult<()> {
        let (w, h) = (self.pixel_width, self.pixel_height);
        if w > u32::from(u16::MAX) || h > u32::from(u16::MAX) {
            return Err(PrintError::validation(format!(
                "raster {w}x{h} exceeds the {} pixel limit per side; lower the dpi",
                u16::MAX
            )));
        }
        let mp = f64::from(w) * f64::from(h) / 1_000_000.0;
        if mp > max_megapixels {
            return Err(PrintError::validation(format!(
                "raster {w}x{h} ({mp:.1} MP) exceeds the {max_megapixels} MP limit; lower the dpi"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/geometry/page.rs"]
mod tests;
