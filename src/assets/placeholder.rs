use std::sync::Arc;

use anyhow::Context;

use crate::{
    assets::decode::{PreparedImage, rasterize_svg_to_premul_rgba8},
    foundation::{
        core::{Affine, Rgba8Premul},
        error::{PrintError, PrintResult},
    },
};

/// Box fill drawn in place of an image that failed to load.
pub const PLACEHOLDER_FILL: Rgba8Premul = Rgba8Premul {
    r: 0xf0,
    g: 0xf0,
    b: 0xf0,
    a: 255,
};

/// Box size used when the object has no width/height of its own.
pub const PLACEHOLDER_DEFAULT_SIDE: f64 = 100.0;

const LABEL_TEXT: &str = "Image Error";
const LABEL_W: f64 = 120.0;
const LABEL_H: f64 = 24.0;
/// Baseline of the label inside its own box.
const LABEL_BASELINE: f64 = 16.0;

/// Largest label raster, per side.
const MAX_DIM: u32 = 16_384;

/// The centered "Image Error" label, parsed once per render and rasterized per placement.
pub struct PlaceholderLabel {
    tree: usvg::Tree,
}

impl PlaceholderLabel {
    pub fn new(fontdb: Arc<usvg::fontdb::Database>) -> PrintResult<Self> {
        let svg = format!(
            r##"<svg xmlns="http://www.w3.org/2000/svg" width="{LABEL_W}" height="{LABEL_H}" viewBox="0 0 {LABEL_W} {LABEL_H}"><text x="{x}" y="{LABEL_BASELINE}" font-family="Arial, Helvetica, Liberation Sans, DejaVu Sans, sans-serif" font-size="12" fill="#999999" text-anchor="middle">{LABEL_TEXT}</text></svg>"##,
            x = LABEL_W / 2.0,
        );
        let opts = usvg::Options {
            fontdb,
            ..usvg::Options::default()
        };
        let tree = usvg::Tree::from_str(&svg, &opts).context("parse placeholder label svg")?;
        Ok(Self { tree })
    }

    /// Local offset of the label box so its baseline is centered in a `box_w x box_h` box.
    pub fn local_origin(box_w: f64, box_h: f64) -> (f64, f64) {
        (box_w / 2.0 - LABEL_W / 2.0, box_h / 2.0 - LABEL_BASELINE)
    }

    /// Rasterize the label for drawing under `transform` (label-local units to device pixels).
    ///
    /// Returns the pixels and the transform to draw them with. `None` when no font could shape
    /// the label.
    pub fn rasterize(&self, transform: Affine) -> PrintResult<Option<(PreparedImage, Affine)>> {
        if self.tree.root().children().is_empty() {
            return Ok(None);
        }
        let (w, h, adjust) = svg_raster_params(&self.tree, transform)?;
        let rgba8_premul = rasterize_svg_to_premul_rgba8(&self.tree, w, h)?;
        Ok(Some((
            PreparedImage {
                width: w,
                height: h,
                rgba8_premul: Arc::new(rgba8_premul),
            },
            adjust,
        )))
    }
}

/// Raster size for an SVG drawn under `transform`, and the transform to draw that raster with.
///
/// Rasterizing at device resolution avoids blurry upscaling of the label on high-dpi pages.
fn svg_raster_params(tree: &usvg::Tree, transform: Affine) -> PrintResult<(u32, u32, Affine)> {
    fn to_px(v: f32) -> PrintResult<u32> {
        if !v.is_finite() || v <= 0.0 {
            return Err(PrintError::render("svg has invalid width/height"));
        }
        Ok((v.ceil() as u32).max(1))
    }

    let size = tree.size();
    let base_w = to_px(size.width())?;
    let base_h = to_px(size.height())?;

    let [a, b, c, d, _e, _f] = transform.as_coeffs();
    let sx = (a * a + b * b).sqrt().max(1e-6);
    let sy = (c * c + d * d).sqrt().max(1e-6);

    let w = (f64::from(base_w) * sx).ceil().max(1.0) as u32;
    let h = (f64::from(base_h) * sy).ceil().max(1.0) as u32;
    if w > MAX_DIM || h > MAX_DIM {
        return Err(PrintError::render(format!(
            "svg raster size too large: {w}x{h} (max {MAX_DIM}x{MAX_DIM})"
        )));
    }

    let inv = Affine::scale_non_uniform(
        f64::from(base_w) / f64::from(w),
        f64::from(base_h) / f64::from(h),
    );
    Ok((w, h, transform * inv))
}

#[cfg(test)]
#[path = "../../tests/unit/assets/placeholder.rs"]
mod tests;
