use std::sync::Arc;

use anyhow::Context;

use crate::foundation::{
    core::premultiply_rgba8_in_place,
    error::{PrintError, PrintResult},
};

/// Largest decoded source image accepted, per side.
const MAX_SOURCE_DIM: u32 = 16_384;

/// Decoded image pixels, premultiplied RGBA8, row-major.
#[derive(Clone, Debug)]
pub struct PreparedImage {
    pub width: u32,
    pub height: u32,
    pub rgba8_premul: Arc<Vec<u8>>,
}

impl PreparedImage {
    /// Pixel bounds `(x0, y0, x1, y1)` of the rectangle at `(x, y)` of size `w x h`,
    /// clamped to the image. `None` when nothing of it lies inside.
    pub fn clamp_region(&self, x: f64, y: f64, w: f64, h: f64) -> Option<(u32, u32, u32, u32)> {
        let clamp = |v: f64, max: u32| -> u32 {
            if v.is_finite() {
                v.round().clamp(0.0, f64::from(max)) as u32
            } else {
                0
            }
        };
        let x0 = clamp(x, self.width);
        let y0 = clamp(y, self.height);
        let x1 = clamp(x + w, self.width);
        let y1 = clamp(y + h, self.height);
        (x1 > x0 && y1 > y0).then_some((x0, y0, x1, y1))
    }

    /// Copy out the sub-rectangle at `(x, y)` of size `w x h`, clamped to the image bounds.
    ///
    /// Returns `None` when the clamped region is empty.
    pub fn crop(&self, x: f64, y: f64, w: f64, h: f64) -> Option<Self> {
        let (x0, y0, x1, y1) = self.clamp_region(x, y, w, h)?;
        if x0 == 0 && y0 == 0 && x1 == self.width && y1 == self.height {
            return Some(self.clone());
        }

        let (cw, ch) = (x1 - x0, y1 - y0);
        let stride = self.width as usize * 4;
        let row_len = cw as usize * 4;
        let mut out = Vec::with_capacity(row_len * ch as usize);
        for row in y0..y1 {
            let start = row as usize * stride + x0 as usize * 4;
            out.extend_from_slice(&self.rgba8_premul[start..start + row_len]);
        }
        Some(Self {
            width: cw,
            height: ch,
            rgba8_premul: Arc::new(out),
        })
    }
}

/// Decode raster (PNG, JPEG, WebP, GIF, ...) or SVG bytes into premultiplied pixels.
pub fn decode_image(bytes: &[u8], fontdb: Arc<usvg::fontdb::Database>) -> PrintResult<PreparedImage> {
    if looks_like_svg(bytes) {
        return decode_svg(bytes, fontdb);
    }

    let dyn_img = image::load_from_memory(bytes).context("decode image from memory")?;
    let (width, height) = (dyn_img.width(), dyn_img.height());
    check_dims(width, height)?;
    let rgba = dyn_img.to_rgba8();

    let mut rgba8_premul = rgba.into_raw();
    premultiply_rgba8_in_place(&mut rgba8_premul);

    Ok(PreparedImage {
        width,
        height,
        rgba8_premul: Arc::new(rgba8_premul),
    })
}

/// SVG sources are rasterized once at their intrinsic size.
fn decode_svg(bytes: &[u8], fontdb: Arc<usvg::fontdb::Database>) -> PrintResult<PreparedImage> {
    let opts = usvg::Options {
        fontdb,
        ..usvg::Options::default()
    };
    let tree = usvg::Tree::from_data(bytes, &opts).context("parse svg tree")?;

    let size = tree.size();
    let to_px = |v: f32| -> PrintResult<u32> {
        if !v.is_finite() || v <= 0.0 {
            return Err(PrintError::asset("svg has invalid width/height"));
        }
        Ok((v.ceil() as u32).max(1))
    };
    let (width, height) = (to_px(size.width())?, to_px(size.height())?);
    check_dims(width, height)?;

    let rgba8_premul = rasterize_svg_to_premul_rgba8(&tree, width, height)?;
    Ok(PreparedImage {
        width,
        height,
        rgba8_premul: Arc::new(rgba8_premul),
    })
}

pub(crate) fn rasterize_svg_to_premul_rgba8(
    tree: &usvg::Tree,
    width: u32,
    height: u32,
) -> PrintResult<Vec<u8>> {
    let mut pixmap = resvg::tiny_skia::Pixmap::new(width, height)
        .ok_or_else(|| PrintError::asset("failed to allocate svg pixmap"))?;

    let sx = (width as f32) / tree.size().width();
    let sy = (height as f32) / tree.size().height();
    let xform = resvg::tiny_skia::Transform::from_scale(sx, sy);

    resvg::render(tree, xform, &mut pixmap.as_mut());
    Ok(pixmap.take())
}

fn looks_like_svg(bytes: &[u8]) -> bool {
    let head = &bytes[..bytes.len().min(512)];
    let head = String::from_utf8_lossy(head);
    let t = head.trim_start_matches('\u{feff}').trim_start();
    t.starts_with("<svg") || (t.starts_with("<?xml") && head.contains("<svg"))
}

fn check_dims(w: u32, h: u32) -> PrintResult<()> {
    if w == 0 || h == 0 {
        return Err(PrintError::asset("image has zero size"));
    }
    if w > MAX_SOURCE_DIM || h > MAX_SOURCE_DIM {
        return Err(PrintError::asset(format!(
            "image too large: {w}x{h} (max {MAX_SOURCE_DIM}x{MAX_SOURCE_DIM})"
        )));
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/assets/decode.rs"]
mod tests;
