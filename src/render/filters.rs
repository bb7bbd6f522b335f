use std::sync::Arc;

use crate::{
    assets::decode::PreparedImage,
    foundation::error::{PrintError, PrintResult},
    scene::filters::{GrayscaleMode, ImageFilter},
};

const MAX_BLUR_RADIUS: u32 = 256;

const SEPIA: [f32; 20] = [
    0.393, 0.769, 0.189, 0.0, 0.0, //
    0.349, 0.686, 0.168, 0.0, 0.0, //
    0.272, 0.534, 0.131, 0.0, 0.0, //
    0.0, 0.0, 0.0, 1.0, 0.0,
];

const INVERT_RGB: [f32; 20] = [
    -1.0, 0.0, 0.0, 0.0, 1.0, //
    0.0, -1.0, 0.0, 0.0, 1.0, //
    0.0, 0.0, -1.0, 0.0, 1.0, //
    0.0, 0.0, 0.0, 1.0, 0.0,
];

const INVERT_RGBA: [f32; 20] = [
    -1.0, 0.0, 0.0, 0.0, 1.0, //
    0.0, -1.0, 0.0, 0.0, 1.0, //
    0.0, 0.0, -1.0, 0.0, 1.0, //
    0.0, 0.0, 0.0, -1.0, 1.0,
];

/// Apply `filters` in order to a decoded image. Returns the input unchanged when the list is empty.
pub fn apply_filters(img: &PreparedImage, filters: &[ImageFilter]) -> PrintResult<PreparedImage> {
    if filters.is_empty() {
        return Ok(img.clone());
    }

    let (w, h) = (img.width, img.height);
    let mut cur = img.rgba8_premul.as_slice().to_vec();
    let mut scratch = vec![0u8; cur.len()];
    for f in filters {
        match *f {
            ImageFilter::Grayscale { mode } => grayscale_rgba8_premul(&mut cur, mode),
            ImageFilter::Sepia => {
                color_matrix_rgba8_premul(&cur, &mut scratch, SEPIA);
                std::mem::swap(&mut cur, &mut scratch);
            }
            ImageFilter::Invert { alpha } => {
                let m = if alpha { INVERT_RGBA } else { INVERT_RGB };
                color_matrix_rgba8_premul(&cur, &mut scratch, m);
                std::mem::swap(&mut cur, &mut scratch);
            }
            ImageFilter::Blur { blur } => {
                let radius = blur_radius_px(blur, w, h);
                if radius > 0 {
                    cur = blur_rgba8_premul(&cur, w, h, radius, radius as f32 / 2.0)?;
                }
            }
        }
    }

    Ok(PreparedImage {
        width: w,
        height: h,
        rgba8_premul: Arc::new(cur),
    })
}

/// Map the editor's fractional blur amount to a pixel radius on this image.
pub fn blur_radius_px(blur: f64, width: u32, height: u32) -> u32 {
    if !blur.is_finite() || blur <= 0.0 {
        return 0;
    }
    let min_side = f64::from(width.min(height));
    let r = (blur.min(1.0) * 0.12 * min_side).round();
    (r as u32).min(MAX_BLUR_RADIUS)
}

/// Grayscale works directly on premultiplied values: every mode is homogeneous in alpha.
fn grayscale_rgba8_premul(px: &mut [u8], mode: GrayscaleMode) {
    for p in px.chunks_exact_mut(4) {
        let (r, g, b) = (u32::from(p[0]), u32::from(p[1]), u32::from(p[2]));
        let v = match mode {
            GrayscaleMode::Average => (r + g + b + 1) / 3,
            GrayscaleMode::Luminosity => (r * 21 + g * 72 + b * 7 + 50) / 100,
            GrayscaleMode::Lightness => (r.max(g).max(b) + r.min(g).min(b) + 1) / 2,
        };
        let v = v.min(u32::from(p[3])) as u8;
        p[0] = v;
        p[1] = v;
        p[2] = v;
    }
}

pub(crate) fn color_matrix_rgba8_premul(src: &[u8], dst: &mut [u8], m: [f32; 20]) {
    debug_assert_eq!(src.len(), dst.len());
    for (s, d) in src.chunks_exact(4).zip(dst.chunks_exact_mut(4)) {
        let pr = s[0] as f32 / 255.0;
        let pg = s[1] as f32 / 255.0;
        let pb = s[2] as f32 / 255.0;
        let pa = s[3] as f32 / 255.0;

        let inv_a = if pa > 0.0 { 1.0 / pa } else { 0.0 };
        let r = pr * inv_a;
        let g = pg * inv_a;
        let b = pb * inv_a;
        let a = pa;

        let out_r = (m[0] * r + m[1] * g + m[2] * b + m[3] * a + m[4]).clamp(0.0, 1.0);
        let out_g = (m[5] * r + m[6] * g + m[7] * b + m[8] * a + m[9]).clamp(0.0, 1.0);
        let out_b = (m[10] * r + m[11] * g + m[12] * b + m[13] * a + m[14]).clamp(0.0, 1.0);
        let out_a = (m[15] * r + m[16] * g + m[17] * b + m[18] * a + m[19]).clamp(0.0, 1.0);

        d[0] = (out_r * out_a * 255.0).round().clamp(0.0, 255.0) as u8;
        d[1] = (out_g * out_a * 255.0).round().clamp(0.0, 255.0) as u8;
        d[2] = (out_b * out_a * 255.0).round().clamp(0.0, 255.0) as u8;
        d[3] = (out_a * 255.0).round().clamp(0.0, 255.0) as u8;
    }
}

pub(crate) fn blur_rgba8_premul(
    src: &[u8],
    width: u32,
    height: u32,
    radius: u32,
    sigma: f32,
) -> PrintResult<Vec<u8>> {
    let expected_len = (width as usize)
        .checked_mul(height as usize)
        .and_then(|v| v.checked_mul(4))
        .ok_or_else(|| PrintError::render("blur buffer size overflow"))?;
    if src.len() != expected_len {
        return Err(PrintError::render(
            "blur expects a buffer of width*height*4 bytes",
        ));
    }
    if radius == 0 || width == 0 || height == 0 {
        return Ok(src.to_vec());
    }

    let kernel = gaussian_kernel_q16(radius, sigma)?;
    let mut tmp = vec![0u8; expected_len];
    let mut out = vec![0u8; expected_len];

    horizontal_pass(src, &mut tmp, width, height, &kernel);
    vertical_pass(&tmp, &mut out, width, height, &kernel);
    Ok(out)
}

fn gaussian_kernel_q16(radius: u32, sigma: f32) -> PrintResult<Vec<u32>> {
    if radius == 0 {
        return Ok(vec![1 << 16]);
    }
    if !sigma.is_finite() || sigma <= 0.0 {
        return Err(PrintError::render("blur sigma must be > 0"));
    }

    let r = radius as i32;
    let sigma = f64::from(sigma);
    let denom = 2.0 * sigma * sigma;
    let weights_f: Vec<f64> = (-r..=r)
        .map(|i| {
            let x = f64::from(i);
            (-x * x / denom).exp()
        })
        .collect();
    let sum: f64 = weights_f.iter().sum();
    if sum <= 0.0 {
        return Err(PrintError::render("gaussian kernel sum is zero"));
    }

    let mut weights = Vec::<u32>::with_capacity(weights_f.len());
    let mut acc: i64 = 0;
    for &wf in &weights_f {
        let q = (((wf / sum) * 65536.0).round() as i64).clamp(0, 65536);
        weights.push(q as u32);
        acc += q;
    }
    // Push rounding drift into the centre tap so the kernel sums to exactly 1.0 in Q16.
    let delta = 65536 - acc;
    if delta != 0 {
        let mid = weights.len() / 2;
        weights[mid] = (i64::from(weights[mid]) + delta).clamp(0, 65536) as u32;
    }

    Ok(weights)
}

fn horizontal_pass(src: &[u8], dst: &mut [u8], width: u32, height: u32, k: &[u32]) {
    let radius = (k.len() / 2) as i32;
    let w = width as i32;
    for y in 0..height as i32 {
        for x in 0..w {
            let mut acc = [0u64; 4];
            for (ki, &kw) in k.iter().enumerate() {
                let sx = (x + ki as i32 - radius).clamp(0, w - 1);
                let idx = ((y * w + sx) as usize) * 4;
                for c in 0..4 {
                    acc[c] += u64::from(kw) * u64::from(src[idx + c]);
                }
            }
            let out_idx = ((y * w + x) as usize) * 4;
            for c in 0..4 {
                dst[out_idx + c] = q16_to_u8(acc[c]);
            }
        }
    }
}

fn vertical_pass(src: &[u8], dst: &mut [u8], width: u32, height: u32, k: &[u32]) {
    let radius = (k.len() / 2) as i32;
    let w = width as i32;
    let h = height as i32;
    for y in 0..h {
        for x in 0..w {
            let mut acc = [0u64; 4];
            for (ki, &kw) in k.iter().enumerate() {
                let sy = (y + ki as i32 - radius).clamp(0, h - 1);
                let idx = ((sy * w + x) as usize) * 4;
                for c in 0..4 {
                    acc[c] += u64::from(kw) * u64::from(src[idx + c]);
                }
            }
            let out_idx = ((y * w + x) as usize) * 4;
            for c in 0..4 {
                dst[out_idx + c] = q16_to_u8(acc[c]);
            }
        }
    }
}

fn q16_to_u8(acc: u64) -> u8 {
    ((acc + 32768) >> 16).min(255) as u8
}

#[cfg(test)]
#[path = "../../tests/unit/render/filters.rs"]
mod tests;
