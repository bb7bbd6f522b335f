use std::sync::Arc;

use kurbo::Shape as _;

use crate::{
    assets::{
        decode::PreparedImage,
        placeholder::{PLACEHOLDER_DEFAULT_SIDE, PLACEHOLDER_FILL, PlaceholderLabel},
        store::{ImageOutcome, ResolvedImages},
    },
    foundation::{
        core::{Affine, BezPath, Rgba8Premul},
        error::{PrintError, PrintResult},
    },
    geometry::page::PageGeometry,
    render::transform::object_transform,
    scene::{
        color::ColorDef,
        model::{CircleObject, ImageObject, ObjectCommon, RectObject, SceneDocument, SceneObject},
    },
};

/// Flattened, opaque raster ready for embedding: tightly packed RGB8, row-major.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RasterImage {
    pub width: u32,
    pub height: u32,
    pub rgb8: Vec<u8>,
}

/// Paints the non-text objects of a scene onto a CPU surface sized by the page geometry.
pub struct Compositor<'a> {
    geometry: &'a PageGeometry,
    images: &'a ResolvedImages,
    label: Option<&'a PlaceholderLabel>,
}

impl<'a> Compositor<'a> {
    pub fn new(
        geometry: &'a PageGeometry,
        images: &'a ResolvedImages,
        label: Option<&'a PlaceholderLabel>,
    ) -> Self {
        Self {
            geometry,
            images,
            label,
        }
    }

    /// Paint `order` (already in paint order) over the document background.
    #[tracing::instrument(skip_all, fields(w = self.geometry.pixel_width, h = self.geometry.pixel_height))]
    pub fn composite(&self, doc: &SceneDocument, order: &[&SceneObject]) -> PrintResult<RasterImage> {
        let g = self.geometry;
        let width: u16 = g
            .pixel_width
            .try_into()
            .map_err(|_| PrintError::validation("raster width exceeds u16"))?;
        let height: u16 = g
            .pixel_height
            .try_into()
            .map_err(|_| PrintError::validation("raster height exceeds u16"))?;

        let mut ctx = vello_cpu::RenderContext::new(width, height);
        ctx.reset();
        ctx.set_blend_mode(vello_cpu::peniko::BlendMode::default());
        ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);

        // The background covers the whole surface so rounding in the pixel size leaves no seam.
        let bg = doc.background_or_white().to_rgba8_premul();
        ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
        ctx.set_paint(color_paint(bg));
        ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
            0.0,
            0.0,
            f64::from(width),
            f64::from(height),
        ));

        let global = Affine::scale(g.final_scale);
        for (idx, obj) in order.iter().enumerate() {
            let Some(common) = obj.common() else {
                tracing::debug!(index = idx, kind = obj.kind(), "skipping unsupported object");
                continue;
            };
            if !common.visible() {
                continue;
            }
            // Text is drawn as vector text on the PDF page, never into the raster.
            if matches!(obj, SceneObject::Text(_)) {
                continue;
            }
            let opacity = common.opacity() as f32;
            if opacity <= 0.0 {
                continue;
            }

            let tr = object_transform(global, common);
            if opacity < 1.0 {
                ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
                ctx.push_opacity_layer(opacity);
            }
            match obj {
                SceneObject::Rect(r) => draw_rect(&mut ctx, tr, r),
                SceneObject::Circle(c) => draw_circle(&mut ctx, tr, c),
                SceneObject::Image(img) => self.draw_image(&mut ctx, tr, idx, img)?,
                SceneObject::Text(_) | SceneObject::Unsupported { .. } => {}
            }
            if opacity < 1.0 {
                ctx.pop_layer();
            }
        }

        let mut pixmap = vello_cpu::Pixmap::new(width, height);
        ctx.flush();
        ctx.render_to_pixmap(&mut pixmap);

        Ok(RasterImage {
            width: u32::from(width),
            height: u32::from(height),
            rgb8: flatten_over_white(pixmap.data_as_u8_slice()),
        })
    }

    fn draw_image(
        &self,
        ctx: &mut vello_cpu::RenderContext,
        tr: Affine,
        idx: usize,
        img: &ImageObject,
    ) -> PrintResult<()> {
        match self.images.get(idx) {
            Some(ImageOutcome::Ready { image, dest }) => {
                let (iw, ih) = (f64::from(image.width), f64::from(image.height));
                let sized = tr
                    * Affine::translate((dest.x0, dest.y0))
                    * Affine::scale_non_uniform(dest.width() / iw, dest.height() / ih);
                draw_pixels(ctx, sized, image)?;
            }
            Some(ImageOutcome::Failed(_)) => self.draw_placeholder(ctx, tr, &img.common)?,
            // No source: nothing to draw.
            None => {}
        }
        Ok(())
    }

    fn draw_placeholder(
        &self,
        ctx: &mut vello_cpu::RenderContext,
        tr: Affine,
        c: &ObjectCommon,
    ) -> PrintResult<()> {
        let bw = c.width.filter(|w| *w > 0.0).unwrap_or(PLACEHOLDER_DEFAULT_SIDE) * c.scale_x();
        let bh = c.height.filter(|h| *h > 0.0).unwrap_or(PLACEHOLDER_DEFAULT_SIDE) * c.scale_y();

        ctx.set_transform(affine_to_cpu(tr));
        ctx.set_paint(color_paint(PLACEHOLDER_FILL));
        ctx.fill_rect(&vello_cpu::kurbo::Rect::new(0.0, 0.0, bw, bh));

        let Some(label) = self.label else {
            return Ok(());
        };
        let (lx, ly) = PlaceholderLabel::local_origin(bw, bh);
        match label.rasterize(tr * Affine::translate((lx, ly))) {
            Ok(Some((pixels, adjust))) => draw_pixels(ctx, adjust, &pixels)?,
            Ok(None) => {}
            Err(e) => tracing::debug!("placeholder label skipped: {e}"),
        }
        Ok(())
    }
}

fn draw_rect(ctx: &mut vello_cpu::RenderContext, tr: Affine, r: &RectObject) {
    let (w, h) = r.common.scaled_size();
    let rect = vello_cpu::kurbo::Rect::new(0.0, 0.0, w, h);
    ctx.set_transform(affine_to_cpu(tr));

    let fill = r.fill.unwrap_or(ColorDef::rgba(0.0, 0.0, 0.0, 1.0));
    if !fill.is_transparent() {
        ctx.set_paint(color_paint(fill.to_rgba8_premul()));
        ctx.fill_rect(&rect);
    }
    if let Some(stroke) = r.common.stroke {
        let sw = r.common.stroke_width();
        if sw > 0.0 && !stroke.is_transparent() {
            ctx.set_paint(color_paint(stroke.to_rgba8_premul()));
            ctx.set_stroke(vello_cpu::kurbo::Stroke::new(sw));
            ctx.stroke_rect(&rect);
        }
    }
}

fn draw_circle(ctx: &mut vello_cpu::RenderContext, tr: Affine, c: &CircleObject) {
    let r = c.scaled_radius();
    if !(r.is_finite() && r > 0.0) {
        return;
    }
    let circle = kurbo::Circle::new((r, r), r);
    let path = bezpath_to_cpu(&circle.to_path(0.1));
    ctx.set_transform(affine_to_cpu(tr));

    if let Some(fill) = c.fill
        && !fill.is_transparent()
    {
        ctx.set_paint(color_paint(fill.to_rgba8_premul()));
        ctx.fill_path(&path);
    }
    if let Some(stroke) = c.common.stroke {
        let sw = c.common.stroke_width();
        if sw > 0.0 && !stroke.is_transparent() {
            ctx.set_paint(color_paint(stroke.to_rgba8_premul()));
            ctx.set_stroke(vello_cpu::kurbo::Stroke::new(sw));
            ctx.stroke_path(&path);
        }
    }
}

/// Draw premultiplied pixels so that image pixel space maps through `tr`.
fn draw_pixels(
    ctx: &mut vello_cpu::RenderContext,
    tr: Affine,
    img: &PreparedImage,
) -> PrintResult<()> {
    let pixmap = pixmap_from_premul_bytes(&img.rgba8_premul, img.width, img.height)?;
    ctx.set_transform(affine_to_cpu(tr));
    ctx.set_paint(vello_cpu::Image {
        image: vello_cpu::ImageSource::Pixmap(Arc::new(pixmap)),
        sampler: vello_cpu::peniko::ImageSampler::default(),
    });
    ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
        0.0,
        0.0,
        f64::from(img.width),
        f64::from(img.height),
    ));
    Ok(())
}

fn color_paint(c: Rgba8Premul) -> vello_cpu::peniko::Color {
    let [r, g, b, a] = c.to_straight_rgba();
    vello_cpu::peniko::Color::from_rgba8(r, g, b, a)
}

/// Premultiplied RGBA over opaque white, dropping alpha.
fn flatten_over_white(rgba_premul: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(rgba_premul.len() / 4 * 3);
    for px in rgba_premul.chunks_exact(4) {
        let inv = 255 - u16::from(px[3]);
        for &c in &px[..3] {
            out.push((u16::from(c) + inv).min(255) as u8);
        }
    }
    out
}

fn affine_to_cpu(a: Affine) -> vello_cpu::kurbo::Affine {
    vello_cpu::kurbo::Affine::new(a.as_coeffs())
}

fn bezpath_to_cpu(path: &BezPath) -> vello_cpu::kurbo::BezPath {
    use kurbo::PathEl;

    let mut out = vello_cpu::kurbo::BezPath::new();
    for &el in path.elements() {
        match el {
            PathEl::MoveTo(p) => out.move_to(vello_cpu::kurbo::Point::new(p.x, p.y)),
            PathEl::LineTo(p) => out.line_to(vello_cpu::kurbo::Point::new(p.x, p.y)),
            PathEl::QuadTo(p1, p2) => out.quad_to(
                vello_cpu::kurbo::Point::new(p1.x, p1.y),
                vello_cpu::kurbo::Point::new(p2.x, p2.y),
            ),
            PathEl::CurveTo(p1, p2, p3) => out.curve_to(
                vello_cpu::kurbo::Point::new(p1.x, p1.y),
                vello_cpu::kurbo::Point::new(p2.x, p2.y),
                vello_cpu::kurbo::Point::new(p3.x, p3.y),
            ),
            PathEl::ClosePath => out.close_path(),
        }
    }
    out
}

fn pixmap_from_premul_bytes(bytes: &[u8], width: u32, height: u32) -> PrintResult<vello_cpu::Pixmap> {
    let w: u16 = width
        .try_into()
        .map_err(|_| PrintError::render("pixmap width exceeds u16"))?;
    let h: u16 = height
        .try_into()
        .map_err(|_| PrintError::render("pixmap height exceeds u16"))?;
    if bytes.len()
        != (width as usize)
            .saturating_mul(height as usize)
            .saturating_mul(4)
    {
        return Err(PrintError::render("pixmap byte len mismatch"));
    }
    let pixels: Vec<vello_cpu::peniko::color::PremulRgba8> = bytes
        .chunks_exact(4)
        .map(|px| vello_cpu::peniko::color::PremulRgba8::from_u8_array([px[0], px[1], px[2], px[3]]))
        .collect();
    Ok(vello_cpu::Pixmap::from_parts_with_opacity(pixels, w, h, true))
}

#[cfg(test)]
#[path = "../../tests/unit/render/compositor.rs"]
mod tests;
