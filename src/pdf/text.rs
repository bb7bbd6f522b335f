use std::collections::BTreeSet;

use lopdf::{Object, StringFormat, content::Operation};

use crate::{
    foundation::core::{Affine, Rgba8Premul},
    geometry::page::PageGeometry,
    pdf::fonts::{StandardFace, encode_win_ansi, resolve_font},
    scene::model::{SceneObject, TextAlign, TextObject},
};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TextLayerOptions {
    /// Stroke underline/overline/line-through like the raster preview does.
    pub draw_decorations: bool,
}

/// One line of a laid-out text block, in top-down page points.
#[derive(Clone, Debug, PartialEq)]
pub struct PlacedLine {
    pub bytes: Vec<u8>,
    pub x: f64,
    /// Top of the line box.
    pub top: f64,
    /// Baseline, `top + ascender * size / 1000`.
    pub baseline: f64,
    pub width: f64,
}

/// A text object resolved to a face, a size and positioned lines.
#[derive(Clone, Debug, PartialEq)]
pub struct TextBlock {
    pub face: StandardFace,
    pub font_size: f64,
    pub char_spacing: f64,
    pub line_height: f64,
    pub fill: Rgba8Premul,
    pub lines: Vec<PlacedLine>,
    /// Object box origin and size in page points, used for background and rotation.
    pub box_x: f64,
    pub box_y: f64,
    pub box_width: f64,
    pub box_height: f64,
    pub background: Option<Rgba8Premul>,
    pub angle: f64,
    pub pivot: (f64, f64),
    pub underline: bool,
    pub overline: bool,
    pub linethrough: bool,
    /// Design font size times the page scale; decorations are offset in these units.
    pub unit: f64,
    pub design_font_size: f64,
}

/// Lay out one text object at the page scale and offsets of `g`.
pub fn layout_text(obj: &TextObject, g: &PageGeometry) -> TextBlock {
    let c = &obj.common;
    let scale = g.scale;
    let x = g.offset_x + c.left() * scale;
    let y = g.offset_y + c.top() * scale;
    let font_size = obj.font_size() * scale;
    let line_height = font_size * obj.line_height();
    let char_spacing = obj.char_spacing() / 1000.0 * font_size;
    let face = resolve_font(obj.font_family.as_deref(), obj.is_bold(), obj.is_italic());
    let box_width = c.width() * scale;
    let ascent = face.ascender() * font_size / 1000.0;

    let lines = obj
        .lines()
        .enumerate()
        .map(|(i, line)| {
            let bytes = encode_win_ansi(line);
            let width = face.string_width(&bytes, font_size, char_spacing);
            let lx = match obj.text_align {
                TextAlign::Left => x,
                TextAlign::Center => x + box_width / 2.0 - width / 2.0,
                TextAlign::Right => x + box_width - width,
            };
            let top = y + i as f64 * line_height;
            PlacedLine {
                bytes,
                x: lx,
                top,
                baseline: top + ascent,
                width,
            }
        })
        .collect();

    let (sw, sh) = c.scaled_size();
    TextBlock {
        face,
        font_size,
        char_spacing,
        line_height,
        fill: obj.fill_or_black().to_rgba8_premul(),
        lines,
        box_x: x,
        box_y: y,
        box_width,
        box_height: c.height() * scale,
        background: obj
            .text_background_color
            .filter(|bg| !bg.is_transparent())
            .map(|bg| bg.to_rgba8_premul()),
        angle: c.angle(),
        pivot: (x + sw * scale / 2.0, y + sh * scale / 2.0),
        underline: obj.underline.unwrap_or(false),
        overline: obj.overline.unwrap_or(false),
        linethrough: obj.linethrough.unwrap_or(false),
        unit: scale,
        design_font_size: obj.font_size(),
    }
}

/// Content-stream operations drawing every visible text object as live PDF text.
#[derive(Debug, Default)]
pub struct TextLayer {
    ops: Vec<Operation>,
    faces: BTreeSet<StandardFace>,
    drawn: usize,
}

impl TextLayer {
    #[tracing::instrument(skip_all, fields(objects = order.len()))]
    pub fn build(order: &[&SceneObject], g: &PageGeometry, opts: TextLayerOptions) -> Self {
        let (_, media_h) = g.media_size();
        let mut layer = Self::default();
        for obj in order {
            let SceneObject::Text(text) = obj else {
                continue;
            };
            if !text.common.visible() || text.common.opacity() <= 0.0 {
                continue;
            }
            let block = layout_text(text, g);
            layer.faces.insert(block.face);
            layer.push_block(&block, media_h, opts);
            layer.drawn += 1;
        }
        layer
    }

    pub fn operations(&self) -> &[Operation] {
        &self.ops
    }

    /// Faces referenced by the operations; each needs a `/Font` resource.
    pub fn faces(&self) -> &BTreeSet<StandardFace> {
        &self.faces
    }

    pub fn drawn_objects(&self) -> usize {
        self.drawn
    }

    pub fn into_operations(self) -> Vec<Operation> {
        self.ops
    }

    fn push_block(&mut self, b: &TextBlock, media_h: f64, opts: TextLayerOptions) {
        let ops = &mut self.ops;
        ops.push(Operation::new("q", vec![]));

        if b.angle != 0.0 && b.angle.is_finite() {
            let (px, py) = b.pivot;
            let top_down = Affine::translate((px, py))
                * Affine::rotate(b.angle.to_radians())
                * Affine::translate((-px, -py));
            let flip = Affine::new([1.0, 0.0, 0.0, -1.0, 0.0, media_h]);
            let m = (flip * top_down * flip).as_coeffs();
            ops.push(Operation::new("cm", m.iter().copied().map(num).collect()));
        }

        if let Some(bg) = b.background {
            ops.push(Operation::new("rg", rgb(bg)));
            ops.push(Operation::new(
                "re",
                vec![
                    num(b.box_x),
                    num(media_h - b.box_y - b.box_height),
                    num(b.box_width),
                    num(b.box_height),
                ],
            ));
            ops.push(Operation::new("f", vec![]));
        }

        ops.push(Operation::new("BT", vec![]));
        ops.push(Operation::new(
            "Tf",
            vec![Object::Name(b.face.resource_name().into()), num(b.font_size)],
        ));
        if b.char_spacing != 0.0 {
            ops.push(Operation::new("Tc", vec![num(b.char_spacing)]));
        }
        ops.push(Operation::new("rg", rgb(b.fill)));
        for line in b.lines.iter().filter(|l| !l.bytes.is_empty()) {
            ops.push(Operation::new(
                "Tm",
                vec![
                    num(1.0),
                    num(0.0),
                    num(0.0),
                    num(1.0),
                    num(line.x),
                    num(media_h - line.baseline),
                ],
            ));
            ops.push(Operation::new(
                "Tj",
                vec![Object::String(line.bytes.clone(), StringFormat::Literal)],
            ));
        }
        ops.push(Operation::new("ET", vec![]));

        if opts.draw_decorations && (b.underline || b.overline || b.linethrough) {
            push_decorations(ops, b, media_h);
        }

        ops.push(Operation::new("Q", vec![]));
    }
}

/// Decoration lines at the offsets the raster preview uses (design px, scaled).
fn push_decorations(ops: &mut Vec<Operation>, b: &TextBlock, media_h: f64) {
    let width = (b.design_font_size / 20.0).max(1.0) * b.unit;
    ops.push(Operation::new("w", vec![num(width)]));
    ops.push(Operation::new("RG", rgb(b.fill)));

    for line in b.lines.iter().filter(|l| l.width > 0.0) {
        let mut ys = Vec::with_capacity(3);
        if b.underline {
            ys.push(line.top + b.font_size + 2.0 * b.unit);
        }
        if b.overline {
            ys.push(line.top - 2.0 * b.unit);
        }
        if b.linethrough {
            ys.push(line.top + b.font_size / 2.0);
        }
        for y in ys {
            ops.push(Operation::new("m", vec![num(line.x), num(media_h - y)]));
            ops.push(Operation::new(
                "l",
                vec![num(line.x + line.width), num(media_h - y)],
            ));
        }
    }
    ops.push(Operation::new("S", vec![]));
}

pub(crate) fn num(v: f64) -> Object {
    Object::Real(v as f32)
}

pub(crate) fn rgb(c: Rgba8Premul) -> Vec<Object> {
    c.to_unit_rgb().iter().map(|&v| Object::Real(v)).collect()
}

#[cfg(test)]
#[path = "../../tests/unit/pdf/text.rs"]
mod tests;
