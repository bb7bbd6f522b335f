use lopdf::content::Operation;

use crate::{foundation::core::Point, geometry::page::PageGeometry, pdf::text::num};

pub const CROP_MARK_LINE_WIDTH: f64 = 0.25;
pub const CROP_MARK_LENGTH: f64 = 10.0;
pub const CROP_MARK_OFFSET: f64 = 5.0;

/// The eight crop-mark strokes in top-down media coordinates.
///
/// Each corner of the trim box gets a horizontal and a vertical mark that start
/// `CROP_MARK_OFFSET` outside the corner and run `CROP_MARK_LENGTH` outward.
pub fn crop_mark_segments(g: &PageGeometry) -> [(Point, Point); 8] {
    let (w, h, b) = (g.page_width_pts, g.page_height_pts, g.bleed_pts);
    let (o, l) = (CROP_MARK_OFFSET, CROP_MARK_LENGTH);
    let p = Point::new;
    [
        // top-left
        (p(b - o, b), p(b - o - l, b)),
        (p(b, b - o), p(b, b - o - l)),
        // top-right
        (p(w + b + o, b), p(w + b + o + l, b)),
        (p(w + b, b - o), p(w + b, b - o - l)),
        // bottom-left
        (p(b - o, h + b), p(b - o - l, h + b)),
        (p(b, h + b + o), p(b, h + b + o + l)),
        // bottom-right
        (p(w + b + o, h + b), p(w + b + o + l, h + b)),
        (p(w + b, h + b + o), p(w + b, h + b + o + l)),
    ]
}

/// Stroke the crop marks in black, flipped into PDF's bottom-up space.
pub fn crop_mark_operations(g: &PageGeometry) -> Vec<Operation> {
    let (_, media_h) = g.media_size();
    let mut ops = vec![
        Operation::new("q", vec![]),
        Operation::new("w", vec![num(CROP_MARK_LINE_WIDTH)]),
        Operation::new("G", vec![num(0.0)]),
    ];
    for (a, b) in crop_mark_segments(g) {
        ops.push(Operation::new("m", vec![num(a.x), num(media_h - a.y)]));
        ops.push(Operation::new("l", vec![num(b.x), num(media_h - b.y)]));
    }
    ops.push(Operation::new("S", vec![]));
    ops.push(Operation::new("Q", vec![]));
    ops
}

#[cfg(test)]
#[path = "../../tests/unit/pdf/marks.rs"]
mod tests;
