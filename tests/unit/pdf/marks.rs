use super::*;

fn geometry() -> PageGeometry {
    PageGeometry {
        doc_width: 100.0,
        doc_height: 100.0,
        page_width_pts: 200.0,
        page_height_pts: 100.0,
        bleed_pts: 8.0,
        margin_pts: 0.0,
        scale: 1.0,
        render_width: 100.0,
        render_height: 100.0,
        offset_x: 0.0,
        offset_y: 0.0,
        pixel_width: 100,
        pixel_height: 100,
        final_scale: 1.0,
    }
}

#[test]
fn marks_sit_outside_each_trim_corner() {
    let segs = crop_mark_segments(&geometry());
    let p = Point::new;
    assert_eq!(segs[0], (p(3.0, 8.0), p(-7.0, 8.0)));
    assert_eq!(segs[1], (p(8.0, 3.0), p(8.0, -7.0)));
    assert_eq!(segs[2], (p(213.0, 8.0), p(223.0, 8.0)));
    assert_eq!(segs[3], (p(208.0, 3.0), p(208.0, -7.0)));
    assert_eq!(segs[4], (p(3.0, 108.0), p(-7.0, 108.0)));
    assert_eq!(segs[5], (p(8.0, 113.0), p(8.0, 123.0)));
    assert_eq!(segs[6], (p(213.0, 108.0), p(223.0, 108.0)));
    assert_eq!(segs[7], (p(208.0, 113.0), p(208.0, 123.0)));

    for (a, b) in segs {
        assert!(((a - b).hypot() - CROP_MARK_LENGTH).abs() < 1e-9);
    }
}

#[test]
fn operations_flip_into_pdf_space() {
    let ops = crop_mark_operations(&geometry());
    let moves: Vec<_> = ops.iter().filter(|o| o.operator == "m").collect();
    let lines: Vec<_> = ops.iter().filter(|o| o.operator == "l").collect();
    assert_eq!((moves.len(), lines.len()), (8, 8));
    // Media height is 100 + 2*8; the top-left horizontal mark is at y = 116 - 8.
    assert_eq!(moves[0].operands, vec![num(3.0), num(108.0)]);
    assert_eq!(ops.iter().filter(|o| o.operator == "S").count(), 1);
    assert_eq!(ops[1].operands, vec![num(0.25)]);
}
