use super::*;
use crate::scene::model::SceneDocument;

fn geometry() -> PageGeometry {
    PageGeometry {
        doc_width: 800.0,
        doc_height: 600.0,
        page_width_pts: 400.0,
        page_height_pts: 300.0,
        bleed_pts: 0.0,
        margin_pts: 0.0,
        scale: 0.5,
        render_width: 400.0,
        render_height: 300.0,
        offset_x: 10.0,
        offset_y: 20.0,
        pixel_width: 400,
        pixel_height: 300,
        final_scale: 0.5,
    }
}

fn text(json: serde_json::Value) -> TextObject {
    let doc = SceneDocument::from_json_value(serde_json::json!({ "objects": [json] })).unwrap();
    match doc.objects.into_iter().next() {
        Some(SceneObject::Text(t)) => t,
        other => panic!("expected text, got {other:?}"),
    }
}

fn ops_named<'a>(ops: &'a [Operation], name: &str) -> Vec<&'a Operation> {
    ops.iter().filter(|o| o.operator == name).collect()
}

fn real(o: &Object) -> f64 {
    match o {
        Object::Real(v) => f64::from(*v),
        Object::Integer(i) => *i as f64,
        other => panic!("not a number: {other:?}"),
    }
}

#[test]
fn lines_are_spaced_by_scaled_line_height() {
    let block = layout_text(
        &text(serde_json::json!({"type": "Text", "text": "Hello\nWorld", "fontSize": 24})),
        &geometry(),
    );
    assert_eq!(block.lines.len(), 2);
    assert_eq!(block.font_size, 12.0);
    let gap = block.lines[1].top - block.lines[0].top;
    assert!((gap - 24.0 * 1.16 * 0.5).abs() < 1e-9);
    assert_eq!(block.lines[0].top, 20.0);
    assert_eq!(block.lines[0].x, 10.0);
    assert!((block.lines[0].baseline - (20.0 + 12.0 * 0.718)).abs() < 1e-9);
}

#[test]
fn centered_lines_are_symmetric_about_the_box_center() {
    let g = geometry();
    let block = layout_text(
        &text(serde_json::json!({
            "type": "IText", "text": "Hi\nwide line here", "left": 100, "width": 300, "textAlign": "center"
        })),
        &g,
    );
    let center = g.offset_x + (100.0 + 300.0 / 2.0) * g.scale;
    for line in &block.lines {
        assert!((line.x + line.width / 2.0 - center).abs() < 1e-9);
    }
}

#[test]
fn right_alignment_ends_at_the_box_edge() {
    let g = geometry();
    let block = layout_text(
        &text(serde_json::json!({"type": "Text", "text": "abc", "width": 200, "textAlign": "right", "charSpacing": 100})),
        &g,
    );
    let line = &block.lines[0];
    assert!((line.x + line.width - (g.offset_x + 100.0)).abs() < 1e-9);
    // charSpacing is in 1/1000 em.
    assert!((block.char_spacing - 0.8).abs() < 1e-9);
}

#[test]
fn layer_emits_text_operators_in_pdf_space() {
    let doc = SceneDocument::from_json_value(serde_json::json!({"objects": [
        {"type": "Rect", "width": 10, "height": 10},
        {"type": "Text", "text": "Hello", "fontSize": 20, "fill": "#ff0000", "fontFamily": "Times New Roman", "fontWeight": "bold"},
        {"type": "Text", "text": "hidden", "visible": false},
        {"type": "Text", "text": "clear", "opacity": 0}
    ]}))
    .unwrap();
    let order = doc.paint_order();
    let g = geometry();
    let layer = TextLayer::build(&order, &g, TextLayerOptions::default());

    assert_eq!(layer.drawn_objects(), 1);
    assert_eq!(layer.faces().iter().copied().collect::<Vec<_>>(), vec![StandardFace::TimesBold]);

    let ops = layer.operations();
    let tf = ops_named(ops, "Tf");
    assert_eq!(tf.len(), 1);
    assert_eq!(tf[0].operands[0], Object::Name(b"F4".to_vec()));
    assert!((real(&tf[0].operands[1]) - 10.0).abs() < 1e-6);

    let rg = ops_named(ops, "rg");
    assert_eq!(rg[0].operands.iter().map(real).collect::<Vec<_>>(), vec![1.0, 0.0, 0.0]);

    let tm = ops_named(ops, "Tm");
    assert_eq!(tm.len(), 1);
    let baseline_td = 20.0 + 10.0 * 0.683;
    assert!((real(&tm[0].operands[5]) - (300.0 - baseline_td)).abs() < 1e-4);

    let tj = ops_named(ops, "Tj");
    assert_eq!(tj[0].operands[0], Object::String(b"Hello".to_vec(), StringFormat::Literal));
    assert!(ops_named(ops, "S").is_empty());
    assert!(ops_named(ops, "cm").is_empty());
    assert_eq!(ops.first().map(|o| o.operator.as_str()), Some("q"));
    assert_eq!(ops.last().map(|o| o.operator.as_str()), Some("Q"));
}

#[test]
fn italic_text_uses_the_slanted_face() {
    let doc = SceneDocument::from_json_value(serde_json::json!({"objects": [
        {"type": "Text", "text": "a", "fontStyle": "italic", "fontFamily": "serif"},
        {"type": "Text", "text": "b", "fontStyle": "Oblique", "fontWeight": 700},
        {"type": "Text", "text": "c", "fontStyle": "normal", "fontFamily": "monospace"}
    ]}))
    .unwrap();
    let order = doc.paint_order();
    let layer = TextLayer::build(&order, &geometry(), TextLayerOptions::default());

    let faces: Vec<_> = layer.faces().iter().copied().collect();
    assert_eq!(
        faces,
        vec![
            StandardFace::Courier,
            StandardFace::HelveticaBoldOblique,
            StandardFace::TimesItalic
        ]
    );
}

#[test]
fn background_is_painted_before_glyphs() {
    let doc = SceneDocument::from_json_value(serde_json::json!({"objects": [
        {"type": "Textbox", "text": "x", "left": 20, "top": 40, "width": 100, "height": 60, "textBackgroundColor": "yellow"}
    ]}))
    .unwrap();
    let order = doc.paint_order();
    let layer = TextLayer::build(&order, &geometry(), TextLayerOptions::default());
    let ops = layer.operations();

    let re_at = ops.iter().position(|o| o.operator == "re").unwrap();
    let bt_at = ops.iter().position(|o| o.operator == "BT").unwrap();
    assert!(re_at < bt_at);
    let re: Vec<f64> = ops[re_at].operands.iter().map(real).collect();
    // x = 10 + 20*0.5, top = 20 + 40*0.5, box 50x30, flipped: 300 - 40 - 30.
    assert_eq!(re, vec![20.0, 230.0, 50.0, 30.0]);
}

#[test]
fn decorations_only_when_enabled() {
    let doc = SceneDocument::from_json_value(serde_json::json!({"objects": [
        {"type": "Text", "text": "under", "underline": true, "linethrough": true}
    ]}))
    .unwrap();
    let order = doc.paint_order();
    let g = geometry();

    let off = TextLayer::build(&order, &g, TextLayerOptions::default());
    assert!(ops_named(off.operations(), "S").is_empty());

    let on = TextLayer::build(&order, &g, TextLayerOptions { draw_decorations: true });
    let ops = on.operations();
    assert_eq!(ops_named(ops, "S").len(), 1);
    assert_eq!(ops_named(ops, "m").len(), 2);
    let w = ops_named(ops, "w");
    assert!((real(&w[0].operands[0]) - 0.5).abs() < 1e-6);
    // Underline sits at top + fontSize + 2 (design px) scaled: 20 + 8 + 1.
    let m = ops_named(ops, "m");
    assert!((real(&m[0].operands[1]) - (300.0 - 29.0)).abs() < 1e-4);
}

#[test]
fn rotated_text_gets_a_pivoted_matrix() {
    let doc = SceneDocument::from_json_value(serde_json::json!({"objects": [
        {"type": "Text", "text": "spin", "width": 100, "height": 40, "angle": 90}
    ]}))
    .unwrap();
    let order = doc.paint_order();
    let g = geometry();
    let layer = TextLayer::build(&order, &g, TextLayerOptions::default());
    let cm = ops_named(layer.operations(), "cm");
    assert_eq!(cm.len(), 1);

    let c: Vec<f64> = cm[0].operands.iter().map(real).collect();
    let m = Affine::new([c[0], c[1], c[2], c[3], c[4], c[5]]);
    // Pivot (10 + 25, 20 + 10) top-down is (35, 270) in PDF space and stays fixed.
    let p = m * crate::foundation::core::Point::new(35.0, 270.0);
    assert!((p.x - 35.0).abs() < 1e-4 && (p.y - 270.0).abs() < 1e-4);
    // Clockwise on screen is clockwise in PDF space too after the flip.
    assert!(c[1] < -0.99);
}

#[test]
fn unmappable_characters_are_replaced() {
    let block = layout_text(&text(serde_json::json!({"type": "Text", "text": "Ω ok"})), &geometry());
    assert_eq!(block.lines[0].bytes, b"? ok".to_vec());
}
