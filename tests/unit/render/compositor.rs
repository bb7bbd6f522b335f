use super::*;
use crate::foundation::core::Rect;

fn geometry(w: u32, h: u32, final_scale: f64) -> PageGeometry {
    PageGeometry {
        doc_width: f64::from(w) / final_scale,
        doc_height: f64::from(h) / final_scale,
        page_width_pts: 0.0,
        page_height_pts: 0.0,
        bleed_pts: 0.0,
        margin_pts: 0.0,
        scale: 1.0,
        render_width: 0.0,
        render_height: 0.0,
        offset_x: 0.0,
        offset_y: 0.0,
        pixel_width: w,
        pixel_height: h,
        final_scale,
    }
}

fn render(json: serde_json::Value) -> RasterImage {
    render_with(json, &ResolvedImages::default())
}

fn render_with(json: serde_json::Value, images: &ResolvedImages) -> RasterImage {
    let doc = SceneDocument::from_json_value(json).unwrap();
    let order = doc.paint_order();
    let g = geometry(100, 100, 1.0);
    Compositor::new(&g, images, None)
        .composite(&doc, &order)
        .unwrap()
}

fn px(img: &RasterImage, x: u32, y: u32) -> [u8; 3] {
    let i = ((y * img.width + x) * 3) as usize;
    [img.rgb8[i], img.rgb8[i + 1], img.rgb8[i + 2]]
}

fn max_diff(a: &RasterImage, b: &RasterImage) -> u8 {
    a.rgb8
        .iter()
        .zip(&b.rgb8)
        .map(|(x, y)| x.abs_diff(*y))
        .max()
        .unwrap_or(0)
}

const RED: [u8; 3] = [255, 0, 0];
const BLUE: [u8; 3] = [0, 0, 255];
const WHITE: [u8; 3] = [255, 255, 255];

#[test]
fn background_defaults_to_white_and_honors_color() {
    let img = render(serde_json::json!({"objects": []}));
    assert_eq!((img.width, img.height), (100, 100));
    assert_eq!(img.rgb8.len(), 100 * 100 * 3);
    assert!(img.rgb8.iter().all(|&c| c == 255));

    let img = render(serde_json::json!({"background": "#336699", "objects": []}));
    assert_eq!(px(&img, 0, 0), [0x33, 0x66, 0x99]);
    assert_eq!(px(&img, 99, 99), [0x33, 0x66, 0x99]);
}

#[test]
fn later_objects_paint_over_earlier_ones() {
    let a = serde_json::json!({"type": "Rect", "left": 0, "top": 0, "width": 60, "height": 60, "fill": "red"});
    let b = serde_json::json!({"type": "Rect", "left": 40, "top": 40, "width": 60, "height": 60, "fill": "blue"});

    let img = render(serde_json::json!({"objects": [a.clone(), b.clone()]}));
    assert_eq!(px(&img, 50, 50), BLUE);
    assert_eq!(px(&img, 10, 10), RED);
    assert_eq!(px(&img, 90, 90), BLUE);
    assert_eq!(px(&img, 90, 10), WHITE);

    let img = render(serde_json::json!({"objects": [b, a]}));
    assert_eq!(px(&img, 50, 50), RED);
}

#[test]
fn z_index_reorders_stably() {
    let a = serde_json::json!({"type": "Rect", "width": 60, "height": 60, "fill": "red", "zIndex": 1});
    let b = serde_json::json!({"type": "Rect", "left": 40, "top": 40, "width": 60, "height": 60, "fill": "blue"});
    let img = render(serde_json::json!({"objects": [a, b]}));
    assert_eq!(px(&img, 50, 50), RED);
}

#[test]
fn hidden_objects_have_no_effect() {
    let base = serde_json::json!({"type": "Rect", "left": 10, "top": 10, "width": 50, "height": 50, "fill": "red"});
    let hidden = serde_json::json!({"type": "Rect", "width": 100, "height": 100, "fill": "blue", "visible": false});

    let with = render(serde_json::json!({"objects": [base.clone(), hidden]}));
    let without = render(serde_json::json!({"objects": [base]}));
    assert_eq!(with, without);
}

#[test]
fn text_is_never_rasterized() {
    let img = render(serde_json::json!({"objects": [
        {"type": "Text", "text": "Hello", "fontSize": 80, "fill": "black", "textBackgroundColor": "red",
         "width": 100, "height": 100}
    ]}));
    assert!(img.rgb8.iter().all(|&c| c == 255));
}

#[test]
fn rotating_a_square_by_90_keeps_its_footprint() {
    let square = |angle: f64| {
        render(serde_json::json!({"objects": [
            {"type": "Rect", "left": 20, "top": 30, "width": 40, "height": 40, "fill": "red", "angle": angle}
        ]}))
    };
    let upright = square(0.0);
    let rotated = square(90.0);
    assert!(max_diff(&upright, &rotated) <= 2);
    assert_eq!(px(&rotated, 40, 50), RED);
    assert_eq!(px(&rotated, 10, 10), WHITE);
}

#[test]
fn rotation_moves_non_square_shapes_about_their_center() {
    let img = render(serde_json::json!({"objects": [
        {"type": "Rect", "left": 10, "top": 40, "width": 80, "height": 20, "fill": "red", "angle": 90}
    ]}));
    // An 80x20 bar centered at (50, 50) becomes a 20x80 bar.
    assert_eq!(px(&img, 50, 15), RED);
    assert_eq!(px(&img, 50, 85), RED);
    assert_eq!(px(&img, 15, 50), WHITE);
}

#[test]
fn opacity_blends_with_what_is_below() {
    let img = render(serde_json::json!({"objects": [
        {"type": "Rect", "width": 100, "height": 100, "fill": "red", "opacity": 0.5}
    ]}));
    let [r, g, b] = px(&img, 50, 50);
    assert_eq!(r, 255);
    assert!((i32::from(g) - 128).abs() <= 2, "{g}");
    assert!((i32::from(b) - 128).abs() <= 2, "{b}");

    let img = render(serde_json::json!({"objects": [
        {"type": "Rect", "width": 100, "height": 100, "fill": "red", "opacity": 0}
    ]}));
    assert!(img.rgb8.iter().all(|&c| c == 255));
}

#[test]
fn stroke_outlines_without_fill() {
    let img = render(serde_json::json!({"objects": [
        {"type": "Rect", "left": 20, "top": 20, "width": 60, "height": 60, "fill": "transparent",
         "stroke": "#000000", "strokeWidth": 6}
    ]}));
    assert_eq!(px(&img, 20, 50), [0, 0, 0]);
    assert_eq!(px(&img, 50, 50), WHITE);
    assert_eq!(px(&img, 10, 50), WHITE);
}

#[test]
fn circles_fill_their_disc_only() {
    let img = render(serde_json::json!({"objects": [
        {"type": "Circle", "left": 0, "top": 0, "radius": 50, "fill": "blue"}
    ]}));
    assert_eq!(px(&img, 50, 50), BLUE);
    assert_eq!(px(&img, 2, 2), WHITE);
    assert_eq!(px(&img, 97, 97), WHITE);

    let img = render(serde_json::json!({"objects": [
        {"type": "Circle", "left": 0, "top": 0, "radius": 50}
    ]}));
    assert!(img.rgb8.iter().all(|&c| c == 255));
}

#[test]
fn global_scale_maps_design_pixels_to_raster_pixels() {
    let doc = SceneDocument::from_json_value(serde_json::json!({"objects": [
        {"type": "Rect", "left": 10, "top": 10, "width": 10, "height": 10, "fill": "red"}
    ]}))
    .unwrap();
    let order = doc.paint_order();
    let g = geometry(100, 100, 2.0);
    let img = Compositor::new(&g, &ResolvedImages::default(), None)
        .composite(&doc, &order)
        .unwrap();
    assert_eq!(px(&img, 25, 25), RED);
    assert_eq!(px(&img, 39, 39), RED);
    assert_eq!(px(&img, 45, 45), WHITE);
}

fn two_px_image() -> PreparedImage {
    PreparedImage {
        width: 2,
        height: 1,
        rgba8_premul: Arc::new(vec![255, 0, 0, 255, 0, 0, 255, 255]),
    }
}

fn ready_in(image: PreparedImage, dest: Rect) -> ResolvedImages {
    let mut r = ResolvedImages::default();
    r.insert_for_test(0, ImageOutcome::Ready { image, dest });
    r
}

fn ready_at_zero(image: PreparedImage, w: f64, h: f64) -> ResolvedImages {
    ready_in(image, Rect::new(0.0, 0.0, w, h))
}

#[test]
fn ready_images_stretch_to_their_draw_size() {
    let images = ready_at_zero(two_px_image(), 80.0, 40.0);
    let img = render_with(
        serde_json::json!({"objects": [{"type": "Image", "src": "x", "left": 10, "top": 10}]}),
        &images,
    );
    assert_eq!(px(&img, 15, 30), RED);
    assert_eq!(px(&img, 85, 30), BLUE);
    assert_eq!(px(&img, 50, 70), WHITE);
}

#[test]
fn clipped_crops_leave_the_rest_of_the_box_to_the_background() {
    // A crop that ran off the image edge covers only the left quarter of its box.
    let images = ready_in(two_px_image(), Rect::new(0.0, 0.0, 20.0, 40.0));
    let img = render_with(
        serde_json::json!({"objects": [
            {"type": "Image", "src": "x", "left": 10, "top": 10, "width": 80, "height": 40, "cropX": 8}
        ]}),
        &images,
    );
    assert_eq!(px(&img, 12, 30), RED);
    assert_eq!(px(&img, 27, 30), BLUE);
    assert_eq!(px(&img, 45, 30), WHITE);
    assert_eq!(px(&img, 85, 30), WHITE);
}

#[test]
fn flipped_images_mirror_in_place() {
    let images = ready_at_zero(two_px_image(), 80.0, 40.0);
    let img = render_with(
        serde_json::json!({"objects": [
            {"type": "Image", "src": "x", "left": 10, "top": 10, "width": 80, "height": 40, "flipX": true}
        ]}),
        &images,
    );
    assert_eq!(px(&img, 15, 30), BLUE);
    assert_eq!(px(&img, 85, 30), RED);
}

#[test]
fn failed_images_draw_a_placeholder_box() {
    let mut images = ResolvedImages::default();
    images.insert_for_test(0, ImageOutcome::Failed("http status 404".into()));
    let img = render_with(
        serde_json::json!({"objects": [{"type": "Image", "src": "x", "left": 0, "top": 0}]}),
        &images,
    );
    assert_eq!(px(&img, 5, 5), [0xf0, 0xf0, 0xf0]);
    assert_eq!(px(&img, 95, 95), [0xf0, 0xf0, 0xf0]);

    let img = render_with(
        serde_json::json!({"objects": [
            {"type": "Image", "src": "x", "left": 0, "top": 0, "width": 20, "height": 20, "scaleX": 2}
        ]}),
        &images,
    );
    assert_eq!(px(&img, 35, 15), [0xf0, 0xf0, 0xf0]);
    assert_eq!(px(&img, 45, 15), WHITE);
    assert_eq!(px(&img, 35, 25), WHITE);
}

#[test]
fn placeholder_label_is_drawn_when_fonts_exist() {
    let mut db = usvg::fontdb::Database::new();
    db.load_system_fonts();
    let label = PlaceholderLabel::new(Arc::new(db)).unwrap();

    let mut images = ResolvedImages::default();
    images.insert_for_test(0, ImageOutcome::Failed("boom".into()));
    let doc = SceneDocument::from_json_value(serde_json::json!({"objects": [
        {"type": "Image", "src": "x", "left": 0, "top": 0, "width": 100, "height": 100}
    ]}))
    .unwrap();
    let order = doc.paint_order();
    let g = geometry(100, 100, 1.0);
    let img = Compositor::new(&g, &images, Some(&label))
        .composite(&doc, &order)
        .unwrap();

    // Corners stay box-colored whether or not a font shaped the label.
    assert_eq!(px(&img, 2, 2), [0xf0, 0xf0, 0xf0]);
    assert_eq!(px(&img, 97, 97), [0xf0, 0xf0, 0xf0]);
    // Nothing darker than the label grey is ever painted.
    assert!(img.rgb8.iter().all(|&c| c >= 0x99 - 2));
}

#[test]
fn compositing_is_deterministic() {
    let scene = serde_json::json!({"background": "#eeeeee", "objects": [
        {"type": "Rect", "left": 3.3, "top": 7.7, "width": 50.5, "height": 20, "fill": "rgba(10,200,30,0.7)", "angle": 17},
        {"type": "Circle", "left": 40, "top": 40, "radius": 25, "fill": "#123456", "stroke": "red", "strokeWidth": 3, "flipY": true}
    ]});
    assert_eq!(render(scene.clone()), render(scene));
}

#[test]
fn oversized_surfaces_are_rejected() {
    let doc = SceneDocument::default();
    let g = geometry(70_000, 10, 1.0);
    let err = Compositor::new(&g, &ResolvedImages::default(), None)
        .composite(&doc, &[])
        .unwrap_err();
    assert!(err.is_caller_error());
}

#[test]
fn flatten_composites_premultiplied_over_white() {
    assert_eq!(
        flatten_over_white(&[0, 0, 0, 0, 128, 0, 0, 128, 10, 20, 30, 255]),
        vec![255, 255, 255, 255, 127, 127, 10, 20, 30]
    );
}
