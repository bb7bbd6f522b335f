use super::*;

#[test]
fn parses_hex_forms() {
    assert_eq!(
        ColorDef::parse("#ff0000").unwrap(),
        ColorDef::rgba(1.0, 0.0, 0.0, 1.0)
    );
    assert_eq!(
        ColorDef::parse("#0f0").unwrap(),
        ColorDef::rgba(0.0, 1.0, 0.0, 1.0)
    );

    let c = ColorDef::parse("#0000ff80").unwrap();
    assert!((c.b - 1.0).abs() < 1e-9);
    assert!((c.a - (128.0 / 255.0)).abs() < 1e-9);

    assert!(ColorDef::parse("#12345").is_err());
    assert!(ColorDef::parse("#gg0000").is_err());
}

#[test]
fn parses_rgb_functions() {
    let c = ColorDef::parse("rgb(255, 0, 0)").unwrap();
    assert_eq!(c.to_rgba8_premul(), Rgba8Premul::from_straight_rgba(255, 0, 0, 255));

    let c = ColorDef::parse("rgba(0,0,0,0.5)").unwrap();
    assert!((c.a - 0.5).abs() < 1e-9);

    let c = ColorDef::parse("rgb(100% 0% 0% / 25%)").unwrap();
    assert!((c.r - 1.0).abs() < 1e-9);
    assert!((c.a - 0.25).abs() < 1e-9);

    assert!(ColorDef::parse("rgb(1, 2)").is_err());
}

#[test]
fn parses_hsl_red() {
    let c = ColorDef::parse("hsl(0, 100%, 50%)").unwrap();
    assert!((c.r - 1.0).abs() < 1e-9);
    assert!(c.g.abs() < 1e-9);
    assert!(c.b.abs() < 1e-9);
}

#[test]
fn parses_named_and_transparent() {
    assert_eq!(
        ColorDef::parse("Red").unwrap().to_rgba8_premul(),
        Rgba8Premul::from_straight_rgba(255, 0, 0, 255)
    );
    assert!(ColorDef::parse("transparent").unwrap().is_transparent());
    assert!(ColorDef::parse("notacolor").is_err());
}

#[test]
fn lenient_paint_ignores_gradients() {
    #[derive(serde::Deserialize)]
    struct Holder {
        #[serde(default, deserialize_with = "deserialize_paint")]
        fill: Option<ColorDef>,
    }

    let h: Holder = serde_json::from_str(r##"{"fill":"#00ff00"}"##).unwrap();
    assert_eq!(h.fill, Some(ColorDef::rgba(0.0, 1.0, 0.0, 1.0)));

    let h: Holder =
        serde_json::from_str(r#"{"fill":{"type":"linear","colorStops":[]}}"#).unwrap();
    assert_eq!(h.fill, None);

    let h: Holder = serde_json::from_str(r#"{"fill":null}"#).unwrap();
    assert_eq!(h.fill, None);

    let h: Holder = serde_json::from_str(r#"{}"#).unwrap();
    assert_eq!(h.fill, None);
}
