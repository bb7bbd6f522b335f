use std::{
    io::Cursor,
    sync::atomic::{AtomicUsize, Ordering},
    time::Duration,
};

use async_trait::async_trait;

use super::*;
use crate::{
    foundation::{
        core::Rect,
        error::{PrintError, PrintResult},
    },
    scene::model::SceneDocument,
};

fn png(w: u32, h: u32, px: [u8; 4]) -> Vec<u8> {
    let img = image::RgbaImage::from_fn(w, h, |x, _| {
        let mut p = px;
        p[1] = x as u8;
        image::Rgba(p)
    });
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

#[derive(Default)]
struct MapFetcher {
    items: HashMap<String, Vec<u8>>,
    calls: AtomicUsize,
}

#[async_trait]
impl ImageFetcher for MapFetcher {
    async fn fetch(&self, url: &str) -> PrintResult<Vec<u8>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if url.contains("slow") {
            tokio::time::sleep(Duration::from_secs(5)).await;
        }
        self.items
            .get(url)
            .cloned()
            .ok_or_else(|| PrintError::asset("http status 404 Not Found"))
    }
}

fn store(fetcher: Arc<MapFetcher>) -> ImageStore {
    let opts = FetchOptions {
        timeout: Duration::from_millis(50),
        ..FetchOptions::default()
    };
    ImageStore::new(fetcher, opts)
}

fn fontdb() -> Arc<usvg::fontdb::Database> {
    Arc::new(usvg::fontdb::Database::new())
}

#[tokio::test]
async fn resolves_ready_and_failed_per_object() {
    let mut fetcher = MapFetcher::default();
    fetcher
        .items
        .insert("https://cdn.test/ok.png".into(), png(8, 4, [255, 0, 0, 255]));
    fetcher.items.insert("https://cdn.test/bad.png".into(), b"nope".to_vec());
    let fetcher = Arc::new(fetcher);

    let doc = SceneDocument::from_json_str(
        r#"{"objects": [
            {"type": "Image", "src": "https://cdn.test/ok.png", "scaleX": 2},
            {"type": "Rect"},
            {"type": "Image", "src": "https://cdn.test/missing.png"},
            {"type": "Image", "src": "https://cdn.test/bad.png"},
            {"type": "Image", "src": "https://cdn.test/ok.png", "visible": false},
            {"type": "Image"}
        ]}"#,
    )
    .unwrap();
    let order = doc.paint_order();

    let resolved = store(Arc::clone(&fetcher)).resolve(&order, &fontdb()).await;
    assert_eq!(resolved.len(), 3);
    assert_eq!(resolved.failed_count(), 2);

    match resolved.get(0).unwrap() {
        ImageOutcome::Ready { image, dest } => {
            assert_eq!((image.width, image.height), (8, 4));
            assert_eq!(*dest, Rect::new(0.0, 0.0, 16.0, 4.0));
        }
        other => panic!("expected ready, got {other:?}"),
    }
    assert!(resolved.get(1).is_none());
    assert!(matches!(resolved.get(2), Some(ImageOutcome::Failed(_))));
    assert!(matches!(resolved.get(3), Some(ImageOutcome::Failed(_))));
    assert!(resolved.get(4).is_none());
    assert!(resolved.get(5).is_none());

    // ok.png, missing.png and bad.png; the hidden duplicate is never fetched twice.
    assert_eq!(fetcher.calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn timeouts_degrade_to_failed() {
    let mut fetcher = MapFetcher::default();
    fetcher
        .items
        .insert("https://cdn.test/slow.png".into(), png(2, 2, [0, 0, 255, 255]));
    let fetcher = Arc::new(fetcher);

    let doc = SceneDocument::from_json_str(
        r#"{"objects": [{"type": "Image", "src": "https://cdn.test/slow.png"}]}"#,
    )
    .unwrap();
    let order = doc.paint_order();

    let resolved = store(fetcher).resolve(&order, &fontdb()).await;
    match resolved.get(0).unwrap() {
        ImageOutcome::Failed(reason) => assert!(reason.contains("timed out"), "{reason}"),
        other => panic!("expected failure, got {other:?}"),
    }
}

#[tokio::test]
async fn data_urls_skip_the_fetcher() {
    use base64::Engine as _;
    let b64 = base64::engine::general_purpose::STANDARD.encode(png(3, 3, [0, 0, 0, 255]));
    let doc = SceneDocument::from_json_value(serde_json::json!({
        "objects": [{"type": "Image", "src": format!("data:image/png;base64,{b64}")}]
    }))
    .unwrap();
    let order = doc.paint_order();

    let fetcher = Arc::new(MapFetcher::default());
    let resolved = store(Arc::clone(&fetcher)).resolve(&order, &fontdb()).await;
    assert!(matches!(resolved.get(0), Some(ImageOutcome::Ready { .. })));
    assert_eq!(fetcher.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn crop_uses_object_size_as_source_rect() {
    let mut fetcher = MapFetcher::default();
    fetcher
        .items
        .insert("https://cdn.test/strip.png".into(), png(10, 2, [9, 0, 9, 255]));
    let fetcher = Arc::new(fetcher);

    let doc = SceneDocument::from_json_str(
        r#"{"objects": [{"type": "Image", "src": "https://cdn.test/strip.png",
            "cropX": 4, "width": 3, "height": 2, "scaleX": 10, "scaleY": 10,
            "filters": [{"type": "Invert"}]}]}"#,
    )
    .unwrap();
    let order = doc.paint_order();
    let resolved = store(fetcher).resolve(&order, &fontdb()).await;

    let Some(ImageOutcome::Ready { image, dest }) = resolved.get(0) else {
        panic!("expected ready");
    };
    assert_eq!((image.width, image.height), (3, 2));
    assert_eq!(*dest, Rect::new(0.0, 0.0, 30.0, 20.0));
    // Green channel encodes the source column; inverted after filtering.
    assert_eq!(image.rgba8_premul[1], 255 - 4);
    assert_eq!(image.rgba8_premul[0], 255 - 9);
}

#[tokio::test]
async fn crops_past_the_edge_shrink_the_destination() {
    let mut fetcher = MapFetcher::default();
    fetcher
        .items
        .insert("https://cdn.test/strip.png".into(), png(10, 2, [9, 0, 9, 255]));
    let fetcher = Arc::new(fetcher);

    let doc = SceneDocument::from_json_str(
        r#"{"objects": [{"type": "Image", "src": "https://cdn.test/strip.png",
            "cropX": 8, "width": 10, "height": 2, "scaleX": 4, "scaleY": 4}]}"#,
    )
    .unwrap();
    let order = doc.paint_order();
    let resolved = store(fetcher).resolve(&order, &fontdb()).await;

    let Some(ImageOutcome::Ready { image, dest }) = resolved.get(0) else {
        panic!("expected ready");
    };
    // Two source columns remain; they keep their 4x scale instead of filling the 40px box.
    assert_eq!((image.width, image.height), (2, 2));
    assert_eq!(*dest, Rect::new(0.0, 0.0, 8.0, 8.0));
    assert_eq!(image.rgba8_premul[1], 8);
}

#[test]
fn long_sources_are_truncated_for_logs() {
    let src = format!("data:image/png;base64,{}", "A".repeat(500));
    let shown = display_src(&src);
    assert!(shown.len() < 110);
    assert!(shown.ends_with("..."));
    assert_eq!(display_src("https://a/b.png"), "https://a/b.png");
}
