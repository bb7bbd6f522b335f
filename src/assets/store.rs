use std::{collections::HashMap, sync::Arc};

use futures::StreamExt as _;

use crate::{
    assets::{
        decode::{PreparedImage, decode_image},
        fetch::{FetchOptions, ImageFetcher, decode_data_url},
    },
    foundation::core::Rect,
    render::filters::apply_filters,
    scene::model::{ImageObject, SceneObject},
};

/// Per-object result of the asset phase.
#[derive(Clone, Debug)]
pub enum ImageOutcome {
    /// Filtered, cropped pixels and the rectangle they are stretched over, in the
    /// object's scaled box space (design px).
    Ready { image: PreparedImage, dest: Rect },
    Failed(String),
}

/// Asset outcomes keyed by position in the paint order.
#[derive(Clone, Debug, Default)]
pub struct ResolvedImages {
    by_index: HashMap<usize, ImageOutcome>,
}

impl ResolvedImages {
    pub fn get(&self, paint_index: usize) -> Option<&ImageOutcome> {
        self.by_index.get(&paint_index)
    }

    pub fn len(&self) -> usize {
        self.by_index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_index.is_empty()
    }

    pub fn failed_count(&self) -> usize {
        self.by_index
            .values()
            .filter(|o| matches!(o, ImageOutcome::Failed(_)))
            .count()
    }

    #[cfg(test)]
    pub(crate) fn insert_for_test(&mut self, paint_index: usize, outcome: ImageOutcome) {
        self.by_index.insert(paint_index, outcome);
    }
}

/// Raw bytes per distinct image source, as returned by the fetch phase.
#[derive(Clone, Debug, Default)]
pub struct FetchedSources {
    bytes: HashMap<String, Result<Arc<Vec<u8>>, String>>,
}

impl FetchedSources {
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Resolves every image object of a render to pixels or a failure, never aborting the render.
#[derive(Clone)]
pub struct ImageStore {
    fetcher: Arc<dyn ImageFetcher>,
    opts: FetchOptions,
}

impl ImageStore {
    pub fn new(fetcher: Arc<dyn ImageFetcher>, opts: FetchOptions) -> Self {
        Self { fetcher, opts }
    }

    /// Fetch each distinct source of the visible image objects, a bounded number at a time.
    #[tracing::instrument(skip_all, fields(objects = order.len()))]
    pub async fn fetch_sources(&self, order: &[&SceneObject]) -> FetchedSources {
        let mut srcs: Vec<String> = image_objects(order)
            .filter_map(|(_, img)| img.src().map(str::to_owned))
            .collect();
        srcs.sort();
        srcs.dedup();
        if srcs.is_empty() {
            return FetchedSources::default();
        }

        let limit = self.opts.max_concurrent.max(1);
        let bytes = futures::stream::iter(srcs)
            .map(|src| async move {
                let res = self.fetch_one(&src).await;
                if let Err(e) = &res {
                    tracing::debug!(src = %display_src(&src), "image fetch failed: {e}");
                }
                (src, res)
            })
            .buffer_unordered(limit)
            .collect::<HashMap<_, _>>()
            .await;

        FetchedSources { bytes }
    }

    async fn fetch_one(&self, src: &str) -> Result<Arc<Vec<u8>>, String> {
        if let Some(decoded) = decode_data_url(src) {
            return decoded.map(Arc::new).map_err(|e| e.to_string());
        }
        match tokio::time::timeout(self.opts.timeout, self.fetcher.fetch(src)).await {
            Ok(Ok(bytes)) if bytes.len() > self.opts.max_image_bytes => Err(format!(
                "image is {} bytes (limit {})",
                bytes.len(),
                self.opts.max_image_bytes
            )),
            Ok(Ok(bytes)) => Ok(Arc::new(bytes)),
            Ok(Err(e)) => Err(e.to_string()),
            Err(_) => Err(format!(
                "timed out after {}s",
                self.opts.timeout.as_secs_f64()
            )),
        }
    }

    /// Decode, filter and crop every image object. CPU-bound; performs no IO.
    #[tracing::instrument(skip_all, fields(sources = sources.len()))]
    pub fn prepare(
        sources: &FetchedSources,
        order: &[&SceneObject],
        fontdb: &Arc<usvg::fontdb::Database>,
    ) -> ResolvedImages {
        let mut decoded: HashMap<&str, Result<PreparedImage, String>> = HashMap::new();
        let mut by_index = HashMap::new();

        for (idx, img) in image_objects(order) {
            // An image without a source draws nothing at all.
            let Some(src) = img.src() else {
                continue;
            };
            let base = decoded
                .entry(src)
                .or_insert_with(|| match sources.bytes.get(src) {
                    Some(Ok(bytes)) => {
                        decode_image(bytes, Arc::clone(fontdb)).map_err(|e| e.to_string())
                    }
                    Some(Err(e)) => Err(e.clone()),
                    None => Err("source was not fetched".to_owned()),
                });
            let outcome = match base {
                Ok(base) => prepare_object(base, img),
                Err(e) => ImageOutcome::Failed(e.clone()),
            };

            if let ImageOutcome::Failed(reason) = &outcome {
                tracing::warn!(
                    index = idx,
                    kind = "image",
                    src = %display_src(src),
                    "image unavailable, drawing placeholder: {reason}"
                );
            }
            by_index.insert(idx, outcome);
        }

        ResolvedImages { by_index }
    }

    /// Both phases back to back on the current task.
    #[cfg(test)]
    pub(crate) async fn resolve(
        &self,
        order: &[&SceneObject],
        fontdb: &Arc<usvg::fontdb::Database>,
    ) -> ResolvedImages {
        let sources = self.fetch_sources(order).await;
        Self::prepare(&sources, order, fontdb)
    }
}

fn prepare_object(base: &PreparedImage, img: &ImageObject) -> ImageOutcome {
    let filtered = match apply_filters(base, &img.filters) {
        Ok(f) => f,
        Err(e) => return ImageOutcome::Failed(format!("filter: {e}")),
    };

    let c = &img.common;
    let src_w = c.width.filter(|w| *w > 0.0).unwrap_or(f64::from(base.width));
    let src_h = c.height.filter(|h| *h > 0.0).unwrap_or(f64::from(base.height));
    let draw_width = src_w * c.scale_x();
    let draw_height = src_h * c.scale_y();

    if !img.is_cropped() {
        return ImageOutcome::Ready {
            image: filtered,
            dest: Rect::new(0.0, 0.0, draw_width, draw_height),
        };
    }

    // Source pixels off the image edge are clipped; the destination shrinks with them.
    let (crop_x, crop_y) = (img.crop_x.unwrap_or(0.0), img.crop_y.unwrap_or(0.0));
    let (Some((x0, y0, x1, y1)), Some(image)) = (
        filtered.clamp_region(crop_x, crop_y, src_w, src_h),
        filtered.crop(crop_x, crop_y, src_w, src_h),
    ) else {
        return ImageOutcome::Failed("crop region is outside the image".to_owned());
    };
    let sx = draw_width / src_w;
    let sy = draw_height / src_h;
    let dest = Rect::new(
        (f64::from(x0) - crop_x) * sx,
        (f64::from(y0) - crop_y) * sy,
        (f64::from(x1) - crop_x) * sx,
        (f64::from(y1) - crop_y) * sy,
    );
    ImageOutcome::Ready { image, dest }
}

/// Visible image objects with their paint-order index.
fn image_objects<'a>(
    order: &'a [&'a SceneObject],
) -> impl Iterator<Item = (usize, &'a ImageObject)> + 'a {
    order.iter().enumerate().filter_map(|(i, o)| match o {
        SceneObject::Image(img) if img.common.visible() => Some((i, img)),
        _ => None,
    })
}

fn display_src(src: &str) -> String {
    const MAX: usize = 96;
    if src.len() <= MAX {
        return src.to_owned();
    }
    let mut end = MAX;
    while !src.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &src[..end])
}

#[cfg(test)]
#[path = "../../tests/unit/assets/store.rs"]
mod tests;
