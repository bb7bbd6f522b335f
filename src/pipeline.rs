use std::sync::Arc;

use crate::{
    assets::{
        fetch::{FetchOptions, ImageFetcher},
        placeholder::PlaceholderLabel,
        store::{FetchedSources, ImageStore},
    },
    foundation::error::{PrintError, PrintResult},
    geometry::page::{PageGeometry, RenderSettings},
    pdf::{
        assembler::{DocumentInfo, assemble_pdf},
        text::{TextLayer, TextLayerOptions},
    },
    render::compositor::{Compositor, RasterImage},
    scene::model::SceneDocument,
};

/// Engine-wide knobs that are not part of a single request's settings.
#[derive(Clone, Debug)]
pub struct RenderOptions {
    pub max_raster_megapixels: f64,
    pub text: TextLayerOptions,
    /// Fixed `CreationDate`; the current time when `None`.
    pub creation_date: Option<chrono::DateTime<chrono::Utc>>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            max_raster_megapixels: 120.0,
            text: TextLayerOptions::default(),
            creation_date: None,
        }
    }
}

/// Everything that goes onto the page, before it is serialized.
#[derive(Debug)]
pub struct ComposedPage {
    pub geometry: PageGeometry,
    pub raster: RasterImage,
    pub text: TextLayer,
    pub failed_images: usize,
}

/// A finished document and what went into it.
#[derive(Clone, Debug)]
pub struct RenderedPdf {
    pub bytes: Vec<u8>,
    pub filename: String,
    pub geometry: PageGeometry,
    pub failed_images: usize,
    pub text_objects: usize,
}

/// Resolve the page layout for a document, falling back to `record_size` and then
/// the default design size when the document does not carry its own.
pub fn resolve_geometry(
    doc: &SceneDocument,
    settings: &RenderSettings,
    record_size: (Option<f64>, Option<f64>),
    max_megapixels: f64,
) -> PrintResult<PageGeometry> {
    let (w, h) = doc.native_size(record_size);
    let geometry = PageGeometry::resolve(settings, w, h)?;
    geometry.check_raster_limits(max_megapixels)?;
    Ok(geometry)
}

/// Decode images from already fetched sources, composite the raster and lay out
/// text. CPU-bound; performs no IO.
#[tracing::instrument(skip_all, fields(objects = doc.objects.len()))]
pub fn compose_page(
    doc: &SceneDocument,
    geometry: PageGeometry,
    sources: &FetchedSources,
    fontdb: &Arc<usvg::fontdb::Database>,
    text: TextLayerOptions,
) -> PrintResult<ComposedPage> {
    let order = doc.paint_order();
    let images = ImageStore::prepare(sources, &order, fontdb);

    let label = if images.failed_count() > 0 {
        match PlaceholderLabel::new(Arc::clone(fontdb)) {
            Ok(label) => Some(label),
            Err(e) => {
                tracing::warn!("placeholder label unavailable: {e}");
                None
            }
        }
    } else {
        None
    };

    let raster = Compositor::new(&geometry, &images, label.as_ref()).composite(doc, &order)?;
    let text = TextLayer::build(&order, &geometry, text);
    Ok(ComposedPage {
        geometry,
        raster,
        text,
        failed_images: images.failed_count(),
    })
}

/// Two-phase renderer: image IO on the async runtime, then compositing and
/// assembly on a blocking thread.
#[derive(Clone)]
pub struct Renderer {
    images: ImageStore,
    fontdb: Arc<usvg::fontdb::Database>,
    opts: RenderOptions,
}

impl Renderer {
    pub fn new(
        fetcher: Arc<dyn ImageFetcher>,
        fetch: FetchOptions,
        fontdb: Arc<usvg::fontdb::Database>,
        opts: RenderOptions,
    ) -> Self {
        Self {
            images: ImageStore::new(fetcher, fetch),
            fontdb,
            opts,
        }
    }

    pub fn options(&self) -> &RenderOptions {
        &self.opts
    }

    /// Fetch every image source, then compose the page.
    #[tracing::instrument(skip_all, fields(format = %settings.format, dpi = settings.dpi))]
    pub async fn render_page(
        &self,
        doc: SceneDocument,
        settings: &RenderSettings,
        record_size: (Option<f64>, Option<f64>),
    ) -> PrintResult<ComposedPage> {
        let geometry =
            resolve_geometry(&doc, settings, record_size, self.opts.max_raster_megapixels)?;
        tracing::debug!(
            pixel_width = geometry.pixel_width,
            pixel_height = geometry.pixel_height,
            scale = geometry.scale,
            "page geometry resolved"
        );

        let sources = {
            let order = doc.paint_order();
            self.images.fetch_sources(&order).await
        };

        let fontdb = Arc::clone(&self.fontdb);
        let text = self.opts.text;
        tokio::task::spawn_blocking(move || compose_page(&doc, geometry, &sources, &fontdb, text))
            .await
            .map_err(|e| PrintError::render(format!("render task failed: {e}")))?
    }

    /// Full render to PDF bytes. Nothing is returned until the document is complete.
    pub async fn render_pdf(
        &self,
        doc: SceneDocument,
        settings: &RenderSettings,
        record_size: (Option<f64>, Option<f64>),
    ) -> PrintResult<RenderedPdf> {
        let page = self.render_page(doc, settings, record_size).await?;
        let info = self
            .opts
            .creation_date
            .map_or_else(DocumentInfo::now, DocumentInfo::at);

        let (bytes, page) = tokio::task::spawn_blocking(move || {
            assemble_pdf(&page.geometry, &page.raster, &page.text, &info).map(|b| (b, page))
        })
        .await
        .map_err(|e| PrintError::pdf(format!("assembly task failed: {e}")))??;

        Ok(RenderedPdf {
            bytes,
            filename: settings.attachment_filename(),
            geometry: page.geometry,
            failed_images: page.failed_images,
            text_objects: page.text.drawn_objects(),
        })
    }
}
