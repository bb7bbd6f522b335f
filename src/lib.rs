#![forbid(unsafe_code)]

//! Print-ready PDF rendering for canvas scene documents.
//!
//! A scene is resolved against page settings ([`geometry`]), its images are fetched
//! ([`assets`]), shapes and images are composited to a raster ([`render`]), and the
//! raster is placed on a PDF page with crop marks and live text on top ([`pdf`]).
//! [`pipeline`] ties the stages together; [`service`] exposes them over HTTP.

mod foundation;

pub mod assets;
pub mod geometry;
pub mod pdf;
pub mod pipeline;
pub mod render;
pub mod scene;
pub mod service;

pub use foundation::core::{Affine, BezPath, Point, Rect, Rgba8Premul, Vec2};
pub use foundation::error::{PrintError, PrintResult};

pub use assets::{
    decode::PreparedImage,
    fetch::{FetchOptions, ImageFetcher, ReqwestFetcher},
    store::{ImageOutcome, ImageStore},
    system_fontdb,
};
pub use geometry::page::{Orientation, PageFormat, PageGeometry, RenderSettings};
pub use pdf::{
    assembler::{DocumentInfo, assemble_pdf},
    fonts::{StandardFace, resolve_font},
    text::{TextLayer, TextLayerOptions},
};
pub use pipeline::{ComposedPage, RenderOptions, RenderedPdf, Renderer, compose_page};
pub use render::compositor::{Compositor, RasterImage};
pub use scene::{
    color::ColorDef,
    filters::ImageFilter,
    model::{SceneDocument, SceneObject},
};
