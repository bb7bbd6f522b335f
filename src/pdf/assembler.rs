use std::io::Write as _;

use flate2::{Compression, write::ZlibEncoder};
use lopdf::{
    Dictionary, Document, Object, Stream,
    content::{Content, Operation},
    dictionary,
};

use crate::{
    foundation::error::{PrintError, PrintResult},
    geometry::page::PageGeometry,
    pdf::{marks::crop_mark_operations, text::TextLayer, text::num},
    render::compositor::RasterImage,
};

pub const DOCUMENT_TITLE: &str = "Print Ready Design";
pub const DOCUMENT_PRODUCER: &str = "High Quality PDF Generator";

const IMAGE_RESOURCE: &str = "Im1";

/// Info dictionary contents. The timestamp is explicit so output can be reproduced.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DocumentInfo {
    pub title: String,
    pub producer: String,
    pub creation_date: chrono::DateTime<chrono::Utc>,
}

impl DocumentInfo {
    pub fn at(creation_date: chrono::DateTime<chrono::Utc>) -> Self {
        Self {
            title: DOCUMENT_TITLE.to_owned(),
            producer: DOCUMENT_PRODUCER.to_owned(),
            creation_date,
        }
    }

    pub fn now() -> Self {
        Self::at(chrono::Utc::now())
    }

    /// `D:YYYYMMDDHHmmSSZ`
    pub fn pdf_date(&self) -> String {
        self.creation_date.format("D:%Y%m%d%H%M%SZ").to_string()
    }
}

/// Build the single-page print PDF: crop marks, the composited raster placed at
/// the resolved offset and size, then live text on top.
#[tracing::instrument(skip_all, fields(raster_w = raster.width, raster_h = raster.height))]
pub fn assemble_pdf(
    g: &PageGeometry,
    raster: &RasterImage,
    text: &TextLayer,
    info: &DocumentInfo,
) -> PrintResult<Vec<u8>> {
    let expected = (raster.width as usize)
        .saturating_mul(raster.height as usize)
        .saturating_mul(3);
    if raster.width == 0 || raster.height == 0 || raster.rgb8.len() != expected {
        return Err(PrintError::pdf(format!(
            "raster buffer of {} bytes does not match {}x{} rgb",
            raster.rgb8.len(),
            raster.width,
            raster.height
        )));
    }

    let mut doc = Document::with_version("1.7");
    let pages_id = doc.new_object_id();

    let image_id = doc.add_object(image_xobject(raster)?);

    let mut fonts = Dictionary::new();
    for face in text.faces() {
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => face.base_font(),
            "Encoding" => "WinAnsiEncoding",
        });
        fonts.set(face.resource_name(), font_id);
    }

    let (media_w, media_h) = g.media_size();
    let mut ops = crop_mark_operations(g);
    ops.extend([
        Operation::new("q", vec![]),
        Operation::new(
            "cm",
            vec![
                num(g.render_width),
                num(0.0),
                num(0.0),
                num(g.render_height),
                num(g.offset_x),
                num(media_h - g.offset_y - g.render_height),
            ],
        ),
        Operation::new("Do", vec![Object::Name(IMAGE_RESOURCE.into())]),
        Operation::new("Q", vec![]),
    ]);
    ops.extend(text.operations().iter().cloned());

    let content = Content { operations: ops }.encode()?;
    let mut content = Stream::new(dictionary! { "Filter" => "FlateDecode" }, deflate(&content)?);
    content.allows_compression = false;
    let content_id = doc.add_object(content);

    let mut resources = dictionary! {
        "XObject" => dictionary! { IMAGE_RESOURCE => image_id },
    };
    if !fonts.is_empty() {
        resources.set("Font", fonts);
    }

    let media_box = vec![0.into(), 0.into(), num(media_w), num(media_h)];
    let b = g.bleed_pts;
    let trim_box = vec![
        num(b),
        num(b),
        num(g.page_width_pts + b),
        num(g.page_height_pts + b),
    ];
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "MediaBox" => media_box.clone(),
        "BleedBox" => media_box,
        "TrimBox" => trim_box,
        "Contents" => content_id,
        "Resources" => resources,
    });

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
        }),
    );
    let catalog_id = doc.add_object(dictionary! { "Type" => "Catalog", "Pages" => pages_id });
    doc.trailer.set("Root", catalog_id);

    let info_id = doc.add_object(dictionary! {
        "Title" => Object::string_literal(info.title.as_str()),
        "Producer" => Object::string_literal(info.producer.as_str()),
        "CreationDate" => Object::string_literal(info.pdf_date()),
    });
    doc.trailer.set("Info", info_id);

    let mut out = Vec::new();
    doc.save_to(&mut out)
        .map_err(|e| PrintError::pdf(format!("write document: {e}")))?;
    tracing::debug!(bytes = out.len(), "pdf assembled");
    Ok(out)
}

fn image_xobject(raster: &RasterImage) -> PrintResult<Stream> {
    let dict = dictionary! {
        "Type" => "XObject",
        "Subtype" => "Image",
        "Width" => i64::from(raster.width),
        "Height" => i64::from(raster.height),
        "ColorSpace" => "DeviceRGB",
        "BitsPerComponent" => 8,
        "Filter" => "FlateDecode",
    };
    let mut stream = Stream::new(dict, deflate(&raster.rgb8)?);
    stream.allows_compression = false;
    Ok(stream)
}

fn deflate(bytes: &[u8]) -> PrintResult<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::with_capacity(bytes.len() / 4), Compression::default());
    encoder
        .write_all(bytes)
        .map_err(|e| PrintError::pdf(format!("compress stream: {e}")))?;
    encoder
        .finish()
        .map_err(|e| PrintError::pdf(format!("compress stream: {e}")))
}

#[cfg(test)]
#[path = "../../tests/unit/pdf/assembler.rs"]
mod tests;
