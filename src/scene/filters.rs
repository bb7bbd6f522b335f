#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum GrayscaleMode {
    #[default]
    Average,
    Luminosity,
    Lightness,
}

/// Image filter descriptors as the editor serializes them (`{"type": "Sepia"}` etc).
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ImageFilter {
    Grayscale { mode: GrayscaleMode },
    Sepia,
    Invert { alpha: bool },
    /// `blur` is a fraction (`0..=1`) of the image's smaller side.
    Blur { blur: f64 },
}

impl ImageFilter {
    fn from_value(v: &serde_json::Value) -> Option<Self> {
        let kind = v.get("type")?.as_str()?.to_ascii_lowercase();
        match kind.as_str() {
            "grayscale" => {
                let mode = match v
                    .get("mode")
                    .and_then(serde_json::Value::as_str)
                    .map(str::to_ascii_lowercase)
                    .as_deref()
                {
                    Some("luminosity") => GrayscaleMode::Luminosity,
                    Some("lightness") => GrayscaleMode::Lightness,
                    _ => GrayscaleMode::Average,
                };
                Some(Self::Grayscale { mode })
            }
            "sepia" => Some(Self::Sepia),
            "invert" => Some(Self::Invert {
                alpha: v
                    .get("alpha")
                    .and_then(serde_json::Value::as_bool)
                    .unwrap_or(false),
            }),
            "blur" => {
                let blur = v
                    .get("blur")
                    .and_then(serde_json::Value::as_f64)
                    .unwrap_or(0.0);
                Some(Self::Blur {
                    blur: blur.clamp(0.0, 1.0),
                })
            }
            _ => {
                tracing::debug!(filter = %kind, "ignoring unsupported image filter");
                None
            }
        }
    }
}

/// `filters` may contain `null` holes and unknown entries; both are dropped.
pub(crate) fn deserialize_filters<'de, D>(deserializer: D) -> Result<Vec<ImageFilter>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let v = <serde_json::Value as serde::Deserialize>::deserialize(deserializer)?;
    Ok(match v {
        serde_json::Value::Array(items) => {
            items.iter().filter_map(ImageFilter::from_value).collect()
        }
        _ => Vec::new(),
    })
}
