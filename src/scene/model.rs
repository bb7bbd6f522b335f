use serde::de::DeserializeOwned;

use crate::{
    foundation::error::{PrintError, PrintResult},
    scene::{
        color::{ColorDef, deserialize_paint},
        filters::{ImageFilter, deserialize_filters},
    },
};

pub const DEFAULT_DOC_WIDTH: f64 = 800.0;
pub const DEFAULT_DOC_HEIGHT: f64 = 600.0;
pub const DEFAULT_FONT_SIZE: f64 = 16.0;
pub const DEFAULT_LINE_HEIGHT: f64 = 1.16;

/// A design as serialized by the editor: native pixel size, background and ordered objects.
#[derive(Clone, Debug, Default, serde::Deserialize)]
pub struct SceneDocument {
    #[serde(default, deserialize_with = "lenient")]
    pub width: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pub height: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_paint")]
    pub background: Option<ColorDef>,
    /// Fabric's own key; `background` wins when both are set.
    #[serde(default, rename = "backgroundColor", deserialize_with = "deserialize_paint")]
    pub background_color: Option<ColorDef>,
    #[serde(default, deserialize_with = "deserialize_objects")]
    pub objects: Vec<SceneObject>,
}

impl SceneDocument {
    pub fn from_json_str(s: &str) -> PrintResult<Self> {
        serde_json::from_str(s).map_err(|e| PrintError::scene(format!("invalid scene json: {e}")))
    }

    pub fn from_json_value(v: serde_json::Value) -> PrintResult<Self> {
        serde_json::from_value(v).map_err(|e| PrintError::scene(format!("invalid scene json: {e}")))
    }

    /// Native design size, falling back to `fallback` and then to 800x600 per axis.
    pub fn native_size(&self, fallback: (Option<f64>, Option<f64>)) -> (f64, f64) {
        let pick = |own: Option<f64>, rec: Option<f64>, default: f64| {
            own.filter(|v| *v > 0.0)
                .or(rec.filter(|v| *v > 0.0))
                .unwrap_or(default)
        };
        (
            pick(self.width, fallback.0, DEFAULT_DOC_WIDTH),
            pick(self.height, fallback.1, DEFAULT_DOC_HEIGHT),
        )
    }

    /// Background paint, opaque white when absent.
    pub fn background_or_white(&self) -> ColorDef {
        self.background
            .or(self.background_color)
            .unwrap_or(ColorDef::rgba(1.0, 1.0, 1.0, 1.0))
    }

    /// Objects in paint order: array order, stable-sorted by `zIndex`.
    pub fn paint_order(&self) -> Vec<&SceneObject> {
        let mut out: Vec<&SceneObject> = self.objects.iter().collect();
        out.sort_by_key(|o| o.common().map_or(0, |c| c.z_index.unwrap_or(0)));
        out
    }
}

/// Fields shared by every drawable object.
#[derive(Clone, Debug, Default, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectCommon {
    #[serde(default, deserialize_with = "lenient")]
    pub left: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pub top: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pub width: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pub height: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pub scale_x: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pub scale_y: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pub angle: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pub opacity: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pub flip_x: Option<bool>,
    #[serde(default, deserialize_with = "lenient")]
    pub flip_y: Option<bool>,
    #[serde(default, deserialize_with = "lenient")]
    pub visible: Option<bool>,
    #[serde(default, deserialize_with = "deserialize_paint")]
    pub stroke: Option<ColorDef>,
    #[serde(default, deserialize_with = "lenient")]
    pub stroke_width: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pub z_index: Option<i64>,
}

impl ObjectCommon {
    pub fn left(&self) -> f64 {
        self.left.unwrap_or(0.0)
    }

    pub fn top(&self) -> f64 {
        self.top.unwrap_or(0.0)
    }

    pub fn width(&self) -> f64 {
        self.width.unwrap_or(0.0)
    }

    pub fn height(&self) -> f64 {
        self.height.unwrap_or(0.0)
    }

    pub fn scale_x(&self) -> f64 {
        self.scale_x.unwrap_or(1.0)
    }

    pub fn scale_y(&self) -> f64 {
        self.scale_y.unwrap_or(1.0)
    }

    pub fn angle(&self) -> f64 {
        self.angle.unwrap_or(0.0)
    }

    /// Opacity in `0..=1`; an explicit `0` stays `0`.
    pub fn opacity(&self) -> f64 {
        self.opacity.unwrap_or(1.0).clamp(0.0, 1.0)
    }

    pub fn flip_x(&self) -> bool {
        self.flip_x.unwrap_or(false)
    }

    pub fn flip_y(&self) -> bool {
        self.flip_y.unwrap_or(false)
    }

    pub fn visible(&self) -> bool {
        self.visible.unwrap_or(true)
    }

    pub fn stroke_width(&self) -> f64 {
        self.stroke_width.unwrap_or(1.0)
    }

    /// On-canvas box size: `width * scaleX` by `height * scaleY`.
    pub fn scaled_size(&self) -> (f64, f64) {
        (self.width() * self.scale_x(), self.height() * self.scale_y())
    }
}

#[derive(Clone, Debug, Default, serde::Deserialize)]
pub struct RectObject {
    #[serde(flatten)]
    pub common: ObjectCommon,
    #[serde(default, deserialize_with = "deserialize_paint")]
    pub fill: Option<ColorDef>,
}

#[derive(Clone, Debug, Default, serde::Deserialize)]
pub struct CircleObject {
    #[serde(flatten)]
    pub common: ObjectCommon,
    #[serde(default, deserialize_with = "lenient")]
    pub radius: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_paint")]
    pub fill: Option<ColorDef>,
}

impl CircleObject {
    /// Radius in scaled-box units: `(radius ?? width / 2) * scaleX`.
    pub fn scaled_radius(&self) -> f64 {
        let r = self
            .radius
            .filter(|r| *r > 0.0)
            .unwrap_or(self.common.width() / 2.0);
        r * self.common.scale_x()
    }
}

#[derive(Clone, Debug, Default, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageObject {
    #[serde(flatten)]
    pub common: ObjectCommon,
    #[serde(default, deserialize_with = "lenient")]
    pub src: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub crop_x: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pub crop_y: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_filters")]
    pub filters: Vec<ImageFilter>,
}

impl ImageObject {
    pub fn src(&self) -> Option<&str> {
        self.src.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }

    pub fn is_cropped(&self) -> bool {
        self.crop_x.unwrap_or(0.0) != 0.0 || self.crop_y.unwrap_or(0.0) != 0.0
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FontWeight {
    #[default]
    Normal,
    Bold,
}

#[derive(Clone, Debug, Default, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextObject {
    #[serde(flatten)]
    pub common: ObjectCommon,
    #[serde(default, deserialize_with = "lenient")]
    pub text: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub font_family: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub font_size: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_weight")]
    pub font_weight: FontWeight,
    #[serde(default, deserialize_with = "lenient")]
    pub font_style: Option<String>,
    #[serde(default, deserialize_with = "deserialize_paint")]
    pub fill: Option<ColorDef>,
    #[serde(default, deserialize_with = "deserialize_align")]
    pub text_align: TextAlign,
    #[serde(default, deserialize_with = "deserialize_paint")]
    pub text_background_color: Option<ColorDef>,
    #[serde(default, deserialize_with = "lenient")]
    pub line_height: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pub underline: Option<bool>,
    #[serde(default, deserialize_with = "lenient")]
    pub overline: Option<bool>,
    #[serde(default, deserialize_with = "lenient")]
    pub linethrough: Option<bool>,
    #[serde(default, deserialize_with = "lenient")]
    pub char_spacing: Option<f64>,
}

impl TextObject {
    pub fn text(&self) -> &str {
        self.text.as_deref().unwrap_or("")
    }

    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.text().split('\n').map(|l| l.strip_suffix('\r').unwrap_or(l))
    }

    pub fn font_size(&self) -> f64 {
        self.font_size
            .filter(|s| *s > 0.0)
            .unwrap_or(DEFAULT_FONT_SIZE)
    }

    pub fn line_height(&self) -> f64 {
        self.line_height
            .filter(|h| *h > 0.0)
            .unwrap_or(DEFAULT_LINE_HEIGHT)
    }

    pub fn fill_or_black(&self) -> ColorDef {
        self.fill.unwrap_or(ColorDef::rgba(0.0, 0.0, 0.0, 1.0))
    }

    pub fn is_bold(&self) -> bool {
        self.font_weight == FontWeight::Bold
    }

    /// `fontStyle` of `italic` or `oblique`.
    pub fn is_italic(&self) -> bool {
        self.font_style.as_deref().is_some_and(|s| {
            let s = s.trim();
            s.eq_ignore_ascii_case("italic") || s.eq_ignore_ascii_case("oblique")
        })
    }

    /// Extra advance per character in em/1000 units (Fabric's `charSpacing`).
    pub fn char_spacing(&self) -> f64 {
        self.char_spacing.unwrap_or(0.0)
    }

    pub fn has_decorations(&self) -> bool {
        self.underline.unwrap_or(false)
            || self.overline.unwrap_or(false)
            || self.linethrough.unwrap_or(false)
    }
}

/// A drawable object. The `type` discriminant is matched case-insensitively.
#[derive(Clone, Debug)]
pub enum SceneObject {
    Rect(RectObject),
    Circle(CircleObject),
    Image(ImageObject),
    Text(TextObject),
    /// Recognised as an object but not drawable here (paths, groups, ...).
    Unsupported { kind: String },
}

impl SceneObject {
    pub fn common(&self) -> Option<&ObjectCommon> {
        match self {
            Self::Rect(o) => Some(&o.common),
            Self::Circle(o) => Some(&o.common),
            Self::Image(o) => Some(&o.common),
            Self::Text(o) => Some(&o.common),
            Self::Unsupported { .. } => None,
        }
    }

    pub fn kind(&self) -> &str {
        match self {
            Self::Rect(_) => "rect",
            Self::Circle(_) => "circle",
            Self::Image(_) => "image",
            Self::Text(_) => "text",
            Self::Unsupported { kind } => kind,
        }
    }

    pub fn is_visible(&self) -> bool {
        self.common().is_some_and(ObjectCommon::visible)
    }

    fn from_value(v: serde_json::Value) -> Result<Self, serde_json::Error> {
        let kind = v
            .get("type")
            .and_then(serde_json::Value::as_str)
            .unwrap_or("")
            .to_owned();
        Ok(match kind.to_ascii_lowercase().as_str() {
            "rect" => Self::Rect(serde_json::from_value(v)?),
            "circle" => Self::Circle(serde_json::from_value(v)?),
            "image" => Self::Image(serde_json::from_value(v)?),
            "text" | "itext" | "i-text" | "textbox" => Self::Text(serde_json::from_value(v)?),
            _ => Self::Unsupported { kind },
        })
    }
}

impl<'de> serde::Deserialize<'de> for SceneObject {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let v = <serde_json::Value as serde::Deserialize>::deserialize(deserializer)?;
        Self::from_value(v).map_err(serde::de::Error::custom)
    }
}

fn deserialize_objects<'de, D>(deserializer: D) -> Result<Vec<SceneObject>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let v = <Option<Vec<serde_json::Value>> as serde::Deserialize>::deserialize(deserializer)?;
    v.unwrap_or_default()
        .into_iter()
        .filter(|o| o.is_object())
        .map(|o| SceneObject::from_value(o).map_err(serde::de::Error::custom))
        .collect()
}

/// Accept any JSON value; values of the wrong shape become `None`.
pub(crate) fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: DeserializeOwned,
{
    let v = <serde_json::Value as serde::Deserialize>::deserialize(deserializer)?;
    Ok(serde_json::from_value(v).ok())
}

fn deserialize_weight<'de, D>(deserializer: D) -> Result<FontWeight, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let v = <serde_json::Value as serde::Deserialize>::deserialize(deserializer)?;
    let bold = match &v {
        serde_json::Value::String(s) => {
            let s = s.trim().to_ascii_lowercase();
            matches!(s.as_str(), "bold" | "bolder")
                || s.parse::<f64>().is_ok_and(|w| w >= 600.0)
        }
        serde_json::Value::Number(n) => n.as_f64().is_some_and(|w| w >= 600.0),
        _ => false,
    };
    Ok(if bold {
        FontWeight::Bold
    } else {
        FontWeight::Normal
    })
}

fn deserialize_align<'de, D>(deserializer: D) -> Result<TextAlign, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let v = <serde_json::Value as serde::Deserialize>::deserialize(deserializer)?;
    Ok(match v.as_str().map(str::to_ascii_lowercase).as_deref() {
        Some("center") => TextAlign::Center,
        Some("right") => TextAlign::Right,
        _ => TextAlign::Left,
    })
}

#[cfg(test)]
#[path = "../../tests/unit/scene/model.rs"]
mod tests;
