/// Convenience result type used across printready.
pub type PrintResult<T> = Result<T, PrintError>;

/// Top-level error taxonomy used by the rendering engine.
#[derive(thiserror::Error, Debug)]
pub enum PrintError {
    /// Invalid render settings or out-of-range document values.
    #[error("validation error: {0}")]
    Validation(String),

    /// The scene document could not be parsed.
    #[error("scene error: {0}")]
    Scene(String),

    /// A single image source could not be fetched or decoded.
    #[error("asset error: {0}")]
    Asset(String),

    /// Raster compositing failed.
    #[error("render error: {0}")]
    Render(String),

    /// PDF document assembly failed.
    #[error("pdf error: {0}")]
    Pdf(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl PrintError {
    /// Build a [`PrintError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`PrintError::Scene`] value.
    pub fn scene(msg: impl Into<String>) -> Self {
        Self::Scene(msg.into())
    }

    /// Build a [`PrintError::Asset`] value.
    pub fn asset(msg: impl Into<String>) -> Self {
        Self::Asset(msg.into())
    }

    /// Build a [`PrintError::Render`] value.
    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    /// Build a [`PrintError::Pdf`] value.
    pub fn pdf(msg: impl Into<String>) -> Self {
        Self::Pdf(msg.into())
    }

    /// True when the error stems from caller-provided input rather than an engine fault.
    pub fn is_caller_error(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

impl From<lopdf::Error> for PrintError {
    fn from(e: lopdf::Error) -> Self {
        Self::Pdf(e.to_string())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
