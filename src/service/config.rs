use std::{collections::HashMap, path::Path, path::PathBuf, time::Duration};

use crate::{
    assets::fetch::{DEFAULT_USER_AGENT, FetchOptions},
    pdf::text::TextLayerOptions,
    pipeline::RenderOptions,
};

pub const ENV_PREFIX: &str = "PRINTREADY";

#[derive(Debug, Clone, Default, serde::Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub render: RenderConfig,
    pub fetch: FetchConfig,
    pub store: StoreConfig,
    pub log_format: LogFormat,
}

#[derive(Debug, Clone, serde::Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub max_body_mb: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_owned(),
            port: 5003,
            max_body_mb: 16,
        }
    }
}

#[derive(Debug, Clone, serde::Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Renders allowed to run at once; further requests wait for a slot.
    pub max_concurrent: usize,
    /// Longest a request waits for a slot before failing.
    pub queue_timeout_secs: u64,
    pub max_raster_megapixels: f64,
    pub draw_text_decorations: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            max_concurrent: 2,
            queue_timeout_secs: 120,
            max_raster_megapixels: 120.0,
            draw_text_decorations: false,
        }
    }
}

#[derive(Debug, Clone, serde::Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    pub timeout_secs: u64,
    pub user_agent: String,
    pub max_image_bytes: usize,
    pub max_concurrent: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 10,
            user_agent: DEFAULT_USER_AGENT.to_owned(),
            max_image_bytes: 32 * 1024 * 1024,
            max_concurrent: 8,
        }
    }
}

#[derive(Debug, Clone, serde::Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub root: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("./data"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl Config {
    /// Defaults, then the optional TOML file, then `PRINTREADY__SECTION__KEY` variables.
    pub fn load(path: Option<&Path>) -> Result<Self, config::ConfigError> {
        Self::load_with_env(path, None)
    }

    /// Like [`Config::load`], reading variables from `env` instead of the process
    /// environment when given.
    pub fn load_with_env(
        path: Option<&Path>,
        env: Option<HashMap<String, String>>,
    ) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        }
        builder = builder.add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true)
                .source(env),
        );
        builder.build()?.try_deserialize()
    }

    pub fn fetch_options(&self) -> FetchOptions {
        FetchOptions {
            timeout: Duration::from_secs(self.fetch.timeout_secs.max(1)),
            user_agent: self.fetch.user_agent.clone(),
            max_image_bytes: self.fetch.max_image_bytes,
            max_concurrent: self.fetch.max_concurrent.max(1),
        }
    }

    pub fn render_options(&self) -> RenderOptions {
        RenderOptions {
            max_raster_megapixels: self.render.max_raster_megapixels,
            text: TextLayerOptions {
                draw_decorations: self.render.draw_text_decorations,
            },
            creation_date: None,
        }
    }

    pub fn render_queue_timeout(&self) -> Duration {
        Duration::from_secs(self.render.queue_timeout_secs.max(1))
    }

    pub fn max_body_bytes(&self) -> usize {
        self.server.max_body_mb.saturating_mul(1024 * 1024)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/service/config.rs"]
mod tests;
