use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use base64::Engine as _;

use crate::foundation::error::{PrintError, PrintResult};

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

/// Limits applied to every image source fetched for a render.
#[derive(Clone, Debug)]
pub struct FetchOptions {
    pub timeout: Duration,
    pub user_agent: String,
    pub max_image_bytes: usize,
    /// Fetches in flight per render.
    pub max_concurrent: usize,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            user_agent: DEFAULT_USER_AGENT.to_owned(),
            max_image_bytes: 32 * 1024 * 1024,
            max_concurrent: 8,
        }
    }
}

/// Source of raw image bytes for a URL.
#[async_trait]
pub trait ImageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> PrintResult<Vec<u8>>;
}

/// HTTP(S) fetcher with a browser-like user agent, a request timeout and a body size cap.
#[derive(Clone, Debug)]
pub struct ReqwestFetcher {
    client: reqwest::Client,
    max_bytes: usize,
}

impl ReqwestFetcher {
    pub fn new(opts: &FetchOptions) -> PrintResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(opts.timeout)
            .user_agent(opts.user_agent.clone())
            .build()
            .context("build http client")?;
        Ok(Self {
            client,
            max_bytes: opts.max_image_bytes,
        })
    }
}

#[async_trait]
impl ImageFetcher for ReqwestFetcher {
    async fn fetch(&self, url: &str) -> PrintResult<Vec<u8>> {
        let mut resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| PrintError::asset(format!("request failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(PrintError::asset(format!("http status {status}")));
        }
        if let Some(len) = resp.content_length()
            && len > self.max_bytes as u64
        {
            return Err(PrintError::asset(format!(
                "image is {len} bytes (limit {})",
                self.max_bytes
            )));
        }

        let mut body = Vec::new();
        while let Some(chunk) = resp
            .chunk()
            .await
            .map_err(|e| PrintError::asset(format!("read body: {e}")))?
        {
            if body.len() + chunk.len() > self.max_bytes {
                return Err(PrintError::asset(format!(
                    "image exceeds {} bytes",
                    self.max_bytes
                )));
            }
            body.extend_from_slice(&chunk);
        }
        Ok(body)
    }
}

/// Decode an RFC 2397 `data:` URL. Returns `None` when `url` is not a data URL.
pub fn decode_data_url(url: &str) -> Option<PrintResult<Vec<u8>>> {
    let rest = url.trim().strip_prefix("data:")?;
    let Some((meta, payload)) = rest.split_once(',') else {
        return Some(Err(PrintError::asset("data url has no payload")));
    };

    let is_base64 = meta
        .rsplit(';')
        .next()
        .is_some_and(|p| p.eq_ignore_ascii_case("base64"));
    if is_base64 {
        let cleaned: String = payload.chars().filter(|c| !c.is_ascii_whitespace()).collect();
        return Some(
            base64::engine::general_purpose::STANDARD
                .decode(cleaned.as_bytes())
                .map_err(|e| PrintError::asset(format!("data url base64: {e}"))),
        );
    }
    Some(Ok(percent_decode(payload)))
}

fn percent_decode(s: &str) -> Vec<u8> {
    let b = s.as_bytes();
    let mut out = Vec::with_capacity(b.len());
    let mut i = 0;
    while i < b.len() {
        if b[i] == b'%'
            && i + 2 < b.len()
            && let (Some(h), Some(l)) = (hex_val(b[i + 1]), hex_val(b[i + 2]))
        {
            out.push(h << 4 | l);
            i += 3;
            continue;
        }
        out.push(b[i]);
        i += 1;
    }
    out
}

fn hex_val(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/fetch.rs"]
mod tests;
