use std::{collections::HashMap, path::PathBuf, sync::RwLock};

use anyhow::Context as _;
use async_trait::async_trait;

use crate::{foundation::error::PrintResult, scene::model::SceneDocument};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DocumentKind {
    Design,
    Template,
}

impl DocumentKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Design => "Design",
            Self::Template => "Template",
        }
    }

    fn dir(self) -> &'static str {
        match self {
            Self::Design => "designs",
            Self::Template => "templates",
        }
    }
}

/// A stored design or template. `canvasData` is the scene JSON, usually string-encoded.
#[derive(Clone, Debug, Default, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentRecord {
    #[serde(default)]
    pub canvas_data: Option<serde_json::Value>,
    #[serde(default)]
    pub width: Option<f64>,
    #[serde(default)]
    pub height: Option<f64>,
}

impl DocumentRecord {
    pub fn with_scene(canvas: serde_json::Value) -> Self {
        Self {
            canvas_data: Some(canvas),
            ..Self::default()
        }
    }

    /// Parse the scene. `Ok(None)` when the record has no canvas data at all.
    pub fn scene(&self) -> PrintResult<Option<SceneDocument>> {
        parse_canvas(self.canvas_data.as_ref())
    }

    pub fn size(&self) -> (Option<f64>, Option<f64>) {
        (self.width, self.height)
    }
}

/// Interpret a `canvasData` value: a JSON object or a string holding one.
pub fn parse_canvas(v: Option<&serde_json::Value>) -> PrintResult<Option<SceneDocument>> {
    match v {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(serde_json::Value::String(s)) if s.trim().is_empty() || s.trim() == "null" => Ok(None),
        Some(serde_json::Value::String(s)) => SceneDocument::from_json_str(s).map(Some),
        Some(other) => SceneDocument::from_json_value(other.clone()).map(Some),
    }
}

/// Read contract for designs and templates.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn fetch(&self, kind: DocumentKind, id: &str) -> anyhow::Result<Option<DocumentRecord>>;
}

/// Ids are used as file names, so only `[A-Za-z0-9_-]` is accepted.
pub fn is_valid_id(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= 128
        && id
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-')
}

/// Records stored as `<root>/designs/<id>.json` and `<root>/templates/<id>.json`.
pub struct FilesystemDocumentStore {
    root: PathBuf,
}

impl FilesystemDocumentStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path(&self, kind: DocumentKind, id: &str) -> PathBuf {
        self.root.join(kind.dir()).join(format!("{id}.json"))
    }
}

#[async_trait]
impl DocumentStore for FilesystemDocumentStore {
    async fn fetch(&self, kind: DocumentKind, id: &str) -> anyhow::Result<Option<DocumentRecord>> {
        if !is_valid_id(id) {
            return Ok(None);
        }
        let path = self.path(kind, id);
        let bytes = match tokio::fs::read(&path).await {
            Ok(b) => b,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e).with_context(|| format!("read {}", path.display())),
        };
        let record = serde_json::from_slice(&bytes)
            .with_context(|| format!("parse record {}", path.display()))?;
        Ok(Some(record))
    }
}

/// Store backed by a map, for tests and embedding.
#[derive(Default)]
pub struct InMemoryDocumentStore {
    records: RwLock<HashMap<(DocumentKind, String), DocumentRecord>>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, kind: DocumentKind, id: impl Into<String>, record: DocumentRecord) {
        if let Ok(mut map) = self.records.write() {
            map.insert((kind, id.into()), record);
        }
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn fetch(&self, kind: DocumentKind, id: &str) -> anyhow::Result<Option<DocumentRecord>> {
        let map = self
            .records
            .read()
            .map_err(|_| anyhow::anyhow!("document map lock poisoned"))?;
        Ok(map.get(&(kind, id.to_owned())).cloned())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/service/store.rs"]
mod tests;
