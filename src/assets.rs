use std::sync::Arc;

pub mod decode;
pub mod fetch;
pub mod placeholder;
pub mod store;

/// Font database shared by SVG decoding and placeholder labels. Loading system fonts is slow,
/// so build this once per process.
pub fn system_fontdb() -> Arc<usvg::fontdb::Database> {
    let mut db = usvg::fontdb::Database::new();
    db.load_system_fonts();
    tracing::debug!(faces = db.len(), "loaded system fonts");
    Arc::new(db)
}
