use axum::{
    Json,
    body::Bytes,
    extract::State,
    http::{StatusCode, header},
    response::IntoResponse,
};
use serde_json::json;

use crate::{
    geometry::page::RenderSettings,
    scene::model::SceneDocument,
    service::{
        error::{ServiceError, ServiceResult},
        state::AppState,
        store::{DocumentKind, parse_canvas},
    },
};

/// Body of `POST /designs/pdf`.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PdfRequest {
    #[serde(default)]
    pub design_id: Option<String>,
    #[serde(default)]
    pub template_id: Option<String>,
    /// Inline scene, used only when neither id is given.
    #[serde(default)]
    pub canvas_data: Option<serde_json::Value>,
    #[serde(default)]
    pub settings: Option<RenderSettings>,
}

impl PdfRequest {
    fn id(v: &Option<String>) -> Option<&str> {
        v.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }
}

pub async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

pub async fn generate_pdf(
    State(state): State<AppState>,
    body: Bytes,
) -> ServiceResult<impl IntoResponse> {
    let req: PdfRequest = if body.iter().all(u8::is_ascii_whitespace) {
        PdfRequest::default()
    } else {
        serde_json::from_slice(&body).map_err(|e| ServiceError::InvalidRequest(e.to_string()))?
    };
    let (scene, record_size) = load_scene(&state, &req).await?;
    let scene = scene.ok_or(ServiceError::MissingInput)?;
    let settings = req.settings.unwrap_or_default();
    settings.validate()?;

    let _permit = tokio::time::timeout(
        state.config.render_queue_timeout(),
        state.render_permits.clone().acquire_owned(),
    )
    .await
    .map_err(|_| ServiceError::GenerationFailed("timed out waiting for a free renderer".to_owned()))?
    .map_err(|e| ServiceError::GenerationFailed(format!("render queue closed: {e}")))?;

    tracing::info!(
        format = %settings.format,
        orientation = %settings.orientation,
        dpi = settings.dpi,
        objects = scene.objects.len(),
        "pdf render started"
    );
    let rendered = state
        .renderer
        .render_pdf(scene, &settings, record_size)
        .await?;
    tracing::info!(
        bytes = rendered.bytes.len(),
        failed_images = rendered.failed_images,
        text_objects = rendered.text_objects,
        "pdf render finished"
    );

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "application/pdf".to_owned()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", rendered.filename),
            ),
        ],
        rendered.bytes,
    ))
}

/// `designId` wins over `templateId`; inline `canvasData` is the last resort.
async fn load_scene(
    state: &AppState,
    req: &PdfRequest,
) -> ServiceResult<(Option<SceneDocument>, (Option<f64>, Option<f64>))> {
    let lookup = if let Some(id) = PdfRequest::id(&req.design_id) {
        Some((DocumentKind::Design, id))
    } else {
        PdfRequest::id(&req.template_id).map(|id| (DocumentKind::Template, id))
    };

    let Some((kind, id)) = lookup else {
        return Ok((parse_canvas(req.canvas_data.as_ref())?, (None, None)));
    };

    let record = state
        .store
        .fetch(kind, id)
        .await
        .map_err(|e| ServiceError::GenerationFailed(format!("{e:#}")))?
        .ok_or(ServiceError::NotFound(kind))?;
    Ok((record.scene()?, record.size()))
}
