use super::AppState;
use crate::core::{AnalysisResponse, InputMeta, RequestContext, fallback_response};
use crate::error::GaugeError;
use crate::quality::{self, QualityInput};
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};
use serde::Deserialize;

/// POST /api/face/analyze request body. Unknown fields from older client
/// revisions are ignored.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct AnalyzeRequest {
    pub front_image: String,
    #[serde(default)]
    pub side_image: Option<String>,
    #[serde(default)]
    pub premium_enabled: bool,
}

/// GET /health — always public.
pub(super) async fn handle_health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

/// POST /api/face/analyze — provider call plus scoring pipeline.
pub(super) async fn handle_analyze(
    State(state): State<AppState>,
    body: Result<Json<AnalyzeRequest>, JsonRejection>,
) -> axum::response::Response {
    let Ok(Json(request)) = body else {
        let err = serde_json::json!({ "error": "invalid request body" });
        return (StatusCode::BAD_REQUEST, Json(err)).into_response();
    };
    if request.front_image.trim().is_empty() {
        let err = serde_json::json!({ "error": "front image is required" });
        return (StatusCode::BAD_REQUEST, Json(err)).into_response();
    }

    // Advisory pre-flight check; the authoritative photo-quality report
    // comes back from the model and is validated by the pipeline.
    let precheck = quality::run_quality_checks(&QualityInput {
        dimensions: None,
        has_front_photo: true,
        has_side_photo: request.side_image.is_some(),
    });
    tracing::debug!(
        score = precheck.score,
        issues = ?precheck.issues,
        "pre-flight capture check"
    );

    let ctx = RequestContext {
        premium_enabled: request.premium_enabled,
        input: InputMeta {
            has_secondary_photo: request.side_image.is_some(),
            ..InputMeta::default()
        },
    };
    tracing::info!(
        premium = ctx.premium_enabled,
        side_photo = ctx.input.has_secondary_photo,
        "analyzing capture"
    );

    match analyze(&state, &request, &ctx).await {
        Ok(response) => {
            tracing::info!(
                current = response.overall.current_score10,
                potential = response.overall.potential_score10,
                "analysis complete"
            );
            Json(response).into_response()
        }
        Err(err) => {
            // Demo never breaks: a failed analysis serves the deterministic
            // fallback for the requested tier.
            tracing::warn!(error = %err, "analysis failed, serving fallback response");
            Json(fallback_response(ctx.premium_enabled)).into_response()
        }
    }
}

async fn analyze(
    state: &AppState,
    request: &AnalyzeRequest,
    ctx: &RequestContext,
) -> Result<AnalysisResponse, GaugeError> {
    let text = state
        .provider
        .analyze(
            &request.front_image,
            request.side_image.as_deref(),
            request.premium_enabled,
        )
        .await?;
    Ok(state.pipeline.run_text(&text, ctx)?)
}
