//! Highlight clip handlers.
//!
//! `generate_clip` downloads the source footage into a per-request scratch
//! directory, plans segments around the requested markers, cuts and joins
//! them, and returns the finished MP4. `plan_clip` runs only the planning
//! step so callers can preview what would be cut.

use std::time::Instant;

use axum::body::Body;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::Response;
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

use vigil_media::{assemble_highlight, download_source, MediaError};
use vigil_models::{
    format_duration_label, select_markers, ClipPlan, EventAction, MarkerFilter, Segment,
    SegmentPlanner, Severity, TimelineEvent,
};

use crate::error::{ApiError, ApiResult};
use crate::metrics;
use crate::state::AppState;

/// Upper bound on markers per request.
const MAX_MARKERS: u64 = 1000;

/// Upper bound on timeline events per request.
const MAX_EVENTS: u64 = 5000;

// ============================================================================
// Requests
// ============================================================================

/// Marker fields shared by the generate and plan endpoints.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct MarkerRequest {
    /// Explicit markers (MM:SS or HH:MM:SS)
    #[serde(default)]
    #[validate(length(max = MAX_MARKERS))]
    pub timestamps: Vec<String>,

    /// Context window in seconds; server default when absent
    #[serde(default)]
    #[validate(range(max = 86400))]
    pub context_seconds: Option<i64>,

    /// Analysis timeline to pick additional markers from
    #[serde(default)]
    #[validate(length(max = MAX_EVENTS))]
    pub events: Vec<TimelineEvent>,

    /// Only events at or above this severity become markers
    #[serde(default)]
    pub min_severity: Option<Severity>,

    /// Only events with one of these actions become markers; empty allows all
    #[serde(default)]
    pub actions: Vec<EventAction>,
}

impl MarkerRequest {
    /// Explicit timestamps followed by the selected timeline events.
    pub fn markers(&self) -> Vec<String> {
        let filter = MarkerFilter {
            min_severity: self.min_severity,
            actions: self.actions.clone(),
        };

        let mut markers = self.timestamps.clone();
        markers.extend(select_markers(&self.events, &filter));
        markers
    }

    /// Planner for this request, falling back to `default_context_secs`.
    pub fn planner(&self, default_context_secs: u64) -> ApiResult<SegmentPlanner> {
        match self.context_seconds {
            Some(secs) => Ok(SegmentPlanner::new(secs)?),
            None => Ok(SegmentPlanner::with_context_secs(default_context_secs)),
        }
    }

    fn plan(&self, default_context_secs: u64) -> ApiResult<ClipPlan> {
        let markers = self.markers();
        Ok(self.planner(default_context_secs)?.plan(markers.as_slice())?)
    }
}

/// Request to generate a highlight clip.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct GenerateClipRequest {
    /// Source footage URL (http/https)
    #[serde(default)]
    pub video_url: String,

    #[serde(flatten)]
    #[validate(nested)]
    pub markers: MarkerRequest,
}

// ============================================================================
// Responses
// ============================================================================

/// Planning result returned by `/api/clips/plan`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanResponse {
    pub segments: Vec<Segment>,
    pub context_seconds: u64,
    pub total_duration_secs: u64,
    /// e.g. "1 min 5 sec"
    pub total_duration_label: String,
}

impl From<&ClipPlan> for PlanResponse {
    fn from(plan: &ClipPlan) -> Self {
        Self {
            segments: plan.segments().to_vec(),
            context_seconds: plan.context_secs(),
            total_duration_secs: plan.total_duration_secs(),
            total_duration_label: format_duration_label(plan.total_duration_secs()),
        }
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// Preview the segments a set of markers would produce.
pub async fn plan_clip(
    State(state): State<AppState>,
    Json(request): Json<MarkerRequest>,
) -> ApiResult<Json<PlanResponse>> {
    request
        .validate()
        .map_err(|e| ApiError::Validation(e.to_string()))?;

    let plan = request.plan(state.config.context_secs)?;

    Ok(Json(PlanResponse::from(&plan)))
}

/// Generate a highlight clip and return it as an MP4 attachment.
pub async fn generate_clip(
    State(state): State<AppState>,
    Json(request): Json<GenerateClipRequest>,
) -> ApiResult<Response> {
    if request.video_url.trim().is_empty()
        || (request.markers.timestamps.is_empty() && request.markers.events.is_empty())
    {
        return Err(ApiError::missing_input());
    }

    request
        .validate()
        .map_err(|e| ApiError::Validation(e.to_string()))?;

    let source_url = state
        .source_policy
        .validate(&request.video_url)
        .into_result()
        .map_err(ApiError::bad_request)?;

    // Selection can leave nothing even when events were sent
    if request.markers.markers().is_empty() {
        return Err(ApiError::missing_input());
    }

    let plan = request.markers.plan(state.config.context_secs)?;

    let job_id = Uuid::new_v4();
    info!(
        job_id = %job_id,
        segments = plan.len(),
        planned_secs = plan.total_duration_secs(),
        "Generating highlight clip"
    );

    // Removed on drop, whichever way this request ends
    tokio::fs::create_dir_all(&state.config.work_dir)
        .await
        .map_err(MediaError::from)?;
    let work_dir = tempfile::Builder::new()
        .prefix("vigil-")
        .tempdir_in(&state.config.work_dir)
        .map_err(MediaError::from)?;

    let source = work_dir.path().join("input.mp4");
    let started = Instant::now();
    let bytes = download_source(&state.http, source_url.as_str(), &source)
        .await
        .inspect_err(|e| {
            warn!(job_id = %job_id, "Source download failed: {}", e);
            metrics::record_clip_failed("download");
        })?;
    metrics::record_download_duration(started.elapsed().as_secs_f64());
    info!(job_id = %job_id, bytes = bytes, "Source footage ready");

    let output = work_dir.path().join("output.mp4");
    let started = Instant::now();
    let clip = assemble_highlight(
        state.assembler.as_ref(),
        &source,
        &plan,
        work_dir.path(),
        &output,
        state.config.max_parallel,
    )
    .await
    .inspect_err(|e| {
        warn!(job_id = %job_id, "Clip assembly failed: {}", e);
        metrics::record_clip_failed("assemble");
    })?;
    metrics::record_ffmpeg_duration(started.elapsed().as_secs_f64());

    let body = tokio::fs::read(&clip.path).await.map_err(MediaError::from)?;
    metrics::record_clip_generated(clip.segment_count);

    info!(
        job_id = %job_id,
        segments = clip.segment_count,
        bytes = body.len(),
        "Highlight clip generated"
    );

    let filename = format!("clip-{}.mp4", Utc::now().timestamp_millis());

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "video/mp4")
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", filename),
        )
        .header(header::CONTENT_LENGTH, body.len())
        .body(Body::from(body))
        .map_err(|e| ApiError::internal(format!("Failed to build response: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(timestamp: &str, severity: Severity) -> TimelineEvent {
        TimelineEvent {
            timestamp: timestamp.to_string(),
            action: EventAction::Suspicious,
            description: String::new(),
            screenshot: None,
            severity,
        }
    }

    #[test]
    fn test_markers_combine_timestamps_and_events() {
        let request = MarkerRequest {
            timestamps: vec!["00:10".to_string()],
            events: vec![event("00:40", Severity::High), event("01:00", Severity::Low)],
            min_severity: Some(Severity::Medium),
            ..Default::default()
        };
        assert_eq!(request.markers(), vec!["00:10", "00:40"]);
    }

    #[test]
    fn test_planner_defaults_to_config() {
        let request = MarkerRequest::default();
        assert_eq!(request.planner(7).unwrap().context_secs(), 7);

        let request = MarkerRequest {
            context_seconds: Some(2),
            ..Default::default()
        };
        assert_eq!(request.planner(7).unwrap().context_secs(), 2);
    }

    #[test]
    fn test_negative_context_is_rejected() {
        let request = MarkerRequest {
            context_seconds: Some(-3),
            ..Default::default()
        };
        assert!(matches!(request.planner(5), Err(ApiError::Plan(_))));
    }

    #[test]
    fn test_generate_request_deserializes_camel_case() {
        let request: GenerateClipRequest = serde_json::from_value(serde_json::json!({
            "videoUrl": "https://footage.example.com/cam1.mp4",
            "timestamps": ["00:10", "01:00"],
            "contextSeconds": 3,
            "minSeverity": "high"
        }))
        .unwrap();

        assert_eq!(request.video_url, "https://footage.example.com/cam1.mp4");
        assert_eq!(request.markers.timestamps.len(), 2);
        assert_eq!(request.markers.context_seconds, Some(3));
        assert_eq!(request.markers.min_severity, Some(Severity::High));
    }

    #[test]
    fn test_plan_response_shape() {
        let plan = SegmentPlanner::default().plan(&["00:10", "01:00"]).unwrap();
        let response = serde_json::to_value(PlanResponse::from(&plan)).unwrap();

        assert_eq!(
            response,
            serde_json::json!({
                "segments": [
                    { "start": "00:05", "end": "00:15", "duration": 10 },
                    { "start": "00:55", "end": "01:05", "duration": 10 }
                ],
                "contextSeconds": 5,
                "totalDurationSecs": 20,
                "totalDurationLabel": "20 sec"
            })
        );
    }
}
