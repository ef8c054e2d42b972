//! Axum route handlers for the resume analysis API.

use axum::{
    extract::{
        multipart::MultipartError, rejection::PathRejection, Multipart, Path, State,
    },
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::analysis::chart::{render, ChartSpec};
use crate::analysis::parser::{MatchPercentage, PercentageSource};
use crate::analysis::service::{build_match_report, run_analysis, AnalysisKind};
use crate::errors::AppError;
use crate::resume::{ResumeFormat, ResumeText};
use crate::state::AppState;

const JOB_DESCRIPTION_FIELD: &str = "job_description";
const RESUME_FIELD: &str = "resume";

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

/// Parsed multipart form: free-text job description plus the resume file.
#[derive(Debug, Default)]
pub struct AnalysisUpload {
    pub job_description: String,
    pub resume: Option<(ResumeFormat, Bytes)>,
}

#[derive(Debug, Serialize)]
pub struct AnalysisResponse {
    pub id: Uuid,
    pub kind: AnalysisKind,
    pub resume_format: ResumeFormat,
    pub response_text: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct MatchResponse {
    pub id: Uuid,
    pub resume_format: ResumeFormat,
    pub match_percentage: MatchPercentage,
    pub percentage_source: PercentageSource,
    pub chart: ChartSpec,
    pub chart_svg: String,
    pub response_text: String,
    pub created_at: DateTime<Utc>,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/resume/analyze
pub async fn handle_analyze(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<AnalysisResponse>, AppError> {
    text_analysis(AnalysisKind::Analyze, &state, multipart).await
}

/// POST /api/v1/resume/improve
pub async fn handle_improve(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<AnalysisResponse>, AppError> {
    text_analysis(AnalysisKind::Improve, &state, multipart).await
}

/// POST /api/v1/resume/match
///
/// Same inputs as analyze, plus the extracted match percentage and its chart.
pub async fn handle_match(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<MatchResponse>, AppError> {
    let upload = read_upload(multipart).await?;
    let resume = require_resume(upload.resume).await?;

    let response_text = run_analysis(
        AnalysisKind::Match,
        &upload.job_description,
        &resume,
        state.generator.as_ref(),
    )
    .await?;

    let report = build_match_report(&response_text);
    info!(
        "Match analysis: {} ({:?})",
        report.extraction.percentage, report.extraction.source
    );

    Ok(Json(MatchResponse {
        id: Uuid::new_v4(),
        resume_format: resume.format,
        match_percentage: report.extraction.percentage,
        percentage_source: report.extraction.source,
        chart: report.chart.spec,
        chart_svg: report.chart.svg,
        response_text,
        created_at: Utc::now(),
    }))
}

/// GET /api/v1/chart/:percentage
///
/// Renders the match chart for a known percentage as `image/svg+xml`.
pub async fn handle_chart(
    percentage: Result<Path<u32>, PathRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Path(percentage) = percentage.map_err(|rejection| {
        AppError::Validation(format!("Invalid percentage: {}", rejection.body_text()))
    })?;
    let percentage = MatchPercentage::new(percentage).ok_or_else(|| {
        AppError::Validation(format!("percentage must be between 0 and 100, got {percentage}"))
    })?;
    let chart = render(percentage);
    Ok(([(header::CONTENT_TYPE, "image/svg+xml")], chart.svg))
}

// ────────────────────────────────────────────────────────────────────────────
// Helpers
// ────────────────────────────────────────────────────────────────────────────

async fn text_analysis(
    kind: AnalysisKind,
    state: &AppState,
    multipart: Multipart,
) -> Result<Json<AnalysisResponse>, AppError> {
    let upload = read_upload(multipart).await?;
    let resume = require_resume(upload.resume).await?;

    let response_text = run_analysis(
        kind,
        &upload.job_description,
        &resume,
        state.generator.as_ref(),
    )
    .await?;

    Ok(Json(AnalysisResponse {
        id: Uuid::new_v4(),
        kind,
        resume_format: resume.format,
        response_text,
        created_at: Utc::now(),
    }))
}

async fn require_resume(resume: Option<(ResumeFormat, Bytes)>) -> Result<ResumeText, AppError> {
    let (format, bytes) =
        resume.ok_or_else(|| AppError::Validation("Please upload your resume".to_string()))?;
    ResumeText::extract(format, bytes).await
}

/// Reads the `job_description` and `resume` fields; unknown fields are ignored.
async fn read_upload(mut multipart: Multipart) -> Result<AnalysisUpload, AppError> {
    let mut upload = AnalysisUpload::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error("Malformed multipart body", e))?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some(JOB_DESCRIPTION_FIELD) => {
                upload.job_description = field
                    .text()
                    .await
                    .map_err(|e| multipart_error("Invalid job_description field", e))?;
            }
            Some(RESUME_FIELD) => {
                let file_name = field.file_name().map(str::to_string);
                let content_type = field.content_type().map(str::to_string);
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| multipart_error("Invalid resume upload", e))?;

                // Browsers send an empty, unnamed part when no file was chosen
                if bytes.is_empty() && file_name.as_deref().unwrap_or("").is_empty() {
                    continue;
                }

                let format = ResumeFormat::detect(content_type.as_deref(), file_name.as_deref())
                    .ok_or_else(|| {
                        AppError::Validation(
                            "Resume must be a PDF or plain text file".to_string(),
                        )
                    })?;
                upload.resume = Some((format, bytes));
            }
            _ => {}
        }
    }

    Ok(upload)
}

/// Body-limit overruns surface as multipart stream errors; keep them distinct from bad input.
fn multipart_error(context: &str, e: MultipartError) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(format!("{context}: {}", e.body_text()))
    } else {
        AppError::Validation(format!("{context}: {}", e.body_text()))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
