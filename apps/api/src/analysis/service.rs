//! Analysis pipeline — builds the request parts, calls the generator, and for the
//! match action turns the response into a percentage and a chart.
//!
//! Flow: job description + resume text + prompt → TextGenerator → response text
//!       → (match only) extract_match → render.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::analysis::chart::{render, ChartArtifact};
use crate::analysis::parser::{extract_match, PercentageExtraction, PercentageSource};
use crate::analysis::prompts::{
    ANALYZE_PROMPT, IMPROVE_PROMPT, JOB_DESCRIPTION_PART_TEMPLATE, MATCH_PROMPT,
    RESUME_PART_TEMPLATE,
};
use crate::errors::AppError;
use crate::llm_client::TextGenerator;
use crate::resume::ResumeText;

/// The three actions a caller can request for a resume.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisKind {
    /// Strengths, weaknesses and overall fit.
    Analyze,
    /// Skill gaps and a learning plan.
    Improve,
    /// ATS-style scan with a match percentage.
    Match,
}

impl AnalysisKind {
    pub fn prompt(self) -> &'static str {
        match self {
            AnalysisKind::Analyze => ANALYZE_PROMPT,
            AnalysisKind::Improve => IMPROVE_PROMPT,
            AnalysisKind::Match => MATCH_PROMPT,
        }
    }
}

/// Percentage and chart derived from a match response.
#[derive(Debug, Clone, Serialize)]
pub struct MatchReport {
    pub extraction: PercentageExtraction,
    pub chart: ChartArtifact,
}

/// Orders the request parts: job description, resume, instruction prompt.
pub fn build_parts(kind: AnalysisKind, job_description: &str, resume: &ResumeText) -> Vec<String> {
    vec![
        JOB_DESCRIPTION_PART_TEMPLATE.replace("{job_description}", job_description.trim()),
        RESUME_PART_TEMPLATE.replace("{resume_text}", &resume.text),
        kind.prompt().to_string(),
    ]
}

/// Sends one analysis request and returns the raw model text.
pub async fn run_analysis(
    kind: AnalysisKind,
    job_description: &str,
    resume: &ResumeText,
    generator: &dyn TextGenerator,
) -> Result<String, AppError> {
    if job_description.trim().is_empty() {
        // Allowed: the model still reviews the resume on its own.
        info!("Running {:?} analysis without a job description", kind);
    }

    let parts = build_parts(kind, job_description, resume);
    let text = generator
        .generate(&parts)
        .await
        .map_err(|e| AppError::Llm(format!("{kind:?} analysis failed: {e}")))?;

    info!("{:?} analysis complete: {} chars", kind, text.len());
    Ok(text)
}

/// Reads the match percentage out of the response text and renders its chart.
pub fn build_match_report(response_text: &str) -> MatchReport {
    let extraction = extract_match(response_text);
    match extraction.source {
        PercentageSource::Structured => {}
        PercentageSource::Heuristic => warn!(
            "No 'Match Percentage' line in response; using first standalone number {}",
            extraction.percentage
        ),
        PercentageSource::Default => {
            warn!("No percentage found in response; defaulting to 0")
        }
    }

    MatchReport {
        extraction,
        chart: render(extraction.percentage),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::llm_client::LlmError;
    use crate::resume::ResumeFormat;

    struct RecordingGenerator {
        reply: Result<String, ()>,
        seen: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl TextGenerator for RecordingGenerator {
        async fn generate(&self, parts: &[String]) -> Result<String, LlmError> {
            self.seen.lock().unwrap().extend(parts.iter().cloned());
            self.reply.clone().map_err(|_| LlmError::EmptyContent)
        }
    }

    fn resume() -> ResumeText {
        ResumeText {
            format: ResumeFormat::Text,
            text: "Rust engineer, 6 years, tokio and axum".to_string(),
        }
    }

    #[test]
    fn test_each_kind_has_its_prompt() {
        assert!(AnalysisKind::Analyze.prompt().contains("Technical HR Manager"));
        assert!(AnalysisKind::Improve.prompt().contains("Career Advisor"));
        assert!(AnalysisKind::Match.prompt().contains("Match Percentage:"));
    }

    #[test]
    fn test_build_parts_order() {
        let parts = build_parts(AnalysisKind::Match, "  Backend role, Rust  ", &resume());
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "Job Description:\nBackend role, Rust");
        assert!(parts[1].starts_with("Resume:\n"));
        assert!(parts[1].contains("tokio"));
        assert_eq!(parts[2], MATCH_PROMPT);
    }

    #[tokio::test]
    async fn test_run_analysis_returns_generator_text() {
        let generator = RecordingGenerator {
            reply: Ok("Strong candidate".to_string()),
            seen: Mutex::new(vec![]),
        };
        let text = run_analysis(AnalysisKind::Analyze, "Rust", &resume(), &generator)
            .await
            .unwrap();
        assert_eq!(text, "Strong candidate");
        let seen = generator.seen.lock().unwrap();
        assert_eq!(seen.len(), 3);
        assert_eq!(seen[2], ANALYZE_PROMPT);
    }

    #[tokio::test]
    async fn test_run_analysis_maps_generator_failure() {
        let generator = RecordingGenerator {
            reply: Err(()),
            seen: Mutex::new(vec![]),
        };
        let err = run_analysis(AnalysisKind::Improve, "", &resume(), &generator)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Llm(_)));
    }

    #[test]
    fn test_match_report_structured() {
        let report = build_match_report("- **Match Percentage:** 82%\n- **Missing Keywords:** Go");
        assert_eq!(report.extraction.percentage.value(), 82);
        assert_eq!(report.extraction.source, PercentageSource::Structured);
        assert_eq!(report.chart.spec.slices[1].value, 18);
    }

    #[test]
    fn test_match_report_unparseable_defaults_to_zero_chart() {
        let report = build_match_report("The model declined to score this resume.");
        assert_eq!(report.extraction.percentage.value(), 0);
        assert_eq!(report.extraction.source, PercentageSource::Default);
        assert_eq!(report.chart.spec.slices[1].value, 100);
    }
}
