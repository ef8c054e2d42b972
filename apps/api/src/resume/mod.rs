//! Resume ingestion — turns an uploaded file into plain text the model can read.
//!
//! PDF extraction is CPU-bound and runs inside `tokio::task::spawn_blocking`.

use bytes::Bytes;
use serde::Serialize;
use tracing::{debug, info};

use crate::errors::AppError;

/// The upload formats accepted for a resume.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResumeFormat {
    Pdf,
    Text,
}

impl ResumeFormat {
    /// Detects the format from the multipart content type, then the file extension.
    pub fn detect(content_type: Option<&str>, file_name: Option<&str>) -> Option<Self> {
        let by_mime = content_type.and_then(|ct| {
            let essence = ct.split(';').next().unwrap_or(ct).trim().to_ascii_lowercase();
            match essence.as_str() {
                "application/pdf" => Some(ResumeFormat::Pdf),
                "text/plain" | "text/markdown" => Some(ResumeFormat::Text),
                _ => None,
            }
        });

        by_mime.or_else(|| {
            let name = file_name?.to_ascii_lowercase();
            let ext = name.rsplit_once('.')?.1.to_string();
            match ext.as_str() {
                "pdf" => Some(ResumeFormat::Pdf),
                "txt" | "md" => Some(ResumeFormat::Text),
                _ => None,
            }
        })
    }
}

/// Extracted resume content, ready to be sent to the model.
#[derive(Debug, Clone)]
pub struct ResumeText {
    pub format: ResumeFormat,
    pub text: String,
}

impl ResumeText {
    /// Extracts text from raw upload bytes.
    ///
    /// Empty or whitespace-only results are rejected: the model would otherwise
    /// analyse the job description against nothing.
    pub async fn extract(format: ResumeFormat, bytes: Bytes) -> Result<Self, AppError> {
        let text = match format {
            ResumeFormat::Pdf => {
                let size = bytes.len();
                let text = tokio::task::spawn_blocking(move || extract_pdf_text(&bytes))
                    .await
                    // pdf-extract panics on some malformed inputs
                    .map_err(|e| AppError::PdfExtraction(format!("extractor aborted: {e}")))??;
                info!("Extracted {} chars from {} byte PDF", text.len(), size);
                text
            }
            ResumeFormat::Text => String::from_utf8(bytes.to_vec()).map_err(|_| {
                AppError::Validation("Text resume must be valid UTF-8".to_string())
            })?,
        };

        let text = normalize_whitespace(&text);
        if text.is_empty() {
            return Err(AppError::UnprocessableEntity(
                "The uploaded resume contains no readable text".to_string(),
            ));
        }

        debug!("Resume text ready: format={:?}, chars={}", format, text.len());
        Ok(ResumeText { format, text })
    }
}

fn extract_pdf_text(bytes: &[u8]) -> Result<String, AppError> {
    pdf_extract::extract_text_from_mem(bytes).map_err(|e| AppError::PdfExtraction(e.to_string()))
}

/// Trims every line and collapses runs of blank lines left behind by PDF extraction.
fn normalize_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut blank_run = 0;
    for line in text.lines().map(str::trim_end) {
        if line.trim().is_empty() {
            blank_run += 1;
            continue;
        }
        if !out.is_empty() {
            out.push_str(if blank_run > 0 { "\n\n" } else { "\n" });
        }
        out.push_str(line);
        blank_run = 0;
    }
    out
}
