use axum::extract::Multipart;
use tracing::{info, warn};

use crate::errors::AppError;
use crate::models::run::InvocationInput;

const PDF_MAGIC: &[u8] = b"%PDF";

/// Extracts resume text from an uploaded file: PDF by magic bytes or `.pdf` name, else UTF-8 text.
pub fn extract_resume_text(file_name: &str, bytes: &[u8]) -> Result<String, AppError> {
    let is_pdf = bytes.starts_with(PDF_MAGIC) || file_name.to_lowercase().ends_with(".pdf");

    let text = if is_pdf {
        info!("Extracting text from PDF resume {file_name:?} ({} bytes)", bytes.len());
        pdf_extract::extract_text_from_mem(bytes).map_err(|e| {
            warn!("PDF extraction failed for {file_name:?}: {e}");
            AppError::Validation(format!("Could not read PDF resume: {e}"))
        })?
    } else {
        String::from_utf8(bytes.to_vec()).map_err(|_| {
            AppError::Validation("Resume must be a PDF or UTF-8 text file".to_string())
        })?
    };

    if text.trim().is_empty() {
        return Err(AppError::Validation(
            "Resume file contains no readable text".to_string(),
        ));
    }
    Ok(text)
}

/// Reads the upload form: a `resume` file plus optional `location`, `jobType` and `keywords` fields.
pub async fn read_upload_form(mut multipart: Multipart) -> Result<InvocationInput, AppError> {
    let mut input = InvocationInput::default();
    let mut resume: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Malformed multipart body: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "resume" => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::Validation(format!("Could not read resume: {e}")))?;
                resume = Some(extract_resume_text(&file_name, &bytes)?);
            }
            "location" | "jobType" | "keywords" => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| AppError::Validation(format!("Could not read {name}: {e}")))?;
                match name.as_str() {
                    "location" => input.location = value,
                    "jobType" => input.job_type = value,
                    _ => input.keywords = value,
                }
            }
            other => warn!("Ignoring unknown upload field {other:?}"),
        }
    }

    input.resume =
        resume.ok_or_else(|| AppError::Validation("Missing 'resume' file field".to_string()))?;
    Ok(input)
}
