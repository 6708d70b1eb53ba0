//! Text extraction from uploaded study files
//!
//! Only PDF documents and PPTX slide decks are accepted. The file type is
//! decided by extension alone.

pub mod pdf;
pub mod pptx;

use std::path::Path;
use tracing::info;

use crate::errors::{Result, ServiceError};

pub const UNSUPPORTED_TYPE: &str = "Unsupported file type. Only PDF or PPTX is allowed.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    Pdf,
    Slides,
}

impl FileType {
    /// Detect by extension, case-insensitively
    pub fn detect(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();

        match ext.as_str() {
            "pdf" => Ok(FileType::Pdf),
            "pptx" | "ppt" => Ok(FileType::Slides),
            _ => Err(ServiceError::InvalidInput(UNSUPPORTED_TYPE.to_string())),
        }
    }
}

/// Plain text of a PDF or slide deck, trimmed
pub fn extract_text(path: &Path) -> Result<String> {
    if !path.exists() {
        return Err(ServiceError::NotFound("File not found.".to_string()));
    }

    let text = match FileType::detect(path)? {
        FileType::Pdf => pdf::extract(path)?,
        FileType::Slides => pptx::extract(path)?,
    };

    info!(path = %path.display(), chars = text.len(), "text extracted");
    Ok(text)
}
