// PDF text, page by page
use std::path::Path;

use crate::errors::{Result, ServiceError};

/// Pages joined by newlines, trimmed
pub fn extract(path: &Path) -> Result<String> {
    let pages = pdf_extract::extract_text_by_pages(path)
        .map_err(|e| ServiceError::ProcessingFailure(format!("Failed to read PDF: {}", e)))?;

    Ok(pages.join("\n").trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_garbage_pdf_is_processing_failure() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.pdf");
        std::fs::write(&path, b"this is not a pdf").unwrap();
        assert!(matches!(extract(&path), Err(ServiceError::ProcessingFailure(_))));
    }
}
