/// Failures of the document extraction pipeline (text layer and OCR).
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("OCR unavailable: `{0}` not found on PATH")]
    OcrUnavailable(&'static str),

    #[error("{tool} failed: {stderr}")]
    ToolFailed { tool: &'static str, stderr: String },

    #[error("no German menu page found")]
    NoGermanPage,

    #[error("PDF error: {0}")]
    Pdf(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ExtractError {
    pub fn tool_failed(tool: &'static str, stderr: &[u8]) -> Self {
        ExtractError::ToolFailed {
            tool,
            stderr: String::from_utf8_lossy(stderr).trim().to_string(),
        }
    }
}
