use crate::error::ExtractError;
use tracing::debug;

/// Text layers with fewer alphanumeric characters than this are treated as scans.
pub const MIN_TEXT_CHARS: usize = 40;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PdfKind {
    TextBased,
    ImageBased,
}

#[derive(Debug, Clone)]
pub struct PdfDocument {
    pub text: String,
    pub kind: PdfKind,
}

pub fn extract_text(bytes: &[u8]) -> Result<String, ExtractError> {
    pdf_extract::extract_text_from_mem(bytes).map_err(|err| ExtractError::Pdf(err.to_string()))
}

pub fn classify(text: &str) -> PdfKind {
    let chars = text.chars().filter(|c| c.is_alphanumeric()).count();
    if chars < MIN_TEXT_CHARS {
        PdfKind::ImageBased
    } else {
        PdfKind::TextBased
    }
}

pub fn load_document(bytes: &[u8]) -> PdfDocument {
    match extract_text(bytes) {
        Ok(text) => {
            let kind = classify(&text);
            debug!(?kind, chars = text.len(), "read PDF text layer");
            PdfDocument { text, kind }
        }
        Err(err) => {
            debug!(%err, "no usable text layer, treating PDF as image-based");
            PdfDocument {
                text: String::new(),
                kind: PdfKind::ImageBased,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sparse_text_layer_is_image_based() {
        assert_eq!(classify(""), PdfKind::ImageBased);
        assert_eq!(classify("  \n 1 \n  Seite 1 \n"), PdfKind::ImageBased);
    }

    #[test]
    fn dense_text_layer_is_text_based() {
        let text = "Montag\nRindsgulasch mit Semmelknödel\nDienstag\nGebackener Karpfen\n";
        assert_eq!(classify(text), PdfKind::TextBased);
    }

    #[test]
    fn unreadable_bytes_fall_back_to_image() {
        let doc = load_document(b"definitely not a pdf");
        assert_eq!(doc.kind, PdfKind::ImageBased);
        assert!(doc.text.is_empty());
    }
}
