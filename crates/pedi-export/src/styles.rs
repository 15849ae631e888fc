use serde::{Deserialize, Serialize};

/// Fonts and sizes for DOCX handouts. Sizes are in points.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentStyles {
    pub body_font: String,
    pub heading_font: String,
    pub body_size: usize,
    pub heading1_size: usize,
    pub heading2_size: usize,
    /// Colour of the capped-dose and note lines, as RRGGBB hex.
    pub note_color: String,
}

impl Default for DocumentStyles {
    fn default() -> Self {
        Self {
            body_font: "Calibri".to_string(),
            heading_font: "Calibri".to_string(),
            body_size: 11,
            heading1_size: 16,
            heading2_size: 13,
            note_color: "7F1D1D".to_string(),
        }
    }
}
