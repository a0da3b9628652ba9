/// Display category of a file, derived from its extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileCategory {
    Pdf,
    Text,
    WordDoc,
    Image,
    Generic,
}

impl FileCategory {
    pub fn classify(file_name: &str) -> Self {
        match extension_of(file_name).as_deref() {
            Some("pdf") => Self::Pdf,
            Some("txt") => Self::Text,
            Some("doc") | Some("docx") => Self::WordDoc,
            Some("jpg") | Some("jpeg") | Some("png") | Some("gif") | Some("bmp") | Some("webp") => {
                Self::Image
            }
            _ => Self::Generic,
        }
    }

    pub fn icon(self) -> &'static str {
        match self {
            Self::Pdf => "📕",
            Self::Text => "📝",
            Self::WordDoc => "📘",
            Self::Image => "🖼",
            Self::Generic => "📄",
        }
    }
}

/// Lowercased substring after the last `.`, if any.
pub fn extension_of(file_name: &str) -> Option<String> {
    file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_lowercase())
        .filter(|ext| !ext.is_empty())
}

pub fn is_accepted(file_name: &str, accepted: &[String]) -> bool {
    if accepted.is_empty() {
        return true;
    }
    extension_of(file_name)
        .map(|ext| accepted.iter().any(|a| a.eq_ignore_ascii_case(&ext)))
        .unwrap_or(false)
}

pub fn content_type_for(file_name: &str) -> &'static str {
    match extension_of(file_name).as_deref() {
        Some("pdf") => "application/pdf",
        Some("txt") => "text/plain",
        Some("doc") => "application/msword",
        Some("docx") => {
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
        }
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("bmp") => "image/bmp",
        Some("webp") => "image/webp",
        Some("json") => "application/json",
        _ => "application/octet-stream",
    }
}
