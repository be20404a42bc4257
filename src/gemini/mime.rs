use std::path::Path;

pub const GEMINI_MIME: &str = "text/gemini";

const DEFAULT_MIME: &str = "application/octet-stream";

/// Picks the MIME type for a resource from its file extension.
pub fn mime_type_for(path: &Path) -> &'static str {
    let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
        return DEFAULT_MIME;
    };

    match ext.to_ascii_lowercase().as_str() {
        "gmi" | "gemini" => GEMINI_MIME,
        "txt" => "text/plain",
        "md" => "text/markdown",
        "html" | "htm" => "text/html",
        "css" => "text/css",
        "csv" => "text/csv",
        "xml" => "text/xml",
        "json" => "application/json",
        "pdf" => "application/pdf",
        "zip" => "application/zip",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "webp" => "image/webp",
        "mp3" => "audio/mpeg",
        "ogg" => "audio/ogg",
        _ => DEFAULT_MIME,
    }
}
