//! Magic-byte signature detection.
//!
//! `detect` looks only at the leading bytes of a resource and never at the
//! server-declared type. `classify` layers the Content-Type header underneath
//! as a weaker signal for buffers no recognizer understands.

pub mod container;
pub mod signatures;

use serde::Serialize;
use tracing::{debug, trace};

use self::signatures::RECOGNIZERS;

pub const PDF_MIME: &str = "application/pdf";
pub const OCTET_STREAM: &str = "application/octet-stream";

/// Content-Type values that carry no information about the payload.
pub const GENERIC_MIME_TYPES: &[&str] = &[
    "application/octet-stream",
    "binary/octet-stream",
    "application/force-download",
    "application/x-download",
    "application/unknown",
    "unknown/unknown",
];

/// How a MIME type was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DetectionMethod {
    MagicBytes,
    ContentTypeHeader { generic: bool },
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DetectionResult {
    pub mime_type: Option<String>,
    pub method: DetectionMethod,
}

impl DetectionResult {
    pub fn unknown() -> Self {
        Self {
            mime_type: None,
            method: DetectionMethod::Unknown,
        }
    }

    pub fn magic(mime_type: &str) -> Self {
        Self {
            mime_type: Some(mime_type.to_string()),
            method: DetectionMethod::MagicBytes,
        }
    }

    pub fn is_magic(&self, mime_type: &str) -> bool {
        self.method == DetectionMethod::MagicBytes && self.mime_type.as_deref() == Some(mime_type)
    }
}

/// Runs the recognizers in priority order; first match wins.
pub fn detect(bytes: &[u8]) -> Option<&'static str> {
    trace!(
        "[Detect] {} bytes, head: {}",
        bytes.len(),
        hex_preview(bytes, 16)
    );

    for recognizer in RECOGNIZERS {
        if let Some(mime) = recognizer.recognize(bytes) {
            debug!("[Detect] {} matched -> {}", recognizer.name(), mime);
            return Some(mime);
        }
    }

    debug!("[Detect] No signature matched ({} bytes)", bytes.len());
    None
}

/// Magic bytes first, then the Content-Type header.
pub fn classify(bytes: &[u8], content_type: Option<&str>) -> DetectionResult {
    if let Some(mime) = detect(bytes) {
        return DetectionResult::magic(mime);
    }
    from_content_type(content_type)
}

/// Builds a result from the Content-Type header alone.
pub fn from_content_type(content_type: Option<&str>) -> DetectionResult {
    let Some(raw) = content_type.filter(|v| !v.trim().is_empty()) else {
        return DetectionResult::unknown();
    };

    let essence = raw.split(';').next().unwrap_or(raw).trim().to_string();
    let lowered = raw.to_ascii_lowercase();
    let generic = GENERIC_MIME_TYPES.iter().any(|g| lowered.contains(g));

    DetectionResult {
        mime_type: Some(essence),
        method: DetectionMethod::ContentTypeHeader { generic },
    }
}

fn hex_preview(bytes: &[u8], limit: usize) -> String {
    bytes
        .iter()
        .take(limit)
        .map(|b| format!("{:02x}", b))
        .collect::<Vec<_>>()
        .join(" ")
}
