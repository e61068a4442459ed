//! Magic-byte sniffing for uploaded media.

use crate::{Error, Result};

const TEXT_BOMS: [&[u8]; 3] = [&[0xEF, 0xBB, 0xBF], &[0xFF, 0xFE], &[0xFE, 0xFF]];

/// Best-effort content type from the leading bytes of a file.
///
/// Returns `None` for content without a recognisable signature (plain text,
/// raw PCM, truncated files). Text starting with a UTF-8 or UTF-16 byte order
/// mark is never taken for a binary format.
pub fn detect_mime(bytes: &[u8]) -> Option<&'static str> {
    if TEXT_BOMS.iter().any(|bom| bytes.starts_with(bom)) {
        return None;
    }
    infer::get(bytes).map(|kind| canonical_detected(kind.mime_type()))
}

/// Guess a MIME type from a file extension.
pub fn mime_from_extension(ext: &str) -> Option<&'static str> {
    match ext.to_ascii_lowercase().as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "webp" => Some("image/webp"),
        "gif" => Some("image/gif"),
        "heic" | "heif" => Some("image/heic"),
        "avif" => Some("image/avif"),
        "pdf" => Some("application/pdf"),
        "txt" | "md" => Some("text/plain"),
        "wav" => Some("audio/wav"),
        "mp3" => Some("audio/mpeg"),
        "ogg" | "oga" => Some("audio/ogg"),
        "flac" => Some("audio/flac"),
        "m4a" => Some("audio/mp4"),
        "webm" => Some("video/webm"),
        "mp4" => Some("video/mp4"),
        _ => None,
    }
}

fn canonical_detected(mime: &'static str) -> &'static str {
    match mime {
        "audio/x-wav" => "audio/wav",
        "audio/m4a" => "audio/mp4",
        "audio/x-flac" => "audio/flac",
        "image/heif" => "image/heic",
        other => other,
    }
}

fn canonical(mime: &str) -> String {
    let essence = mime.split(';').next().unwrap_or(mime).trim();
    match essence.to_ascii_lowercase().as_str() {
        "image/jpg" | "image/pjpeg" => "image/jpeg".to_string(),
        "image/heif" => "image/heic".to_string(),
        "audio/x-wav" | "audio/wave" | "audio/vnd.wave" => "audio/wav".to_string(),
        "audio/mp3" => "audio/mpeg".to_string(),
        "audio/x-m4a" | "audio/m4a" => "audio/mp4".to_string(),
        "audio/x-flac" => "audio/flac".to_string(),
        other => other.to_string(),
    }
}

fn top_level(mime: &str) -> &str {
    mime.split('/').next().unwrap_or(mime)
}

/// Reject a declared MIME type that contradicts the file's signature.
///
/// Unrecognised content is trusted. A recognised signature must agree on the
/// exact type for images and documents; for audio and video containers the
/// top-level type is enough, since the same container is declared several
/// ways (`video/webm` recordings carry only audio, for instance).
pub fn check_declared_mime(declared: &str, bytes: &[u8]) -> Result<()> {
    let Some(detected) = detect_mime(bytes) else {
        tracing::debug!(
            "No signature recognised for declared type {}, trusting caller",
            declared
        );
        return Ok(());
    };

    let declared = canonical(declared);
    if declared == detected {
        return Ok(());
    }

    let media_container = |m: &str| matches!(top_level(m), "audio" | "video");
    if media_container(&declared) && media_container(detected) {
        return Ok(());
    }

    Err(Error::Encoding(format!(
        "declared type {} does not match content ({})",
        declared, detected
    )))
}
