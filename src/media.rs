//! Media encoding for transport to the generation capability
//!
//! Uploaded files travel inline as base64 alongside their declared MIME type.
//! Bytes are never transformed, only encoded.

use crate::ai::mime;
use crate::{Error, Result};
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Coarse category of a piece of media, used to pick a flow's code path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Audio,
    Video,
    Document,
    Text,
}

/// A file encoded for inline transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaReference {
    pub mime_type: String,
    /// Standard base64 of the original bytes.
    pub data: String,
}

impl MediaReference {
    /// Encode `bytes` declared as `mime_type`.
    ///
    /// Fails with [`Error::Encoding`] for empty input, a malformed MIME type,
    /// or a MIME type contradicted by the file's magic bytes.
    pub fn encode(bytes: &[u8], mime_type: &str) -> Result<Self> {
        if bytes.is_empty() {
            return Err(Error::Encoding("source file is empty".to_string()));
        }
        let mime_type = mime_type.trim();
        if !is_valid_mime(mime_type) {
            return Err(Error::Encoding(format!(
                "invalid MIME type '{}'",
                mime_type
            )));
        }
        mime::check_declared_mime(mime_type, bytes)?;

        tracing::debug!("Encoded {} bytes as {}", bytes.len(), mime_type);

        Ok(Self {
            mime_type: mime_type.to_string(),
            data: base64::engine::general_purpose::STANDARD.encode(bytes),
        })
    }

    /// Read and encode a file, inferring the MIME type from its extension
    /// when none is given.
    pub async fn from_path(path: &Path, mime_type: Option<&str>) -> Result<Self> {
        let mime_type = match mime_type {
            Some(m) => m.to_string(),
            None => path
                .extension()
                .and_then(|ext| ext.to_str())
                .and_then(mime::mime_from_extension)
                .ok_or_else(|| {
                    Error::Encoding(format!(
                        "cannot infer MIME type for {}",
                        path.display()
                    ))
                })?
                .to_string(),
        };

        let bytes = tokio::fs::read(path).await.map_err(|e| {
            Error::Encoding(format!("failed to read {}: {}", path.display(), e))
        })?;

        Self::encode(&bytes, &mime_type)
    }

    /// Parse a `data:<mime>;base64,<payload>` URI.
    pub fn parse_data_uri(uri: &str) -> Result<Self> {
        let rest = uri
            .strip_prefix("data:")
            .ok_or_else(|| Error::Encoding("data URI must start with 'data:'".to_string()))?;
        let (header, payload) = rest
            .split_once(',')
            .ok_or_else(|| Error::Encoding("data URI has no payload".to_string()))?;
        let mime_type = header.strip_suffix(";base64").ok_or_else(|| {
            Error::Encoding("only base64 data URIs are supported".to_string())
        })?;

        let bytes = base64::engine::general_purpose::STANDARD
            .decode(payload)
            .map_err(|e| Error::Encoding(format!("invalid base64 payload: {}", e)))?;

        Self::encode(&bytes, mime_type)
    }

    pub fn to_data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.data)
    }

    pub fn decode(&self) -> Result<Vec<u8>> {
        base64::engine::general_purpose::STANDARD
            .decode(&self.data)
            .map_err(|e| Error::Encoding(format!("invalid base64 payload: {}", e)))
    }

    pub fn kind(&self) -> MediaKind {
        let mime = self.mime_type.to_ascii_lowercase();
        if mime.starts_with("image/") {
            MediaKind::Image
        } else if mime.starts_with("audio/") {
            MediaKind::Audio
        } else if mime.starts_with("video/") {
            MediaKind::Video
        } else if mime.starts_with("text/") {
            MediaKind::Text
        } else {
            MediaKind::Document
        }
    }

    /// Size of the decoded payload, computed without decoding.
    pub fn decoded_len(&self) -> usize {
        let padding = self.data.bytes().rev().take_while(|b| *b == b'=').count();
        ((self.data.len() / 4) * 3).saturating_sub(padding)
    }
}

fn is_valid_mime(mime_type: &str) -> bool {
    let essence = mime_type.split(';').next().unwrap_or("");
    match essence.split_once('/') {
        Some((kind, sub)) => {
            !kind.is_empty()
                && !sub.is_empty()
                && !essence.contains(char::is_whitespace)
                && !sub.contains('/')
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const PNG: &[u8] = &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

    #[test]
    fn test_encode_rejects_empty_input() {
        let err = MediaReference::encode(&[], "image/png").unwrap_err();
        assert!(matches!(err, Error::Encoding(_)));
    }

    #[test]
    fn test_encode_rejects_malformed_mime() {
        for mime in ["", "png", "image/", "/png", "image/png/x"] {
            let err = MediaReference::encode(PNG, mime).unwrap_err();
            assert!(matches!(err, Error::Encoding(_)), "accepted {:?}", mime);
        }
    }

    #[test]
    fn test_encode_is_pass_through_base64() {
        let media = MediaReference::encode(PNG, "image/png").unwrap();
        assert_eq!(media.mime_type, "image/png");
        assert_eq!(media.decode().unwrap(), PNG);
        assert_eq!(media.decoded_len(), PNG.len());
    }

    #[test]
    fn test_encode_rejects_mismatched_signature() {
        let err = MediaReference::encode(b"%PDF-1.5 body", "image/jpeg").unwrap_err();
        assert!(matches!(err, Error::Encoding(_)));
    }

    #[test]
    fn test_encode_accepts_utf16_notepad_text() {
        let utf16 = [0xFF, 0xFE, b'h', 0, b'i', 0];
        let media = MediaReference::encode(&utf16, "text/plain").unwrap();
        assert_eq!(media.kind(), MediaKind::Text);
        assert_eq!(media.decode().unwrap(), utf16);
    }

    #[test]
    fn test_encode_accepts_heic_photo() {
        let heic = b"\0\0\0\x18ftypheic\0\0\0\0mif1heic";
        let media = MediaReference::encode(heic, "image/heic").unwrap();
        assert_eq!(media.kind(), MediaKind::Image);
    }

    #[test]
    fn test_data_uri_round_trip() {
        let media = MediaReference::encode(b"some notes", "text/plain").unwrap();
        let uri = media.to_data_uri();
        assert!(uri.starts_with("data:text/plain;base64,"));
        assert_eq!(MediaReference::parse_data_uri(&uri).unwrap(), media);
    }

    #[test]
    fn test_parse_data_uri_rejects_non_base64() {
        let err = MediaReference::parse_data_uri("data:text/plain,hello").unwrap_err();
        assert!(matches!(err, Error::Encoding(_)));
        let err = MediaReference::parse_data_uri("https://example.com/a.png").unwrap_err();
        assert!(matches!(err, Error::Encoding(_)));
    }

    #[test]
    fn test_kind_classification() {
        let kind = |mime: &str| {
            MediaReference {
                mime_type: mime.to_string(),
                data: String::new(),
            }
            .kind()
        };
        assert_eq!(kind("image/png"), MediaKind::Image);
        assert_eq!(kind("audio/webm"), MediaKind::Audio);
        assert_eq!(kind("video/mp4"), MediaKind::Video);
        assert_eq!(kind("text/plain"), MediaKind::Text);
        assert_eq!(kind("application/pdf"), MediaKind::Document);
    }

    #[tokio::test]
    async fn test_from_path_infers_mime_from_extension() {
        let mut file = tempfile::Builder::new().suffix(".png").tempfile().unwrap();
        file.write_all(PNG).unwrap();

        let media = MediaReference::from_path(file.path(), None).await.unwrap();
        assert_eq!(media.mime_type, "image/png");
    }

    #[tokio::test]
    async fn test_from_path_missing_file_is_encoding_error() {
        let err = MediaReference::from_path(Path::new("/nonexistent/chart.png"), None)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Encoding(_)));
    }

    #[tokio::test]
    async fn test_from_path_unknown_extension_needs_explicit_mime() {
        let mut file = tempfile::Builder::new().suffix(".bin").tempfile().unwrap();
        file.write_all(b"notes").unwrap();

        assert!(MediaReference::from_path(file.path(), None).await.is_err());
        let media = MediaReference::from_path(file.path(), Some("text/plain"))
            .await
            .unwrap();
        assert_eq!(media.kind(), MediaKind::Text);
    }
}
