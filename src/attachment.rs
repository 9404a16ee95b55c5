//! Uploaded files are stored inline in the incident record as
//! `data:<mime>;base64,<payload>` URLs.

use base64::Engine;
use chrono::Utc;
use thiserror::Error;

use crate::models::FileAttachment;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum AttachmentError {
    #[error("Not a data URL")]
    NotDataUrl,

    #[error("Only base64 data URLs are supported")]
    NotBase64,

    #[error("Invalid base64 payload")]
    InvalidPayload,
}

/// Build an attachment from raw file bytes. The mime type comes from the
/// browser-supplied hint when present, otherwise from the file extension.
pub fn encode_attachment(name: &str, bytes: &[u8], mime_hint: Option<&str>) -> FileAttachment {
    let mime_type = match mime_hint.map(str::trim) {
        Some(hint) if !hint.is_empty() => hint.to_string(),
        _ => mime_guess::from_path(name)
            .first_or_octet_stream()
            .essence_str()
            .to_string(),
    };
    let payload = base64::engine::general_purpose::STANDARD.encode(bytes);

    tracing::debug!(file = name, size = bytes.len(), mime = %mime_type, "Attachment encoded");
    FileAttachment {
        name: name.to_string(),
        url: format!("data:{mime_type};base64,{payload}"),
        mime_type,
        size: bytes.len() as u64,
        uploaded_at: Utc::now(),
    }
}

/// Decode the bytes carried by a base64 data URL.
pub fn decode_data_url(url: &str) -> Result<Vec<u8>, AttachmentError> {
    let rest = url.strip_prefix("data:").ok_or(AttachmentError::NotDataUrl)?;
    let (meta, payload) = rest.split_once(',').ok_or(AttachmentError::NotDataUrl)?;
    if !meta.ends_with(";base64") {
        return Err(AttachmentError::NotBase64);
    }
    base64::engine::general_purpose::STANDARD
        .decode(payload)
        .map_err(|_| AttachmentError::InvalidPayload)
}

impl FileAttachment {
    /// Bytes of the stored file.
    pub fn contents(&self) -> Result<Vec<u8>, AttachmentError> {
        decode_data_url(&self.url)
    }
}
