use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use lazy_static::lazy_static;
use regex::Regex;
use thiserror::Error;

lazy_static! {
    static ref DATA_IMAGE_SRC: Regex = Regex::new(r#"src\s*=\s*"(data:[^"]+)""#)
        .expect("Invalid DATA_IMAGE_SRC regex pattern");
}

const SCHEME: &str = "data:";

/// An embedded image decoded out of a self-describing `data:` reference.
///
/// The extension is the media-type subtype verbatim: `image/jpeg` yields
/// `jpeg`, not `jpg`. Callers must not read a container format into it
/// beyond what the subtype names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataImage {
    pub payload: Vec<u8>,
    pub extension: String,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("data reference has no payload separator")]
    MissingPayload,
    #[error("data reference has an empty media type")]
    MissingMediaType,
    #[error("unsupported payload encoding: {0:?}")]
    UnsupportedEncoding(String),
    #[error("invalid base64 payload: {0}")]
    InvalidPayload(#[from] base64::DecodeError),
}

/// Decode a self-describing embedded-image reference.
///
/// Returns `Ok(None)` when the reference is not an embedding at all (a file
/// or network reference) or when its media type is neither `image/*` nor
/// `video/*` — those stay in the document untouched. Malformed references
/// are an error so the caller can log them.
pub fn decode(reference: &str) -> Result<Option<DataImage>, DecodeError> {
    let Some(rest) = reference.strip_prefix(SCHEME) else {
        return Ok(None);
    };

    let (header, data) = rest.split_once(',').ok_or(DecodeError::MissingPayload)?;
    let (media_type, encoding) = match header.split_once(';') {
        Some((media_type, encoding)) => (media_type, encoding),
        None => (header, ""),
    };

    let (top_level, subtype) = media_type
        .split_once('/')
        .ok_or(DecodeError::MissingMediaType)?;
    if subtype.is_empty() {
        return Err(DecodeError::MissingMediaType);
    }
    if top_level != "image" && top_level != "video" {
        return Ok(None);
    }

    if encoding != "base64" {
        return Err(DecodeError::UnsupportedEncoding(encoding.to_string()));
    }

    let payload = BASE64.decode(data)?;
    Ok(Some(DataImage {
        payload,
        extension: subtype.to_string(),
    }))
}

/// Build the embedded reference for raw bytes, as produced when the user
/// picks an image file to insert.
pub fn encode(payload: &[u8], media_type: &str) -> String {
    format!("{SCHEME}{media_type};base64,{}", BASE64.encode(payload))
}

/// Media type for a file extension the insert-image flow accepts.
pub fn media_type_for_extension(extension: &str) -> Option<&'static str> {
    match extension.to_ascii_lowercase().as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        "bmp" => Some("image/bmp"),
        "svg" => Some("image/svg+xml"),
        "mp4" => Some("video/mp4"),
        "webm" => Some("video/webm"),
        "mov" => Some("video/quicktime"),
        _ => None,
    }
}

/// Collect the embedded-image references of a document in first-seen order.
///
/// A reference pasted into several elements appears once; rewriting it
/// rewrites every occurrence.
pub fn find_data_images(html: &str) -> Vec<String> {
    let mut references: Vec<String> = Vec::new();
    for captures in DATA_IMAGE_SRC.captures_iter(html) {
        let reference = &captures[1];
        if !references.iter().any(|seen| seen == reference) {
            references.push(reference.to_string());
        }
    }
    references
}
