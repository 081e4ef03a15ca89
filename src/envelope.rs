//! Envelope decoding
//!
//! Turns the raw invocation parameters into an engine-ready payload and the
//! caller's correlation id. [`decode`] is lenient and never fails, matching what
//! existing callers rely on; [`validate`] is the explicit up-front check that
//! reports a typed [`DecodeError`] instead.

use crate::models::{CorrelationId, InvocationRequest, ResizeOptions, Variant, MAX_DIMENSION};
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine as _;
use thiserror::Error;

/// Accepts unpadded input and stray trailing bits; input is pre-cleaned.
const LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent)
        .with_decode_allow_trailing_bits(true),
);

/// Strict alphabet check; only the padding may be omitted.
const STRICT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DecodeError {
    #[error("request body is empty")]
    EmptyPayload,

    #[error("request body is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("request body is not a recognized image (leading bytes: {leading:02X?})")]
    UnrecognizedImage { leading: Vec<u8> },
}

/// Payload and correlation id extracted from one request.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedEnvelope {
    pub payload: Vec<u8>,
    pub testid: CorrelationId,
}

/// Decode without validation. Malformed bodies become empty or garbage
/// buffers and are left for the engine to reject.
pub fn decode(variant: Variant, request: &InvocationRequest) -> DecodedEnvelope {
    DecodedEnvelope {
        payload: decode_payload(&request.raw_body),
        testid: correlation_id(variant, &request.query),
    }
}

/// Decode and reject bodies no engine could process.
pub fn validate(
    variant: Variant,
    request: &InvocationRequest,
) -> std::result::Result<DecodedEnvelope, DecodeError> {
    // Line wrapping and the URL-safe alphabet are accepted, as in `decode`.
    let cleaned: String = request
        .raw_body
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .map(|c| match c {
            '-' => '+',
            '_' => '/',
            other => other,
        })
        .collect();
    if cleaned.is_empty() {
        return Err(DecodeError::EmptyPayload);
    }

    let payload = STRICT.decode(cleaned.as_bytes())?;
    if payload.is_empty() {
        return Err(DecodeError::EmptyPayload);
    }
    if detect_image_mime(&payload).is_none() {
        return Err(DecodeError::UnrecognizedImage {
            leading: payload[..payload.len().min(8)].to_vec(),
        });
    }

    Ok(DecodedEnvelope {
        payload,
        testid: correlation_id(variant, &request.query),
    })
}

/// Forgiving base64 decoding: URL-safe symbols are accepted, anything outside
/// the alphabet is skipped, input ends at the first `=`, and a dangling final
/// symbol is dropped.
pub fn decode_payload(raw: &str) -> Vec<u8> {
    let mut cleaned: String = raw
        .chars()
        .take_while(|c| *c != '=')
        .filter_map(|c| match c {
            'A'..='Z' | 'a'..='z' | '0'..='9' | '+' | '/' => Some(c),
            '-' => Some('+'),
            '_' => Some('/'),
            _ => None,
        })
        .collect();

    if cleaned.len() % 4 == 1 {
        cleaned.pop();
    }

    match LENIENT.decode(cleaned.as_bytes()) {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!("Could not decode request body, passing empty payload: {}", e);
            Vec::new()
        }
    }
}

/// Resize takes the first `&`-separated segment verbatim; OCR takes the whole
/// query string.
pub fn correlation_id(variant: Variant, query: &str) -> CorrelationId {
    match variant {
        Variant::Resize => CorrelationId::new(query.split('&').next().unwrap_or("")),
        Variant::Ocr => CorrelationId::new(query),
    }
}

/// Size overrides carried in the resize query after the correlation segment,
/// e.g. `t1&w=100&h=80`. Unparseable, zero or oversized values are ignored.
pub fn resize_options(query: &str, defaults: ResizeOptions) -> ResizeOptions {
    let mut options = defaults;

    for segment in query.split('&').skip(1) {
        let Some((key, value)) = segment.split_once('=') else {
            continue;
        };
        let Some(value) = value
            .trim()
            .parse::<u32>()
            .ok()
            .filter(|v| *v > 0 && *v <= MAX_DIMENSION)
        else {
            tracing::debug!("Ignoring resize parameter '{}'", segment);
            continue;
        };

        match key.trim() {
            "w" | "width" => options.width = value,
            "h" | "height" => options.height = Some(value),
            _ => {}
        }
    }

    options
}

pub fn detect_image_mime(bytes: &[u8]) -> Option<&'static str> {
    match bytes {
        [0xFF, 0xD8, 0xFF, ..] => Some("image/jpeg"),
        [0x89, 0x50, 0x4E, 0x47, ..] => Some("image/png"),
        [0x52, 0x49, 0x46, 0x46, _, _, _, _, 0x57, 0x45, 0x42, 0x50, ..] => Some("image/webp"),
        [0x47, 0x49, 0x46, 0x38, ..] => Some("image/gif"),
        [0x42, 0x4D, ..] => Some("image/bmp"),
        [0x49, 0x49, 0x2A, 0x00, ..] | [0x4D, 0x4D, 0x00, 0x2A, ..] => Some("image/tiff"),
        _ => None,
    }
}
