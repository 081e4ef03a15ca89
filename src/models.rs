//! Data models and configuration
//!
//! Defines the invocation envelope handed over by the hosting runtime, the
//! response shape handed back to it, and the per-function rules that differ
//! between the resize and OCR entry points.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Parameters of one web invocation, as delivered by the hosting runtime.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct InvocationRequest {
    /// Base64-encoded request body.
    #[serde(rename = "__ow_body", alias = "rawBody", alias = "body", default)]
    pub raw_body: String,
    /// Raw query string, without the leading `?`.
    #[serde(rename = "__ow_query", alias = "query", default)]
    pub query: String,
}

impl InvocationRequest {
    pub fn new(raw_body: impl Into<String>, query: impl Into<String>) -> Self {
        Self {
            raw_body: raw_body.into(),
            query: query.into(),
        }
    }

    /// Build a request from unencoded bytes, encoding them the way the
    /// hosting runtime does for binary bodies.
    pub fn from_bytes(body: &[u8], query: impl Into<String>) -> Self {
        use base64::Engine as _;
        Self::new(base64::engine::general_purpose::STANDARD.encode(body), query)
    }
}

/// Caller-supplied token echoed back so responses can be matched to requests.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct CorrelationId(String);

impl CorrelationId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CorrelationId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Marker written into successful results.
pub const RESULT_OK: &str = "ok";

/// Status the hosting runtime reports when a result carries none.
pub const DEFAULT_STATUS: u16 = 200;

/// Status used for every failed invocation.
pub const FAILURE_STATUS: u16 = 500;

/// Body of a failed OCR invocation under [`FailurePolicy::Compatible`].
pub const OCR_FAILURE_BODY: &str = "Error!";

/// The single terminal artifact of an invocation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InvocationResult {
    #[serde(rename = "statusCode", skip_serializing_if = "Option::is_none", default)]
    pub status_code: Option<u16>,
    pub body: serde_json::Value,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub result: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub testid: Option<CorrelationId>,
}

impl InvocationResult {
    pub fn success(
        status_code: Option<u16>,
        body: serde_json::Value,
        testid: CorrelationId,
    ) -> Self {
        Self {
            status_code,
            body,
            result: Some(RESULT_OK.to_string()),
            testid: Some(testid),
        }
    }

    pub fn failure(body: serde_json::Value, testid: Option<CorrelationId>) -> Self {
        Self {
            status_code: Some(FAILURE_STATUS),
            body,
            result: None,
            testid,
        }
    }

    /// Status the caller observes once the hosting runtime applies its default.
    pub fn effective_status(&self) -> u16 {
        self.status_code.unwrap_or(DEFAULT_STATUS)
    }

    pub fn is_ok(&self) -> bool {
        self.result.as_deref() == Some(RESULT_OK)
    }
}

/// Which entry point an invocation belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Variant {
    Resize,
    Ocr,
}

impl Variant {
    pub fn name(self) -> &'static str {
        match self {
            Variant::Resize => "img-resize",
            Variant::Ocr => "ocr-img",
        }
    }

    /// Explicit status on success; the resize function leaves it to the runtime.
    pub fn success_status(self) -> Option<u16> {
        match self {
            Variant::Resize => None,
            Variant::Ocr => Some(DEFAULT_STATUS),
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// How failed invocations are shaped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Existing callers' contract: resize failures carry the raw error and no
    /// testid, OCR failures carry a fixed message and no testid.
    #[default]
    Compatible,
    /// Every failure carries the testid and the underlying error detail.
    Unified,
}

impl FromStr for FailurePolicy {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "compatible" | "legacy" => Ok(FailurePolicy::Compatible),
            "unified" => Ok(FailurePolicy::Unified),
            other => Err(crate::Error::Config(format!(
                "Unknown failure policy '{}'. Expected 'compatible' or 'unified'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Png,
    Jpeg,
    WebP,
}

impl OutputFormat {
    pub fn content_type(self) -> &'static str {
        match self {
            OutputFormat::Png => "image/png",
            OutputFormat::Jpeg => "image/jpeg",
            OutputFormat::WebP => "image/webp",
        }
    }

    pub fn image_format(self) -> image::ImageFormat {
        match self {
            OutputFormat::Png => image::ImageFormat::Png,
            OutputFormat::Jpeg => image::ImageFormat::Jpeg,
            OutputFormat::WebP => image::ImageFormat::WebP,
        }
    }
}

impl FromStr for OutputFormat {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "png" => Ok(OutputFormat::Png),
            "jpg" | "jpeg" => Ok(OutputFormat::Jpeg),
            "webp" => Ok(OutputFormat::WebP),
            other => Err(crate::Error::Config(format!(
                "Unsupported output format '{}'",
                other
            ))),
        }
    }
}

/// Largest width or height the resize engine will produce.
pub const MAX_DIMENSION: u32 = 4096;

/// Target geometry and encoding for the resize engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResizeOptions {
    pub width: u32,
    /// `None` keeps the source aspect ratio.
    pub height: Option<u32>,
    pub format: OutputFormat,
}

impl Default for ResizeOptions {
    fn default() -> Self {
        Self {
            width: 100,
            height: None,
            format: OutputFormat::Png,
        }
    }
}

// Configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub resize: ResizeOptions,
    pub tesseract_bin: String,
    pub tesseract_lang: String,
    pub failure_policy: FailurePolicy,
    pub strict_decode: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            resize: ResizeOptions::default(),
            tesseract_bin: "tesseract".to_string(),
            tesseract_lang: "eng".to_string(),
            failure_policy: FailurePolicy::Compatible,
            strict_decode: false,
        }
    }
}

impl Config {
    pub fn from_env() -> crate::Result<Self> {
        load_dotenv(dotenvy::dotenv())?;
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup; unset keys keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> crate::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let width = match lookup("RESIZE_WIDTH") {
            Some(raw) => parse_dimension("RESIZE_WIDTH", &raw)?,
            None => defaults.resize.width,
        };
        let height = lookup("RESIZE_HEIGHT")
            .map(|raw| parse_dimension("RESIZE_HEIGHT", &raw))
            .transpose()?;
        let format = lookup("RESIZE_FORMAT")
            .map(|raw| raw.parse::<OutputFormat>())
            .transpose()?
            .unwrap_or(defaults.resize.format);

        let failure_policy = lookup("FAILURE_POLICY")
            .map(|raw| raw.parse::<FailurePolicy>())
            .transpose()?
            .unwrap_or(defaults.failure_policy);

        let strict_decode = match lookup("STRICT_DECODE") {
            Some(raw) => parse_flag("STRICT_DECODE", &raw)?,
            None => defaults.strict_decode,
        };

        Ok(Self {
            resize: ResizeOptions {
                width,
                height,
                format,
            },
            tesseract_bin: lookup("TESSERACT_BIN").unwrap_or(defaults.tesseract_bin),
            tesseract_lang: lookup("TESSERACT_LANG").unwrap_or(defaults.tesseract_lang),
            failure_policy,
            strict_decode,
        })
    }
}

/// A missing `.env` file is fine; an unreadable or malformed one is not.
fn load_dotenv(
    outcome: std::result::Result<std::path::PathBuf, dotenvy::Error>,
) -> crate::Result<()> {
    match outcome {
        Ok(path) => {
            tracing::debug!("Loaded environment from {}", path.display());
            Ok(())
        }
        Err(e) if e.not_found() => Ok(()),
        Err(e) => Err(e.into()),
    }
}

fn parse_dimension(key: &str, raw: &str) -> crate::Result<u32> {
    match raw.trim().parse::<u32>() {
        Ok(value) if value > 0 && value <= MAX_DIMENSION => Ok(value),
        _ => Err(crate::Error::Config(format!(
            "{} must be an integer between 1 and {}, got '{}'",
            key, MAX_DIMENSION, raw
        ))),
    }
}

fn parse_flag(key: &str, raw: &str) -> crate::Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(crate::Error::Config(format!(
            "{} must be a boolean, got '{}'",
            key, raw
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_request_deserializes_runtime_field_names() {
        let json = r#"{"__ow_body": "aGVsbG8=", "__ow_query": "t1&w=100"}"#;
        let request: InvocationRequest = serde_json::from_str(json).unwrap();

        assert_eq!(request.raw_body, "aGVsbG8=");
        assert_eq!(request.query, "t1&w=100");
    }

    #[test]
    fn test_request_accepts_aliases_and_missing_query() {
        let request: InvocationRequest = serde_json::from_str(r#"{"rawBody": "AA=="}"#).unwrap();

        assert_eq!(request.raw_body, "AA==");
        assert_eq!(request.query, "");
    }

    #[test]
    fn test_request_from_bytes_encodes_body() {
        let request = InvocationRequest::from_bytes(b"hello", "q");
        assert_eq!(request.raw_body, "aGVsbG8=");
    }

    #[test]
    fn test_success_result_serialization() {
        let result = InvocationResult::success(
            None,
            serde_json::json!({"width": 10}),
            CorrelationId::new("t1"),
        );

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"body": {"width": 10}, "result": "ok", "testid": "t1"})
        );
        assert_eq!(result.effective_status(), 200);
        assert!(result.is_ok());
    }

    #[test]
    fn test_failure_result_omits_testid_when_absent() {
        let result = InvocationResult::failure(serde_json::json!("boom"), None);

        let json = serde_json::to_string(&result).unwrap();
        assert_eq!(json, r#"{"statusCode":500,"body":"boom"}"#);
        assert!(!result.is_ok());
    }

    #[test]
    fn test_variant_success_status() {
        assert_eq!(Variant::Resize.success_status(), None);
        assert_eq!(Variant::Ocr.success_status(), Some(200));
    }

    #[test]
    fn test_failure_policy_parsing() {
        assert_eq!(
            "Unified".parse::<FailurePolicy>().unwrap(),
            FailurePolicy::Unified
        );
        assert_eq!(
            "legacy".parse::<FailurePolicy>().unwrap(),
            FailurePolicy::Compatible
        );
        assert!("strict".parse::<FailurePolicy>().is_err());
    }

    #[test]
    fn test_config_defaults() {
        let config = Config::from_lookup(|_| None).unwrap();

        assert_eq!(config.resize, ResizeOptions::default());
        assert_eq!(config.tesseract_bin, "tesseract");
        assert_eq!(config.tesseract_lang, "eng");
        assert_eq!(config.failure_policy, FailurePolicy::Compatible);
        assert!(!config.strict_decode);
    }

    #[test]
    fn test_config_overrides() {
        let config = Config::from_lookup(lookup_from(&[
            ("RESIZE_WIDTH", "320"),
            ("RESIZE_HEIGHT", "240"),
            ("RESIZE_FORMAT", "jpeg"),
            ("TESSERACT_LANG", "deu"),
            ("FAILURE_POLICY", "unified"),
            ("STRICT_DECODE", "true"),
        ]))
        .unwrap();

        assert_eq!(config.resize.width, 320);
        assert_eq!(config.resize.height, Some(240));
        assert_eq!(config.resize.format, OutputFormat::Jpeg);
        assert_eq!(config.tesseract_lang, "deu");
        assert_eq!(config.failure_policy, FailurePolicy::Unified);
        assert!(config.strict_decode);
    }

    #[test]
    fn test_config_rejects_oversized_height() {
        let err = Config::from_lookup(lookup_from(&[("RESIZE_HEIGHT", "100000")])).unwrap_err();
        assert!(err.to_string().contains("RESIZE_HEIGHT"));
    }

    #[test]
    fn test_missing_dotenv_file_is_ignored() {
        let missing = dotenvy::Error::Io(std::io::Error::from(std::io::ErrorKind::NotFound));
        assert!(load_dotenv(Err(missing)).is_ok());
    }

    #[test]
    fn test_malformed_dotenv_file_is_reported() {
        let malformed = dotenvy::Error::LineParse("RESIZE_WIDTH 10".to_string(), 12);

        let err = load_dotenv(Err(malformed)).unwrap_err();
        assert!(matches!(err, crate::Error::EnvVar(_)));
    }

    #[test]
    fn test_config_rejects_zero_width() {
        let err = Config::from_lookup(lookup_from(&[("RESIZE_WIDTH", "0")])).unwrap_err();
        assert!(err.to_string().contains("RESIZE_WIDTH"));
    }
}
