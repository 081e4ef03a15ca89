//! The two web functions: image resize and OCR.
//!
//! Each invocation decodes its envelope, runs the engine once and lets the
//! bridge shape the outcome. Invocations share no state.

use crate::bridge;
use crate::envelope::{self, DecodedEnvelope};
use crate::image::{ImageProcessor, ImageService};
use crate::models::{
    Config, FailurePolicy, InvocationRequest, InvocationResult, ResizeOptions, Variant,
};
use crate::ocr::{self, TesseractEngine, TextRecognizer};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::Instrument;
use uuid::Uuid;

#[async_trait]
pub trait Function: Send + Sync {
    fn variant(&self) -> Variant;

    fn name(&self) -> &'static str {
        self.variant().name()
    }

    async fn invoke(&self, request: InvocationRequest) -> InvocationResult;
}

/// Shared decoding step. In strict mode a typed decode error short-circuits
/// into a failure result before any engine runs.
fn decode_envelope(
    variant: Variant,
    policy: FailurePolicy,
    strict: bool,
    request: &InvocationRequest,
) -> std::result::Result<DecodedEnvelope, InvocationResult> {
    if !strict {
        return Ok(envelope::decode(variant, request));
    }

    envelope::validate(variant, request).map_err(|e| {
        let testid = envelope::correlation_id(variant, &request.query);
        bridge::reject(variant, policy, testid, &crate::Error::from(e))
    })
}

fn invocation_span(variant: Variant) -> tracing::Span {
    tracing::info_span!("invocation", function = %variant, activation = %Uuid::new_v4())
}

pub struct ResizeFunction {
    engine: Box<dyn ImageService>,
    defaults: ResizeOptions,
    policy: FailurePolicy,
    strict_decode: bool,
}

impl ResizeFunction {
    pub fn new(engine: Box<dyn ImageService>, defaults: ResizeOptions) -> Self {
        Self {
            engine,
            defaults,
            policy: FailurePolicy::Compatible,
            strict_decode: false,
        }
    }

    pub fn with_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_strict_decode(mut self, strict: bool) -> Self {
        self.strict_decode = strict;
        self
    }
}

#[async_trait]
impl Function for ResizeFunction {
    fn variant(&self) -> Variant {
        Variant::Resize
    }

    async fn invoke(&self, request: InvocationRequest) -> InvocationResult {
        let variant = self.variant();

        async {
            let decoded =
                match decode_envelope(variant, self.policy, self.strict_decode, &request) {
                    Ok(decoded) => decoded,
                    Err(result) => return result,
                };
            let options = envelope::resize_options(&request.query, self.defaults);

            bridge::settle(
                variant,
                self.policy,
                decoded.testid,
                self.engine.resize(&decoded.payload, &options),
            )
            .await
        }
        .instrument(invocation_span(variant))
        .await
    }
}

pub struct OcrFunction {
    engine: Arc<dyn TextRecognizer>,
    policy: FailurePolicy,
    strict_decode: bool,
}

impl OcrFunction {
    pub fn new(engine: Arc<dyn TextRecognizer>) -> Self {
        Self {
            engine,
            policy: FailurePolicy::Compatible,
            strict_decode: false,
        }
    }

    pub fn with_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_strict_decode(mut self, strict: bool) -> Self {
        self.strict_decode = strict;
        self
    }
}

#[async_trait]
impl Function for OcrFunction {
    fn variant(&self) -> Variant {
        Variant::Ocr
    }

    async fn invoke(&self, request: InvocationRequest) -> InvocationResult {
        let variant = self.variant();

        async {
            let decoded =
                match decode_envelope(variant, self.policy, self.strict_decode, &request) {
                    Ok(decoded) => decoded,
                    Err(result) => return result,
                };

            bridge::settle(
                variant,
                self.policy,
                decoded.testid,
                ocr::recognize_text(self.engine.as_ref(), decoded.payload),
            )
            .await
        }
        .instrument(invocation_span(variant))
        .await
    }
}

/// Both functions wired to their real engines.
pub struct FunctionSet {
    pub resize: ResizeFunction,
    pub ocr: OcrFunction,
}

impl FunctionSet {
    pub fn from_config(config: &Config) -> Self {
        let resize = ResizeFunction::new(Box::new(ImageProcessor::new()), config.resize)
            .with_policy(config.failure_policy)
            .with_strict_decode(config.strict_decode);

        let ocr = OcrFunction::new(Arc::new(TesseractEngine::new(
            config.tesseract_bin.clone(),
            config.tesseract_lang.clone(),
        )))
        .with_policy(config.failure_policy)
        .with_strict_decode(config.strict_decode);

        Self { resize, ocr }
    }

    pub fn get(&self, variant: Variant) -> &dyn Function {
        match variant {
            Variant::Resize => &self.resize,
            Variant::Ocr => &self.ocr,
        }
    }
}
