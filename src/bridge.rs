//! Invocation bridge
//!
//! Awaits the single outcome of a processing engine and shapes it into the
//! [`InvocationResult`] handed back to the hosting runtime. Engine errors are
//! always turned into a failure result; nothing escapes this boundary.

use crate::image::ResizedImage;
use crate::models::{
    CorrelationId, FailurePolicy, InvocationResult, Variant, OCR_FAILURE_BODY,
};
use crate::{Error, Result};
use serde_json::Value;
use std::future::Future;
use tracing::{debug, info, warn};

/// Engine success values that can become a response body.
pub trait EngineOutput {
    fn into_body(self) -> Result<Value>;
}

impl EngineOutput for ResizedImage {
    fn into_body(self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }
}

/// Recognized text.
impl EngineOutput for String {
    fn into_body(self) -> Result<Value> {
        Ok(Value::String(self))
    }
}

/// Await `operation` once and normalize its outcome.
pub async fn settle<T, F>(
    variant: Variant,
    policy: FailurePolicy,
    testid: CorrelationId,
    operation: F,
) -> InvocationResult
where
    T: EngineOutput,
    F: Future<Output = Result<T>>,
{
    debug!("{} pending (testid '{}')", variant, testid);

    match operation.await.and_then(EngineOutput::into_body) {
        Ok(body) => {
            info!("{} succeeded (testid '{}')", variant, testid);
            InvocationResult::success(variant.success_status(), body, testid)
        }
        Err(e) => reject(variant, policy, testid, &e),
    }
}

/// Build the failure result for `error`.
pub fn reject(
    variant: Variant,
    policy: FailurePolicy,
    testid: CorrelationId,
    error: &Error,
) -> InvocationResult {
    warn!("{} failed (testid '{}'): {}", variant, testid, error);

    match (policy, variant) {
        (FailurePolicy::Compatible, Variant::Resize) => {
            InvocationResult::failure(Value::String(error.to_string()), None)
        }
        (FailurePolicy::Compatible, Variant::Ocr) => {
            InvocationResult::failure(Value::String(OCR_FAILURE_BODY.to_string()), None)
        }
        (FailurePolicy::Unified, _) => {
            InvocationResult::failure(Value::String(error.to_string()), Some(testid))
        }
    }
}
