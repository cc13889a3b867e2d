//! The completion seam used by summarization.

use std::future::Future;

use crate::error::LlmError;
use crate::types::{LlmRequest, LlmResponse};

/// Anything that can turn a system prompt plus user content into text.
///
/// [`crate::LlmClient`] implements this for real backends; tests supply
/// scripted models.
pub trait LanguageModel {
    /// Run one completion.
    fn complete(
        &self,
        request: &LlmRequest,
    ) -> impl Future<Output = Result<LlmResponse, LlmError>> + Send;
}

impl<T: LanguageModel + Sync> LanguageModel for &T {
    fn complete(
        &self,
        request: &LlmRequest,
    ) -> impl Future<Output = Result<LlmResponse, LlmError>> + Send {
        (**self).complete(request)
    }
}
