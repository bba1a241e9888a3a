use std::num::NonZeroU32;
use std::sync::Arc;

use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use rig::completion::{CompletionError, CompletionModel, CompletionRequest, CompletionResponse};
use tracing::{Instrument, debug_span, info_span};

/// Completion model that waits for a per-minute quota before every request
#[derive(Clone)]
pub struct ThrottledModel<M: CompletionModel> {
    model: M,
    limiter: Arc<DefaultDirectRateLimiter>,
}

impl<M: CompletionModel> ThrottledModel<M> {
    pub fn new(model: M, limiter: DefaultDirectRateLimiter) -> Self {
        Self {
            model,
            limiter: Arc::new(limiter),
        }
    }

    /// Allow at most `requests` completions per minute
    pub fn per_minute(model: M, requests: NonZeroU32) -> Self {
        Self::new(model, RateLimiter::direct(Quota::per_minute(requests)))
    }
}

impl<M: CompletionModel> CompletionModel for ThrottledModel<M> {
    type Response = M::Response;

    async fn completion(
        &self,
        request: CompletionRequest,
    ) -> Result<CompletionResponse<Self::Response>, CompletionError> {
        self.limiter.until_ready().instrument(debug_span!("limiter")).await;
        self.model
            .completion(request)
            .instrument(info_span!("completion"))
            .await
    }
}
