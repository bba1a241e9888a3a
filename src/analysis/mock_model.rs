//! Completion model double for tests.
//!
//! Replies with a canned text (empty by default) and records the preamble,
//! prompt and token limit of every request it receives, so tests can check how agents
//! were configured without calling a provider. Replies can also be keyed on a
//! fragment of the preamble, so one model can serve several agents.

use rig::{
    completion::{
        AssistantContent, CompletionError, CompletionModel, CompletionRequest, CompletionResponse,
    },
    one_or_many::OneOrMany,
};
use std::sync::Arc;
use tokio::sync::Mutex;

/// What the mock saw in one request
#[derive(Debug, Clone, PartialEq)]
pub struct SeenRequest {
    pub preamble: Option<String>,
    /// Debug rendering of the prompt message
    pub prompt: String,
    pub max_tokens: Option<u64>,
}

#[derive(Debug, Clone, Default)]
pub struct MockCompletionModel {
    reply: Arc<Mutex<Option<Result<String, String>>>>,
    rules: Arc<Mutex<Vec<(String, Result<String, String>)>>>,
    seen: Arc<Mutex<Vec<SeenRequest>>>,
}

impl MockCompletionModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Model that always answers with `text`
    pub async fn replying(text: &str) -> Self {
        let model = Self::new();
        *model.reply.lock().await = Some(Ok(text.to_string()));
        model
    }

    /// Model whose every request fails with a provider error
    pub async fn failing(message: &str) -> Self {
        let model = Self::new();
        *model.reply.lock().await = Some(Err(message.to_string()));
        model
    }

    /// Answer with `text` when the request's preamble contains `fragment`
    pub async fn reply_when(self, fragment: &str, text: &str) -> Self {
        self.rules
            .lock()
            .await
            .push((fragment.to_string(), Ok(text.to_string())));
        self
    }

    /// Fail when the request's preamble contains `fragment`
    pub async fn fail_when(self, fragment: &str, message: &str) -> Self {
        self.rules
            .lock()
            .await
            .push((fragment.to_string(), Err(message.to_string())));
        self
    }

    pub async fn requests(&self) -> Vec<SeenRequest> {
        self.seen.lock().await.clone()
    }
}

impl CompletionModel for MockCompletionModel {
    type Response = String;

    async fn completion(
        &self,
        request: CompletionRequest,
    ) -> Result<CompletionResponse<Self::Response>, CompletionError> {
        self.seen.lock().await.push(SeenRequest {
            preamble: request.preamble.clone(),
            prompt: format!("{:?}", request.prompt),
            max_tokens: request.max_tokens,
        });

        let preamble = request.preamble.unwrap_or_default();
        let matched = self
            .rules
            .lock()
            .await
            .iter()
            .find(|(fragment, _)| preamble.contains(fragment.as_str()))
            .map(|(_, reply)| reply.clone());
        let reply = match matched {
            Some(reply) => Some(reply),
            None => self.reply.lock().await.clone(),
        };
        match reply {
            Some(Err(message)) => Err(CompletionError::ProviderError(message)),
            Some(Ok(text)) => Ok(CompletionResponse {
                choice: OneOrMany::one(AssistantContent::text(&text)),
                raw_response: text,
            }),
            None => Ok(CompletionResponse {
                choice: OneOrMany::one(AssistantContent::text("")),
                raw_response: String::new(),
            }),
        }
    }
}
