//! Page summarization over any `rig` completion model

use std::future::Future;

use rig::{
    agent::{Agent, AgentBuilder},
    completion::{CompletionModel, Prompt},
};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, trace};

use super::AnalysisError;

/// Input longer than this many characters is cut before prompting
pub const DEFAULT_MAX_INPUT_CHARS: usize = 4000;

/// Default upper bound on summary length, in words
pub const DEFAULT_MAX_WORDS: u64 = 200;

/// A generated summary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub text: String,

    /// Characters of input the summary was generated from
    pub input_chars: usize,

    /// Whether the input had to be shortened
    pub truncated: bool,
}

/// Something that can summarize page text
pub trait Summarizer {
    fn summarize(&self, text: &str) -> impl Future<Output = Result<Summary, AnalysisError>> + Send;
}

/// [`Summarizer`] backed by a `rig` agent
pub struct CompletionSummarizer<M: CompletionModel> {
    agent: Agent<M>,
    max_input_chars: usize,
}

impl<M: CompletionModel> CompletionSummarizer<M> {
    pub fn new(model: M) -> Self {
        Self::with_limits(model, DEFAULT_MAX_WORDS, DEFAULT_MAX_INPUT_CHARS)
    }

    /// Summarizer producing at most `max_words` words from at most
    /// `max_input_chars` characters of input
    pub fn with_limits(model: M, max_words: u64, max_input_chars: usize) -> Self {
        let agent = AgentBuilder::new(model)
            .preamble(&format!(
                "You are an expert content summarizer. Create a concise, informative summary \
                 of the provided text in maximum {} words. Focus on the main points and key \
                 information.",
                max_words
            ))
            .max_tokens(max_words * 2)
            .build();

        Self {
            agent,
            max_input_chars,
        }
    }
}

impl<M: CompletionModel> Summarizer for CompletionSummarizer<M> {
    #[instrument(skip(self, text), fields(len = text.len()))]
    async fn summarize(&self, text: &str) -> Result<Summary, AnalysisError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(AnalysisError::EmptyInput);
        }

        let (input, truncated) = truncate_chars(text, self.max_input_chars);
        if truncated {
            debug!("Truncated input to {} characters", self.max_input_chars);
        }

        let reply = self
            .agent
            .prompt(format!("Summarize this content:\n\n{}", input))
            .await?;
        let reply = reply.trim();
        if reply.is_empty() {
            return Err(AnalysisError::EmptyResponse);
        }

        trace!("Generated summary of length {}", reply.len());
        Ok(Summary {
            text: reply.to_string(),
            input_chars: input.chars().count(),
            truncated,
        })
    }
}

/// Cut `text` to at most `max_chars` characters without splitting one
pub(super) fn truncate_chars(text: &str, max_chars: usize) -> (&str, bool) {
    match text.char_indices().nth(max_chars) {
        Some((end, _)) => (&text[..end], true),
        None => (text, false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::mock_model::MockCompletionModel;

    #[test]
    fn test_truncate_chars_respects_boundaries() {
        assert_eq!(truncate_chars("héllo", 2), ("hé", true));
        assert_eq!(truncate_chars("héllo", 5), ("héllo", false));
        assert_eq!(truncate_chars("", 3), ("", false));
    }

    #[tokio::test]
    async fn test_summarize_configures_agent() {
        let model = MockCompletionModel::replying("  A short summary.  ").await;
        let summarizer = CompletionSummarizer::with_limits(model.clone(), 50, 4000);

        let summary = summarizer.summarize("Some page text").await.unwrap();

        assert_eq!(summary.text, "A short summary.");
        assert_eq!(summary.input_chars, 14);
        assert!(!summary.truncated);

        let requests = model.requests().await;
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].max_tokens, Some(100));
        assert!(requests[0].preamble.as_deref().unwrap().contains("maximum 50 words"));
    }

    #[tokio::test]
    async fn test_summarize_truncates_long_input() {
        let model = MockCompletionModel::replying("ok").await;
        let summarizer = CompletionSummarizer::with_limits(model, 10, 8);

        let summary = summarizer.summarize(&"é".repeat(20)).await.unwrap();

        assert!(summary.truncated);
        assert_eq!(summary.input_chars, 8);
    }

    #[tokio::test]
    async fn test_empty_input_skips_model() {
        let model = MockCompletionModel::replying("unused").await;
        let summarizer = CompletionSummarizer::new(model.clone());

        let result = summarizer.summarize("   \n ").await;

        assert!(matches!(result, Err(AnalysisError::EmptyInput)));
        assert!(model.requests().await.is_empty());
    }

    #[tokio::test]
    async fn test_blank_reply_is_an_error() {
        let summarizer = CompletionSummarizer::new(MockCompletionModel::new());
        let result = summarizer.summarize("text").await;
        assert!(matches!(result, Err(AnalysisError::EmptyResponse)));
    }

    #[tokio::test]
    async fn test_provider_failure_propagates() {
        let summarizer = CompletionSummarizer::new(MockCompletionModel::failing("quota").await);
        let result = summarizer.summarize("text").await;
        assert!(matches!(result, Err(AnalysisError::Prompt(_))));
    }
}
