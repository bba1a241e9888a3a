//! Content analysis beyond summaries: sentiment, category, entities, language
//! and quality, each answered by its own `rig` agent over the same model.

use std::future::Future;

use rig::{
    agent::{Agent, AgentBuilder},
    completion::{CompletionModel, Prompt},
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use super::summarizer::truncate_chars;
use super::{
    AnalysisError, CompletionSummarizer, DEFAULT_MAX_INPUT_CHARS, DEFAULT_MAX_WORDS, Summarizer,
    Summary,
};

/// Categories a page can be sorted into
pub const CATEGORIES: [&str; 13] = [
    "News & Current Events",
    "Technology & Science",
    "Business & Finance",
    "Entertainment & Media",
    "Sports",
    "Health & Medical",
    "Education",
    "Travel & Lifestyle",
    "Politics & Government",
    "E-commerce & Shopping",
    "Blog & Personal",
    "Reference & Documentation",
    "Other",
];

/// Category recorded when categorization fails
pub const UNKNOWN_CATEGORY: &str = "Unknown";

/// Language recorded when detection fails
pub const UNKNOWN_LANGUAGE: &str = "unknown";

const SENTIMENT_INPUT_CHARS: usize = 3000;
const ENTITY_INPUT_CHARS: usize = 3000;
const CATEGORY_INPUT_CHARS: usize = 2000;
const QUALITY_INPUT_CHARS: usize = 2000;
const LANGUAGE_INPUT_CHARS: usize = 500;

/// Sentiment of a text as rated by the model
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Sentiment {
    /// -1.0 (very negative) to 1.0 (very positive)
    pub score: f64,
    /// 0.0 to 1.0
    pub confidence: f64,
}

/// Named entities found in a text
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entities {
    #[serde(default)]
    pub people: Vec<String>,
    #[serde(default)]
    pub places: Vec<String>,
    #[serde(default)]
    pub organizations: Vec<String>,
    #[serde(default)]
    pub other: Vec<String>,
}

/// Everything learned about one page.
///
/// Fields stay `None` for analyses the analyzer does not perform. When an
/// analysis is performed and fails, its field holds the fallback value
/// (`"Unknown"` category, `"unknown"` language, zero scores, no entities)
/// and `failures` names it with the reason.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub summary: Option<Summary>,
    pub sentiment_score: Option<f64>,
    pub sentiment_confidence: Option<f64>,
    pub content_category: Option<String>,
    pub extracted_entities: Option<Entities>,
    pub language_detected: Option<String>,
    pub readability_score: Option<f64>,
    pub failures: Vec<String>,
}

/// Something that can analyze a page from its title and text
pub trait ContentAnalyzer {
    fn analyze(
        &self,
        title: &str,
        text: &str,
    ) -> impl Future<Output = Result<AnalysisReport, AnalysisError>> + Send;
}

/// A bare summarizer is an analyzer that only summarizes
impl<M: CompletionModel> ContentAnalyzer for CompletionSummarizer<M> {
    async fn analyze(&self, _title: &str, text: &str) -> Result<AnalysisReport, AnalysisError> {
        let summary = self.summarize(text).await?;
        Ok(AnalysisReport {
            summary: Some(summary),
            ..AnalysisReport::default()
        })
    }
}

/// Full [`ContentAnalyzer`] backed by one agent per analysis
pub struct CompletionAnalyzer<M: CompletionModel> {
    summarizer: CompletionSummarizer<M>,
    sentiment: Agent<M>,
    category: Agent<M>,
    entities: Agent<M>,
    language: Agent<M>,
    quality: Agent<M>,
}

fn agent<M: CompletionModel>(model: M, preamble: &str, max_tokens: u64) -> Agent<M> {
    AgentBuilder::new(model)
        .preamble(preamble)
        .max_tokens(max_tokens)
        .build()
}

impl<M: CompletionModel> CompletionAnalyzer<M> {
    pub fn new(model: M) -> Self {
        Self::with_summary_words(model, DEFAULT_MAX_WORDS)
    }

    /// Analyzer whose summaries are at most `max_words` words
    pub fn with_summary_words(model: M, max_words: u64) -> Self {
        let sentiment = agent(
            model.clone(),
            "You are a sentiment analysis expert. Analyze the sentiment of the text and respond \
             with JSON containing 'score' (float from -1.0 to 1.0, where -1 is very negative, 0 \
             is neutral, 1 is very positive) and 'confidence' (float from 0.0 to 1.0).",
            200,
        );
        let category = agent(
            model.clone(),
            &format!(
                "Categorize the following content into one of these categories: {}. Respond \
                 with only the category name.",
                CATEGORIES.join(", ")
            ),
            50,
        );
        let entities = agent(
            model.clone(),
            "Extract named entities from the text and return as JSON with keys: 'people', \
             'places', 'organizations', 'other'. Each key should contain a list of unique \
             entities found.",
            500,
        );
        let language = agent(
            model.clone(),
            "Detect the language of the given text. Respond with the language name in English \
             (e.g., 'English', 'Spanish', 'French').",
            20,
        );
        let quality = agent(
            model.clone(),
            "Assess the quality of this text content on a scale of 0.0 to 1.0, considering \
             factors like clarity, coherence, informativeness, and readability. Respond with \
             only a number between 0.0 and 1.0.",
            10,
        );

        Self {
            summarizer: CompletionSummarizer::with_limits(model, max_words, DEFAULT_MAX_INPUT_CHARS),
            sentiment,
            category,
            entities,
            language,
            quality,
        }
    }

    pub async fn sentiment(&self, text: &str) -> Result<Sentiment, AnalysisError> {
        let (input, _) = truncate_chars(text, SENTIMENT_INPUT_CHARS);
        let reply = ask(
            &self.sentiment,
            format!("Analyze the sentiment of this text:\n\n{}", input),
        )
        .await?;
        let sentiment: Sentiment = parse_json_reply(&reply)?;
        Ok(Sentiment {
            score: sentiment.score.clamp(-1.0, 1.0),
            confidence: sentiment.confidence.clamp(0.0, 1.0),
        })
    }

    /// One of [`CATEGORIES`]; replies naming no known category become "Other"
    pub async fn categorize(&self, title: &str, text: &str) -> Result<String, AnalysisError> {
        let (input, _) = truncate_chars(text, CATEGORY_INPUT_CHARS);
        let reply = ask(
            &self.category,
            format!("Title: {}\n\nContent: {}", title, input),
        )
        .await?;
        Ok(match_category(&reply).to_string())
    }

    pub async fn entities(&self, text: &str) -> Result<Entities, AnalysisError> {
        let (input, _) = truncate_chars(text, ENTITY_INPUT_CHARS);
        let reply = ask(
            &self.entities,
            format!("Extract entities from this text:\n\n{}", input),
        )
        .await?;
        parse_json_reply(&reply)
    }

    pub async fn detect_language(&self, text: &str) -> Result<String, AnalysisError> {
        let (sample, _) = truncate_chars(text, LANGUAGE_INPUT_CHARS);
        let reply = ask(
            &self.language,
            format!("What language is this text: {}", sample),
        )
        .await?;
        let language = reply
            .lines()
            .next()
            .unwrap_or_default()
            .trim_matches(|c: char| c == '"' || c == '\'' || c == '.' || c.is_whitespace());
        if language.is_empty() {
            return Err(AnalysisError::EmptyResponse);
        }
        Ok(language.to_string())
    }

    /// Quality and readability from 0.0 to 1.0
    pub async fn content_quality(&self, text: &str) -> Result<f64, AnalysisError> {
        let (sample, _) = truncate_chars(text, QUALITY_INPUT_CHARS);
        let reply = ask(
            &self.quality,
            format!("Rate the quality of this content: {}", sample),
        )
        .await?;
        let score = reply
            .trim()
            .trim_end_matches('.')
            .parse::<f64>()
            .ok()
            .filter(|score| score.is_finite())
            .ok_or_else(|| AnalysisError::MalformedResponse(format!("not a score: {}", reply)))?;
        Ok(score.clamp(0.0, 1.0))
    }
}

impl<M: CompletionModel> ContentAnalyzer for CompletionAnalyzer<M> {
    #[instrument(skip(self, title, text), fields(len = text.len()))]
    async fn analyze(&self, title: &str, text: &str) -> Result<AnalysisReport, AnalysisError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(AnalysisError::EmptyInput);
        }

        let mut failures = Vec::new();
        let mut record = |analysis: &str, err: AnalysisError| {
            warn!("{} analysis failed: {}", analysis, err);
            failures.push(format!("{}: {}", analysis, err));
        };

        let summary = match self.summarizer.summarize(text).await {
            Ok(summary) => Some(summary),
            Err(e) => {
                record("summary", e);
                None
            }
        };
        let sentiment = self.sentiment(text).await.unwrap_or_else(|e| {
            record("sentiment", e);
            Sentiment::default()
        });
        let category = self.categorize(title, text).await.unwrap_or_else(|e| {
            record("category", e);
            UNKNOWN_CATEGORY.to_string()
        });
        let entities = self.entities(text).await.unwrap_or_else(|e| {
            record("entities", e);
            Entities::default()
        });
        let language = self.detect_language(text).await.unwrap_or_else(|e| {
            record("language", e);
            UNKNOWN_LANGUAGE.to_string()
        });
        let readability = self.content_quality(text).await.unwrap_or_else(|e| {
            record("quality", e);
            0.0
        });

        debug!("Analysis finished with {} failures", failures.len());
        Ok(AnalysisReport {
            summary,
            sentiment_score: Some(sentiment.score),
            sentiment_confidence: Some(sentiment.confidence),
            content_category: Some(category),
            extracted_entities: Some(entities),
            language_detected: Some(language),
            readability_score: Some(readability),
            failures,
        })
    }
}

async fn ask<M: CompletionModel>(agent: &Agent<M>, prompt: String) -> Result<String, AnalysisError> {
    let reply = agent.prompt(prompt).await?;
    let reply = reply.trim();
    if reply.is_empty() {
        return Err(AnalysisError::EmptyResponse);
    }
    Ok(reply.to_string())
}

/// Parse the JSON object in `reply`, ignoring any prose or code fences around it
fn parse_json_reply<T: DeserializeOwned>(reply: &str) -> Result<T, AnalysisError> {
    let json = match (reply.find('{'), reply.rfind('}')) {
        (Some(start), Some(end)) if start < end => &reply[start..=end],
        _ => reply,
    };
    serde_json::from_str(json).map_err(|e| AnalysisError::MalformedResponse(e.to_string()))
}

fn match_category(reply: &str) -> &'static str {
    let reply = reply
        .trim()
        .trim_matches(|c: char| c == '"' || c == '\'' || c == '.')
        .to_lowercase();
    CATEGORIES
        .iter()
        .find(|category| category.to_lowercase() == reply)
        .or_else(|| {
            CATEGORIES
                .iter()
                .find(|category| reply.contains(&category.to_lowercase()))
        })
        .copied()
        .unwrap_or("Other")
}
