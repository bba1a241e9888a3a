//! Error types for the analysis module

use crate::error::Error as CrateError;
use rig::completion::PromptError;
use thiserror::Error;

/// Error type for analysis operations
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// The completion request failed
    #[error("Prompt error: {0}")]
    Prompt(#[from] PromptError),

    /// Nothing to analyze
    #[error("No text to analyze")]
    EmptyInput,

    /// The model answered with nothing but whitespace
    #[error("Model returned an empty response")]
    EmptyResponse,

    /// The reply could not be read as the expected structure
    #[error("Malformed model response: {0}")]
    MalformedResponse(String),

    /// The provider's API key variable is not set
    #[error("{0} environment variable must be set")]
    MissingApiKey(&'static str),

    /// Unknown provider name
    #[error("Unknown AI provider: {0}")]
    UnknownProvider(String),
}

impl From<AnalysisError> for CrateError {
    fn from(err: AnalysisError) -> Self {
        CrateError::Analysis(err.to_string())
    }
}
