pub mod gemini;
pub mod prompt;
pub mod types;

pub use gemini::GeminiClient;
pub use types::ReviewComment;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, instrument};

use crate::pr::ChangedFile;

#[derive(Debug, Error)]
pub enum ReviewError {
    #[error("Model API request failed: {0}")]
    ApiRequest(#[from] reqwest::Error),

    #[error("Model API returned {status}: {body}")]
    ApiStatus {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("Model returned no candidates")]
    NoCandidates,

    #[error("Model returned an empty response")]
    EmptyResponse,
}

/// A text-completion backend that reviews a prompt.
#[async_trait]
pub trait ReviewModel: Send + Sync {
    /// Send a single-turn prompt and return the raw completion text.
    async fn generate(&self, prompt: &str) -> Result<String, ReviewError>;
}

/// Ask the model to review one file's patch.
///
/// Returns the completion with any surrounding code fence removed. The text
/// is expected, but not guaranteed, to be a JSON array of review comments.
#[instrument(skip(model, file), fields(file = %file.filename))]
pub async fn request_review<M>(model: &M, file: &ChangedFile) -> Result<String, ReviewError>
where
    M: ReviewModel + ?Sized,
{
    let prompt = prompt::build_prompt(file);
    let raw = model.generate(&prompt).await?;
    let text = prompt::strip_code_fence(&raw);
    if text.is_empty() {
        return Err(ReviewError::EmptyResponse);
    }
    debug!(bytes = text.len(), "model review ready");
    Ok(text.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pr::types::FileStatus;
    use std::sync::Mutex;

    /// Returns a canned completion and records every prompt it receives.
    struct CannedModel {
        reply: Result<String, ()>,
        prompts: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl ReviewModel for CannedModel {
        async fn generate(&self, prompt: &str) -> Result<String, ReviewError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            self.reply.clone().map_err(|_| ReviewError::NoCandidates)
        }
    }

    fn canned(reply: Result<&str, ()>) -> CannedModel {
        CannedModel {
            reply: reply.map(str::to_string),
            prompts: Mutex::new(Vec::new()),
        }
    }

    fn test_file() -> ChangedFile {
        ChangedFile {
            filename: "static/site.css".to_string(),
            patch: Some("@@ -1 +1 @@\n-a{}\n+a{color:red}".to_string()),
            status: FileStatus::Modified,
            raw_url: String::new(),
        }
    }

    #[tokio::test]
    async fn test_request_review_strips_fence() {
        let model = canned(Ok("```json\n[]\n```"));
        let text = request_review(&model, &test_file()).await.unwrap();
        assert_eq!(text, "[]");
        let prompts = model.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("static/site.css"));
    }

    #[tokio::test]
    async fn test_request_review_passes_non_json_through() {
        let model = canned(Ok("Sure, here's my review:"));
        let text = request_review(&model, &test_file()).await.unwrap();
        assert_eq!(text, "Sure, here's my review:");
    }

    #[tokio::test]
    async fn test_request_review_propagates_api_failure() {
        let model = canned(Err(()));
        let result = request_review(&model, &test_file()).await;
        assert!(matches!(result, Err(ReviewError::NoCandidates)));
    }

    #[tokio::test]
    async fn test_blank_completion_is_empty_response() {
        let model = canned(Ok("  ```json\n```  "));
        let result = request_review(&model, &test_file()).await;
        assert!(matches!(result, Err(ReviewError::EmptyResponse)));
    }
}
