//! CV writing suggestions — pluggable, trait-based provider.
//!
//! Default: `CannedSuggester` (fixed rewrite library, random pick, no network).
//! Optional: `RemoteSuggester` (verbatim proxy to a configured HTTP endpoint).
//!
//! `AppState` holds an `Arc<dyn SuggestionProvider>`, swapped at startup via
//! the `SUGGESTIONS_URL` env var. There is no genuine model integration here
//! by design; what the endpoint does with the payload is its business.

pub mod handlers;

use async_trait::async_trait;
use rand::seq::SliceRandom;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

const MAX_RETRIES: u32 = 3;
const REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Error)]
pub enum SuggestError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("suggestion endpoint returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("suggestion endpoint unreachable after {retries} retries")]
    Unavailable { retries: u32 },
}

/// What the caller is asking about. Forwarded verbatim to a remote provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuggestRequest {
    pub section: Option<String>,
    pub content: Option<String>,
    pub job_description: Option<String>,
}

/// A single rewrite suggestion. `before`/`after` carry the concrete edit when
/// the provider has one; `content` is the accompanying message.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Suggestion {
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub before: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub after: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SuggestResponse {
    suggestions: Vec<Suggestion>,
}

/// The suggestion provider trait. Implement this to swap backends without
/// touching the handler or caller code.
#[async_trait]
pub trait SuggestionProvider: Send + Sync {
    async fn suggest(&self, request: &SuggestRequest) -> Result<Vec<Suggestion>, SuggestError>;
}

/// Quick prompts offered alongside the suggestion box.
pub const QUICK_PROMPTS: [&str; 5] = [
    "Make this sound more professional",
    "Rewrite for a tech job",
    "Add quantifiable achievements",
    "Improve for ATS systems",
    "Make it more concise",
];

// ────────────────────────────────────────────────────────────────────────────
// CannedSuggester — default provider
// ────────────────────────────────────────────────────────────────────────────

/// Returns one entry from a fixed rewrite library, chosen at random.
pub struct CannedSuggester;

fn canned_library() -> Vec<Suggestion> {
    vec![
        Suggestion {
            content: "I can help you improve that section! Here's a more professional version:"
                .to_string(),
            before: Some("Worked on various projects and tasks".to_string()),
            after: Some(
                "Led cross-functional projects delivering 25% improvement in operational \
                 efficiency while managing stakeholder relationships across 5 departments"
                    .to_string(),
            ),
        },
        Suggestion {
            content: "Based on the job description you provided, I recommend emphasizing these \
                      key skills in your experience section. Here's how to make your current \
                      experience more relevant:"
                .to_string(),
            before: Some("Managed team and projects".to_string()),
            after: Some(
                "Spearheaded agile development teams of 8+ engineers, delivering 15+ features \
                 on schedule while maintaining 99.9% system uptime for enterprise clients"
                    .to_string(),
            ),
        },
        Suggestion {
            content: "Your summary could be more impactful. Let me suggest a version that better \
                      highlights your achievements:"
                .to_string(),
            before: Some("Experienced professional with good skills".to_string()),
            after: Some(
                "Results-driven software architect with 8+ years of experience building scalable \
                 systems that serve 2M+ users. Proven track record of reducing infrastructure \
                 costs by 40% while improving performance metrics."
                    .to_string(),
            ),
        },
    ]
}

#[async_trait]
impl SuggestionProvider for CannedSuggester {
    async fn suggest(&self, request: &SuggestRequest) -> Result<Vec<Suggestion>, SuggestError> {
        debug!(
            "Canned suggestion requested for section {:?}",
            request.section
        );
        let library = canned_library();
        let pick = library
            .choose(&mut rand::thread_rng())
            .cloned()
            .expect("canned library is non-empty");
        Ok(vec![pick])
    }
}

// ────────────────────────────────────────────────────────────────────────────
// RemoteSuggester — verbatim HTTP proxy
// ────────────────────────────────────────────────────────────────────────────

/// Forwards the request payload to a configured endpoint and returns its
/// suggestions. Retries on 429/5xx and network errors with exponential
/// backoff.
pub struct RemoteSuggester {
    client: Client,
    endpoint: String,
}

impl RemoteSuggester {
    pub fn new(endpoint: String) -> RemoteSuggester {
        RemoteSuggester {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
                .build()
                .expect("Failed to build HTTP client"),
            endpoint,
        }
    }
}

#[async_trait]
impl SuggestionProvider for RemoteSuggester {
    async fn suggest(&self, request: &SuggestRequest) -> Result<Vec<Suggestion>, SuggestError> {
        let mut last_error: Option<SuggestError> = None;

        for attempt in 0..MAX_RETRIES {
            if attempt > 0 {
                // Exponential backoff: 1s, 2s
                let delay = std::time::Duration::from_millis(1000 * (1 << (attempt - 1)));
                warn!(
                    "Suggestion call attempt {} failed, retrying after {}ms...",
                    attempt,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }

            let response = self.client.post(&self.endpoint).json(request).send().await;

            let response = match response {
                Ok(r) => r,
                Err(e) => {
                    last_error = Some(SuggestError::Http(e));
                    continue;
                }
            };

            let status = response.status();

            if status.as_u16() == 429 || status.is_server_error() {
                let body = response.text().await.unwrap_or_default();
                warn!("Suggestion endpoint returned {}: {}", status, body);
                last_error = Some(SuggestError::Api {
                    status: status.as_u16(),
                    message: body,
                });
                continue;
            }

            if !status.is_success() {
                let message = response.text().await.unwrap_or_default();
                return Err(SuggestError::Api {
                    status: status.as_u16(),
                    message,
                });
            }

            let parsed: SuggestResponse = response.json().await?;
            debug!("Suggestion call succeeded: {} entries", parsed.suggestions.len());
            return Ok(parsed.suggestions);
        }

        Err(last_error.unwrap_or(SuggestError::Unavailable {
            retries: MAX_RETRIES,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> SuggestRequest {
        SuggestRequest {
            section: Some("experience".to_string()),
            content: Some("Worked on stuff".to_string()),
            job_description: None,
        }
    }

    #[tokio::test]
    async fn test_canned_suggester_picks_from_the_library() {
        let library = canned_library();
        let suggestions = CannedSuggester.suggest(&request()).await.unwrap();
        assert_eq!(suggestions.len(), 1);
        assert!(library.contains(&suggestions[0]));
    }

    #[tokio::test]
    async fn test_canned_suggestions_carry_a_concrete_rewrite() {
        let suggestions = CannedSuggester.suggest(&request()).await.unwrap();
        assert!(suggestions[0].before.is_some());
        assert!(suggestions[0].after.is_some());
    }

    #[test]
    fn test_quick_prompts_are_stable() {
        assert_eq!(QUICK_PROMPTS.len(), 5);
        assert_eq!(QUICK_PROMPTS[0], "Make this sound more professional");
    }

    #[test]
    fn test_suggestion_omits_empty_rewrite_fields_on_the_wire() {
        let json = serde_json::to_string(&Suggestion {
            content: "hi".to_string(),
            before: None,
            after: None,
        })
        .unwrap();
        assert_eq!(json, "{\"content\":\"hi\"}");
    }
}
