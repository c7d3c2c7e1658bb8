//! AI caption service: asks Gemini for a one-line recommendation for the
//! selected food, degrading to a local template whenever the endpoint is
//! unconfigured, unreachable, or returns anything unusable.
//!
//! This module never fails. Every error path yields a usable caption with
//! `is_ai == false`; the caller cannot tell the difference except by flag.

use std::time::Duration;

use futures::StreamExt;
use rand::Rng;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const GEMINI_GENERATE_PATH: &str = "/v1beta/models/gemini-1.5-flash:generateContent";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Gemini responses are a few hundred bytes; anything near this limit is garbage.
const MAX_RESPONSE_SIZE: usize = 256 * 1024;

/// Local caption templates, used whenever the generative backend is out of
/// the picture. Each one contains the food name.
const FALLBACK_TEMPLATES: &[&str] = &[
    "오늘의 선택 {food}! 맛있게 드세요 😋",
    "{food} 어떠세요? 좋은 선택이에요! 👍",
    "{food}(으)로 결정! 든든한 한 끼 되세요 🍽️",
    "오늘은 {food}! 맛있는 식사 되세요 ✨",
];

/// A caption for a selected food. `is_ai` tells whether it came from the
/// generative backend or a local fallback template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Caption {
    pub message: String,
    #[serde(rename = "isAI")]
    pub is_ai: bool,
}

#[derive(Debug, Error)]
enum CaptionError {
    #[error("request timed out after {}s", REQUEST_TIMEOUT.as_secs())]
    Timeout,
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("HTTP error: status {0}")]
    HttpStatus(u16),
    #[error("response too large (exceeds {0} bytes)")]
    ResponseTooLarge(usize),
    #[error("unparsable response body: {0}")]
    InvalidBody(#[from] serde_json::Error),
    #[error("API error: {0}")]
    Api(String),
    #[error("response contained no text")]
    EmptyText,
}

// ============================================================================
// Wire Types
// ============================================================================

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    contents: Vec<RequestContent>,
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct RequestContent {
    parts: Vec<RequestPart>,
}

#[derive(Serialize)]
struct RequestPart {
    text: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
}

#[derive(Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Option<Vec<Candidate>>,
    #[serde(default)]
    error: Option<ApiError>,
}

#[derive(Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Option<Vec<CandidatePart>>,
}

#[derive(Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Deserialize)]
struct ApiError {
    message: String,
}

// ============================================================================
// Public API
// ============================================================================

/// Resolve the Gemini credential: the `GEMINI_API_KEY` environment variable
/// takes precedence over the config file value.
pub fn resolve_api_key(config_key: Option<&str>) -> Option<SecretString> {
    std::env::var("GEMINI_API_KEY")
        .ok()
        .filter(|k| !k.is_empty())
        .or_else(|| config_key.map(str::to_owned))
        .map(SecretString::from)
}

/// Produce a caption for `food_name`. Infallible by contract.
///
/// Without a credential the local fallback is returned immediately. With
/// one, a single request goes to the generate endpoint; any transport error,
/// non-2xx status, response-level error field, or empty extracted text
/// degrades to the fallback instead of surfacing.
///
/// `base_url` overrides the endpoint host for tests; the credential is only
/// attached when talking to the official host.
pub async fn recommend(
    client: &reqwest::Client,
    food_name: &str,
    category: Option<&str>,
    api_key: Option<&SecretString>,
    base_url: Option<&str>,
) -> Caption {
    let Some(key) = api_key else {
        tracing::debug!("No Gemini credential configured, using fallback caption");
        return fallback(food_name);
    };

    match fetch_caption(client, food_name, category, key, base_url).await {
        Ok(message) => Caption {
            message,
            is_ai: true,
        },
        Err(e) => {
            tracing::warn!(food = %food_name, error = %e, "Caption request failed, using fallback");
            fallback(food_name)
        }
    }
}

fn fallback(food_name: &str) -> Caption {
    let mut rng = rand::thread_rng();
    Caption {
        message: fallback_message(food_name, &mut rng),
        is_ai: false,
    }
}

/// One of the fixed templates, chosen uniformly, with the food name filled in.
pub fn fallback_message<R: Rng>(food_name: &str, rng: &mut R) -> String {
    let template = FALLBACK_TEMPLATES[rng.gen_range(0..FALLBACK_TEMPLATES.len())];
    template.replace("{food}", food_name)
}

fn build_prompt(food_name: &str, category: Option<&str>) -> String {
    let qualifier = category.map(|c| format!(" ({c})")).unwrap_or_default();
    format!(
        "당신은 음식 추천 도우미입니다.\n\
         사용자가 \"{food_name}\"{qualifier}을(를) 선택했습니다.\n\
         이 음식에 대해 재미있고 긍정적인 한줄 추천 멘트를 작성해주세요.\n\
         - 20-40자 내외로 짧게\n\
         - 이모지 1-2개 포함\n\
         - 친근하고 유쾌한 톤\n\
         - 음식의 특징이나 어울리는 상황 언급\n\n\
         예시: \"추운 날씨에 딱! 뜨끈한 국물로 몸도 마음도 따뜻하게 🔥\"\n\n\
         멘트만 출력하세요:"
    )
}

async fn fetch_caption(
    client: &reqwest::Client,
    food_name: &str,
    category: Option<&str>,
    api_key: &SecretString,
    base_url: Option<&str>,
) -> Result<String, CaptionError> {
    let base = base_url.unwrap_or(GEMINI_BASE_URL);
    let mut request = client
        .post(format!("{base}{GEMINI_GENERATE_PATH}"))
        .json(&GenerateRequest {
            contents: vec![RequestContent {
                parts: vec![RequestPart {
                    text: build_prompt(food_name, category),
                }],
            }],
            generation_config: GenerationConfig {
                temperature: 0.9,
                max_output_tokens: 100,
            },
        });

    // The credential only ever goes to the official host, never to a
    // custom base_url used in tests.
    if base_url.is_none() {
        request = request.query(&[("key", api_key.expose_secret())]);
    }

    let response = tokio::time::timeout(REQUEST_TIMEOUT, request.send())
        .await
        .map_err(|_| CaptionError::Timeout)?
        .map_err(CaptionError::Network)?;

    if !response.status().is_success() {
        return Err(CaptionError::HttpStatus(response.status().as_u16()));
    }

    let body = read_limited(response, MAX_RESPONSE_SIZE).await?;
    let parsed: GeminiResponse = serde_json::from_slice(&body)?;

    if let Some(error) = parsed.error {
        return Err(CaptionError::Api(error.message));
    }

    let text = parsed
        .candidates
        .and_then(|mut c| c.drain(..).next())
        .and_then(|c| c.content)
        .and_then(|c| c.parts)
        .and_then(|mut p| p.drain(..).next())
        .and_then(|p| p.text)
        .map(|t| t.trim().to_owned())
        .filter(|t| !t.is_empty());

    text.ok_or(CaptionError::EmptyText)
}

async fn read_limited(response: reqwest::Response, limit: usize) -> Result<Vec<u8>, CaptionError> {
    if let Some(len) = response.content_length() {
        if len as usize > limit {
            return Err(CaptionError::ResponseTooLarge(limit));
        }
    }

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(CaptionError::Network)?;
        if bytes.len().saturating_add(chunk.len()) > limit {
            return Err(CaptionError::ResponseTooLarge(limit));
        }
        bytes.extend_from_slice(&chunk);
    }

    Ok(bytes)
}
