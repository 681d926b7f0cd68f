use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, ClientBuilder};

use crate::persona::Persona;
use crate::Settings;

pub(crate) const API_URL: &str = "https://api.openai.com/v1/chat/completions";

// Fixed request parameters; neither is configurable. The temperature is kept
// low so answers stay stable and do not garble.
const MODEL: &str = "gpt-4o-mini";
const TEMPERATURE: f64 = 0.3;

/// The only failure kind of the remote boundary. Auth rejections, transport
/// failures, quota errors and malformed responses all land here, carrying
/// the upstream message.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct RemoteServiceError {
    message: String,
}

impl RemoteServiceError {
    pub(crate) fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<reqwest::Error> for RemoteServiceError {
    fn from(err: reqwest::Error) -> Self {
        Self::new(err.to_string())
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Debug)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    Assistant,
    User,
}

/// One role-tagged message of the request sequence.
#[derive(Serialize, Clone, PartialEq, Eq, Debug)]
pub struct ChatTurn {
    pub role: Role,
    pub content: String,
}

impl ChatTurn {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

#[derive(Deserialize)]
struct ChatMessage {
    #[allow(unused)] // needed for deserialization
    role: Role,
    content: String,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

// Error payloads come back as {"error": {"message": ...}}.
#[derive(Deserialize)]
struct ApiErrorResponse {
    error: ApiErrorDetail,
}

#[derive(Deserialize)]
struct ApiErrorDetail {
    message: String,
}

// The slot between the system instruction and the user text is reserved for
// prior conversation turns. Nothing populates it: every request sends it
// empty, and no memory is kept between submissions.
pub(crate) fn build_messages(
    instruction: &str,
    history: &[ChatTurn],
    user_text: &str,
) -> Vec<ChatTurn> {
    let mut messages = Vec::with_capacity(history.len() + 2);
    messages.push(ChatTurn::new(Role::System, instruction));
    messages.extend_from_slice(history);
    messages.push(ChatTurn::new(Role::User, user_text));
    messages
}

pub(crate) fn build_request_body(persona: Persona, user_text: &str) -> serde_json::Value {
    json!({
        "model": MODEL,
        "messages": build_messages(persona.instruction(), &[], user_text),
        "temperature": TEMPERATURE
    })
}

/// One blocking chat-completion request: persona instruction plus the user
/// text, full response text back. No streaming, no retry, no timeout beyond
/// the client default.
pub(crate) async fn send(
    settings: &Settings,
    persona: Persona,
    user_text: &str,
) -> Result<String, RemoteServiceError> {
    // An absent key is a call-time failure, through the same error kind as
    // any other remote failure.
    let api_key = settings
        .api_key()
        .ok_or_else(|| RemoteServiceError::new("OPENAI_API_KEY is not set"))?;

    let client: Client = ClientBuilder::new().build()?;

    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(
        AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {api_key}"))
            .map_err(|err| RemoteServiceError::new(err.to_string()))?,
    );

    let body = build_request_body(persona, user_text);
    let response = client
        .post(settings.endpoint())
        .headers(headers)
        .json(&body)
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        let message = match response.json::<ApiErrorResponse>().await {
            Ok(payload) => payload.error.message,
            Err(_) => format!("HTTP {status}"),
        };
        return Err(RemoteServiceError::new(message));
    }

    let response: ChatResponse = response.json().await?;
    let answer = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| RemoteServiceError::new("response contained no choices"))?;
    Ok(answer.message.content)
}
