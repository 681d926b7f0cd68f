#![allow(clippy::future_not_send)]

pub mod cli;
mod openai;
mod persona;
mod prompts;

use thiserror::Error;

pub use openai::{ChatTurn, RemoteServiceError, Role};
pub use persona::{instruction_for_label, Persona};

/// Everything the requester needs from the environment, captured once at
/// startup. The key is not validated here; an absent or bad key surfaces at
/// call time like any other remote failure.
#[derive(Clone, Debug)]
pub struct Settings {
    api_key: Option<String>,
    endpoint: String,
}

impl Settings {
    /// Reads `OPENAI_API_KEY` from the process environment. Call after the
    /// `.env` file has been loaded; an empty value counts as unset.
    pub fn from_env() -> Self {
        Self {
            api_key: std::env::var("OPENAI_API_KEY")
                .ok()
                .filter(|key| !key.is_empty()),
            endpoint: openai::API_URL.to_string(),
        }
    }

    pub(crate) fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref()
    }

    pub(crate) fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[derive(Debug, Error)]
pub enum AskError {
    /// Blank input is rejected before a request is built; the remote
    /// service is never contacted for it.
    #[error("テキストを入力してください。")]
    EmptyInput,
    #[error("{0}")]
    Remote(#[from] RemoteServiceError),
}

/// The submit operation behind the 送信 action: reject whitespace-only
/// input locally, otherwise issue exactly one chat-completion request with
/// the persona's instruction and return the answer text verbatim.
pub async fn ask(
    settings: Settings,
    persona: Persona,
    user_text: String,
) -> Result<String, AskError> {
    if user_text.trim().is_empty() {
        return Err(AskError::EmptyInput);
    }
    Ok(openai::send(&settings, persona, &user_text).await?)
}

#[cfg(test)]
mod tests {
    use crate::{ask, AskError, Persona, Settings};

    // Nothing listens here; reaching it would fail the EmptyInput tests
    // with a Remote error instead.
    fn unroutable_settings() -> Settings {
        Settings {
            api_key: Some("sk-test-key".to_string()),
            endpoint: "http://127.0.0.1:1/v1/chat/completions".to_string(),
        }
    }

    #[tokio::test]
    async fn empty_input_is_rejected_without_network_io() {
        let result = ask(unroutable_settings(), Persona::KokugoSensei, String::new()).await;
        assert!(matches!(result, Err(AskError::EmptyInput)));
    }

    #[tokio::test]
    async fn whitespace_only_input_is_rejected_without_network_io() {
        // Covers ASCII whitespace and the ideographic space U+3000.
        for text in [" \t\n", "　　", " \u{3000} "] {
            let result = ask(
                unroutable_settings(),
                Persona::ItEngineer,
                text.to_string(),
            )
            .await;
            assert!(matches!(result, Err(AskError::EmptyInput)), "input {text:?}");
        }
    }

    #[tokio::test]
    async fn transport_failure_surfaces_as_remote_error() {
        let result = ask(
            unroutable_settings(),
            Persona::ItEngineer,
            "RAGとは?".to_string(),
        )
        .await;
        assert!(matches!(result, Err(AskError::Remote(_))));
    }

    #[tokio::test]
    async fn missing_api_key_fails_at_call_time() {
        let settings = Settings {
            api_key: None,
            endpoint: "http://127.0.0.1:1/v1/chat/completions".to_string(),
        };
        let err = ask(settings, Persona::KokugoSensei, "RAGとは?".to_string())
            .await
            .unwrap_err();
        match err {
            AskError::Remote(remote) => {
                assert!(remote.to_string().contains("OPENAI_API_KEY"));
            }
            AskError::EmptyInput => panic!("expected a remote failure"),
        }
    }

    #[cfg(feature = "live-api-tests")]
    mod live {
        use crate::{ask, AskError, Persona, Settings};

        #[tokio::test]
        async fn engineer_persona_answers_a_real_question() {
            dotenvy::dotenv().ok();
            let settings = Settings::from_env();
            let answer = ask(settings, Persona::ItEngineer, "RAGとは?".to_string())
                .await
                .unwrap();
            assert!(!answer.trim().is_empty());
        }

        #[tokio::test]
        async fn invalid_api_key_is_rejected_by_the_service() {
            let settings = Settings {
                api_key: Some("sk-invalid-0000000000000000".to_string()),
                endpoint: crate::openai::API_URL.to_string(),
            };
            let err = ask(settings, Persona::KokugoSensei, "こんにちは".to_string())
                .await
                .unwrap_err();
            assert!(matches!(err, AskError::Remote(_)));
        }
    }
}
