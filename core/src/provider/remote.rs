//! Remote chat backend: one POST per attempt to an account-scoped,
//! OpenAI-compatible chat completions endpoint.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{GenerationRequest, ProviderConfig};
use crate::error::{ConvertError, ConvertResult};

const BACKEND: &str = "remote chat";

/// Hard cap on reply length. The contract reply is small; anything larger
/// is already malformed.
const MAX_REPLY_TOKENS: u32 = 1024;
const TEMPERATURE: f32 = 0.2;

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    max_tokens: u32,
    temperature: f32,
    response_format: ResponseFormat,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

/// Asks the service to constrain its own output to a JSON object.
#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ReplyMessage,
}

#[derive(Deserialize)]
struct ReplyMessage {
    content: String,
}

pub(super) async fn complete(
    http: &reqwest::Client,
    config: &ProviderConfig,
    request: &GenerationRequest,
) -> ConvertResult<String> {
    let credentials = config
        .remote_credentials
        .as_ref()
        .ok_or_else(|| ConvertError::config("remote provider dispatched without credentials"))?;

    let url = format!(
        "{}/accounts/{}/ai/v1/chat/completions",
        config.base_url.trim_end_matches('/'),
        credentials.account_id
    );

    let body = ChatRequest {
        model: &config.model,
        messages: [
            ChatMessage {
                role: "system",
                content: &request.system_prompt,
            },
            ChatMessage {
                role: "user",
                content: &request.user_prompt,
            },
        ],
        max_tokens: MAX_REPLY_TOKENS,
        temperature: TEMPERATURE,
        response_format: ResponseFormat { kind: "json_object" },
    };

    debug!(model = %config.model, "sending chat completion request");
    let response = http
        .post(&url)
        .bearer_auth(&credentials.api_token)
        .json(&body)
        .send()
        .await
        .map_err(|err| ConvertError::backend(BACKEND, format!("request failed: {err}")))?;

    let status = response.status();
    let text = response.text().await.map_err(|err| {
        ConvertError::backend(BACKEND, format!("could not read response body: {err}"))
    })?;

    if !status.is_success() {
        return Err(ConvertError::backend(
            BACKEND,
            format!("endpoint returned {status}: {}", snippet(&text)),
        ));
    }

    let parsed: ChatResponse = serde_json::from_str(&text).map_err(|err| {
        ConvertError::backend(BACKEND, format!("malformed completion envelope: {err}"))
    })?;

    parsed
        .choices
        .into_iter()
        .next()
        .map(|choice| choice.message.content)
        .ok_or_else(|| ConvertError::backend(BACKEND, "completion contained no choices"))
}

/// Error bodies can be arbitrarily large HTML pages; keep a readable head.
fn snippet(body: &str) -> &str {
    match body.char_indices().nth(300) {
        Some((index, _)) => &body[..index],
        None => body,
    }
}
