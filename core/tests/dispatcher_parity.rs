//! The two backends must be interchangeable at the validation boundary:
//! the same reply text, produced by either path, validates identically.

use std::io::Write as _;
use std::os::unix::fs::PermissionsExt;

use aiconv_core::{
    validate_response, ConvertError, GenerationRequest, Generator, ProviderClient, ProviderConfig,
    RemoteCredentials,
};
use pretty_assertions::assert_eq;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const REPLY: &str =
    r#"{"commands":["ffmpeg -i in.mp4 -c:v libx264 in_converted.mp4"],"explanation":"Re-encodes the video."}"#;

fn request() -> GenerationRequest {
    GenerationRequest {
        system_prompt: "system prompt under test".to_string(),
        user_prompt: "shrink my clip".to_string(),
    }
}

async fn remote_client(server: &MockServer) -> ProviderClient {
    let credentials = RemoteCredentials {
        account_id: "acct-123".to_string(),
        api_token: "secret-token".to_string(),
    };
    let config = ProviderConfig::remote_chat(credentials, "test-model").with_base_url(server.uri());
    ProviderClient::new(config).unwrap()
}

/// A stand-in agent binary: ignores its arguments and prints the reply.
fn fake_agent(dir: &tempfile::TempDir, stdout: &str) -> String {
    let path = dir.path().join("fake-agent");
    let mut file = std::fs::File::create(&path).unwrap();
    writeln!(file, "#!/bin/sh").unwrap();
    writeln!(file, "cat <<'REPLY_EOF'").unwrap();
    writeln!(file, "{stdout}").unwrap();
    writeln!(file, "REPLY_EOF").unwrap();
    drop(file);
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path.display().to_string()
}

#[tokio::test]
async fn both_backends_validate_to_the_same_result() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/accounts/acct-123/ai/v1/chat/completions"))
        .and(body_partial_json(serde_json::json!({
            "model": "test-model",
            "response_format": { "type": "json_object" },
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "choices": [{ "message": { "role": "assistant", "content": REPLY } }]
        })))
        .mount(&server)
        .await;

    let remote = remote_client(&server).await;
    let remote_raw = remote.generate(&request()).await.unwrap();

    let dir = tempfile::tempdir().unwrap();
    let local = ProviderClient::new(ProviderConfig::local_agent(fake_agent(&dir, REPLY))).unwrap();
    let local_raw = local.generate(&request()).await.unwrap();

    let remote_result = validate_response(&remote_raw).unwrap();
    let local_result = validate_response(&local_raw).unwrap();
    assert_eq!(remote_result, local_result);
    assert_eq!(remote_result.commands.len(), 1);
}

#[tokio::test]
async fn remote_sends_two_role_tagged_messages() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/accounts/acct-123/ai/v1/chat/completions"))
        .and(body_partial_json(serde_json::json!({
            "messages": [
                { "role": "system", "content": "system prompt under test" },
                { "role": "user", "content": "shrink my clip" },
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "choices": [{ "message": { "role": "assistant", "content": REPLY } }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let remote = remote_client(&server).await;
    remote.generate(&request()).await.unwrap();
}

#[tokio::test]
async fn non_success_status_is_a_backend_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401).set_body_string("authentication error"))
        .mount(&server)
        .await;

    let remote = remote_client(&server).await;
    let err = remote.generate(&request()).await.unwrap_err();
    assert!(matches!(err, ConvertError::Backend { .. }));
    assert!(err.to_string().contains("401"));
}

#[tokio::test]
async fn missing_agent_binary_is_a_backend_error() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("no-such-agent").display().to_string();
    let local = ProviderClient::new(ProviderConfig::local_agent(missing)).unwrap();

    let err = local.generate(&request()).await.unwrap_err();
    assert!(matches!(err, ConvertError::Backend { .. }));
}

#[tokio::test]
async fn failing_agent_surfaces_its_stderr() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken-agent");
    std::fs::write(&path, "#!/bin/sh\necho 'model unavailable' >&2\nexit 3\n").unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();

    let local =
        ProviderClient::new(ProviderConfig::local_agent(path.display().to_string())).unwrap();
    let err = local.generate(&request()).await.unwrap_err();
    assert!(err.to_string().contains("model unavailable"));
}
