//! Recovery loop behavior against scripted backends and operators.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use aiconv_core::{
    generate_with_recovery, ConversionOutcome, ConvertError, ConvertResult, GenerationRequest,
    Generator, Operator, RecoveryChoice, ValidationFailure,
};
use pretty_assertions::assert_eq;

const VALID_REPLY: &str =
    r#"{"commands":["ffmpeg -i in.mp4 -c:v libx264 in_converted.mp4"],"explanation":"Re-encodes the video."}"#;
const GARBAGE_REPLY: &str = "Sure! Here is what I would do:";
const SYSTEM_PROMPT: &str = "system prompt under test";

struct ScriptedGenerator {
    replies: Mutex<VecDeque<ConvertResult<String>>>,
    calls: AtomicUsize,
    seen_requests: Mutex<Vec<GenerationRequest>>,
}

impl ScriptedGenerator {
    fn new(replies: Vec<ConvertResult<String>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            calls: AtomicUsize::new(0),
            seen_requests: Mutex::new(Vec::new()),
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Generator for ScriptedGenerator {
    async fn generate(&self, request: &GenerationRequest) -> ConvertResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen_requests.lock().unwrap().push(request.clone());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .expect("generator script exhausted")
    }
}

struct ScriptedOperator {
    choices: VecDeque<RecoveryChoice>,
    failures: Vec<ValidationFailure>,
}

impl ScriptedOperator {
    fn new(choices: Vec<RecoveryChoice>) -> Self {
        Self {
            choices: choices.into(),
            failures: Vec::new(),
        }
    }
}

#[async_trait]
impl Operator for ScriptedOperator {
    async fn on_validation_failure(
        &mut self,
        failure: &ValidationFailure,
    ) -> ConvertResult<RecoveryChoice> {
        self.failures.push(failure.clone());
        Ok(self.choices.pop_front().expect("operator script exhausted"))
    }
}

#[tokio::test]
async fn retrying_operator_reaches_success_after_three_dispatches() {
    let generator = ScriptedGenerator::new(vec![
        Ok(GARBAGE_REPLY.to_string()),
        Ok(GARBAGE_REPLY.to_string()),
        Ok(VALID_REPLY.to_string()),
    ]);
    let mut operator = ScriptedOperator::new(vec![RecoveryChoice::Retry, RecoveryChoice::Retry]);

    let outcome = generate_with_recovery(
        &generator,
        SYSTEM_PROMPT,
        "shrink my clip".to_string(),
        &mut operator,
    )
    .await
    .unwrap();

    let ConversionOutcome::Completed(result) = outcome else {
        panic!("expected completion");
    };
    assert_eq!(result.commands.len(), 1);
    assert_eq!(generator.calls(), 3);
    assert_eq!(operator.failures.len(), 2);
}

#[tokio::test]
async fn cancelling_operator_stops_after_one_dispatch() {
    let generator = ScriptedGenerator::new(vec![Ok(GARBAGE_REPLY.to_string())]);
    let mut operator = ScriptedOperator::new(vec![RecoveryChoice::Cancel]);

    let outcome = generate_with_recovery(
        &generator,
        SYSTEM_PROMPT,
        "shrink my clip".to_string(),
        &mut operator,
    )
    .await
    .unwrap();

    assert_eq!(outcome, ConversionOutcome::Cancelled);
    assert_eq!(generator.calls(), 1);
}

#[tokio::test]
async fn editing_replaces_the_user_prompt_but_not_the_system_prompt() {
    let generator = ScriptedGenerator::new(vec![
        Ok(GARBAGE_REPLY.to_string()),
        Ok(VALID_REPLY.to_string()),
    ]);
    let mut operator = ScriptedOperator::new(vec![RecoveryChoice::Edit(
        "convert it to webm instead".to_string(),
    )]);

    generate_with_recovery(
        &generator,
        SYSTEM_PROMPT,
        "shrink my clip".to_string(),
        &mut operator,
    )
    .await
    .unwrap();

    let requests = generator.seen_requests.lock().unwrap();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].user_prompt, "shrink my clip");
    assert_eq!(requests[1].user_prompt, "convert it to webm instead");
    assert_eq!(requests[0].system_prompt, requests[1].system_prompt);
}

#[tokio::test]
async fn operator_sees_the_raw_offending_text() {
    let generator = ScriptedGenerator::new(vec![Ok(GARBAGE_REPLY.to_string())]);
    let mut operator = ScriptedOperator::new(vec![RecoveryChoice::Cancel]);

    generate_with_recovery(
        &generator,
        SYSTEM_PROMPT,
        "shrink my clip".to_string(),
        &mut operator,
    )
    .await
    .unwrap();

    assert_eq!(operator.failures[0].raw, GARBAGE_REPLY);
}

#[tokio::test]
async fn backend_errors_bypass_the_operator() {
    let generator = ScriptedGenerator::new(vec![Err(ConvertError::backend(
        "remote chat",
        "endpoint returned 500",
    ))]);
    let mut operator = ScriptedOperator::new(vec![]);

    let err = generate_with_recovery(
        &generator,
        SYSTEM_PROMPT,
        "shrink my clip".to_string(),
        &mut operator,
    )
    .await
    .unwrap_err();

    assert!(matches!(err, ConvertError::Backend { .. }));
    assert_eq!(generator.calls(), 1);
    assert!(operator.failures.is_empty());
}
