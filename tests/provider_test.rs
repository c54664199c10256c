// HTTP-level tests for the OpenAI-compatible provider against a mock server

use std::time::Duration;

use exemplar_solver::providers::{
    LlmProvider, OpenAIProvider, ProviderRequest, ProviderStatusError, RetryPolicy,
};

fn provider(base_url: &str, retry: RetryPolicy) -> OpenAIProvider {
    OpenAIProvider::new_openai("sk-test".to_string())
        .unwrap()
        .with_base_url(base_url)
        .with_model("gpt-4o-mini")
        .with_retry_policy(retry)
}

fn fast_retry(max_attempts: u32) -> RetryPolicy {
    RetryPolicy {
        max_attempts,
        base_delay: Duration::from_millis(1),
    }
}

#[tokio::test]
async fn test_completion_text_and_usage() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/v1/chat/completions")
        .match_header("authorization", "Bearer sk-test")
        .match_body(mockito::Matcher::PartialJsonString(
            r#"{"model":"gpt-4o-mini","messages":[{"role":"user","content":"Solve it"}]}"#
                .to_string(),
        ))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{
                "choices": [{"message": {"role": "assistant", "content": "```python\nprint(1)\n```"}, "finish_reason": "stop"}],
                "usage": {"prompt_tokens": 42, "completion_tokens": 7, "total_tokens": 49}
            }"#,
        )
        .expect(1)
        .create_async()
        .await;

    let completion = provider(&server.url(), RetryPolicy::none())
        .complete(&ProviderRequest::user("Solve it"))
        .await
        .unwrap();

    assert_eq!(completion.text, "```python\nprint(1)\n```");
    assert_eq!(completion.prompt_tokens, 42);
    assert_eq!(completion.completion_tokens, 7);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_missing_usage_counts_as_zero() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/v1/chat/completions")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"choices": [{"message": {"content": "ok"}, "finish_reason": null}]}"#)
        .create_async()
        .await;

    let completion = provider(&server.url(), RetryPolicy::none())
        .complete(&ProviderRequest::user("hi"))
        .await
        .unwrap();

    assert_eq!(completion.text, "ok");
    assert_eq!(completion.prompt_tokens, 0);
    assert_eq!(completion.completion_tokens, 0);
}

#[tokio::test]
async fn test_client_error_is_not_retried() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/v1/chat/completions")
        .with_status(401)
        .with_body(r#"{"error": {"message": "invalid api key"}}"#)
        .expect(1)
        .create_async()
        .await;

    let err = provider(&server.url(), fast_retry(3))
        .complete(&ProviderRequest::user("hi"))
        .await
        .unwrap_err();

    let status = err.downcast_ref::<ProviderStatusError>().unwrap();
    assert_eq!(status.status, 401);
    assert!(status.body.contains("invalid api key"));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_server_error_is_retried_until_budget() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/v1/chat/completions")
        .with_status(503)
        .with_body("overloaded")
        .expect(3)
        .create_async()
        .await;

    let err = provider(&server.url(), fast_retry(3))
        .complete(&ProviderRequest::user("hi"))
        .await
        .unwrap_err();

    assert!(err.to_string().contains("503"));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_no_choices_is_an_error() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/v1/chat/completions")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"choices": []}"#)
        .create_async()
        .await;

    let err = provider(&server.url(), RetryPolicy::none())
        .complete(&ProviderRequest::user("hi"))
        .await
        .unwrap_err();

    assert!(err.to_string().contains("no choices"));
}

#[tokio::test]
async fn test_malformed_responses_are_not_retried() {
    let mut server = mockito::Server::new_async().await;
    let empty = server
        .mock("POST", "/v1/chat/completions")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"choices": []}"#)
        .expect(1)
        .create_async()
        .await;

    let err = provider(&server.url(), fast_retry(3))
        .complete(&ProviderRequest::user("hi"))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("no choices"));
    empty.assert_async().await;
    empty.remove_async().await;

    let garbled = server
        .mock("POST", "/v1/chat/completions")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body("{not json")
        .expect(1)
        .create_async()
        .await;

    let err = provider(&server.url(), fast_retry(3))
        .complete(&ProviderRequest::user("hi"))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("Failed to parse"));
    garbled.assert_async().await;
}
