use chrono::Utc;
use futures::StreamExt;
use mockito::Matcher;
use tether_llm::{
    CompletionProvider, OpenAICompatibleConfig, OpenAICompatibleProvider, Provider, ProviderEvent,
    ProviderRequest,
};
use tether_types::Message;

fn history() -> Vec<Message> {
    vec![Message::user_text("m1", "t1", "hello", Utc::now())]
}

async fn drain(provider: &dyn Provider, request: ProviderRequest) -> Vec<ProviderEvent> {
    provider
        .stream(request)
        .await
        .unwrap()
        .map(|event| event.unwrap())
        .collect()
        .await
}

#[tokio::test]
async fn test_streaming_provider_parses_sse_until_done() {
    let mut server = mockito::Server::new_async().await;
    let body = concat!(
        "data: {\"choices\":[{\"delta\":{\"role\":\"assistant\"}}]}\n\n",
        "data: {\"choices\":[{\"delta\":{\"content\":\"Hi\"}}]}\n\n",
        "data: {\"choices\":[{\"delta\":{\"content\":\" there\"}}]}\n\n",
        "data: [DONE]\n\n",
    );
    let mock = server
        .mock("POST", "/chat/completions")
        .match_header("authorization", "Bearer sk-test")
        .match_body(Matcher::PartialJson(serde_json::json!({
            "model": "gpt-4o-mini",
            "stream": true,
            "messages": [{"role": "user", "content": "hello"}]
        })))
        .with_status(200)
        .with_header("content-type", "text/event-stream")
        .with_body(body)
        .create_async()
        .await;

    let provider = OpenAICompatibleProvider::openai("sk-test", "gpt-4o-mini")
        .unwrap()
        .with_base_url(server.url());

    let events = drain(&provider, ProviderRequest::new("t1", history(), "")).await;

    mock.assert_async().await;
    assert_eq!(events, vec![ProviderEvent::delta("Hi"), ProviderEvent::delta(" there")]);
}

#[tokio::test]
async fn test_streaming_provider_surfaces_error_payload() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/chat/completions")
        .with_status(200)
        .with_body("data: {\"error\":{\"message\":\"quota exceeded\"}}\n\ndata: [DONE]\n\n")
        .create_async()
        .await;

    let provider = OpenAICompatibleProvider::openrouter("sk-test", "some/model")
        .unwrap()
        .with_base_url(server.url());

    let events = drain(&provider, ProviderRequest::new("t1", history(), "")).await;
    assert_eq!(events, vec![ProviderEvent::error("quota exceeded")]);
}

#[tokio::test]
async fn test_non_success_status_fails_request() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/chat/completions")
        .with_status(401)
        .with_body("{\"error\":\"bad key\"}")
        .create_async()
        .await;

    let provider = OpenAICompatibleProvider::openai("sk-bad", "gpt-4o-mini")
        .unwrap()
        .with_base_url(server.url());

    match provider.stream(ProviderRequest::new("t1", history(), "")).await {
        Err(e) => {
            let message = e.to_string();
            assert!(message.contains("401"), "unexpected error: {}", message);
            assert!(message.contains("bad key"));
        }
        Ok(_) => panic!("Expected request failure"),
    }
}

#[tokio::test]
async fn test_completion_provider_chunks_words() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/chat/completions")
        .match_body(Matcher::PartialJson(serde_json::json!({"stream": false})))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"choices":[{"message":{"role":"assistant","content":"one two three"}}]}"#)
        .create_async()
        .await;

    let provider = CompletionProvider::new(
        "local",
        OpenAICompatibleConfig::new("sk-test", "tiny", server.url()),
    )
    .unwrap();

    let events = drain(&provider, ProviderRequest::new("t1", history(), "")).await;
    assert_eq!(
        events,
        vec![
            ProviderEvent::delta("one "),
            ProviderEvent::delta("two "),
            ProviderEvent::delta("three"),
        ]
    );
}
