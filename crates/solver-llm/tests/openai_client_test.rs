use solver_llm::{ChatClient, ChatOptions, ChatRequest, Content, Message, OpenAIClient};

const COMPLETION_BODY: &str = r#"{
    "id": "chatcmpl-1",
    "object": "chat.completion",
    "created": 1700000000,
    "model": "gpt-4o-mini",
    "choices": [
        {
            "index": 0,
            "message": { "role": "assistant", "content": "答案是 42" },
            "finish_reason": "stop"
        }
    ],
    "usage": { "prompt_tokens": 12, "completion_tokens": 5, "total_tokens": 17 }
}"#;

#[tokio::test]
async fn test_chat_parses_completion() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/chat/completions")
        .match_header("authorization", "Bearer test-key")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(COMPLETION_BODY)
        .create_async()
        .await;

    let client = OpenAIClient::new("test-key").unwrap().with_base_url(server.url());
    let request = ChatRequest::new("gpt-4o-mini", vec![Message::human("這題怎麼解？")])
        .with_options(ChatOptions::new().max_tokens(100));

    let response = client.chat(request).await.unwrap();

    mock.assert_async().await;
    assert_eq!(response.content.as_deref(), Some("答案是 42"));
    assert_eq!(response.finish_reason.as_deref(), Some("stop"));
    assert_eq!(response.usage.unwrap().total_tokens, 17);
}

#[tokio::test]
async fn test_chat_sends_image_parts() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/chat/completions")
        .match_body(mockito::Matcher::PartialJsonString(
            r#"{"messages":[{"role":"user","content":[{"type":"text","text":"解題"},{"type":"image_url","image_url":{"url":"https://img.example/q.png"}}]}]}"#
                .to_string(),
        ))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(COMPLETION_BODY)
        .create_async()
        .await;

    let client = OpenAIClient::new("test-key").unwrap().with_base_url(server.url());
    let content = Content::text_with_image("解題", Some("https://img.example/q.png"));
    let request = ChatRequest::new("gpt-4o", vec![Message::human(content)]);

    client.chat(request).await.unwrap();
    mock.assert_async().await;
}

#[tokio::test]
async fn test_chat_surfaces_api_errors() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/chat/completions")
        .with_status(503)
        .with_body("upstream overloaded")
        .create_async()
        .await;

    let client = OpenAIClient::new("test-key").unwrap().with_base_url(server.url());
    let request = ChatRequest::new("gpt-4o-mini", vec![Message::human("hi")]);

    let err = client.chat(request).await.unwrap_err();
    let message = err.to_string();
    assert!(message.contains("503"));
    assert!(message.contains("upstream overloaded"));
}
