use solver_llm::{Content, ContentPart, Message};

#[test]
fn test_content_text_creation() {
    let content = Content::text("Hello, world!");
    assert_eq!(content.as_text(), Some("Hello, world!"));
}

#[test]
fn test_content_from_string() {
    let content: Content = "Test".into();
    assert_eq!(content.as_text(), Some("Test"));
}

#[test]
fn test_text_with_image_builds_parts() {
    let content = Content::text_with_image("這題怎麼解？", Some("https://img.example/a.png"));
    assert_eq!(content.as_text(), None);
    assert_eq!(content.image_urls(), vec!["https://img.example/a.png"]);

    match content {
        Content::Parts(parts) => {
            assert_eq!(parts.len(), 2);
            assert!(matches!(&parts[0], ContentPart::Text { text } if text == "這題怎麼解？"));
        }
        Content::Text(_) => panic!("expected multipart content"),
    }
}

#[test]
fn test_text_without_image_stays_text() {
    let content = Content::text_with_image("only text", None);
    assert_eq!(content, Content::text("only text"));
    assert!(content.image_urls().is_empty());
}

#[test]
fn test_message_roles() {
    assert_eq!(Message::system("You are helpful").role(), "system");
    assert_eq!(Message::human("Hello").role(), "user");
    assert_eq!(Message::ai("Hi there!").role(), "assistant");
}

#[test]
fn test_message_serialization_human() {
    let msg = Message::human("Hello");
    let json = serde_json::to_string(&msg).unwrap();
    assert!(json.contains("\"role\":\"user\""));
    assert!(json.contains("Hello"));
}

#[test]
fn test_multipart_serialization() {
    let msg = Message::human(Content::text_with_image("q", Some("https://img.example/b.png")));
    let json = serde_json::to_value(&msg).unwrap();
    assert_eq!(json["content"][1]["type"], "image_url");
    assert_eq!(json["content"][1]["image_url"]["detail"], "auto");
}

#[test]
fn test_message_deserialization() {
    let json = r#"{"role":"assistant","content":"Test"}"#;
    let msg: Message = serde_json::from_str(json).unwrap();
    assert_eq!(msg.role(), "assistant");
    assert_eq!(msg.content().as_text(), Some("Test"));
}
