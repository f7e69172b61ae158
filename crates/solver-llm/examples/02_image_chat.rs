use anyhow::Result;
use solver_llm::{ChatClient, ChatOptions, ChatRequest, Content, Message, OpenAIClient};

#[tokio::main]
async fn main() -> Result<()> {
    let api_key = std::env::var("OPENAI_API_KEY")?;
    let image_url = std::env::args()
        .nth(1)
        .ok_or_else(|| anyhow::anyhow!("usage: 02_image_chat <image-url>"))?;

    let client = OpenAIClient::new(api_key)?;

    let request = ChatRequest::new(
        "gpt-4o",
        vec![
            Message::system("你是一位耐心的家教，請一步一步說明解題過程。"),
            Message::human(Content::text_with_image("請幫我解這一題", Some(&image_url))),
        ],
    )
    .with_options(ChatOptions::new().max_tokens(1500));

    let response = client.chat(request).await?;
    println!("{}", response.content.unwrap_or_default());

    Ok(())
}
