pub mod types;
pub mod traits;
pub mod config;
pub mod openai;

pub use traits::{ChatClient, ChatRequest, ChatResponse, ChatOptions, TokenUsage};
pub use config::{ClientFactory, OpenAIConfig, ProviderConfig};
pub use openai::{is_reasoning_model, OpenAIClient};
pub use types::{Message, Content, ContentPart, ImageUrl, ImageDetail};
