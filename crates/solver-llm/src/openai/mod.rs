mod client;

pub use client::{is_reasoning_model, OpenAIClient};
