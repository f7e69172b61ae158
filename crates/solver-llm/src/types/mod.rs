pub mod content;
pub mod message;

pub use content::{Content, ContentPart, ImageUrl, ImageDetail};
pub use message::Message;
