use serde::Deserialize;

use crate::templates::{GENERAL_SYSTEM_PROMPT, QUANTITATIVE_SYSTEM_PROMPT};

/// Model and prompt used to answer a turn
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RouteProfile {
    pub model: String,
    #[serde(default)]
    pub system_prompt: String,
    #[serde(default)]
    pub temperature: Option<f32>,
    #[serde(default)]
    pub max_tokens: Option<u32>,
}

impl RouteProfile {
    pub fn general() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            system_prompt: GENERAL_SYSTEM_PROMPT.to_string(),
            temperature: Some(0.7),
            max_tokens: Some(2000),
        }
    }

    pub fn quantitative() -> Self {
        Self {
            model: "o4-mini".to_string(),
            system_prompt: QUANTITATIVE_SYSTEM_PROMPT.to_string(),
            temperature: None,
            max_tokens: Some(4000),
        }
    }

    /// Fill an empty prompt from a built-in template
    pub fn or_prompt(mut self, default_prompt: &str) -> Self {
        if self.system_prompt.trim().is_empty() {
            self.system_prompt = default_prompt.to_string();
        }
        self
    }
}

/// Title generation settings
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TitleProfile {
    pub model: String,
    #[serde(default = "default_title_max_tokens")]
    pub max_tokens: u32,
    /// Offset used when formatting fallback titles in the user's local time
    #[serde(default = "default_utc_offset_minutes")]
    pub utc_offset_minutes: i32,
}

fn default_title_max_tokens() -> u32 {
    50
}

fn default_utc_offset_minutes() -> i32 {
    // Asia/Taipei
    480
}

impl Default for TitleProfile {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            max_tokens: default_title_max_tokens(),
            utc_offset_minutes: default_utc_offset_minutes(),
        }
    }
}
