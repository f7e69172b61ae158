use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, Duration, FixedOffset, Offset, Utc};
use solver_llm::{ChatClient, ChatOptions, ChatRequest, Message as LLMMessage};

use crate::config::TitleProfile;
use crate::subject::SubjectHint;
use crate::templates::TITLE_SYSTEM_PROMPT;

/// Longest title accepted from the model or from a rename
pub const MAX_TITLE_CHARS: usize = 50;

/// Reply prefix sent to the title model
const SUMMARY_INPUT_CHARS: usize = 300;

/// First-line fallback length before the ellipsis
const FIRST_LINE_CHARS: usize = 20;

const ELLIPSIS: char = '…';

/// Openers that say nothing about the problem
const FILLER_PREFIXES: &[&str] = &[
    "好的", "好，", "當然", "沒問題", "讓我", "我們來", "我來", "首先", "以下是", "這是一",
    "sure", "okay", "ok,", "certainly", "of course", "let me", "let's", "here is", "here's",
];

/// Derives a short display title for a new thread. Never fails.
pub struct TitleSummarizer {
    client: Arc<dyn ChatClient>,
    profile: TitleProfile,
}

impl TitleSummarizer {
    pub fn new(client: Arc<dyn ChatClient>, profile: TitleProfile) -> Self {
        Self { client, profile }
    }

    fn offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.profile.utc_offset_minutes * 60)
            .unwrap_or_else(|| Utc.fix())
    }

    /// Title for a thread whose first reply is `reply`
    pub async fn summarize(&self, reply: &str, subject: Option<SubjectHint>) -> String {
        self.summarize_at(reply, subject, Utc::now()).await
    }

    pub async fn summarize_at(
        &self,
        reply: &str,
        subject: Option<SubjectHint>,
        now: DateTime<Utc>,
    ) -> String {
        if !reply.trim().is_empty() {
            match self.generate(reply, subject).await {
                Ok(Some(title)) => return title,
                Ok(None) => tracing::warn!("Title model returned an unusable title, falling back"),
                Err(e) => tracing::warn!(error = %e, "Title generation failed, falling back"),
            }

            if let Some(title) = first_line_title(reply) {
                return title;
            }
        }

        format!(
            "{} {}",
            SubjectHint::title_prefix(subject),
            format_relative_time(now, now, &self.offset())
        )
    }

    async fn generate(&self, reply: &str, subject: Option<SubjectHint>) -> Result<Option<String>> {
        let excerpt: String = reply.chars().take(SUMMARY_INPUT_CHARS).collect();
        let prompt = match subject {
            Some(hint) => format!("科目：{}\n\n{}", hint.label(), excerpt),
            None => excerpt,
        };

        let request = ChatRequest::new(
            self.profile.model.clone(),
            vec![LLMMessage::system(TITLE_SYSTEM_PROMPT), LLMMessage::human(prompt)],
        )
        .with_options(ChatOptions::new().temperature(0.3).max_tokens(self.profile.max_tokens));

        let response = self.client.chat(request).await?;
        Ok(response.content.as_deref().and_then(validate_title))
    }
}

/// Clean up model output; over-length output is rejected, not truncated
fn validate_title(raw: &str) -> Option<String> {
    let line = raw.lines().map(str::trim).find(|line| !line.is_empty())?;
    let title = line
        .trim_matches(|c: char| {
            matches!(c, '"' | '\'' | '「' | '」' | '『' | '』' | '《' | '》' | '“' | '”' | '*')
        })
        .trim();

    let len = title.chars().count();
    if len == 0 || len > MAX_TITLE_CHARS {
        return None;
    }
    Some(title.to_string())
}

/// First line of the reply, shortened, unless it is generic filler
fn first_line_title(reply: &str) -> Option<String> {
    let line = reply
        .lines()
        .map(|line| {
            line.trim()
                .trim_start_matches(|c: char| matches!(c, '#' | '*' | '>' | '-') || c.is_whitespace())
                .trim_end_matches(|c: char| c == '*' || c.is_whitespace())
        })
        .find(|line| !line.is_empty())?;

    let lowered = line.to_lowercase();
    if FILLER_PREFIXES.iter().any(|prefix| lowered.starts_with(prefix)) {
        return None;
    }

    if line.chars().count() > FIRST_LINE_CHARS {
        let mut title: String = line.chars().take(FIRST_LINE_CHARS).collect();
        title.push(ELLIPSIS);
        Some(title)
    } else {
        Some(line.to_string())
    }
}

/// Format `at` relative to `now` in the given local offset:
/// time of day within 24 hours, date and time within 7 days, full date otherwise
pub fn format_relative_time(at: DateTime<Utc>, now: DateTime<Utc>, offset: &FixedOffset) -> String {
    let local = at.with_timezone(offset);
    let age = now.signed_duration_since(at);

    if age < Duration::hours(24) {
        local.format("%H:%M").to_string()
    } else if age < Duration::days(7) {
        local.format("%m/%d %H:%M").to_string()
    } else {
        local.format("%Y/%m/%d %H:%M").to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::TimeZone;
    use solver_llm::ChatResponse;
    use std::sync::Mutex;

    struct ScriptedClient {
        reply: Option<String>,
        prompts: Mutex<Vec<String>>,
    }

    impl ScriptedClient {
        fn new(reply: Option<&str>) -> Arc<Self> {
            Arc::new(Self {
                reply: reply.map(str::to_string),
                prompts: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl ChatClient for ScriptedClient {
        async fn chat(&self, request: ChatRequest) -> Result<ChatResponse> {
            if let Some(last) = request.messages.last() {
                let text = last.content().as_text().unwrap_or_default().to_string();
                self.prompts.lock().unwrap().push(text);
            }
            match &self.reply {
                Some(reply) => Ok(ChatResponse::text(reply.clone())),
                None => anyhow::bail!("model unavailable"),
            }
        }
    }

    fn summarizer(client: Arc<ScriptedClient>) -> TitleSummarizer {
        TitleSummarizer::new(client, TitleProfile::default())
    }

    fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 19, hour, minute, 0).unwrap()
    }

    #[tokio::test]
    async fn test_uses_model_title() {
        let client = ScriptedClient::new(Some("「二次方程式求根」"));
        let title = summarizer(client).summarize("答案是 42", None).await;
        assert_eq!(title, "二次方程式求根");
    }

    #[tokio::test]
    async fn test_input_is_truncated() {
        let client = ScriptedClient::new(Some("長篇解答"));
        let reply = "解".repeat(1000);
        summarizer(client.clone()).summarize(&reply, None).await;

        let prompts = client.prompts.lock().unwrap();
        assert_eq!(prompts[0].chars().count(), SUMMARY_INPUT_CHARS);
    }

    #[tokio::test]
    async fn test_over_length_model_title_falls_back_to_first_line() {
        let client = ScriptedClient::new(Some(&"標".repeat(51)));
        let title = summarizer(client)
            .summarize("利用配方法可以求出兩個根\n第二行", None)
            .await;
        assert_eq!(title, "利用配方法可以求出兩個根");
    }

    #[tokio::test]
    async fn test_first_line_is_shortened() {
        let client = ScriptedClient::new(None);
        let reply = "## 這個三角形的面積可以用海龍公式計算出來，步驟如下";
        let title = summarizer(client).summarize(reply, None).await;

        assert_eq!(title.chars().count(), FIRST_LINE_CHARS + 1);
        assert!(title.starts_with("這個三角形"));
        assert!(title.ends_with(ELLIPSIS));
    }

    #[tokio::test]
    async fn test_filler_first_line_uses_synthesized_title() {
        let client = ScriptedClient::new(None);
        let title = summarizer(client)
            .summarize_at("好的，我們來看這一題", Some(SubjectHint::Math), at(6, 5))
            .await;
        // 06:05 UTC is 14:05 in UTC+8
        assert_eq!(title, "數學解題 14:05");
    }

    #[tokio::test]
    async fn test_empty_reply_never_empty_title() {
        let client = ScriptedClient::new(Some("should not be asked"));
        let title = summarizer(client.clone()).summarize_at("", None, at(0, 0)).await;

        assert_eq!(title, "作業解題 08:00");
        assert!(client.prompts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_titles_are_bounded() {
        let replies = ["", "   ", "x", &"很長的內容".repeat(40), "Sure! Here it is"];
        for reply in replies {
            let title = summarizer(ScriptedClient::new(None)).summarize(reply, None).await;
            let len = title.chars().count();
            assert!(len > 0 && len <= MAX_TITLE_CHARS, "bad title {:?}", title);
        }
    }

    #[test]
    fn test_validate_title() {
        assert_eq!(validate_title("  \n 向量內積 \n"), Some("向量內積".to_string()));
        assert_eq!(validate_title("\"\""), None);
        assert_eq!(validate_title(&"a".repeat(50)), Some("a".repeat(50)));
        assert_eq!(validate_title(&"a".repeat(51)), None);
    }

    #[test]
    fn test_format_relative_time() {
        let offset = FixedOffset::east_opt(8 * 3600).unwrap();
        let now = Utc.with_ymd_and_hms(2026, 10, 19, 12, 0, 0).unwrap();

        let recent = now - Duration::hours(3);
        assert_eq!(format_relative_time(recent, now, &offset), "17:00");

        let this_week = now - Duration::days(3);
        assert_eq!(format_relative_time(this_week, now, &offset), "10/16 20:00");

        let old = now - Duration::days(30);
        assert_eq!(format_relative_time(old, now, &offset), "2026/09/19 20:00");
    }
}
