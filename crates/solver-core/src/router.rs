use std::sync::Arc;

use solver_llm::{ChatClient, ChatOptions, ChatRequest, Content, Message as LLMMessage};
use solver_persist::MessageRole;

use crate::config::RouteProfile;
use crate::subject::SubjectHint;

const QUANTITATIVE_APOLOGY: &str = "抱歉，數理解題服務暫時無法回應，請稍後再試一次。";
const GENERAL_APOLOGY: &str = "抱歉，目前無法產生解答，請稍後再試一次。";

/// A previous turn as sent to the model
#[derive(Debug, Clone, PartialEq)]
pub struct PriorTurn {
    pub role: MessageRole,
    pub content: String,
}

impl PriorTurn {
    fn into_llm_message(self) -> LLMMessage {
        match self.role {
            MessageRole::User => LLMMessage::human(self.content),
            MessageRole::Assistant => LLMMessage::ai(self.content),
        }
    }
}

/// Picks the model configuration for a turn and never fails
pub struct SubjectRouter {
    client: Arc<dyn ChatClient>,
    general: RouteProfile,
    quantitative: RouteProfile,
}

impl SubjectRouter {
    pub fn new(client: Arc<dyn ChatClient>, general: RouteProfile, quantitative: RouteProfile) -> Self {
        Self {
            client,
            general,
            quantitative,
        }
    }

    /// Profile chosen for a subject
    pub fn profile_for(&self, subject: Option<SubjectHint>) -> &RouteProfile {
        match subject {
            Some(hint) if hint.is_quantitative() => &self.quantitative,
            _ => &self.general,
        }
    }

    /// Apology stored as the assistant turn when the model call fails
    pub fn apology_for(subject: Option<SubjectHint>) -> &'static str {
        match subject {
            Some(hint) if hint.is_quantitative() => QUANTITATIVE_APOLOGY,
            _ => GENERAL_APOLOGY,
        }
    }

    /// Build the request: system prompt, prior turns, then the new
    /// (possibly multimodal) user turn
    pub fn build_request(
        &self,
        subject: Option<SubjectHint>,
        prior_turns: Vec<PriorTurn>,
        new_content: &str,
        new_image_url: Option<&str>,
    ) -> ChatRequest {
        let profile = self.profile_for(subject);

        let mut messages = Vec::with_capacity(prior_turns.len() + 2);
        messages.push(LLMMessage::system(profile.system_prompt.clone()));
        messages.extend(prior_turns.into_iter().map(PriorTurn::into_llm_message));
        messages.push(LLMMessage::human(Content::text_with_image(new_content, new_image_url)));

        let mut options = ChatOptions::new();
        if let Some(temperature) = profile.temperature {
            options = options.temperature(temperature);
        }
        if let Some(max_tokens) = profile.max_tokens {
            options = options.max_tokens(max_tokens);
        }

        ChatRequest::new(profile.model.clone(), messages).with_options(options)
    }

    /// Answer a turn. Model errors and empty replies become an apology.
    pub async fn answer(
        &self,
        subject: Option<SubjectHint>,
        prior_turns: Vec<PriorTurn>,
        new_content: &str,
        new_image_url: Option<&str>,
    ) -> String {
        let request = self.build_request(subject, prior_turns, new_content, new_image_url);
        let model = request.model.clone();

        match self.client.chat(request).await {
            Ok(response) => match response.content.filter(|c| !c.trim().is_empty()) {
                Some(reply) => reply,
                None => {
                    tracing::warn!(model = %model, "Model returned empty content, substituting apology");
                    Self::apology_for(subject).to_string()
                }
            },
            Err(e) => {
                tracing::warn!(model = %model, error = %e, "Model call failed, substituting apology");
                Self::apology_for(subject).to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use async_trait::async_trait;
    use solver_llm::ChatResponse;

    struct FixedClient(Option<&'static str>);

    #[async_trait]
    impl ChatClient for FixedClient {
        async fn chat(&self, _request: ChatRequest) -> Result<ChatResponse> {
            match self.0 {
                Some(reply) => Ok(ChatResponse::text(reply)),
                None => anyhow::bail!("connection reset"),
            }
        }
    }

    fn router(reply: Option<&'static str>) -> SubjectRouter {
        SubjectRouter::new(
            Arc::new(FixedClient(reply)),
            RouteProfile::general(),
            RouteProfile::quantitative(),
        )
    }

    #[test]
    fn test_profile_selection() {
        let router = router(None);
        assert_eq!(router.profile_for(Some(SubjectHint::Math)).model, "o4-mini");
        assert_eq!(router.profile_for(Some(SubjectHint::History)).model, "gpt-4o-mini");
        assert_eq!(router.profile_for(None).model, "gpt-4o-mini");
    }

    #[test]
    fn test_request_shape() {
        let prior = vec![
            PriorTurn { role: MessageRole::User, content: "第一題".to_string() },
            PriorTurn { role: MessageRole::Assistant, content: "答案是 3".to_string() },
        ];
        let request = router(None).build_request(
            Some(SubjectHint::Physics),
            prior,
            "那第二題呢？",
            Some("https://img.example/p2.png"),
        );

        assert_eq!(request.model, "o4-mini");
        assert_eq!(request.messages.len(), 4);
        assert_eq!(request.messages[0].role(), "system");
        assert_eq!(request.messages[1].role(), "user");
        assert_eq!(request.messages[2].role(), "assistant");
        assert_eq!(
            request.messages[3].content().image_urls(),
            vec!["https://img.example/p2.png"]
        );
        assert_eq!(request.options.max_tokens, Some(4000));
    }

    #[tokio::test]
    async fn test_answer_passes_reply_through() {
        let reply = router(Some("答案是 42")).answer(None, vec![], "q", None).await;
        assert_eq!(reply, "答案是 42");
    }

    #[tokio::test]
    async fn test_answer_absorbs_failures() {
        let reply = router(None).answer(Some(SubjectHint::Math), vec![], "q", None).await;
        assert_eq!(reply, QUANTITATIVE_APOLOGY);

        let reply = router(None).answer(None, vec![], "q", None).await;
        assert_eq!(reply, GENERAL_APOLOGY);
    }

    #[tokio::test]
    async fn test_answer_empty_reply_is_apology() {
        let reply = router(Some("   ")).answer(None, vec![], "q", None).await;
        assert_eq!(reply, GENERAL_APOLOGY);
    }
}
