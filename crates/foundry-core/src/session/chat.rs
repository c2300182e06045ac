//! Per-conversation chat session
//!
//! Each session owns its transcript and usage counters. The system
//! instruction is prepended at call time and never stored, so clearing
//! history cannot lose it. A failed model call leaves the session exactly
//! as it was: the user turn only lands in history together with the
//! assistant turn it produced.

use std::sync::Arc;

use tracing::{debug, info};

use crate::Result;
use crate::config::Config;
use crate::llm::{ChatMessage, ChatModel};
use crate::util::preview;

/// Settings shared by every session, built once from configuration.
#[derive(Debug, Clone)]
pub struct SessionSettings {
    /// Composed system instruction sent on every model call
    pub system_prompt: String,
    /// Deployment name, reported in statistics
    pub model: String,
    /// Project name, reported in statistics
    pub project: String,
}

impl SessionSettings {
    pub fn from_config(config: &Config) -> Self {
        let system_prompt = format!(
            "{}\n\n\
             Context information:\n\
             - Platform: Azure AI Foundry\n\
             - Project: {}\n\
             - Model: {}\n\n\
             Guidelines:\n\
             1. Provide accurate and helpful answers\n\
             2. Keep a professional but friendly tone\n\
             3. If you are unsure about something, say so clearly\n\
             4. Use markdown formatting when it improves readability",
            config.app.system_prompt.trim(),
            config.foundry.project_name,
            config.foundry.openai_deployment,
        );

        Self {
            system_prompt,
            model: config.foundry.openai_deployment.clone(),
            project: config.foundry.project_name.clone(),
        }
    }
}

/// Usage statistics for one session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionStatistics {
    pub session_id: String,
    /// Messages currently in history (user and assistant turns)
    pub message_count: usize,
    pub total_tokens_used: u64,
    pub total_calls: u64,
    /// Integer average, zero when no calls have completed
    pub average_tokens_per_call: u64,
    pub model: String,
    pub project: String,
}

/// One conversation with the model
pub struct ChatSession {
    id: String,
    model: Arc<dyn ChatModel>,
    settings: Arc<SessionSettings>,
    history: Vec<ChatMessage>,
    total_tokens_used: u64,
    total_calls: u64,
}

impl ChatSession {
    pub fn new(
        id: impl Into<String>,
        model: Arc<dyn ChatModel>,
        settings: Arc<SessionSettings>,
    ) -> Self {
        let id = id.into();
        debug!("[{}] Session created", id);
        Self {
            id,
            model,
            settings,
            history: Vec::new(),
            total_tokens_used: 0,
            total_calls: 0,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Send one user message and return the assistant reply.
    ///
    /// History and counters are updated only when the model call succeeds;
    /// on error the session is unchanged and the error propagates.
    pub async fn send(&mut self, message: &str) -> Result<String> {
        let mut messages = Vec::with_capacity(self.history.len() + 2);
        messages.push(ChatMessage::system(&self.settings.system_prompt));
        messages.extend(self.history.iter().cloned());
        messages.push(ChatMessage::user(message));

        info!("[{}] Processing message: {}", self.id, preview(message, 50));

        let completion = self.model.complete(&messages).await?;

        self.history.push(ChatMessage::user(message));
        self.history.push(ChatMessage::assistant(completion.content.clone()));
        self.total_calls += 1;
        self.total_tokens_used += completion.usage.total_tokens;

        info!(
            "[{}] Response generated. Tokens: {} (prompt: {}, completion: {})",
            self.id,
            completion.usage.total_tokens,
            completion.usage.prompt_tokens,
            completion.usage.completion_tokens,
        );

        Ok(completion.content)
    }

    /// Empty the transcript. Usage counters are lifetime totals and stay.
    pub fn clear_history(&mut self) {
        info!("[{}] Clearing history", self.id);
        self.history.clear();
    }

    pub fn history(&self) -> &[ChatMessage] {
        &self.history
    }

    pub fn message_count(&self) -> usize {
        self.history.len()
    }

    pub fn statistics(&self) -> SessionStatistics {
        let average = if self.total_calls > 0 {
            self.total_tokens_used / self.total_calls
        } else {
            0
        };

        SessionStatistics {
            session_id: self.id.clone(),
            message_count: self.history.len(),
            total_tokens_used: self.total_tokens_used,
            total_calls: self.total_calls,
            average_tokens_per_call: average,
            model: self.settings.model.clone(),
            project: self.settings.project.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::llm::{ChatCompletion, ChatRole, TokenUsage};
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Records every transcript it receives and replies with a fixed text.
    struct RecordingModel {
        calls: Mutex<Vec<Vec<ChatMessage>>>,
        reply: String,
        total_tokens: u64,
    }

    impl RecordingModel {
        fn new(reply: &str, total_tokens: u64) -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                reply: reply.to_string(),
                total_tokens,
            }
        }

        fn transcripts(&self) -> Vec<Vec<ChatMessage>> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ChatModel for RecordingModel {
        async fn complete(&self, messages: &[ChatMessage]) -> Result<ChatCompletion> {
            self.calls.lock().unwrap().push(messages.to_vec());
            Ok(ChatCompletion {
                content: self.reply.clone(),
                usage: TokenUsage {
                    prompt_tokens: self.total_tokens / 2,
                    completion_tokens: self.total_tokens - self.total_tokens / 2,
                    total_tokens: self.total_tokens,
                },
            })
        }
    }

    struct FailingModel;

    #[async_trait]
    impl ChatModel for FailingModel {
        async fn complete(&self, _messages: &[ChatMessage]) -> Result<ChatCompletion> {
            Err(Error::Api("503: overloaded".to_string()))
        }
    }

    fn settings() -> Arc<SessionSettings> {
        Arc::new(SessionSettings {
            system_prompt: "You are a test assistant.".to_string(),
            model: "gpt-4".to_string(),
            project: "test-project".to_string(),
        })
    }

    #[tokio::test]
    async fn test_send_appends_both_turns_and_bumps_counters() {
        let model = Arc::new(RecordingModel::new("Hello back", 30));
        let mut session = ChatSession::new("conv-1", model.clone(), settings());

        let reply = session.send("Hello").await.unwrap();
        assert_eq!(reply, "Hello back");
        assert_eq!(session.message_count(), 2);
        assert_eq!(session.history()[0].role, ChatRole::User);
        assert_eq!(session.history()[0].content, "Hello");
        assert_eq!(session.history()[1].role, ChatRole::Assistant);
        assert_eq!(session.history()[1].content, "Hello back");

        let stats = session.statistics();
        assert_eq!(stats.total_calls, 1);
        assert_eq!(stats.total_tokens_used, 30);
    }

    #[tokio::test]
    async fn test_transcript_is_system_plus_history_plus_new_message() {
        let model = Arc::new(RecordingModel::new("reply", 10));
        let mut session = ChatSession::new("conv-1", model.clone(), settings());

        session.send("first").await.unwrap();
        session.send("second").await.unwrap();

        let transcripts = model.transcripts();
        assert_eq!(transcripts.len(), 2);

        // first call: system + new user message
        assert_eq!(transcripts[0].len(), 2);
        assert_eq!(transcripts[0][0].role, ChatRole::System);
        assert_eq!(transcripts[0][0].content, "You are a test assistant.");
        assert_eq!(transcripts[0][1].content, "first");

        // second call: system + prior two turns + new user message
        assert_eq!(transcripts[1].len(), 4);
        assert_eq!(transcripts[1][0].role, ChatRole::System);
        assert_eq!(transcripts[1][1].content, "first");
        assert_eq!(transcripts[1][2].content, "reply");
        assert_eq!(transcripts[1][3].content, "second");

        // system instruction is never stored in history
        assert!(session.history().iter().all(|m| m.role != ChatRole::System));
    }

    #[tokio::test]
    async fn test_failed_send_leaves_session_untouched() {
        let mut session = ChatSession::new("conv-1", Arc::new(FailingModel), settings());

        let err = session.send("hello").await.unwrap_err();
        assert!(err.to_string().contains("503"));
        assert_eq!(session.message_count(), 0);

        let stats = session.statistics();
        assert_eq!(stats.total_calls, 0);
        assert_eq!(stats.total_tokens_used, 0);
    }

    #[tokio::test]
    async fn test_clear_history_keeps_counters() {
        let model = Arc::new(RecordingModel::new("reply", 40));
        let mut session = ChatSession::new("conv-1", model.clone(), settings());

        session.send("one").await.unwrap();
        session.send("two").await.unwrap();
        assert_eq!(session.message_count(), 4);

        session.clear_history();
        assert_eq!(session.message_count(), 0);

        let stats = session.statistics();
        assert_eq!(stats.total_calls, 2);
        assert_eq!(stats.total_tokens_used, 80);

        // next call starts from an empty transcript
        session.send("three").await.unwrap();
        let transcripts = model.transcripts();
        let last = transcripts.last().unwrap();
        assert_eq!(last.len(), 2);
        assert_eq!(last[1].content, "three");
    }

    #[tokio::test]
    async fn test_statistics_average_is_integer_with_zero_guard() {
        let model = Arc::new(RecordingModel::new("reply", 25));
        let mut session = ChatSession::new("conv-1", model, settings());

        assert_eq!(session.statistics().average_tokens_per_call, 0);

        session.send("a").await.unwrap();
        session.send("b").await.unwrap();

        let stats = session.statistics();
        // 50 tokens over 2 calls
        assert_eq!(stats.average_tokens_per_call, 25);
        assert_eq!(stats.model, "gpt-4");
        assert_eq!(stats.project, "test-project");
    }

    struct MeteredModel {
        totals: Mutex<std::collections::VecDeque<u64>>,
    }

    #[async_trait]
    impl ChatModel for MeteredModel {
        async fn complete(&self, _messages: &[ChatMessage]) -> Result<ChatCompletion> {
            let total = self.totals.lock().unwrap().pop_front().unwrap_or(0);
            Ok(ChatCompletion {
                content: "ok".to_string(),
                usage: TokenUsage {
                    prompt_tokens: 0,
                    completion_tokens: 0,
                    total_tokens: total,
                },
            })
        }
    }

    #[tokio::test]
    async fn test_average_truncates_toward_zero() {
        let model = Arc::new(MeteredModel {
            totals: Mutex::new(std::collections::VecDeque::from([400, 300, 300])),
        });
        let mut session = ChatSession::new("conv-1", model, settings());

        session.send("a").await.unwrap();
        session.send("b").await.unwrap();
        session.send("c").await.unwrap();

        let stats = session.statistics();
        assert_eq!(stats.total_tokens_used, 1000);
        assert_eq!(stats.total_calls, 3);
        assert_eq!(stats.average_tokens_per_call, 333);
    }

    #[test]
    fn test_system_prompt_composition() {
        use crate::config::{AppConfig, BotConfig, Config, FoundryConfig};
        use crate::safety::SafetyThreshold;

        let config = Config {
            foundry: FoundryConfig {
                subscription_id: "sub".to_string(),
                resource_group: "rg".to_string(),
                project_name: "my-project".to_string(),
                project_endpoint: String::new(),
                hub_name: String::new(),
                openai_endpoint: "https://example.openai.azure.com".to_string(),
                openai_api_key: "key".to_string(),
                openai_deployment: "gpt-4o".to_string(),
                openai_api_version: "2024-02-15-preview".to_string(),
                temperature: 0.7,
                max_tokens: 2000,
                request_timeout_secs: 30,
                enable_content_safety: true,
                content_safety_threshold: SafetyThreshold::Medium,
                content_safety_endpoint: None,
                content_safety_key: None,
                enable_ai_search: false,
                ai_search_endpoint: None,
                ai_search_key: None,
                ai_search_index: None,
            },
            bot: BotConfig {
                app_id: "app".to_string(),
                app_password: "secret".to_string(),
                host: "0.0.0.0".to_string(),
                port: 3978,
            },
            app: AppConfig {
                title: "Test Bot".to_string(),
                system_prompt: "You are helpful.".to_string(),
                environment: "test".to_string(),
            },
        };

        let settings = SessionSettings::from_config(&config);
        assert!(settings.system_prompt.starts_with("You are helpful."));
        assert!(settings.system_prompt.contains("- Project: my-project"));
        assert!(settings.system_prompt.contains("- Model: gpt-4o"));
        assert!(settings.system_prompt.contains("Guidelines:"));
        assert_eq!(settings.model, "gpt-4o");
        assert_eq!(settings.project, "my-project");
    }
}
