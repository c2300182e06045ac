//! Teams bot: message routing and command dispatch
//!
//! `respond` is the whole conversational surface: input safety gate,
//! slash commands, then the model. It never touches the network for
//! replies itself; activity handlers convert its result into connector
//! calls. Model and safety failures stay inside this module as fixed
//! user-facing strings.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, error, info, warn};

use foundry_core::util::preview;
use foundry_core::{SafetyGate, SessionRegistry};

use crate::cards::{self, CardInfo};
use crate::connector::ConnectorClient;
use crate::error::Result;
use crate::types::{ACTIVITY_CONVERSATION_UPDATE, ACTIVITY_MESSAGE, Activity};

const UNSAFE_INPUT_REPLY: &str = "⚠️ Sorry, your message contains content I can't process. \
     Please rephrase your question appropriately.";

const UNSAFE_OUTPUT_REPLY: &str =
    "Sorry, I can't share that information. Is there anything else I can help you with?";

const MODEL_ERROR_REPLY: &str = "Sorry, something went wrong while processing your message. \
     Please try again, or contact an administrator if the problem persists.";

const HISTORY_CLEARED_REPLY: &str = "✅ History cleared. Let's start a new conversation!";

const TURN_ERROR_REPLY: &str = "❌ Sorry, an unexpected error occurred. \
     The technical team has been notified. Please try again later.";

/// What the router wants sent back to the conversation
#[derive(Debug, Clone, PartialEq)]
pub enum BotReply {
    Text(String),
    Card(Value),
}

/// The Teams assistant
pub struct TeamsBot {
    registry: Arc<SessionRegistry>,
    gate: SafetyGate,
    connector: Arc<ConnectorClient>,
    card_info: CardInfo,
}

impl TeamsBot {
    pub fn new(
        registry: Arc<SessionRegistry>,
        gate: SafetyGate,
        connector: Arc<ConnectorClient>,
        card_info: CardInfo,
    ) -> Self {
        info!("Teams bot initialized");
        Self {
            registry,
            gate,
            connector,
            card_info,
        }
    }

    /// Produce the reply for one user message in one conversation.
    ///
    /// Order matters: blocked input never creates a session and never
    /// reaches the model; commands never reach the model either.
    pub async fn respond(&self, conversation_id: &str, user_message: &str) -> BotReply {
        let text = user_message.trim();

        let verdict = self.gate.check(text).await;
        if !verdict.is_safe {
            warn!(
                "[{}] Blocked incoming message, flagged: {:?}",
                conversation_id,
                verdict.flagged.iter().map(|f| &f.category).collect::<Vec<_>>()
            );
            return BotReply::Text(UNSAFE_INPUT_REPLY.to_string());
        }

        if text.starts_with('/') {
            return self.handle_command(conversation_id, text).await;
        }

        let session = self.registry.get_or_create(conversation_id);
        let mut session = session.lock().await;

        match session.send(text).await {
            Ok(reply) => {
                let verdict = self.gate.check(&reply).await;
                if !verdict.is_safe {
                    warn!("[{}] Blocked model reply", conversation_id);
                    return BotReply::Text(UNSAFE_OUTPUT_REPLY.to_string());
                }
                BotReply::Text(reply)
            }
            Err(e) => {
                error!("[{}] Model call failed: {}", conversation_id, e);
                BotReply::Text(MODEL_ERROR_REPLY.to_string())
            }
        }
    }

    /// Dispatch a slash command. The first whitespace token decides,
    /// case-insensitively; arguments are ignored.
    async fn handle_command(&self, conversation_id: &str, text: &str) -> BotReply {
        let token = text
            .split_whitespace()
            .next()
            .unwrap_or_default()
            .to_lowercase();
        debug!("[{}] Command: {}", conversation_id, token);

        match token.as_str() {
            "/help" => BotReply::Card(cards::help_card()),
            "/clear" | "/reset" => {
                let session = self.registry.get_or_create(conversation_id);
                session.lock().await.clear_history();
                BotReply::Text(HISTORY_CLEARED_REPLY.to_string())
            }
            "/stats" => {
                let session = self.registry.get_or_create(conversation_id);
                let stats = session.lock().await.statistics();
                BotReply::Card(cards::stats_card(&stats))
            }
            "/about" => BotReply::Card(cards::about_card(&self.card_info)),
            "/project" => BotReply::Card(cards::project_card(&self.card_info)),
            _ => BotReply::Text(format!(
                "❌ Unknown command: {}\nUse /help to see available commands.",
                token
            )),
        }
    }

    /// Entry point for every inbound activity. Errors never escape: they
    /// are logged, a generic notice is sent best-effort, and the process
    /// keeps serving.
    pub async fn on_turn(&self, activity: &Activity) {
        let result = match activity.activity_type.as_str() {
            ACTIVITY_MESSAGE => self.on_message_activity(activity).await,
            ACTIVITY_CONVERSATION_UPDATE => self.on_members_added(activity).await,
            other => {
                debug!("Ignoring activity type: {}", other);
                Ok(())
            }
        };

        if let Err(e) = result {
            error!("Error handling activity: {}", e);
            if let Err(send_err) = self.connector.reply_text(activity, TURN_ERROR_REPLY).await {
                error!("Failed to send error notice: {}", send_err);
            }
        }
    }

    async fn on_message_activity(&self, activity: &Activity) -> Result<()> {
        let Some(conversation) = &activity.conversation else {
            warn!("Message activity without conversation, ignoring");
            return Ok(());
        };

        let text = activity.text.as_deref().unwrap_or_default().trim().to_string();
        if text.is_empty() {
            debug!("Ignoring message without text");
            return Ok(());
        }

        let user_name = activity
            .from
            .as_ref()
            .and_then(|f| f.name.as_deref())
            .unwrap_or("unknown");
        let user_id = activity
            .from
            .as_ref()
            .map(|f| f.id.as_str())
            .unwrap_or("unknown");
        info!(
            "Message from {} ({}) in {}: {}",
            user_name,
            user_id,
            conversation.id,
            preview(&text, 50)
        );

        // commands answer instantly, everything else shows typing first
        if !text.starts_with('/') {
            self.connector.send_typing(activity).await;
        }

        match self.respond(&conversation.id, &text).await {
            BotReply::Text(reply) => self.connector.reply_text(activity, &reply).await?,
            BotReply::Card(card) => self.connector.reply_card(activity, card).await?,
        }

        info!("Reply sent to {}", user_name);
        Ok(())
    }

    /// Welcome every added member except the bot itself.
    async fn on_members_added(&self, activity: &Activity) -> Result<()> {
        let recipient_id = activity
            .recipient
            .as_ref()
            .map(|r| r.id.as_str())
            .unwrap_or_default();

        for member in &activity.members_added {
            if member.id != recipient_id {
                info!("Member added, sending welcome: {}", member.id);
                self.connector
                    .reply_card(activity, cards::welcome_card(&self.card_info))
                    .await?;
            }
        }

        Ok(())
    }
}
