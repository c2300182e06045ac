//! Adaptive Cards for Teams replies
//!
//! Cards are plain JSON values built with `json!` and wrapped into an
//! attachment by the caller. Schema 1.4, which Teams renders natively.

use foundry_core::{Config, SessionStatistics};
use serde_json::{Value, json};

const CARD_SCHEMA: &str = "http://adaptivecards.io/schemas/adaptive-card.json";
const CARD_VERSION: &str = "1.4";

/// Static facts shown on the informational cards, captured from
/// configuration at startup.
#[derive(Debug, Clone)]
pub struct CardInfo {
    pub title: String,
    pub project: String,
    pub hub: String,
    pub deployment: String,
    pub content_safety_enabled: bool,
    pub ai_search_enabled: bool,
}

impl CardInfo {
    pub fn from_config(config: &Config) -> Self {
        Self {
            title: config.app.title.clone(),
            project: config.foundry.project_name.clone(),
            hub: config.foundry.hub_name.clone(),
            deployment: config.foundry.openai_deployment.clone(),
            content_safety_enabled: config.foundry.enable_content_safety,
            ai_search_enabled: config.foundry.enable_ai_search,
        }
    }
}

fn card(body: Vec<Value>) -> Value {
    json!({
        "type": "AdaptiveCard",
        "$schema": CARD_SCHEMA,
        "version": CARD_VERSION,
        "body": body
    })
}

fn active_flag(enabled: bool) -> &'static str {
    if enabled { "✅ Active" } else { "❌ Inactive" }
}

/// 1234567 -> "1,234,567"
fn thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Greeting card sent once per newly-added member.
pub fn welcome_card(info: &CardInfo) -> Value {
    card(vec![
        json!({
            "type": "TextBlock",
            "text": "👋 Hi! I'm your AI Assistant",
            "size": "ExtraLarge",
            "weight": "Bolder",
            "color": "Accent"
        }),
        json!({
            "type": "TextBlock",
            "text": "Powered by **Azure AI Foundry** 🚀",
            "wrap": true,
            "spacing": "Small",
            "color": "Good"
        }),
        json!({
            "type": "Container",
            "style": "emphasis",
            "items": [
                {
                    "type": "TextBlock",
                    "text": format!("📍 **Project:** {}", info.project),
                    "wrap": true,
                    "size": "Small"
                },
                {
                    "type": "TextBlock",
                    "text": format!("🤖 **Model:** {}", info.deployment),
                    "wrap": true,
                    "size": "Small"
                }
            ],
            "spacing": "Medium"
        }),
        json!({
            "type": "TextBlock",
            "text": "**What can I do?**",
            "weight": "Bolder",
            "spacing": "Medium"
        }),
        json!({
            "type": "ColumnSet",
            "columns": [
                {
                    "type": "Column",
                    "width": "auto",
                    "items": [
                        {
                            "type": "TextBlock",
                            "text": "💬 Natural conversations\n📝 Document drafting\n💡 Idea generation\n🔍 Information analysis\n💻 Code assistance",
                            "wrap": true
                        }
                    ]
                }
            ]
        }),
        json!({
            "type": "TextBlock",
            "text": "**Commands:**",
            "weight": "Bolder",
            "spacing": "Medium"
        }),
        json!({
            "type": "FactSet",
            "facts": [
                {"title": "/help", "value": "See help"},
                {"title": "/clear", "value": "Clear the history"},
                {"title": "/stats", "value": "See statistics"},
                {"title": "/project", "value": "AI Foundry info"},
                {"title": "/about", "value": "About the bot"}
            ]
        }),
    ])
}

/// Command reference and feature list.
pub fn help_card() -> Value {
    card(vec![
        json!({
            "type": "TextBlock",
            "text": "📚 Help Center",
            "size": "Large",
            "weight": "Bolder",
            "color": "Accent"
        }),
        json!({
            "type": "TextBlock",
            "text": "**Available Commands:**",
            "weight": "Bolder",
            "spacing": "Medium"
        }),
        json!({
            "type": "FactSet",
            "facts": [
                {"title": "/help", "value": "Shows this help"},
                {"title": "/clear", "value": "Clears the history"},
                {"title": "/stats", "value": "Usage statistics"},
                {"title": "/project", "value": "AI Foundry info"},
                {"title": "/about", "value": "About the bot"}
            ]
        }),
        json!({
            "type": "TextBlock",
            "text": "**Features:**",
            "weight": "Bolder",
            "spacing": "Medium"
        }),
        json!({
            "type": "TextBlock",
            "text": "✅ Conversation with context\n✅ Content Safety enabled\n✅ Real-time answers\n✅ Multi-language",
            "wrap": true
        }),
    ])
}

/// Per-session usage statistics.
pub fn stats_card(stats: &SessionStatistics) -> Value {
    card(vec![
        json!({
            "type": "TextBlock",
            "text": "📊 Session Statistics",
            "size": "Large",
            "weight": "Bolder",
            "color": "Accent"
        }),
        json!({
            "type": "FactSet",
            "facts": [
                {"title": "Messages:", "value": stats.message_count.to_string()},
                {"title": "Tokens used:", "value": thousands(stats.total_tokens_used)},
                {"title": "Model calls:", "value": stats.total_calls.to_string()},
                {"title": "Avg tokens/call:", "value": stats.average_tokens_per_call.to_string()},
                {"title": "Model:", "value": stats.model},
                {"title": "Project:", "value": stats.project}
            ]
        }),
    ])
}

/// AI Foundry project facts and feature flags.
pub fn project_card(info: &CardInfo) -> Value {
    card(vec![
        json!({
            "type": "TextBlock",
            "text": "🏗️ Azure AI Foundry Project",
            "size": "Large",
            "weight": "Bolder",
            "color": "Accent"
        }),
        json!({
            "type": "FactSet",
            "facts": [
                {"title": "Project:", "value": info.project},
                {"title": "Hub:", "value": info.hub},
                {"title": "Deployment:", "value": info.deployment},
                {"title": "Content Safety:", "value": active_flag(info.content_safety_enabled)},
                {"title": "AI Search:", "value": active_flag(info.ai_search_enabled)}
            ]
        }),
        json!({
            "type": "TextBlock",
            "text": "This bot is powered by Azure AI Foundry, Microsoft's enterprise platform for building generative AI applications.",
            "wrap": true,
            "spacing": "Medium",
            "isSubtle": true
        }),
    ])
}

/// About the assistant.
pub fn about_card(info: &CardInfo) -> Value {
    card(vec![
        json!({
            "type": "TextBlock",
            "text": "ℹ️ About the Assistant",
            "size": "Large",
            "weight": "Bolder",
            "color": "Accent"
        }),
        json!({
            "type": "TextBlock",
            "text": format!("**{}**", info.title),
            "weight": "Bolder",
            "spacing": "Medium"
        }),
        json!({
            "type": "TextBlock",
            "text": "Enterprise AI assistant built on Azure AI Foundry and the Bot Framework.",
            "wrap": true
        }),
        json!({
            "type": "FactSet",
            "facts": [
                {"title": "Version:", "value": env!("CARGO_PKG_VERSION")},
                {"title": "Platform:", "value": "Azure AI Foundry"},
                {"title": "Technologies:", "value": format!("{}, Bot Framework", info.deployment)},
                {"title": "Security:", "value": "Content Safety + RBAC"}
            ],
            "spacing": "Medium"
        }),
    ])
}
