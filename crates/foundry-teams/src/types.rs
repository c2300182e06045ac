//! Bot Framework activity types
//!
//! Wire shapes for the subset of the Bot Framework protocol this bot
//! speaks: message and conversationUpdate activities in, message and
//! typing activities out. Field names on the wire are camelCase.

use serde::{Deserialize, Serialize};

pub const ACTIVITY_MESSAGE: &str = "message";
pub const ACTIVITY_TYPING: &str = "typing";
pub const ACTIVITY_CONVERSATION_UPDATE: &str = "conversationUpdate";

/// Content type marking an attachment as an Adaptive Card
pub const ADAPTIVE_CARD_CONTENT_TYPE: &str = "application/vnd.microsoft.card.adaptive";

/// A user or bot on the channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelAccount {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// The conversation an activity belongs to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationAccount {
    pub id: String,
}

/// A message attachment (cards, for this bot)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attachment {
    #[serde(rename = "contentType")]
    pub content_type: String,
    pub content: serde_json::Value,
}

impl Attachment {
    pub fn adaptive_card(card: serde_json::Value) -> Self {
        Self {
            content_type: ADAPTIVE_CARD_CONTENT_TYPE.to_string(),
            content: card,
        }
    }
}

/// A Bot Framework activity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    #[serde(rename = "type")]
    pub activity_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(rename = "serviceUrl", default, skip_serializing_if = "Option::is_none")]
    pub service_url: Option<String>,
    #[serde(rename = "channelId", default, skip_serializing_if = "Option::is_none")]
    pub channel_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<ChannelAccount>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation: Option<ConversationAccount>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipient: Option<ChannelAccount>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(rename = "replyToId", default, skip_serializing_if = "Option::is_none")]
    pub reply_to_id: Option<String>,
    #[serde(rename = "membersAdded", default, skip_serializing_if = "Vec::is_empty")]
    pub members_added: Vec<ChannelAccount>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<Attachment>,
}

impl Activity {
    /// Skeleton for an outbound activity answering `inbound`: sender and
    /// recipient swap, conversation and reply id carry over.
    fn reply_base(inbound: &Activity, activity_type: &str) -> Self {
        Self {
            activity_type: activity_type.to_string(),
            id: None,
            timestamp: None,
            service_url: inbound.service_url.clone(),
            channel_id: inbound.channel_id.clone(),
            from: inbound.recipient.clone(),
            conversation: inbound.conversation.clone(),
            recipient: inbound.from.clone(),
            text: None,
            reply_to_id: inbound.id.clone(),
            members_added: Vec::new(),
            attachments: Vec::new(),
        }
    }

    /// Text reply to an inbound activity.
    pub fn reply_text(inbound: &Activity, text: impl Into<String>) -> Self {
        let mut activity = Self::reply_base(inbound, ACTIVITY_MESSAGE);
        activity.text = Some(text.into());
        activity
    }

    /// Adaptive-card reply to an inbound activity.
    pub fn reply_card(inbound: &Activity, card: serde_json::Value) -> Self {
        let mut activity = Self::reply_base(inbound, ACTIVITY_MESSAGE);
        activity.attachments = vec![Attachment::adaptive_card(card)];
        activity
    }

    /// Typing indicator for the conversation of an inbound activity.
    pub fn typing(inbound: &Activity) -> Self {
        Self::reply_base(inbound, ACTIVITY_TYPING)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn inbound_json() -> serde_json::Value {
        json!({
            "type": "message",
            "id": "activity-123",
            "timestamp": "2024-05-01T12:00:00.000Z",
            "serviceUrl": "https://smba.trafficmanager.net/emea/",
            "channelId": "msteams",
            "from": {"id": "user-1", "name": "Ada"},
            "conversation": {"id": "conv-42"},
            "recipient": {"id": "bot-1", "name": "Assistant"},
            "text": "Hello"
        })
    }

    #[test]
    fn test_inbound_message_parses() {
        let activity: Activity = serde_json::from_value(inbound_json()).unwrap();
        assert_eq!(activity.activity_type, ACTIVITY_MESSAGE);
        assert_eq!(activity.text.as_deref(), Some("Hello"));
        assert_eq!(activity.conversation.as_ref().unwrap().id, "conv-42");
        assert_eq!(activity.from.as_ref().unwrap().name.as_deref(), Some("Ada"));
        assert!(activity.members_added.is_empty());
    }

    #[test]
    fn test_conversation_update_parses_members_added() {
        let activity: Activity = serde_json::from_value(json!({
            "type": "conversationUpdate",
            "id": "activity-9",
            "serviceUrl": "https://smba.trafficmanager.net/emea/",
            "conversation": {"id": "conv-42"},
            "recipient": {"id": "bot-1", "name": "Assistant"},
            "membersAdded": [
                {"id": "user-7", "name": "Grace"},
                {"id": "bot-1", "name": "Assistant"}
            ]
        }))
        .unwrap();

        assert_eq!(activity.activity_type, ACTIVITY_CONVERSATION_UPDATE);
        assert_eq!(activity.members_added.len(), 2);
        assert!(activity.text.is_none());
    }

    #[test]
    fn test_reply_text_swaps_parties_and_sets_reply_to() {
        let inbound: Activity = serde_json::from_value(inbound_json()).unwrap();
        let reply = Activity::reply_text(&inbound, "Hi there");

        assert_eq!(reply.activity_type, ACTIVITY_MESSAGE);
        assert_eq!(reply.from.as_ref().unwrap().id, "bot-1");
        assert_eq!(reply.recipient.as_ref().unwrap().id, "user-1");
        assert_eq!(reply.conversation.as_ref().unwrap().id, "conv-42");
        assert_eq!(reply.reply_to_id.as_deref(), Some("activity-123"));
        assert_eq!(reply.text.as_deref(), Some("Hi there"));

        // outbound JSON never carries nulls or empty lists
        let json = serde_json::to_value(&reply).unwrap();
        assert!(json.get("id").is_none());
        assert!(json.get("attachments").is_none());
        assert_eq!(json["replyToId"], "activity-123");
    }

    #[test]
    fn test_reply_card_wraps_adaptive_card() {
        let inbound: Activity = serde_json::from_value(inbound_json()).unwrap();
        let reply = Activity::reply_card(&inbound, json!({"type": "AdaptiveCard"}));

        assert_eq!(reply.attachments.len(), 1);
        assert_eq!(reply.attachments[0].content_type, ADAPTIVE_CARD_CONTENT_TYPE);
        assert!(reply.text.is_none());

        let json = serde_json::to_value(&reply).unwrap();
        assert_eq!(
            json["attachments"][0]["contentType"],
            "application/vnd.microsoft.card.adaptive"
        );
    }

    #[test]
    fn test_typing_activity() {
        let inbound: Activity = serde_json::from_value(inbound_json()).unwrap();
        let typing = Activity::typing(&inbound);
        assert_eq!(typing.activity_type, ACTIVITY_TYPING);
        assert!(typing.text.is_none());
        assert_eq!(typing.conversation.as_ref().unwrap().id, "conv-42");
    }
}
