//! Bot Framework Connector client
//!
//! Outbound replies go through the Connector REST API on the service URL
//! the channel stated in the inbound activity. Authentication is an OAuth2
//! client-credentials token from the Bot Framework tenant, cached until
//! shortly before expiry. A blank app id means local emulator mode, where
//! no token is fetched and no Authorization header is sent.

use std::time::{Duration, Instant};

use reqwest::Client;
use serde::Deserialize;
use tokio::sync::RwLock;
use tracing::{debug, error, warn};

use crate::error::{Result, TeamsError};
use crate::types::Activity;

const TOKEN_URL: &str =
    "https://login.microsoftonline.com/botframework.com/oauth2/v2.0/token";
const TOKEN_SCOPE: &str = "https://api.botframework.com/.default";
/// Tokens are refreshed this long before their stated expiry.
const TOKEN_REFRESH_MARGIN: Duration = Duration::from_secs(60);

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

struct CachedToken {
    access_token: String,
    expires_at: Instant,
}

impl CachedToken {
    fn is_valid(&self) -> bool {
        Instant::now() < self.expires_at
    }
}

/// Connector REST client for one bot identity
pub struct ConnectorClient {
    client: Client,
    app_id: String,
    app_password: String,
    token: RwLock<Option<CachedToken>>,
}

impl ConnectorClient {
    pub fn new(app_id: &str, app_password: &str, timeout_secs: u64) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(TeamsError::Http)?;

        Ok(Self {
            client,
            app_id: app_id.trim().to_string(),
            app_password: app_password.to_string(),
            token: RwLock::new(None),
        })
    }

    /// Whether this client authenticates outbound calls. False only in
    /// emulator mode.
    pub fn is_authenticated(&self) -> bool {
        !self.app_id.is_empty()
    }

    /// Current access token, fetching or refreshing as needed.
    /// `None` in emulator mode.
    async fn access_token(&self) -> Result<Option<String>> {
        if !self.is_authenticated() {
            return Ok(None);
        }

        {
            let guard = self.token.read().await;
            if let Some(cached) = guard.as_ref() {
                if cached.is_valid() {
                    return Ok(Some(cached.access_token.clone()));
                }
            }
        }

        let mut guard = self.token.write().await;
        // another task may have refreshed while we waited for the lock
        if let Some(cached) = guard.as_ref() {
            if cached.is_valid() {
                return Ok(Some(cached.access_token.clone()));
            }
        }

        debug!("Fetching Bot Framework access token");

        let params = [
            ("grant_type", "client_credentials"),
            ("client_id", self.app_id.as_str()),
            ("client_secret", self.app_password.as_str()),
            ("scope", TOKEN_SCOPE),
        ];

        let response = self
            .client
            .post(TOKEN_URL)
            .form(&params)
            .send()
            .await
            .map_err(TeamsError::Http)?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            error!("Token request failed: {} - {}", status, error_text);
            return Err(TeamsError::Auth(format!("{}: {}", status, error_text)));
        }

        let token: TokenResponse = response.json().await.map_err(TeamsError::Http)?;
        let lifetime =
            Duration::from_secs(token.expires_in).saturating_sub(TOKEN_REFRESH_MARGIN);
        let access = token.access_token.clone();
        *guard = Some(CachedToken {
            access_token: token.access_token,
            expires_at: Instant::now() + lifetime,
        });

        Ok(Some(access))
    }

    /// Send an outbound activity to its conversation.
    pub async fn send_activity(&self, activity: &Activity) -> Result<()> {
        let service_url = activity
            .service_url
            .as_deref()
            .ok_or(TeamsError::MissingField("serviceUrl"))?;
        let conversation = activity
            .conversation
            .as_ref()
            .ok_or(TeamsError::MissingField("conversation"))?;

        let url = reply_url(service_url, &conversation.id, activity.reply_to_id.as_deref());

        let mut request = self.client.post(&url).json(activity);
        if let Some(token) = self.access_token().await? {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(TeamsError::Http)?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            error!("Send activity failed: {} - {}", status, error_text);
            return Err(TeamsError::Connector(format!("{}: {}", status, error_text)));
        }

        Ok(())
    }

    /// Reply to an inbound activity with plain text.
    pub async fn reply_text(&self, inbound: &Activity, text: &str) -> Result<()> {
        self.send_activity(&Activity::reply_text(inbound, text)).await
    }

    /// Reply to an inbound activity with an Adaptive Card.
    pub async fn reply_card(&self, inbound: &Activity, card: serde_json::Value) -> Result<()> {
        self.send_activity(&Activity::reply_card(inbound, card)).await
    }

    /// Typing indicator, best effort. Failures are logged and swallowed.
    pub async fn send_typing(&self, inbound: &Activity) {
        if let Err(e) = self.send_activity(&Activity::typing(inbound)).await {
            warn!("Failed to send typing indicator: {}", e);
        }
    }
}

/// Activity endpoint on the channel's service URL. With a reply id the
/// activity threads as a reply, without one it posts to the conversation.
fn reply_url(service_url: &str, conversation_id: &str, reply_to_id: Option<&str>) -> String {
    let base = service_url.trim_end_matches('/');
    match reply_to_id {
        Some(id) => format!("{base}/v3/conversations/{conversation_id}/activities/{id}"),
        None => format!("{base}/v3/conversations/{conversation_id}/activities"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reply_url_building() {
        assert_eq!(
            reply_url(
                "https://smba.trafficmanager.net/emea/",
                "conv-42",
                Some("activity-123")
            ),
            "https://smba.trafficmanager.net/emea/v3/conversations/conv-42/activities/activity-123"
        );
        assert_eq!(
            reply_url("https://smba.trafficmanager.net/emea", "conv-42", None),
            "https://smba.trafficmanager.net/emea/v3/conversations/conv-42/activities"
        );
    }

    #[test]
    fn test_token_response_parsing() {
        let body = r#"{"token_type":"Bearer","expires_in":3599,"access_token":"abc123"}"#;
        let token: TokenResponse = serde_json::from_str(body).unwrap();
        assert_eq!(token.access_token, "abc123");
        assert_eq!(token.expires_in, 3599);
    }

    #[tokio::test]
    async fn test_emulator_mode_skips_token_fetch() {
        let client = ConnectorClient::new("", "", 30).unwrap();
        assert!(!client.is_authenticated());
        // no network call happens for a blank app id
        assert!(client.access_token().await.unwrap().is_none());

        let client = ConnectorClient::new("   ", "", 30).unwrap();
        assert!(!client.is_authenticated());
    }

    #[test]
    fn test_cached_token_validity() {
        let valid = CachedToken {
            access_token: "t".to_string(),
            expires_at: Instant::now() + Duration::from_secs(60),
        };
        assert!(valid.is_valid());

        let expired = CachedToken {
            access_token: "t".to_string(),
            expires_at: Instant::now() - Duration::from_secs(1),
        };
        assert!(!expired.is_valid());
    }
}
