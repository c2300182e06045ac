//! Azure AI Content Safety integration
//!
//! Text analysis runs against the Content Safety REST API. The gate wraps
//! the analyzer and fails open: an unreachable or misconfigured safety
//! service never blocks the conversation, it only logs.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::FoundryConfig;
use crate::error::{Error, Result};
use crate::util::preview;

const ANALYZE_API_VERSION: &str = "2023-10-01";

/// Severity threshold for blocking content.
///
/// The cutoff is the highest severity still allowed through. `Low` blocks
/// only severe content, `High` blocks anything with a nonzero severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SafetyThreshold {
    Low,
    Medium,
    High,
}

impl SafetyThreshold {
    /// Parse a threshold name, case-insensitively. Unknown values fall
    /// back to `Medium`.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "low" => Self::Low,
            "high" => Self::High,
            _ => Self::Medium,
        }
    }

    /// Highest severity that still passes the gate.
    pub fn cutoff(self) -> u8 {
        match self {
            Self::Low => 2,
            Self::Medium => 1,
            Self::High => 0,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

/// Severity reported for one harm category
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategorySeverity {
    pub category: String,
    pub severity: u8,
}

/// Outcome of analyzing one piece of text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SafetyVerdict {
    pub is_safe: bool,
    /// Categories whose severity exceeded the threshold
    pub flagged: Vec<CategorySeverity>,
}

impl SafetyVerdict {
    /// Verdict used when analysis is disabled or unavailable.
    pub fn safe() -> Self {
        Self {
            is_safe: true,
            flagged: Vec::new(),
        }
    }
}

/// A text safety backend.
///
/// The production implementation calls Azure Content Safety; tests use
/// in-memory stubs.
#[async_trait]
pub trait SafetyAnalyzer: Send + Sync {
    async fn analyze(&self, text: &str) -> Result<SafetyVerdict>;
}

/// Azure Content Safety REST client
#[derive(Clone)]
pub struct ContentSafetyClient {
    client: Client,
    endpoint: String,
    api_key: String,
    threshold: SafetyThreshold,
}

#[derive(Debug, Serialize)]
struct AnalyzeRequest<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct AnalyzeResponse {
    #[serde(rename = "categoriesAnalysis", default)]
    categories_analysis: Vec<CategoryAnalysis>,
}

#[derive(Debug, Deserialize)]
struct CategoryAnalysis {
    category: String,
    #[serde(default)]
    severity: u8,
}

impl ContentSafetyClient {
    pub fn new(
        endpoint: &str,
        api_key: &str,
        threshold: SafetyThreshold,
        timeout_secs: u64,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(Error::Http)?;

        Ok(Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            threshold,
        })
    }

    fn analyze_url(&self) -> String {
        format!(
            "{}/contentsafety/text:analyze?api-version={}",
            self.endpoint, ANALYZE_API_VERSION
        )
    }

    fn verdict(&self, categories: Vec<CategoryAnalysis>) -> SafetyVerdict {
        let cutoff = self.threshold.cutoff();
        let flagged: Vec<CategorySeverity> = categories
            .into_iter()
            .filter(|c| c.severity > cutoff)
            .map(|c| CategorySeverity {
                category: c.category,
                severity: c.severity,
            })
            .collect();

        SafetyVerdict {
            is_safe: flagged.is_empty(),
            flagged,
        }
    }
}

#[async_trait]
impl SafetyAnalyzer for ContentSafetyClient {
    async fn analyze(&self, text: &str) -> Result<SafetyVerdict> {
        let url = self.analyze_url();

        let response = self
            .client
            .post(&url)
            .header("Ocp-Apim-Subscription-Key", &self.api_key)
            .header("content-type", "application/json")
            .json(&AnalyzeRequest { text })
            .send()
            .await
            .map_err(Error::Http)?;

        let status = response.status();
        let body = response.text().await.map_err(Error::Http)?;

        if !status.is_success() {
            warn!("Content Safety error: {} - {}", status, preview(&body, 500));
            return Err(Error::ContentSafety(format!("{}: {}", status, body)));
        }

        let parsed: AnalyzeResponse = serde_json::from_str(&body).map_err(|e| {
            Error::ContentSafety(format!(
                "Failed to parse response: {} - {}",
                e,
                preview(&body, 500)
            ))
        })?;

        Ok(self.verdict(parsed.categories_analysis))
    }
}

/// Fail-open wrapper around an optional analyzer.
#[derive(Clone)]
pub struct SafetyGate {
    analyzer: Option<Arc<dyn SafetyAnalyzer>>,
}

impl SafetyGate {
    /// Gate that lets everything through.
    pub fn disabled() -> Self {
        Self { analyzer: None }
    }

    pub fn new(analyzer: Arc<dyn SafetyAnalyzer>) -> Self {
        Self {
            analyzer: Some(analyzer),
        }
    }

    /// Build the gate from configuration. Disabled or incompletely
    /// configured safety yields an inactive gate rather than an error.
    pub fn from_config(config: &FoundryConfig) -> Self {
        if !config.enable_content_safety {
            info!("Content safety disabled");
            return Self::disabled();
        }

        match (&config.content_safety_endpoint, &config.content_safety_key) {
            (Some(endpoint), Some(key)) => {
                match ContentSafetyClient::new(
                    endpoint,
                    key,
                    config.content_safety_threshold,
                    config.request_timeout_secs,
                ) {
                    Ok(client) => {
                        info!(
                            "Content safety active, threshold: {}",
                            config.content_safety_threshold.as_str()
                        );
                        Self::new(Arc::new(client))
                    }
                    Err(e) => {
                        warn!("Could not initialize content safety client: {}", e);
                        Self::disabled()
                    }
                }
            }
            _ => {
                warn!("Content safety enabled but endpoint or key not configured");
                Self::disabled()
            }
        }
    }

    pub fn is_active(&self) -> bool {
        self.analyzer.is_some()
    }

    /// Analyze text, treating any failure as safe.
    pub async fn check(&self, text: &str) -> SafetyVerdict {
        let Some(analyzer) = &self.analyzer else {
            return SafetyVerdict::safe();
        };

        match analyzer.analyze(text).await {
            Ok(verdict) => verdict,
            Err(e) => {
                warn!("Content safety analysis failed, allowing message: {}", e);
                SafetyVerdict::safe()
            }
        }
    }
}
