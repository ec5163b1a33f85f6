//! Push Delivery Client
//!
//! Thin HTTP client for an Expo-compatible push service. The dispatcher
//! decides who gets notified; this module only delivers. Callers treat
//! delivery as fire-and-forget: failures are logged, never propagated to
//! the request path.

use serde::Serialize;

/// Default endpoint (Expo push service)
const DEFAULT_PUSH_API_URL: &str = "https://exp.host/--/api/v2/push/send";

/// One push message in the Expo wire format
#[derive(Debug, Serialize)]
struct PushMessage<'a> {
    to: &'a str,
    title: &'a str,
    body: &'a str,
    data: &'a serde_json::Value,
    sound: &'a str,
}

/// HTTP client for the push delivery service
#[derive(Clone)]
pub struct PushClient {
    http: reqwest::Client,
    endpoint: String,
}

impl PushClient {
    /// Client against an explicit endpoint
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: endpoint.into(),
        }
    }

    /// Client configured from `PUSH_API_URL`, falling back to the Expo
    /// public endpoint
    pub fn from_env() -> Self {
        let endpoint =
            std::env::var("PUSH_API_URL").unwrap_or_else(|_| DEFAULT_PUSH_API_URL.to_string());
        Self::new(endpoint)
    }

    /// Deliver one notification to a batch of device tokens
    pub async fn send(
        &self,
        tokens: &[String],
        title: &str,
        body: &str,
        data: &serde_json::Value,
    ) -> Result<(), reqwest::Error> {
        if tokens.is_empty() {
            return Ok(());
        }

        let messages: Vec<PushMessage> = tokens
            .iter()
            .map(|token| PushMessage {
                to: token,
                title,
                body,
                data,
                sound: "default",
            })
            .collect();

        let response = self
            .http
            .post(&self.endpoint)
            .json(&messages)
            .send()
            .await?
            .error_for_status()?;

        tracing::debug!(
            "[Push] Delivered {} notifications, status {}",
            tokens.len(),
            response.status()
        );
        Ok(())
    }
}
