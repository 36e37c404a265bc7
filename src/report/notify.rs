//! Push-message transport for deal alerts.

use crate::config::Config;
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;
use tracing::debug;
use wreq::Client;

const TELEGRAM_API: &str = "https://api.telegram.org";

/// Trait for alert delivery - enables mocking for tests.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    /// Delivers one message.
    async fn send(&self, text: &str) -> Result<()>;
}

#[derive(Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
    disable_web_page_preview: bool,
}

/// Sends alerts through the Telegram Bot API.
pub struct TelegramNotifier {
    client: Client,
    token: String,
    chat_id: String,
    base_url: Option<String>,
}

impl TelegramNotifier {
    /// Creates a notifier for a bot token and chat.
    pub fn new(token: impl Into<String>, chat_id: impl Into<String>) -> Result<Self> {
        Self::with_base_url(token, chat_id, None)
    }

    /// Creates a notifier with an optional custom API URL (for testing).
    pub fn with_base_url(
        token: impl Into<String>,
        chat_id: impl Into<String>,
        base_url: Option<String>,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self { client, token: token.into(), chat_id: chat_id.into(), base_url })
    }

    /// Creates a notifier when credentials are configured.
    pub fn from_config(config: &Config) -> Result<Option<Self>> {
        match config.telegram.credentials() {
            Some((token, chat_id)) => Self::new(token, chat_id).map(Some),
            None => Ok(None),
        }
    }

    fn endpoint(&self) -> String {
        let base = self.base_url.as_deref().unwrap_or(TELEGRAM_API);
        format!("{}/bot{}/sendMessage", base.trim_end_matches('/'), self.token)
    }
}

#[async_trait]
impl NotificationSink for TelegramNotifier {
    async fn send(&self, text: &str) -> Result<()> {
        let payload = SendMessage { chat_id: &self.chat_id, text, disable_web_page_preview: false };
        let body = serde_json::to_vec(&payload).context("Failed to encode message")?;

        debug!("Sending alert to chat {}", self.chat_id);

        let response = self
            .client
            .post(self.endpoint())
            .header("Content-Type", "application/json")
            .body(body)
            .send()
            .await
            .context("Failed to reach Telegram")?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            anyhow::bail!("Telegram rejected the message with status {}: {}", status, detail);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TelegramConfig;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_send_posts_message() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/bot123:abc/sendMessage"))
            .and(header("Content-Type", "application/json"))
            .and(body_partial_json(serde_json::json!({
                "chat_id": "-1001",
                "text": "hello"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"ok":true}"#))
            .expect(1)
            .mount(&mock_server)
            .await;

        let notifier =
            TelegramNotifier::with_base_url("123:abc", "-1001", Some(mock_server.uri())).unwrap();
        notifier.send("hello").await.unwrap();
    }

    #[tokio::test]
    async fn test_send_rejected() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(401).set_body_string(r#"{"ok":false,"description":"Unauthorized"}"#),
            )
            .mount(&mock_server)
            .await;

        let notifier =
            TelegramNotifier::with_base_url("bad", "1", Some(mock_server.uri())).unwrap();
        let err = notifier.send("hello").await.unwrap_err().to_string();
        assert!(err.contains("401"));
        assert!(err.contains("Unauthorized"));
    }

    #[test]
    fn test_endpoint() {
        let notifier = TelegramNotifier::new("123:abc", "1").unwrap();
        assert_eq!(notifier.endpoint(), "https://api.telegram.org/bot123:abc/sendMessage");

        let notifier =
            TelegramNotifier::with_base_url("t", "1", Some("http://localhost:9/".to_string()))
                .unwrap();
        assert_eq!(notifier.endpoint(), "http://localhost:9/bott/sendMessage");
    }

    #[test]
    fn test_from_config() {
        let config = Config::default();
        assert!(TelegramNotifier::from_config(&config).unwrap().is_none());

        let config = Config {
            telegram: TelegramConfig {
                bot_token: Some("123:abc".to_string()),
                chat_id: Some("42".to_string()),
            },
            ..Config::default()
        };
        let notifier = TelegramNotifier::from_config(&config).unwrap().unwrap();
        assert_eq!(notifier.chat_id, "42");
    }
}
