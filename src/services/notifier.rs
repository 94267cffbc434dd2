use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::{debug, instrument};

use crate::error::NotifyError;

const RESEND_BASE_URL: &str = "https://api.resend.com";

/// Outbound notification channel.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, recipient: &str, subject: &str, body: &str) -> Result<(), NotifyError>;
}

/// Sends HTML email through the Resend HTTP API.
#[derive(Clone)]
pub struct ResendNotifier {
    http: Client,
    base_url: String,
    api_key: String,
    from: String,
}

#[derive(Serialize)]
struct EmailRequest<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    html: &'a str,
}

impl ResendNotifier {
    pub fn new(http: Client, api_key: String, from: String) -> Self {
        Self {
            http,
            base_url: RESEND_BASE_URL.to_string(),
            api_key,
            from,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }
}

#[async_trait]
impl Notifier for ResendNotifier {
    #[instrument(skip(self, body), level = "debug")]
    async fn send(&self, recipient: &str, subject: &str, body: &str) -> Result<(), NotifyError> {
        let url = format!("{}/emails", self.base_url);
        let res = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&EmailRequest {
                from: &self.from,
                to: [recipient],
                subject,
                html: body,
            })
            .send()
            .await?;

        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(NotifyError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        debug!("email accepted by resend");
        Ok(())
    }
}
