use async_trait::async_trait;
use serde_json::json;

use shopsync_core::notify::{Notifier, NotifyError};

/// Group-chat notifier backed by a signal-cli REST bridge. Mentions are
/// zero-length markers appended at the end of the message so the tagged
/// contacts get pinged without altering the text.
pub struct ChatNotifier {
    http: reqwest::Client,
    service_url: String,
    phone_number: String,
    group_id: String,
}

impl ChatNotifier {
    pub fn new(service_url: &str, phone_number: &str, group_id: &str) -> Result<Self, NotifyError> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|err| NotifyError(format!("failed to build HTTP client: {err}")))?;
        Ok(Self {
            http,
            service_url: service_url.trim_end_matches('/').to_string(),
            phone_number: phone_number.to_string(),
            group_id: group_id.to_string(),
        })
    }

    fn mention_markers(text: &str, mentions: &[String]) -> Vec<serde_json::Value> {
        mentions
            .iter()
            .map(|author| {
                json!({
                    "author": author,
                    "start": text.chars().count(),
                    "length": 0,
                })
            })
            .collect()
    }
}

#[async_trait]
impl Notifier for ChatNotifier {
    async fn send(&self, text: &str, mentions: &[String]) -> Result<(), NotifyError> {
        let body = json!({
            "message": text,
            "number": self.phone_number,
            "recipients": [self.group_id],
            "notify_self": false,
            "mentions": Self::mention_markers(text, mentions),
        });

        let response = self
            .http
            .post(format!("{}/v2/send", self.service_url))
            .json(&body)
            .send()
            .await
            .map_err(|err| NotifyError(err.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = response.text().await.unwrap_or_default();
            return Err(NotifyError(format!("{status}: {detail}")));
        }
        tracing::debug!("notification delivered");
        Ok(())
    }
}
