#[cfg(test)]
#[path = "maeser_test.rs"]
mod tests;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::Backend;
use crate::domain::models::ConversationRecord;
use crate::domain::models::FeedbackRequest;
use crate::domain::models::HistoryRequest;
use crate::domain::models::MessageReply;
use crate::domain::models::MessageRequest;
use crate::domain::models::RequestError;
use crate::domain::models::RequestsRemainingResponse;
use crate::domain::models::SessionRequest;
use crate::domain::models::SessionResponse;

const INVALID_SESSION: &str = "invalid";

async fn decode<T: DeserializeOwned>(res: reqwest::Response) -> Result<T, RequestError> {
    let status = res.status();
    if !status.is_success() {
        tracing::error!(status = status.as_u16(), url = %res.url(), "Maeser request failed");
        return Err(RequestError::Status(status.as_u16()));
    }

    let body = res.text().await?;
    let decoded = serde_json::from_str::<T>(&body)?;
    return Ok(decoded);
}

/// Client for the Maeser HTTP API.
pub struct Maeser {
    client: reqwest::Client,
    url: String,
}

impl Default for Maeser {
    fn default() -> Maeser {
        return Maeser {
            client: reqwest::Client::new(),
            url: Config::get(ConfigKey::Url),
        };
    }
}

impl Maeser {
    fn endpoint(&self, path: &str) -> String {
        return format!("{url}{path}", url = self.url.trim_end_matches('/'));
    }

    async fn post_json<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, RequestError> {
        let url = self.endpoint(path);
        tracing::debug!(url = url.as_str(), "POST");
        let res = self.client.post(url).json(body).send().await?;
        return decode(res).await;
    }
}

#[async_trait]
impl Backend for Maeser {
    #[allow(clippy::implicit_return)]
    async fn request_session(&self, action: &str) -> Result<String, RequestError> {
        let res: SessionResponse = self
            .post_json("/req_session", &SessionRequest::new(action))
            .await?;

        if res.response == INVALID_SESSION {
            let details = res.details.unwrap_or_else(|| {
                return format!("Session type {action} was rejected");
            });
            tracing::error!(action, details = details.as_str(), "Invalid session");
            return Err(RequestError::Invalid(details));
        }

        return Ok(res.response);
    }

    #[allow(clippy::implicit_return)]
    async fn send_message(&self, request: &MessageRequest) -> Result<MessageReply, RequestError> {
        let path = format!("/msg/{session}", session = request.session);
        return self.post_json(&path, request).await;
    }

    #[allow(clippy::implicit_return)]
    async fn send_feedback(&self, request: &FeedbackRequest) -> Result<(), RequestError> {
        // The acknowledgement body carries nothing we need.
        let _: serde_json::Value = self.post_json("/feedback", request).await?;
        return Ok(());
    }

    #[allow(clippy::implicit_return)]
    async fn conversation_history(
        &self,
        request: &HistoryRequest,
    ) -> Result<ConversationRecord, RequestError> {
        let mut record: ConversationRecord =
            self.post_json("/conversation_history", request).await?;
        record.session = request.session.to_string();
        return Ok(record);
    }

    #[allow(clippy::implicit_return)]
    async fn requests_remaining(&self) -> Result<u32, RequestError> {
        let res = self
            .client
            .get(self.endpoint("/get_requests_remaining"))
            .send()
            .await?;
        let body: RequestsRemainingResponse = decode(res).await?;
        return Ok(body.requests_remaining);
    }
}
