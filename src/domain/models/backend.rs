use async_trait::async_trait;
use serde_derive::Deserialize;
use serde_derive::Serialize;

use super::ConversationRecord;
use super::RequestError;

pub const CLIENT_NAME: &str = "Maeser Terminal";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRequest {
    #[serde(rename = "type")]
    pub request_type: String,
    pub from: String,
    pub action: String,
}

impl SessionRequest {
    pub fn new(action: &str) -> SessionRequest {
        return SessionRequest {
            request_type: "new".to_string(),
            from: CLIENT_NAME.to_string(),
            action: action.to_string(),
        };
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionResponse {
    pub response: String,
    #[serde(default)]
    pub details: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageRequest {
    pub message: String,
    pub from: String,
    pub action: String,
    pub session: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageReply {
    /// HTML rendered by the server.
    pub response: String,
    pub index: u32,
    #[serde(default)]
    pub requests_remaining: Option<u32>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackRequest {
    pub message: String,
    pub like: bool,
    pub index: u32,
    pub session_id: String,
    pub branch: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryRequest {
    pub session: String,
    pub branch: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestsRemainingResponse {
    pub requests_remaining: u32,
}

#[async_trait]
pub trait Backend {
    /// Asks the server for a new session scoped to a branch. Returns the
    /// session id, or `RequestError::Invalid` when the server refuses.
    async fn request_session(&self, action: &str) -> Result<String, RequestError>;

    /// Sends one user message and waits for the full assistant reply.
    async fn send_message(&self, request: &MessageRequest) -> Result<MessageReply, RequestError>;

    async fn send_feedback(&self, request: &FeedbackRequest) -> Result<(), RequestError>;

    /// Fetches a persisted conversation. The returned record has its session
    /// filled in from the request.
    async fn conversation_history(
        &self,
        request: &HistoryRequest,
    ) -> Result<ConversationRecord, RequestError>;

    async fn requests_remaining(&self) -> Result<u32, RequestError>;
}

pub type BackendBox = Box<dyn Backend + Send + Sync>;
