use std::sync::atomic::AtomicU32;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use anyhow::bail;
use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::mpsc;

use super::RateLimitPoller;
use crate::domain::models::Backend;
use crate::domain::models::BackendBox;
use crate::domain::models::ConversationRecord;
use crate::domain::models::Event;
use crate::domain::models::FeedbackRequest;
use crate::domain::models::HistoryRequest;
use crate::domain::models::MessageReply;
use crate::domain::models::MessageRequest;
use crate::domain::models::RequestError;

/// Fails every other poll, counting down otherwise.
struct CountdownBackend {
    polls: AtomicU32,
}

#[async_trait]
impl Backend for CountdownBackend {
    async fn request_session(&self, _action: &str) -> Result<String, RequestError> {
        return Err(RequestError::Status(404));
    }

    async fn send_message(&self, _request: &MessageRequest) -> Result<MessageReply, RequestError> {
        return Err(RequestError::Status(404));
    }

    async fn send_feedback(&self, _request: &FeedbackRequest) -> Result<(), RequestError> {
        return Err(RequestError::Status(404));
    }

    async fn conversation_history(
        &self,
        _request: &HistoryRequest,
    ) -> Result<ConversationRecord, RequestError> {
        return Err(RequestError::Status(404));
    }

    async fn requests_remaining(&self) -> Result<u32, RequestError> {
        let poll = self.polls.fetch_add(1, Ordering::SeqCst);
        if poll % 2 == 1 {
            return Err(RequestError::Network("connection reset".to_string()));
        }

        return Ok(10 - poll);
    }
}

fn poller() -> RateLimitPoller {
    let backend: Arc<BackendBox> = Arc::new(Box::new(CountdownBackend {
        polls: AtomicU32::new(0),
    }));
    return RateLimitPoller::new(backend, Duration::from_millis(5));
}

#[tokio::test]
async fn it_reports_requests_remaining() -> Result<()> {
    let (tx, mut rx) = mpsc::unbounded_channel::<Event>();
    let handle = tokio::spawn(async move {
        return poller().start(tx).await;
    });

    for expected in [10, 8, 6] {
        match rx.recv().await {
            Some(Event::RequestsRemaining(remaining)) => assert_eq!(remaining, expected),
            _ => bail!("Wrong enum"),
        }
    }

    drop(rx);
    handle.await??;
    return Ok(());
}

#[tokio::test]
async fn it_stops_when_the_ui_hangs_up() -> Result<()> {
    let (tx, rx) = mpsc::unbounded_channel::<Event>();
    drop(rx);

    poller().start(tx).await?;
    return Ok(());
}
