#[cfg(test)]
#[path = "actions_test.rs"]
mod tests;

use std::sync::Arc;

use anyhow::Result;
use tokio::sync::mpsc;

use crate::domain::models::Action;
use crate::domain::models::BackendBox;
use crate::domain::models::Event;

async fn run_action(
    backend: &BackendBox,
    action: Action,
    tx: &mpsc::UnboundedSender<Event>,
) -> Result<()> {
    match action {
        Action::RequestSession(epoch, topic) => {
            let res = backend.request_session(&topic).await;
            tx.send(Event::SessionResponse(epoch, topic, res))?;
        }
        Action::SendMessage(epoch, request) => {
            let res = backend.send_message(&request).await;
            tx.send(Event::MessageResponse(epoch, res))?;
        }
        Action::SendFeedback(epoch, position, request) => {
            let res = backend.send_feedback(&request).await;
            tx.send(Event::FeedbackResponse(epoch, position, request, res))?;
        }
        Action::FetchHistory(epoch, request) => {
            let res = backend.conversation_history(&request).await;
            tx.send(Event::HistoryResponse(epoch, request, res))?;
        }
    }

    return Ok(());
}

/// Executes requests issued by the UI. Each action runs on its own task so a
/// slow reply never holds up feedback or history requests; responses go back
/// as `Event`s in completion order.
pub struct ActionsService {}

impl ActionsService {
    pub async fn start(
        backend: Arc<BackendBox>,
        tx: mpsc::UnboundedSender<Event>,
        rx: &mut mpsc::UnboundedReceiver<Action>,
    ) -> Result<()> {
        while let Some(action) = rx.recv().await {
            let worker_backend = backend.clone();
            let worker_tx = tx.clone();

            tokio::spawn(async move {
                if let Err(err) = run_action(&worker_backend, action, &worker_tx).await {
                    // The UI has already shut down.
                    tracing::debug!(error = ?err, "Dropping backend response");
                }
            });
        }

        return Ok(());
    }
}
