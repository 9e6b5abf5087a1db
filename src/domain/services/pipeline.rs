#[cfg(test)]
#[path = "pipeline_test.rs"]
mod tests;

use super::classify;
use super::Classification;
use crate::domain::models::Message;
use crate::domain::models::MessageReply;
use crate::domain::models::MessageRequest;
use crate::domain::models::RequestError;
use crate::domain::models::Session;
use crate::domain::models::SessionState;
use crate::domain::models::CLIENT_NAME;

#[derive(Debug, PartialEq, Eq)]
pub enum Delivery {
    Reply {
        message: Message,
        /// Only reported when rate limiting is enabled.
        requests_remaining: Option<u32>,
    },
    Failed {
        /// Transcript position of the user message that went unanswered.
        position: usize,
        classification: Classification,
    },
}

/// One request/response cycle per user message, never more than one in flight.
pub struct MessagePipeline {
    rate_limiting: bool,
    in_flight: Option<usize>,
    last_index: Option<u32>,
}

impl MessagePipeline {
    pub fn new(rate_limiting: bool) -> MessagePipeline {
        return MessagePipeline {
            rate_limiting,
            in_flight: None,
            last_index: None,
        };
    }

    pub fn is_sending(&self) -> bool {
        return self.in_flight.is_some();
    }

    /// Validates a submission. On success returns the optimistic user message
    /// that will sit at `position` and the request to issue.
    pub fn submit(
        &mut self,
        session: &Session,
        text: &str,
        position: usize,
    ) -> Option<(Message, MessageRequest)> {
        if session.state() != SessionState::Active || self.in_flight.is_some() {
            tracing::debug!(state = %session.state(), "Ignoring submission");
            return None;
        }

        let text = text.trim();
        if text.is_empty() {
            return None;
        }

        let session_id = session.id()?;
        let branch = session.branch()?;

        let request = MessageRequest {
            message: text.to_string(),
            from: CLIENT_NAME.to_string(),
            action: branch.to_string(),
            session: session_id.to_string(),
        };

        self.in_flight = Some(position);
        return Some((Message::user(text), request));
    }

    /// Settles the outstanding request. `None` means nothing was in flight and
    /// the result should be discarded.
    pub fn settle(&mut self, result: Result<MessageReply, RequestError>) -> Option<Delivery> {
        let position = self.in_flight.take()?;

        match result {
            Ok(reply) => {
                if let Some(last_index) = self.last_index {
                    if reply.index < last_index {
                        tracing::warn!(
                            index = reply.index,
                            last_index,
                            "Server returned a decreasing message index"
                        );
                    }
                }
                self.last_index = Some(reply.index);

                let mut requests_remaining = None;
                if self.rate_limiting {
                    requests_remaining = reply.requests_remaining;
                }

                return Some(Delivery::Reply {
                    message: Message::assistant(&reply.response, Some(reply.index)),
                    requests_remaining,
                });
            }
            Err(err) => {
                let classification = classify(&err);
                if classification.is_critical() {
                    tracing::error!(error = ?err, "Failed to send message");
                } else {
                    tracing::warn!(error = ?err, "Failed to send message");
                }

                return Some(Delivery::Failed {
                    position,
                    classification,
                });
            }
        }
    }

    /// Forgets the outstanding request, e.g. when the transcript it belongs to
    /// was replaced.
    pub fn abandon(&mut self) {
        self.in_flight = None;
        self.last_index = None;
    }
}
