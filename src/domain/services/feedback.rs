#[cfg(test)]
#[path = "feedback_test.rs"]
mod tests;

use std::collections::HashSet;

use crate::domain::models::Feedback;
use crate::domain::models::FeedbackRequest;
use crate::domain::models::Message;
use crate::domain::models::RequestError;
use crate::domain::models::Session;

/// Like/dislike votes on assistant messages. A vote matching the current
/// selection, or one for a message with a vote already in flight, is ignored.
#[derive(Default)]
pub struct FeedbackCapture {
    pending: HashSet<usize>,
}

impl FeedbackCapture {
    /// Finds the assistant message keyed by `index` and builds the request for
    /// it. Returns the transcript position alongside the request.
    pub fn prepare(
        &mut self,
        session: &Session,
        messages: &[Message],
        index: u32,
        like: bool,
    ) -> Option<(usize, FeedbackRequest)> {
        let session_id = session.id()?;
        let branch = session.branch()?;

        let position = messages.iter().position(|message| {
            return message.accepts_feedback() && message.index == Some(index);
        })?;
        let message = &messages[position];

        if message.feedback == Some(Feedback::from_like(like)) {
            tracing::debug!(index, like, "Feedback already selected");
            return None;
        }
        if !self.pending.insert(position) {
            tracing::debug!(index, like, "Feedback already in flight");
            return None;
        }

        let request = FeedbackRequest {
            message: message.content.to_string(),
            like,
            index,
            session_id: session_id.to_string(),
            branch: branch.to_string(),
        };

        return Some((position, request));
    }

    /// Settles a vote. Returns the selection to show on success; on failure
    /// the previous selection stays untouched.
    pub fn resolve(
        &mut self,
        position: usize,
        request: &FeedbackRequest,
        result: Result<(), RequestError>,
    ) -> Option<Feedback> {
        self.pending.remove(&position);

        if let Err(err) = result {
            tracing::warn!(index = request.index, error = ?err, "Failed to send feedback");
            return None;
        }

        tracing::debug!(index = request.index, like = request.like, "Feedback sent");
        return Some(Feedback::from_like(request.like));
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }
}
