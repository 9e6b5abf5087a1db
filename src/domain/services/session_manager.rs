#[cfg(test)]
#[path = "session_manager_test.rs"]
mod tests;

use std::time::Duration;
use std::time::Instant;

use anyhow::Result;
use tokio::sync::mpsc;

use super::classify;
use super::Delivery;
use super::FeedbackCapture;
use super::MessagePipeline;
use super::Notifier;
use crate::domain::models::Action;
use crate::domain::models::Controls;
use crate::domain::models::ConversationRecord;
use crate::domain::models::Event;
use crate::domain::models::FeedbackRequest;
use crate::domain::models::HistoryLink;
use crate::domain::models::HistoryRequest;
use crate::domain::models::Message;
use crate::domain::models::MessageReply;
use crate::domain::models::Notification;
use crate::domain::models::RequestError;
use crate::domain::models::Session;
use crate::domain::models::SessionState;
use crate::domain::models::Surface;
use crate::domain::models::Transition;

pub struct ClientSettings {
    pub rate_limiting: bool,
    pub notification_timeout: Duration,
}

impl Default for ClientSettings {
    fn default() -> ClientSettings {
        return ClientSettings {
            rate_limiting: false,
            notification_timeout: Duration::from_secs(5),
        };
    }
}

/// Owns the session state machine and the transcript. Every user intent and
/// every server response goes through here; requests leave as `Action`s and
/// come back as `Event`s tagged with the epoch they were issued in. Starting,
/// resetting or rehydrating a conversation begins a new epoch, so responses
/// belonging to an earlier conversation are dropped.
pub struct SessionManager<S: Surface> {
    session: Session,
    messages: Vec<Message>,
    history: Vec<HistoryLink>,
    pipeline: MessagePipeline,
    feedback: FeedbackCapture,
    notifier: Notifier,
    surface: S,
    tx: mpsc::UnboundedSender<Action>,
    epoch: u64,
    loading_history: bool,
}

impl<S: Surface> SessionManager<S> {
    pub fn new(
        surface: S,
        tx: mpsc::UnboundedSender<Action>,
        settings: ClientSettings,
    ) -> SessionManager<S> {
        let mut manager = SessionManager {
            session: Session::default(),
            messages: vec![],
            history: vec![],
            pipeline: MessagePipeline::new(settings.rate_limiting),
            feedback: FeedbackCapture::default(),
            notifier: Notifier::new(settings.notification_timeout),
            surface,
            tx,
            epoch: 0,
            loading_history: false,
        };

        manager.sync_controls();
        return manager;
    }

    pub fn session(&self) -> &Session {
        return &self.session;
    }

    pub fn messages(&self) -> &[Message] {
        return &self.messages;
    }

    pub fn history_links(&self) -> &[HistoryLink] {
        return &self.history;
    }

    pub fn notification(&self) -> Option<&Notification> {
        return self.notifier.current();
    }

    pub fn surface(&self) -> &S {
        return &self.surface;
    }

    pub fn surface_mut(&mut self) -> &mut S {
        return &mut self.surface;
    }

    pub fn controls(&self) -> Controls {
        let controls = Controls::for_state(self.session.state());
        if self.loading_history {
            return controls.while_loading();
        }

        return controls;
    }

    /// Requests a new session for `topic`. Switching topics from an active
    /// conversation discards it.
    pub fn start_session(&mut self, topic: &str) -> Result<()> {
        let topic = topic.trim();
        if topic.is_empty() || self.loading_history {
            return Ok(());
        }
        if !matches!(
            self.session.state(),
            SessionState::Idle | SessionState::Active
        ) {
            tracing::debug!(state = %self.session.state(), topic, "Ignoring session request");
            return Ok(());
        }

        self.begin_epoch();
        self.clear_conversation();
        self.session.request(topic);
        self.surface.set_topic(Some(topic));
        self.sync_controls();

        tracing::debug!(epoch = self.epoch, topic, "Requesting session");
        self.tx
            .send(Action::RequestSession(self.epoch, topic.to_string()))?;

        return Ok(());
    }

    /// Submits a user message. A no-op unless a session is active and no other
    /// message is in flight.
    pub fn send(&mut self, text: &str) -> Result<()> {
        if self.loading_history {
            return Ok(());
        }

        let position = self.messages.len();
        let (message, request) = match self.pipeline.submit(&self.session, text, position) {
            Some(submission) => submission,
            None => return Ok(()),
        };

        self.surface.render_message(&message);
        self.messages.push(message);
        self.session.apply(Transition::Submit);
        self.sync_controls();

        self.tx.send(Action::SendMessage(self.epoch, request))?;
        return Ok(());
    }

    /// Fetches a persisted conversation. The transcript is replaced once the
    /// record arrives.
    pub fn load_history(&mut self, link: &HistoryLink) -> Result<()> {
        if self.session.is_critical() || self.loading_history {
            return Ok(());
        }

        self.begin_epoch();
        self.loading_history = true;
        self.sync_controls();

        tracing::debug!(epoch = self.epoch, session = link.session.as_str(), "Fetching history");
        self.tx.send(Action::FetchHistory(
            self.epoch,
            HistoryRequest {
                session: link.session.to_string(),
                branch: link.branch.to_string(),
            },
        ))?;

        return Ok(());
    }

    /// Replaces the transcript with `record` in full and resumes its session.
    pub fn apply_history(&mut self, record: ConversationRecord) {
        if self.session.is_critical() {
            return;
        }

        self.loading_history = false;
        self.clear_conversation();

        let messages = record.to_messages();
        for message in messages.iter() {
            self.surface.render_message(message);
        }
        self.messages = messages;

        self.session.activate(&record.session, &record.branch);
        self.surface.set_topic(Some(&record.branch));
        self.sync_controls();
    }

    /// Starts over from topic selection. Ignored while a session or message
    /// request is outstanding, or a conversation is being fetched.
    pub fn reset_session(&mut self) {
        if self.loading_history
            || !matches!(
                self.session.state(),
                SessionState::Idle | SessionState::Active
            )
        {
            tracing::debug!(state = %self.session.state(), "Ignoring reset");
            return;
        }

        self.begin_epoch();
        self.loading_history = false;
        self.clear_conversation();
        self.notifier.clear();
        self.surface.render_notification(None);
        self.session.apply(Transition::Reset);
        self.surface.set_topic(None);
        self.sync_controls();
    }

    pub fn submit_feedback(&mut self, index: u32, like: bool) -> Result<()> {
        if self.session.is_critical() {
            return Ok(());
        }

        let prepared = self
            .feedback
            .prepare(&self.session, &self.messages, index, like);
        if let Some((position, request)) = prepared {
            self.tx
                .send(Action::SendFeedback(self.epoch, position, request))?;
        }

        return Ok(());
    }

    /// Hides an expired notification.
    pub fn tick(&mut self, now: Instant) {
        if self.notifier.tick(now) {
            self.surface.render_notification(None);
        }
    }

    pub fn handle_event(&mut self, event: Event) {
        if self.session.is_critical() {
            return;
        }

        match event {
            Event::SessionResponse(epoch, topic, result) => {
                self.handle_session_response(epoch, topic, result);
            }
            Event::MessageResponse(epoch, result) => {
                self.handle_message_response(epoch, result);
            }
            Event::FeedbackResponse(epoch, position, request, result) => {
                self.handle_feedback_response(epoch, position, request, result);
            }
            Event::HistoryResponse(epoch, request, result) => {
                self.handle_history_response(epoch, request, result);
            }
            Event::RequestsRemaining(remaining) => {
                self.surface.set_requests_remaining(remaining);
            }
            Event::UITick() => {
                self.tick(Instant::now());
            }
            _ => (),
        }
    }

    fn handle_session_response(
        &mut self,
        epoch: u64,
        topic: String,
        result: Result<String, RequestError>,
    ) {
        if !self.is_current(epoch, "session")
            || self.session.state() != SessionState::Requesting
        {
            return;
        }

        match result {
            Ok(session_id) => {
                tracing::info!(session = session_id.as_str(), topic = topic.as_str(), "Session started");
                self.session.activate(&session_id, &topic);

                let link = HistoryLink {
                    session: session_id,
                    branch: topic,
                };
                self.surface.add_history_link(&link);
                self.history.insert(0, link);
                self.notify(Notification::success("Session started successfully."));
            }
            Err(err) => {
                let classification = classify(&err);
                if classification.is_critical() {
                    tracing::error!(error = ?err, "Failed to start session");
                    self.fail(&classification.message);
                    return;
                }

                tracing::warn!(error = ?err, "Failed to start session");
                self.session.apply(Transition::Abandon);
                self.surface.set_topic(None);
                self.notify(Notification::info(&format!(
                    "Error fetching session: {}",
                    classification.message
                )));
            }
        }

        self.sync_controls();
    }

    fn handle_message_response(&mut self, epoch: u64, result: Result<MessageReply, RequestError>) {
        if !self.is_current(epoch, "message") {
            return;
        }

        match self.pipeline.settle(result) {
            Some(Delivery::Reply {
                message,
                requests_remaining,
            }) => {
                self.surface.render_message(&message);
                self.messages.push(message);
                if let Some(remaining) = requests_remaining {
                    self.surface.set_requests_remaining(remaining);
                }
            }
            Some(Delivery::Failed {
                position,
                classification,
            }) => {
                if classification.is_critical() {
                    self.fail(&classification.message);
                    return;
                }

                if let Some(message) = self.messages.get_mut(position) {
                    message.failed = true;
                }
                self.surface.mark_failed(position);
                self.notify(Notification::info(&format!(
                    "Error sending message: {}",
                    classification.message
                )));
            }
            None => return,
        }

        self.session.apply(Transition::Settle);
        self.sync_controls();
    }

    fn handle_feedback_response(
        &mut self,
        epoch: u64,
        position: usize,
        request: FeedbackRequest,
        result: Result<(), RequestError>,
    ) {
        if !self.is_current(epoch, "feedback") {
            return;
        }

        match self.feedback.resolve(position, &request, result) {
            Some(feedback) => {
                if let Some(message) = self.messages.get_mut(position) {
                    message.feedback = Some(feedback);
                }
                self.surface.select_feedback(position, feedback);
                self.notify(Notification::success("Feedback sent!"));
            }
            None => {
                self.notify(Notification::info(
                    "Error sending feedback. Try again later.",
                ));
            }
        }
    }

    fn handle_history_response(
        &mut self,
        epoch: u64,
        request: HistoryRequest,
        result: Result<ConversationRecord, RequestError>,
    ) {
        if !self.is_current(epoch, "history") {
            return;
        }

        match result {
            Ok(mut record) => {
                if record.session.is_empty() {
                    record.session = request.session;
                }
                self.apply_history(record);
            }
            Err(err) => {
                tracing::warn!(error = ?err, session = request.session.as_str(), "Failed to fetch history");
                self.loading_history = false;
                self.clear_conversation();
                self.session.apply(Transition::Reset);
                self.surface.set_topic(None);
                self.notify(Notification::info(
                    "Error getting conversation history from server. Please try again.",
                ));
                self.sync_controls();
            }
        }
    }

    fn is_current(&self, epoch: u64, kind: &str) -> bool {
        if epoch != self.epoch {
            tracing::debug!(epoch, current = self.epoch, kind, "Dropping stale response");
            return false;
        }

        return true;
    }

    fn begin_epoch(&mut self) {
        self.epoch += 1;
        self.pipeline.abandon();
        self.feedback.clear();
    }

    fn clear_conversation(&mut self) {
        self.messages.clear();
        self.surface.clear_transcript();
    }

    fn fail(&mut self, text: &str) {
        self.session.apply(Transition::Fatal);
        self.pipeline.abandon();
        self.notify(Notification::critical(text));
        self.sync_controls();
    }

    pub fn notify(&mut self, notification: Notification) {
        if self.notifier.show(notification, Instant::now()) {
            self.surface.render_notification(self.notifier.current());
        }
    }

    fn sync_controls(&mut self) {
        let controls = self.controls();
        self.surface.set_controls(controls);
    }
}
