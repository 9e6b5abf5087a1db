#[cfg(test)]
#[path = "chat_view_test.rs"]
mod tests;

use ratatui::prelude::Rect;

use super::BubbleList;
use super::Scroll;
use crate::domain::models::Controls;
use crate::domain::models::Feedback;
use crate::domain::models::HistoryLink;
use crate::domain::models::Message;
use crate::domain::models::Notification;
use crate::domain::models::Surface;

/// Terminal rendering state for the chat. The session manager drives it
/// through `Surface`; the UI loop reads it back when drawing a frame.
pub struct ChatView {
    pub bubble_list: BubbleList,
    pub scroll: Scroll,
    pub show_help: bool,
    chat_head: String,
    controls: Controls,
    history_links: Vec<HistoryLink>,
    last_known_height: u16,
    last_known_width: u16,
    messages: Vec<Message>,
    notification: Option<Notification>,
    requests_remaining: Option<u32>,
    topic: Option<String>,
}

impl ChatView {
    pub fn new(chat_head: &str) -> ChatView {
        return ChatView {
            bubble_list: BubbleList::new(chat_head),
            scroll: Scroll::default(),
            show_help: false,
            chat_head: chat_head.to_string(),
            controls: Controls::default(),
            history_links: vec![],
            last_known_height: 0,
            last_known_width: 0,
            messages: vec![],
            notification: None,
            requests_remaining: None,
            topic: None,
        };
    }

    pub fn chat_head(&self) -> &str {
        return &self.chat_head;
    }

    pub fn controls(&self) -> Controls {
        return self.controls;
    }

    pub fn history_links(&self) -> &[HistoryLink] {
        return &self.history_links;
    }

    pub fn messages(&self) -> &[Message] {
        return &self.messages;
    }

    pub fn notification(&self) -> Option<&Notification> {
        return self.notification.as_ref();
    }

    pub fn requests_remaining(&self) -> Option<u32> {
        return self.requests_remaining;
    }

    pub fn topic(&self) -> Option<&str> {
        return self.topic.as_deref();
    }

    /// Header text for the current topic.
    pub fn greeting(&self) -> String {
        if let Some(topic) = &self.topic {
            return format!("Okay, I'll help you with {topic}!");
        }

        return format!("Welcome to {}! Pick a topic to get started.", self.chat_head);
    }

    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
    }

    pub fn set_rect(&mut self, rect: Rect) {
        self.last_known_width = rect.width;
        self.last_known_height = rect.height;
        self.sync_dependants();
    }

    fn sync_dependants(&mut self) {
        self.bubble_list
            .set_messages(&self.messages, self.last_known_width.into());

        let lines_len = u16::try_from(self.bubble_list.len()).unwrap_or(u16::MAX);
        self.scroll.set_state(lines_len, self.last_known_height);
    }
}

impl Surface for ChatView {
    fn render_message(&mut self, message: &Message) {
        self.messages.push(message.clone());
        self.sync_dependants();
        self.scroll.last();
    }

    fn mark_failed(&mut self, position: usize) {
        if let Some(message) = self.messages.get_mut(position) {
            message.failed = true;
            self.sync_dependants();
        }
    }

    fn select_feedback(&mut self, position: usize, feedback: Feedback) {
        if let Some(message) = self.messages.get_mut(position) {
            message.feedback = Some(feedback);
            self.sync_dependants();
        }
    }

    fn clear_transcript(&mut self) {
        self.messages.clear();
        self.bubble_list.clear();
        self.scroll.reset();
        self.sync_dependants();
    }

    fn render_notification(&mut self, notification: Option<&Notification>) {
        self.notification = notification.cloned();
    }

    fn set_controls(&mut self, controls: Controls) {
        self.controls = controls;
    }

    fn add_history_link(&mut self, link: &HistoryLink) {
        self.history_links.insert(0, link.clone());
    }

    fn set_topic(&mut self, topic: Option<&str>) {
        self.topic = topic.map(|topic| return topic.to_string());
    }

    fn set_requests_remaining(&mut self, remaining: u32) {
        self.requests_remaining = Some(remaining);
    }
}
