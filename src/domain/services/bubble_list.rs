use std::collections::HashMap;

use ratatui::prelude::Backend;
use ratatui::prelude::Rect;
use ratatui::text::Line;
use ratatui::widgets::Block;
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use super::Bubble;
use crate::domain::models::Feedback;
use crate::domain::models::Message;

#[cfg(test)]
#[path = "bubble_list_test.rs"]
mod tests;

struct BubbleCacheEntry {
    text_len: usize,
    feedback: Option<Feedback>,
    failed: bool,
    lines: Vec<Line<'static>>,
}

impl BubbleCacheEntry {
    fn matches(&self, message: &Message) -> bool {
        return self.text_len == message.content.len()
            && self.feedback == message.feedback
            && self.failed == message.failed;
    }
}

/// Rendered transcript lines, cached per transcript position. An entry is
/// rebuilt when its message changes state or the window is resized.
pub struct BubbleList {
    cache: HashMap<usize, BubbleCacheEntry>,
    chat_head: String,
    line_width: usize,
    lines_len: usize,
}

impl BubbleList {
    pub fn new(chat_head: &str) -> BubbleList {
        return BubbleList {
            cache: HashMap::new(),
            chat_head: chat_head.to_string(),
            line_width: 0,
            lines_len: 0,
        };
    }

    pub fn set_messages(&mut self, messages: &[Message], line_width: usize) {
        if self.line_width != line_width {
            self.cache.clear();
            self.line_width = line_width;
        }

        self.cache.retain(|idx, _| return *idx < messages.len());

        self.lines_len = messages
            .iter()
            .enumerate()
            .map(|(idx, message)| {
                if let Some(cache_entry) = self.cache.get(&idx) {
                    if cache_entry.matches(message) {
                        return cache_entry.lines.len();
                    }
                }

                let lines = Bubble::new(message, line_width, &self.chat_head).as_lines();
                let lines_len = lines.len();
                self.cache.insert(
                    idx,
                    BubbleCacheEntry {
                        text_len: message.content.len(),
                        feedback: message.feedback,
                        failed: message.failed,
                        lines,
                    },
                );

                return lines_len;
            })
            .sum();
    }

    pub fn clear(&mut self) {
        self.cache.clear();
        self.lines_len = 0;
    }

    pub fn len(&self) -> usize {
        return self.lines_len;
    }

    pub fn is_empty(&self) -> bool {
        return self.lines_len == 0;
    }

    pub fn render<B: Backend>(&self, frame: &mut Frame<B>, rect: Rect, scroll: u16) {
        let mut indexes: Vec<usize> = self.cache.keys().cloned().collect();
        indexes.sort();
        let lines: Vec<Line<'static>> = indexes
            .iter()
            .filter_map(|idx| {
                return self.cache.get(idx);
            })
            .flat_map(|entry| {
                return entry.lines.to_owned();
            })
            .collect();

        frame.render_widget(
            Paragraph::new(lines)
                .block(Block::default())
                .scroll((scroll, 0)),
            rect,
        );
    }
}
