#[cfg(test)]
#[path = "bubble_test.rs"]
mod tests;

use ratatui::style::Color;
use ratatui::style::Modifier;
use ratatui::style::Style;
use ratatui::text::Line;
use ratatui::text::Span;

use crate::domain::models::Feedback;
use crate::domain::models::Message;
use crate::domain::models::Role;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BubbleAlignment {
    Left,
    Right,
}

impl BubbleAlignment {
    pub fn for_role(role: Role) -> BubbleAlignment {
        if role == Role::User {
            return BubbleAlignment::Right;
        }

        return BubbleAlignment::Left;
    }
}

pub struct BubbleConfig {
    pub bubble_padding: usize,
    pub border_elements_length: usize,
    pub outer_padding_percentage: f32,
    pub min_line_length: usize,
}

fn repeat_from_subtractions(text: &str, total: usize, subtractions: &[usize]) -> String {
    let used: usize = subtractions.iter().sum();
    if used >= total {
        return "".to_string();
    }

    return text.repeat(total - used);
}

fn char_len(text: &str) -> usize {
    return text.chars().count();
}

/// A single transcript entry drawn as a bordered box. The top border carries
/// the author, plus the feedback number for assistant replies; the bottom
/// border carries the delivery and feedback state.
pub struct Bubble<'a> {
    alignment: BubbleAlignment,
    message: &'a Message,
    window_max_width: usize,
    title: String,
}

impl<'a> Bubble<'a> {
    pub fn new(message: &'a Message, window_max_width: usize, chat_head: &str) -> Bubble<'a> {
        let title = match (message.role, message.index) {
            (Role::User, _) => "You".to_string(),
            (Role::Assistant, Some(index)) => format!("{chat_head} #{index}"),
            (Role::Assistant, None) => chat_head.to_string(),
        };

        return Bubble {
            alignment: BubbleAlignment::for_role(message.role),
            message,
            window_max_width,
            title,
        };
    }

    pub fn style_config() -> BubbleConfig {
        return BubbleConfig {
            // "│ " + " │"
            bubble_padding: 4,
            // left border + left padding + (text, not counted) + right padding + right border +
            // scrollbar.
            border_elements_length: 5,
            outer_padding_percentage: 0.04,
            min_line_length: 10,
        };
    }

    pub fn as_lines(&self) -> Vec<Line<'static>> {
        let line_limit = self.line_limit();
        let text = self.message.display_text(line_limit);
        let max_line_length = self.max_line_length(&text, line_limit);

        let mut lines: Vec<Line<'static>> = vec![];
        for line in text.lines() {
            let mut words: Vec<&str> = vec![];
            let mut line_char_count = 0;

            for word in line.split(' ') {
                let word_len = char_len(word);
                if !words.is_empty() && word_len + line_char_count > max_line_length {
                    lines.push(self.text_to_line(words.join(" "), max_line_length));
                    words = vec![];
                    line_char_count = 0;
                }

                words.push(word);
                line_char_count += word_len + 1;
            }

            lines.push(self.text_to_line(words.join(" "), max_line_length));
        }

        if lines.is_empty() {
            lines.push(self.text_to_line("".to_string(), max_line_length));
        }

        return self.wrap_lines_in_bubble(lines, max_line_length);
    }

    fn footer(&self) -> Option<&'static str> {
        if self.message.failed {
            return Some("not sent");
        }

        match self.message.feedback {
            Some(Feedback::Like) => return Some("liked"),
            Some(Feedback::Dislike) => return Some("disliked"),
            None => return None,
        }
    }

    fn line_limit(&self) -> usize {
        let style_config = Bubble::style_config();
        // Add a minimum 4% of padding on the side.
        let min_bubble_padding_length = ((self.window_max_width as f32
            * style_config.outer_padding_percentage)
            .ceil()) as usize;

        // Border elements + minimum bubble padding.
        let line_border_width = style_config.border_elements_length + min_bubble_padding_length;

        return self
            .window_max_width
            .saturating_sub(line_border_width)
            .max(style_config.min_line_length);
    }

    fn max_line_length(&self, text: &str, line_limit: usize) -> usize {
        let longest = text
            .lines()
            .map(|line| {
                return char_len(line);
            })
            .max()
            .unwrap_or(0)
            .min(line_limit);

        let footer_len = self.footer().map(char_len).unwrap_or(0);
        return longest.max(char_len(&self.title)).max(footer_len);
    }

    fn text_to_line(&self, text: String, max_line_length: usize) -> Line<'static> {
        let text_len = char_len(&text);
        let fill = repeat_from_subtractions(" ", max_line_length, &[text_len]);
        let formatted_line_length = text_len + fill.len() + Bubble::style_config().bubble_padding;
        let outer_bubble_padding =
            repeat_from_subtractions(" ", self.window_max_width, &[formatted_line_length]);

        let mut spans = vec![
            self.border_span("│ ".to_string()),
            self.text_span(text),
            self.border_span(format!("{fill} │")),
        ];

        if self.alignment == BubbleAlignment::Left {
            spans.push(Span::from(outer_bubble_padding));
        } else {
            spans.insert(0, Span::from(outer_bubble_padding));
        }

        return Line::from(spans);
    }

    fn wrap_lines_in_bubble(&self, lines: Vec<Line<'static>>, max_line_length: usize) -> Vec<Line<'static>> {
        // Add 2 for the padding around the text.
        let bar_length = max_line_length + 2;
        let top_fill = repeat_from_subtractions("─", bar_length, &[char_len(&self.title)]);
        let top_bar = format!("╭{}{top_fill}╮", self.title);

        let footer = self.footer().unwrap_or("");
        let bottom_fill = repeat_from_subtractions("─", bar_length, &[char_len(footer)]);
        let bottom_bar = format!("╰{bottom_fill}{footer}╯");

        let bar_bubble_padding = repeat_from_subtractions(
            " ",
            self.window_max_width,
            &[max_line_length, Bubble::style_config().bubble_padding],
        );

        let (top, bottom) = if self.alignment == BubbleAlignment::Left {
            (
                format!("{top_bar}{bar_bubble_padding}"),
                format!("{bottom_bar}{bar_bubble_padding}"),
            )
        } else {
            (
                format!("{bar_bubble_padding}{top_bar}"),
                format!("{bar_bubble_padding}{bottom_bar}"),
            )
        };

        let mut res = vec![Line::from(self.border_span(top))];
        res.extend(lines);
        res.push(Line::from(self.border_span(bottom)));
        return res;
    }

    fn border_span(&self, text: String) -> Span<'static> {
        if self.message.failed {
            return Span::styled(
                text,
                Style {
                    fg: Some(Color::Red),
                    ..Style::default()
                },
            );
        } else if self.message.role == Role::Assistant {
            return Span::styled(
                text,
                Style {
                    fg: Some(Color::Cyan),
                    ..Style::default()
                },
            );
        }

        return Span::from(text);
    }

    fn text_span(&self, text: String) -> Span<'static> {
        if self.message.failed {
            return Span::styled(
                text,
                Style::default()
                    .fg(Color::Red)
                    .add_modifier(Modifier::CROSSED_OUT),
            );
        }

        return Span::from(text);
    }
}
