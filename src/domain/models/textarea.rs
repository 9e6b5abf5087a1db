use ratatui::widgets::Block;
use ratatui::widgets::BorderType;
use ratatui::widgets::Borders;
use ratatui::widgets::Padding;

use super::Controls;

pub struct TextArea {}

impl<'a> TextArea {
    pub fn title(controls: &Controls) -> &'static str {
        if controls.input {
            return "Enter message";
        }
        if controls.topics {
            return "Pick a topic with /topic NAME";
        }
        if controls.history {
            return "Waiting for the server...";
        }

        return "Disabled";
    }

    pub fn block(title: &'static str) -> Block<'a> {
        return Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Double)
            .title(title)
            .padding(Padding::new(1, 1, 0, 0));
    }

    pub fn with_title(title: &'static str) -> tui_textarea::TextArea<'a> {
        let mut textarea = tui_textarea::TextArea::default();
        textarea.set_block(TextArea::block(title));

        return textarea;
    }
}
