#[cfg(test)]
#[path = "events_test.rs"]
mod tests;

use anyhow::Result;
use crossterm::event::Event as CrosstermEvent;
use crossterm::event::EventStream;
use crossterm::event::KeyEventKind;
use crossterm::event::MouseEventKind;
use futures::StreamExt;
use tokio::sync::mpsc;
use tokio::time;
use tui_textarea::Input;
use tui_textarea::Key;

use crate::domain::models::Event;

const TICK_RATE: time::Duration = time::Duration::from_millis(500);

/// Client keymap. Anything unbound is typed into the input box.
fn map_key(input: Input) -> Event {
    match (input.key, input.ctrl) {
        (Key::Char('c'), true) => return Event::KeyboardCTRLC(),
        (Key::Enter, _) => return Event::KeyboardEnter(),
        (Key::Esc, _) => return Event::UICloseHelp(),
        (Key::Up, _) => return Event::UIScrollUp(),
        (Key::Down, _) => return Event::UIScrollDown(),
        (Key::PageUp, _) | (Key::Char('u'), true) => return Event::UIScrollPageUp(),
        (Key::PageDown, _) | (Key::Char('d'), true) => return Event::UIScrollPageDown(),
        (Key::Home, true) => return Event::UIScrollTop(),
        (Key::End, true) => return Event::UIScrollBottom(),
        _ => return Event::KeyboardCharInput(input),
    }
}

fn map_terminal_event(event: CrosstermEvent) -> Option<Event> {
    match event {
        CrosstermEvent::Key(key) if key.kind == KeyEventKind::Release => return None,
        CrosstermEvent::Key(key) => return Some(map_key(key.into())),
        CrosstermEvent::Paste(text) => return Some(Event::KeyboardPaste(text)),
        CrosstermEvent::Resize(_, _) => return Some(Event::UIResize()),
        CrosstermEvent::Mouse(mouse) => match mouse.kind {
            MouseEventKind::ScrollUp => return Some(Event::UIScrollUp()),
            MouseEventKind::ScrollDown => return Some(Event::UIScrollDown()),
            _ => return None,
        },
        _ => return None,
    }
}

/// Merges terminal input, worker responses and a steady UI tick into one
/// stream for the UI loop.
pub struct EventsService {
    terminal_events: EventStream,
    events: mpsc::UnboundedReceiver<Event>,
    ticker: time::Interval,
}

impl EventsService {
    pub fn new(events: mpsc::UnboundedReceiver<Event>) -> EventsService {
        return EventsService {
            terminal_events: EventStream::new(),
            events,
            ticker: time::interval(TICK_RATE),
        };
    }

    pub async fn next(&mut self) -> Result<Event> {
        loop {
            let event = tokio::select! {
                event = self.events.recv() => event,
                event = self.terminal_events.next() => match event {
                    Some(Ok(raw)) => map_terminal_event(raw),
                    _ => None,
                },
                _ = self.ticker.tick() => Some(Event::UITick()),
            };

            if let Some(event) = event {
                return Ok(event);
            }
        }
    }
}
