#[cfg(test)]
#[path = "ui_test.rs"]
mod tests;

use std::io;

use anyhow::Result;
use crossterm::cursor;
use crossterm::event::DisableMouseCapture;
use crossterm::event::EnableMouseCapture;
use crossterm::terminal::disable_raw_mode;
use crossterm::terminal::enable_raw_mode;
use crossterm::terminal::EnterAlternateScreen;
use crossterm::terminal::LeaveAlternateScreen;
use ratatui::backend::CrosstermBackend;
use ratatui::prelude::*;
use ratatui::widgets::Block;
use ratatui::widgets::Borders;
use ratatui::widgets::Clear;
use ratatui::widgets::Padding;
use ratatui::widgets::Paragraph;
use ratatui::widgets::Scrollbar;
use ratatui::widgets::ScrollbarOrientation;
use ratatui::widgets::Wrap;
use ratatui::Frame;
use ratatui::Terminal;
use tokio::sync::mpsc;

use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::help_text;
use crate::domain::models::Action;
use crate::domain::models::Event;
use crate::domain::models::HistoryLink;
use crate::domain::models::Loading;
use crate::domain::models::Notification;
use crate::domain::models::NotificationLevel;
use crate::domain::models::SessionState;
use crate::domain::models::SlashCommand;
use crate::domain::models::TextArea;
use crate::domain::services::events::EventsService;
use crate::domain::services::ChatView;
use crate::domain::services::ClientSettings;
use crate::domain::services::SessionManager;

const SIDEBAR_WIDTH: u16 = 30;

type ChatManager = SessionManager<ChatView>;

fn resolve_topic(command: &SlashCommand, topics: &[String]) -> Option<String> {
    if let Some(number) = command.number_arg() {
        let idx = usize::try_from(number).ok()?.checked_sub(1)?;
        return topics.get(idx).cloned();
    }

    let name = command.text_arg();
    if name.is_empty() {
        return None;
    }
    if topics.is_empty() || topics.contains(&name) {
        return Some(name);
    }

    return None;
}

/// Runs a slash command against the session. Returns true when the client
/// should exit.
pub fn handle_slash_command(
    manager: &mut ChatManager,
    command: &SlashCommand,
    topics: &[String],
) -> Result<bool> {
    if command.is_quit() {
        return Ok(true);
    }

    if command.is_help() {
        manager.surface_mut().toggle_help();
        return Ok(false);
    }

    if command.is_topic() {
        match resolve_topic(command, topics) {
            Some(topic) => manager.start_session(&topic)?,
            None => manager.notify(Notification::info(&format!(
                "Unknown topic. Pick one of: {}",
                topics.join(", ")
            ))),
        }
        return Ok(false);
    }

    if command.is_new_chat() {
        manager.reset_session();
        return Ok(false);
    }

    if command.is_history() {
        let link = command
            .number_arg()
            .and_then(|number| return usize::try_from(number).ok()?.checked_sub(1))
            .and_then(|idx| return manager.history_links().get(idx).cloned());

        match link {
            Some(link) => manager.load_history(&link)?,
            None => manager.notify(Notification::info(
                "No conversation with that number. Use /history N with a number from the sidebar.",
            )),
        }
        return Ok(false);
    }

    if command.is_like() || command.is_dislike() {
        match command.number_arg() {
            Some(index) => manager.submit_feedback(index, command.is_like())?,
            None => manager.notify(Notification::info(
                "Pass the number shown on the reply, for example /like 1.",
            )),
        }
        return Ok(false);
    }

    return Ok(false);
}

pub fn sidebar_lines(chat_view: &ChatView, topics: &[String], rate_limiting: bool) -> Vec<Line<'static>> {
    let heading = Style::default().add_modifier(Modifier::BOLD | Modifier::UNDERLINED);
    let mut lines = vec![Line::from(Span::styled("TOPICS", heading))];

    for (idx, topic) in topics.iter().enumerate() {
        let mut style = Style::default();
        if chat_view.topic() == Some(topic.as_str()) {
            style = style.fg(Color::Cyan).add_modifier(Modifier::BOLD);
        }
        lines.push(Line::from(Span::styled(
            format!("({}) {topic}", idx + 1),
            style,
        )));
    }

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled("HISTORY", heading)));
    if chat_view.history_links().is_empty() {
        lines.push(Line::from("No conversations yet"));
    }
    for (idx, link) in chat_view.history_links().iter().enumerate() {
        lines.push(Line::from(format_history_link(idx, link)));
    }

    if rate_limiting {
        let remaining = chat_view
            .requests_remaining()
            .map(|remaining| return remaining.to_string())
            .unwrap_or_else(|| return "-".to_string());
        lines.push(Line::from(""));
        lines.push(Line::from(format!("Requests remaining: {remaining}")));
    }

    return lines;
}

fn format_history_link(idx: usize, link: &HistoryLink) -> String {
    let session = link.session.chars().take(8).collect::<String>();
    return format!("({}) {} [{session}]", idx + 1, link.branch);
}

fn notification_style(level: NotificationLevel) -> Style {
    match level {
        NotificationLevel::Critical => {
            return Style::default()
                .fg(Color::Red)
                .add_modifier(Modifier::BOLD);
        }
        NotificationLevel::Success => return Style::default().fg(Color::Green),
        NotificationLevel::Info => return Style::default().fg(Color::Yellow),
    }
}

fn draw<B: Backend>(
    frame: &mut Frame<B>,
    manager: &mut ChatManager,
    textarea: &mut tui_textarea::TextArea<'_>,
    loading: &Loading,
    topics: &[String],
    rate_limiting: bool,
) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(vec![Constraint::Min(1), Constraint::Length(SIDEBAR_WIDTH)])
        .split(frame.size());

    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints(vec![
            Constraint::Length(1),
            Constraint::Min(1),
            Constraint::Length(1),
            Constraint::Max(4),
        ])
        .split(columns[0]);

    let sending = manager.session().state() == SessionState::Sending;
    let controls = manager.controls();
    let chat_view = manager.surface_mut();

    frame.render_widget(
        Paragraph::new(chat_view.greeting()).style(Style::default().add_modifier(Modifier::BOLD)),
        layout[0],
    );

    chat_view.set_rect(layout[1]);
    chat_view
        .bubble_list
        .render(frame, layout[1], chat_view.scroll.position);
    frame.render_stateful_widget(
        Scrollbar::new(ScrollbarOrientation::VerticalRight),
        layout[1].inner(&Margin {
            vertical: 1,
            horizontal: 0,
        }),
        &mut chat_view.scroll.scrollbar_state,
    );

    if chat_view.show_help {
        frame.render_widget(Clear, layout[1]);
        frame.render_widget(
            Paragraph::new(help_text())
                .wrap(Wrap { trim: false })
                .block(
                    Block::default()
                        .borders(Borders::ALL)
                        .title("Help (Esc to close)")
                        .padding(Padding::new(1, 1, 0, 0)),
                ),
            layout[1],
        );
    }

    if let Some(notification) = chat_view.notification() {
        frame.render_widget(
            Paragraph::new(notification.text.as_str()).style(notification_style(notification.level)),
            layout[2],
        );
    }

    if sending {
        loading.render(frame, layout[3]);
    } else {
        textarea.set_block(TextArea::block(TextArea::title(&controls)));
        frame.render_widget(textarea.widget(), layout[3]);
    }

    frame.render_widget(
        Paragraph::new(sidebar_lines(chat_view, topics, rate_limiting)).block(
            Block::default()
                .borders(Borders::LEFT)
                .padding(Padding::new(1, 1, 0, 0)),
        ),
        columns[1],
    );
}

async fn start_loop<B: Backend>(
    terminal: &mut Terminal<B>,
    manager: &mut ChatManager,
    events: &mut EventsService,
    topics: &[String],
    rate_limiting: bool,
) -> Result<()> {
    let mut textarea = TextArea::with_title(TextArea::title(&manager.controls()));
    let loading = Loading::new(manager.surface().chat_head());

    #[cfg(feature = "dev")]
    {
        textarea.insert_str("What is recursion?");
    }

    loop {
        terminal.draw(|frame| {
            draw(frame, manager, &mut textarea, &loading, topics, rate_limiting);
        })?;

        match events.next().await? {
            Event::KeyboardCTRLC() => {
                break;
            }
            Event::KeyboardCharInput(input) => {
                textarea.input(input);
            }
            Event::KeyboardPaste(text) => {
                textarea.insert_str(text);
            }
            Event::UIScrollDown() => {
                manager.surface_mut().scroll.down();
            }
            Event::UIScrollUp() => {
                manager.surface_mut().scroll.up();
            }
            Event::UIScrollPageDown() => {
                manager.surface_mut().scroll.down_page();
            }
            Event::UIScrollPageUp() => {
                manager.surface_mut().scroll.up_page();
            }
            Event::UIScrollTop() => {
                manager.surface_mut().scroll.reset();
            }
            Event::UIScrollBottom() => {
                manager.surface_mut().scroll.last();
            }
            Event::UICloseHelp() => {
                manager.surface_mut().show_help = false;
            }
            Event::UIResize() => (),
            Event::KeyboardEnter() => {
                let input_str = textarea.lines().join("\n");
                if input_str.trim().is_empty() {
                    continue;
                }

                if let Some(command) = SlashCommand::parse(&input_str) {
                    textarea = TextArea::with_title(TextArea::title(&manager.controls()));
                    if handle_slash_command(manager, &command, topics)? {
                        break;
                    }
                    continue;
                }

                if manager.controls().input {
                    textarea = TextArea::with_title(TextArea::title(&manager.controls()));
                    manager.send(&input_str)?;
                }
            }
            event => {
                manager.handle_event(event);
            }
        }
    }

    return Ok(());
}

pub fn destruct_terminal_for_panic() {
    let _ = disable_raw_mode();
    let _ = crossterm::execute!(io::stdout(), LeaveAlternateScreen, DisableMouseCapture);
    let _ = crossterm::execute!(io::stdout(), cursor::Show);
}

pub async fn start(
    tx: mpsc::UnboundedSender<Action>,
    rx: mpsc::UnboundedReceiver<Event>,
) -> Result<()> {
    let settings = ClientSettings {
        rate_limiting: Config::get_bool(ConfigKey::RateLimiting),
        notification_timeout: Config::get_millis(ConfigKey::NotificationTimeout)?,
    };
    let rate_limiting = settings.rate_limiting;
    let topics = Config::branches();

    let chat_view = ChatView::new(&Config::get(ConfigKey::ChatHead));
    let mut manager = SessionManager::new(chat_view, tx, settings);

    let session_id = Config::get(ConfigKey::SessionID);
    let branch = Config::get(ConfigKey::Branch);
    if !session_id.is_empty() && !branch.is_empty() {
        manager.load_history(&HistoryLink {
            session: session_id,
            branch,
        })?;
    }

    let stdout = io::stdout();
    let mut stdout = stdout.lock();

    enable_raw_mode()?;
    crossterm::execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let term_backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(term_backend)?;
    let mut events = EventsService::new(rx);

    let res = start_loop(
        &mut terminal,
        &mut manager,
        &mut events,
        &topics,
        rate_limiting,
    )
    .await;

    disable_raw_mode()?;
    crossterm::execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    return res;
}
