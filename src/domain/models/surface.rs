use super::Feedback;
use super::HistoryLink;
use super::Message;
use super::Notification;
use super::SessionState;

/// Which affordances the user may currently interact with.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Controls {
    pub input: bool,
    pub new_chat: bool,
    pub topics: bool,
    pub history: bool,
}

impl Controls {
    pub fn for_state(state: SessionState) -> Controls {
        match state {
            SessionState::Idle => {
                return Controls {
                    input: false,
                    new_chat: false,
                    topics: true,
                    history: true,
                };
            }
            SessionState::Active => {
                return Controls {
                    input: true,
                    new_chat: true,
                    topics: true,
                    history: true,
                };
            }
            SessionState::Requesting | SessionState::Sending => {
                return Controls {
                    input: false,
                    new_chat: false,
                    topics: false,
                    history: true,
                };
            }
            SessionState::Critical => return Controls::default(),
        }
    }

    /// Locks everything but the sidebar while a conversation is being fetched.
    pub fn while_loading(self) -> Controls {
        return Controls {
            input: false,
            new_chat: false,
            topics: false,
            history: self.history,
        };
    }
}

/// Rendering side of the chat. Positions are transcript offsets, in the order
/// messages were rendered since the last clear.
pub trait Surface {
    fn render_message(&mut self, message: &Message);

    fn mark_failed(&mut self, position: usize);

    fn select_feedback(&mut self, position: usize, feedback: Feedback);

    fn clear_transcript(&mut self);

    fn render_notification(&mut self, notification: Option<&Notification>);

    fn set_controls(&mut self, controls: Controls);

    fn add_history_link(&mut self, link: &HistoryLink);

    fn set_topic(&mut self, topic: Option<&str>);

    fn set_requests_remaining(&mut self, remaining: u32);
}
