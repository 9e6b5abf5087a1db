#[cfg(test)]
#[path = "message_test.rs"]
mod tests;

use serde_derive::Deserialize;
use serde_derive::Serialize;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    /// The server persists its own turns with the `system` role.
    #[serde(alias = "system")]
    Assistant,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Feedback {
    Like,
    Dislike,
}

impl Feedback {
    pub fn from_like(like: bool) -> Feedback {
        if like {
            return Feedback::Like;
        }

        return Feedback::Dislike;
    }

    pub fn is_like(&self) -> bool {
        return *self == Feedback::Like;
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Assigned by the server for assistant turns and used as the feedback
    /// key. User turns never carry one.
    pub index: Option<u32>,
    pub role: Role,
    pub content: String,
    pub feedback: Option<Feedback>,
    pub failed: bool,
}

impl Message {
    pub fn user(content: &str) -> Message {
        return Message {
            index: None,
            role: Role::User,
            content: content.replace('\t', "  "),
            feedback: None,
            failed: false,
        };
    }

    pub fn assistant(content: &str, index: Option<u32>) -> Message {
        return Message {
            index,
            role: Role::Assistant,
            content: content.to_string(),
            feedback: None,
            failed: false,
        };
    }

    pub fn accepts_feedback(&self) -> bool {
        return self.role == Role::Assistant && self.index.is_some();
    }

    /// Content as shown on a terminal. Assistant turns arrive as HTML.
    pub fn display_text(&self, line_max_width: usize) -> String {
        if self.role == Role::User {
            return self.content.to_string();
        }

        let width = line_max_width.max(10);
        return html2text::from_read(self.content.as_bytes(), width)
            .unwrap_or_else(|_| return self.content.to_string())
            .trim_end()
            .to_string();
    }
}
