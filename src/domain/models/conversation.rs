#[cfg(test)]
#[path = "conversation_test.rs"]
mod tests;

use serde_derive::Deserialize;
use serde_derive::Serialize;

use super::Message;
use super::Role;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryMessage {
    pub role: Role,
    pub content: String,
}

/// A previously persisted conversation, used to rehydrate the transcript.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationRecord {
    pub branch: String,
    /// Not part of the server payload; filled in by whoever requested it.
    #[serde(default)]
    pub session: String,
    #[serde(default)]
    pub messages: Vec<HistoryMessage>,
}

impl ConversationRecord {
    /// Builds the transcript in record order. Assistant turns are keyed by
    /// their position in the record, matching the indexes the server hands
    /// out on live replies.
    pub fn to_messages(&self) -> Vec<Message> {
        return self
            .messages
            .iter()
            .enumerate()
            .map(|(idx, message)| {
                if message.role == Role::User {
                    return Message::user(&message.content);
                }

                return Message::assistant(&message.content, u32::try_from(idx).ok());
            })
            .collect();
    }
}

/// Sidebar entry pointing at a conversation that can be rehydrated.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryLink {
    pub session: String,
    pub branch: String,
}
