use serde_derive::Deserialize;
use serde_derive::Serialize;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum NotificationLevel {
    Info,
    Success,
    Critical,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub text: String,
    pub level: NotificationLevel,
}

impl Notification {
    pub fn info(text: &str) -> Notification {
        return Notification {
            text: text.to_string(),
            level: NotificationLevel::Info,
        };
    }

    pub fn success(text: &str) -> Notification {
        return Notification {
            text: text.to_string(),
            level: NotificationLevel::Success,
        };
    }

    pub fn critical(text: &str) -> Notification {
        return Notification {
            text: format!("{text} Please restart the client."),
            level: NotificationLevel::Critical,
        };
    }

    pub fn is_critical(&self) -> bool {
        return self.level == NotificationLevel::Critical;
    }
}
