#[cfg(test)]
#[path = "classifier_test.rs"]
mod tests;

use crate::domain::models::RequestError;

#[derive(Copy, Clone, Debug, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum Severity {
    Recoverable,
    Critical,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, strum::Display)]
pub enum ErrorKind {
    Network,
    Redirection,
    ClientError,
    RateLimited,
    ServerError,
    Invalid,
    NotOk,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Classification {
    pub severity: Severity,
    pub kind: ErrorKind,
    pub message: String,
}

impl Classification {
    fn new(severity: Severity, kind: ErrorKind, message: String) -> Classification {
        return Classification {
            severity,
            kind,
            message,
        };
    }

    pub fn is_critical(&self) -> bool {
        return self.severity == Severity::Critical;
    }
}

/// Maps a status code that was not a success to a severity and a user facing
/// message. Any 5xx leaves the client unusable for the rest of the session.
pub fn classify_status(status: u16) -> Classification {
    if status >= 500 {
        let message = match status {
            503 => "Service Unavailable (503). The server-wide token quota has been exceeded."
                .to_string(),
            502 => "Bad Gateway (502). The web server is running, but Maeser cannot be accessed."
                .to_string(),
            _ => format!("Internal Server Error ({status})"),
        };

        return Classification::new(Severity::Critical, ErrorKind::ServerError, message);
    }

    if status == 429 {
        return Classification::new(
            Severity::Recoverable,
            ErrorKind::RateLimited,
            "Too Many Requests (429). You have exceeded your rate limit.".to_string(),
        );
    }

    if status >= 400 {
        return Classification::new(
            Severity::Recoverable,
            ErrorKind::ClientError,
            format!("Client Error ({status})"),
        );
    }

    if status >= 300 {
        return Classification::new(
            Severity::Recoverable,
            ErrorKind::Redirection,
            format!("Redirection Error ({status})"),
        );
    }

    return Classification::new(
        Severity::Recoverable,
        ErrorKind::NotOk,
        format!("Network response was not ok ({status})"),
    );
}

pub fn classify(err: &RequestError) -> Classification {
    match err {
        RequestError::Network(detail) | RequestError::Malformed(detail) => {
            return Classification::new(Severity::Recoverable, ErrorKind::Network, detail.to_string());
        }
        RequestError::Status(status) => return classify_status(*status),
        RequestError::Invalid(_) => {
            return Classification::new(
                Severity::Critical,
                ErrorKind::Invalid,
                "Invalid session!".to_string(),
            );
        }
    }
}
