#[cfg(test)]
#[path = "session_test.rs"]
mod tests;

use serde_derive::Deserialize;
use serde_derive::Serialize;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
pub enum SessionState {
    Idle,
    Requesting,
    Active,
    Sending,
    /// Absorbing. Only a restart of the client leaves it.
    Critical,
}

/// Inputs to the session state machine.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Transition {
    /// A session creation request was issued.
    Request,
    /// A session id is known, either freshly created or rehydrated.
    Activate,
    /// A session creation request failed without being fatal.
    Abandon,
    /// A user message went out.
    Submit,
    /// The outstanding message request settled without being fatal.
    Settle,
    Reset,
    Fatal,
}

impl SessionState {
    pub fn next(self, transition: Transition) -> SessionState {
        match (self, transition) {
            (SessionState::Critical, _) => return SessionState::Critical,
            (_, Transition::Fatal) => return SessionState::Critical,
            (_, Transition::Reset) => return SessionState::Idle,
            (_, Transition::Activate) => return SessionState::Active,
            (SessionState::Idle | SessionState::Active, Transition::Request) => {
                return SessionState::Requesting;
            }
            (SessionState::Requesting, Transition::Abandon) => return SessionState::Idle,
            (SessionState::Active, Transition::Submit) => return SessionState::Sending,
            (SessionState::Sending, Transition::Settle) => return SessionState::Active,
            (state, _) => return state,
        }
    }

    pub fn has_session(&self) -> bool {
        return matches!(self, SessionState::Active | SessionState::Sending);
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Session {
    id: Option<String>,
    branch: Option<String>,
    state: SessionState,
}

impl Default for Session {
    fn default() -> Session {
        return Session {
            id: None,
            branch: None,
            state: SessionState::Idle,
        };
    }
}

impl Session {
    pub fn id(&self) -> Option<&str> {
        return self.id.as_deref();
    }

    pub fn branch(&self) -> Option<&str> {
        return self.branch.as_deref();
    }

    pub fn state(&self) -> SessionState {
        return self.state;
    }

    pub fn is_critical(&self) -> bool {
        return self.state == SessionState::Critical;
    }

    /// Applies a transition, dropping the id whenever the resulting state no
    /// longer holds a session.
    pub fn apply(&mut self, transition: Transition) -> SessionState {
        self.state = self.state.next(transition);
        if !self.state.has_session() {
            self.id = None;
        }
        if self.state == SessionState::Idle {
            self.branch = None;
        }

        return self.state;
    }

    pub fn request(&mut self, branch: &str) -> SessionState {
        let state = self.apply(Transition::Request);
        if state == SessionState::Requesting {
            self.id = None;
            self.branch = Some(branch.to_string());
        }

        return state;
    }

    pub fn activate(&mut self, id: &str, branch: &str) -> SessionState {
        if self.is_critical() {
            return self.state;
        }

        self.id = Some(id.to_string());
        self.branch = Some(branch.to_string());
        return self.apply(Transition::Activate);
    }
}
