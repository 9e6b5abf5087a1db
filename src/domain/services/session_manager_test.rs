use anyhow::bail;
use anyhow::Result;
use test_utils::conversation_history_fixture;
use tokio::sync::mpsc;

use super::ClientSettings;
use super::SessionManager;
use crate::domain::models::Action;
use crate::domain::models::Controls;
use crate::domain::models::ConversationRecord;
use crate::domain::models::Event;
use crate::domain::models::Feedback;
use crate::domain::models::HistoryLink;
use crate::domain::models::Message;
use crate::domain::models::MessageReply;
use crate::domain::models::Notification;
use crate::domain::models::NotificationLevel;
use crate::domain::models::RequestError;
use crate::domain::models::Role;
use crate::domain::models::SessionState;
use crate::domain::models::Surface;

#[derive(Default)]
struct RecordingSurface {
    transcript: Vec<Message>,
    notification: Option<Notification>,
    controls: Controls,
    links: Vec<HistoryLink>,
    topic: Option<String>,
    requests_remaining: Option<u32>,
}

impl Surface for RecordingSurface {
    fn render_message(&mut self, message: &Message) {
        self.transcript.push(message.clone());
    }

    fn mark_failed(&mut self, position: usize) {
        self.transcript[position].failed = true;
    }

    fn select_feedback(&mut self, position: usize, feedback: Feedback) {
        self.transcript[position].feedback = Some(feedback);
    }

    fn clear_transcript(&mut self) {
        self.transcript.clear();
    }

    fn render_notification(&mut self, notification: Option<&Notification>) {
        self.notification = notification.cloned();
    }

    fn set_controls(&mut self, controls: Controls) {
        self.controls = controls;
    }

    fn add_history_link(&mut self, link: &HistoryLink) {
        self.links.insert(0, link.clone());
    }

    fn set_topic(&mut self, topic: Option<&str>) {
        self.topic = topic.map(|topic| return topic.to_string());
    }

    fn set_requests_remaining(&mut self, remaining: u32) {
        self.requests_remaining = Some(remaining);
    }
}

type Manager = SessionManager<RecordingSurface>;

fn manager_with(settings: ClientSettings) -> (Manager, mpsc::UnboundedReceiver<Action>) {
    let (tx, rx) = mpsc::unbounded_channel::<Action>();
    let manager = SessionManager::new(RecordingSurface::default(), tx, settings);
    return (manager, rx);
}

fn manager() -> (Manager, mpsc::UnboundedReceiver<Action>) {
    return manager_with(ClientSettings::default());
}

fn reply(response: &str, index: u32) -> MessageReply {
    return MessageReply {
        response: response.to_string(),
        index,
        requests_remaining: Some(3),
    };
}

/// Starts a session and answers it with `session_id`.
fn activate(
    manager: &mut Manager,
    rx: &mut mpsc::UnboundedReceiver<Action>,
    topic: &str,
    session_id: &str,
) -> Result<()> {
    manager.start_session(topic)?;
    match rx.try_recv()? {
        Action::RequestSession(epoch, requested) => {
            assert_eq!(requested, topic);
            manager.handle_event(Event::SessionResponse(
                epoch,
                requested,
                Ok(session_id.to_string()),
            ));
        }
        _ => bail!("Wrong enum"),
    }

    return Ok(());
}

/// Sends `text` and returns the epoch of the issued request.
fn send(
    manager: &mut Manager,
    rx: &mut mpsc::UnboundedReceiver<Action>,
    text: &str,
) -> Result<u64> {
    manager.send(text)?;
    match rx.try_recv()? {
        Action::SendMessage(epoch, request) => {
            assert_eq!(request.message, text.trim());
            return Ok(epoch);
        }
        _ => bail!("Wrong enum"),
    }
}

mod start_session {
    use super::*;

    #[test]
    fn it_activates_on_success() -> Result<()> {
        let (mut manager, mut rx) = manager();
        activate(&mut manager, &mut rx, "homework-help", "abc123")?;

        assert_eq!(manager.session().state(), SessionState::Active);
        assert_eq!(manager.session().id(), Some("abc123"));
        assert_eq!(manager.session().branch(), Some("homework-help"));
        assert_eq!(
            manager.history_links()[0],
            HistoryLink {
                session: "abc123".to_string(),
                branch: "homework-help".to_string(),
            }
        );

        let surface = manager.surface();
        assert_eq!(surface.links.len(), 1);
        assert_eq!(surface.topic.as_deref(), Some("homework-help"));
        assert!(surface.controls.input);
        let notification = surface.notification.as_ref().unwrap();
        assert_eq!(notification.level, NotificationLevel::Success);
        insta::assert_snapshot!(notification.text, @"Session started successfully.");

        return Ok(());
    }

    #[test]
    fn it_locks_controls_while_requesting() -> Result<()> {
        let (mut manager, mut rx) = manager();
        manager.start_session("labs")?;

        assert!(matches!(rx.try_recv()?, Action::RequestSession(_, _)));
        assert_eq!(manager.session().state(), SessionState::Requesting);
        assert_eq!(manager.session().id(), None);

        let controls = manager.surface().controls;
        assert!(!controls.topics);
        assert!(!controls.new_chat);
        assert!(!controls.input);

        manager.start_session("homework")?;
        assert!(rx.try_recv().is_err());

        return Ok(());
    }

    #[test]
    fn it_goes_critical_on_invalid() -> Result<()> {
        let (mut manager, mut rx) = manager();
        manager.start_session("labs")?;
        let epoch = match rx.try_recv()? {
            Action::RequestSession(epoch, _) => epoch,
            _ => bail!("Wrong enum"),
        };

        manager.handle_event(Event::SessionResponse(
            epoch,
            "labs".to_string(),
            Err(RequestError::Invalid(
                "Requested session type is not valid".to_string(),
            )),
        ));

        assert_eq!(manager.session().state(), SessionState::Critical);
        assert_eq!(manager.surface().controls, Controls::default());
        let notification = manager.notification().unwrap();
        assert_eq!(notification.level, NotificationLevel::Critical);
        insta::assert_snapshot!(notification.text, @"Invalid session! Please restart the client.");

        return Ok(());
    }

    #[test]
    fn it_returns_to_idle_on_network_failure() -> Result<()> {
        let (mut manager, mut rx) = manager();
        manager.start_session("labs")?;
        let epoch = match rx.try_recv()? {
            Action::RequestSession(epoch, _) => epoch,
            _ => bail!("Wrong enum"),
        };

        manager.handle_event(Event::SessionResponse(
            epoch,
            "labs".to_string(),
            Err(RequestError::Network("connection refused".to_string())),
        ));

        assert_eq!(manager.session().state(), SessionState::Idle);
        assert!(manager.surface().controls.topics);
        assert!(manager.history_links().is_empty());
        let notification = manager.notification().unwrap();
        assert_eq!(notification.level, NotificationLevel::Info);
        insta::assert_snapshot!(notification.text, @"Error fetching session: connection refused");

        // Re-selecting a topic retries.
        activate(&mut manager, &mut rx, "labs", "def456")?;
        assert_eq!(manager.session().state(), SessionState::Active);

        return Ok(());
    }

    #[test]
    fn it_switches_topics_from_active() -> Result<()> {
        let (mut manager, mut rx) = manager();
        activate(&mut manager, &mut rx, "labs", "abc123")?;
        let epoch = send(&mut manager, &mut rx, "hello")?;
        manager.handle_event(Event::MessageResponse(epoch, Ok(reply("<p>hi</p>", 1))));
        assert_eq!(manager.messages().len(), 2);

        activate(&mut manager, &mut rx, "homework", "def456")?;

        assert!(manager.messages().is_empty());
        assert!(manager.surface().transcript.is_empty());
        assert_eq!(manager.session().id(), Some("def456"));
        assert_eq!(manager.history_links().len(), 2);
        assert_eq!(manager.history_links()[0].session, "def456");

        return Ok(());
    }
}

mod send {
    use super::*;

    #[test]
    fn it_completes_a_turn() -> Result<()> {
        let (mut manager, mut rx) = manager();
        activate(&mut manager, &mut rx, "homework-help", "abc123")?;

        let epoch = send(&mut manager, &mut rx, "What is recursion?")?;
        assert_eq!(manager.session().state(), SessionState::Sending);
        assert_eq!(manager.surface().transcript.len(), 1);
        assert!(!manager.surface().controls.input);
        assert!(!manager.surface().controls.new_chat);

        manager.handle_event(Event::MessageResponse(
            epoch,
            Ok(reply("<p>...</p>", 0)),
        ));

        assert_eq!(manager.session().state(), SessionState::Active);
        let transcript = &manager.surface().transcript;
        assert_eq!(transcript.len(), 2);
        assert_eq!(transcript[0].role, Role::User);
        assert_eq!(transcript[1].role, Role::Assistant);
        assert_eq!(transcript[1].index, Some(0));
        assert!(transcript[1].accepts_feedback());
        assert_eq!(manager.messages(), transcript.as_slice());
        // Rate limiting is off.
        assert_eq!(manager.surface().requests_remaining, None);

        return Ok(());
    }

    #[test]
    fn it_updates_requests_remaining_when_rate_limited() -> Result<()> {
        let (mut manager, mut rx) = manager_with(ClientSettings {
            rate_limiting: true,
            ..ClientSettings::default()
        });
        activate(&mut manager, &mut rx, "labs", "abc123")?;
        let epoch = send(&mut manager, &mut rx, "hello")?;
        manager.handle_event(Event::MessageResponse(epoch, Ok(reply("<p>hi</p>", 1))));

        assert_eq!(manager.surface().requests_remaining, Some(3));
        return Ok(());
    }

    #[test]
    fn it_keeps_one_request_in_flight() -> Result<()> {
        let (mut manager, mut rx) = manager();
        activate(&mut manager, &mut rx, "labs", "abc123")?;
        send(&mut manager, &mut rx, "first")?;

        for _ in 0..5 {
            manager.send("again")?;
            assert!(rx.try_recv().is_err());
        }
        assert_eq!(manager.messages().len(), 1);

        return Ok(());
    }

    #[test]
    fn it_ignores_blank_and_idle_sends() -> Result<()> {
        let (mut manager, mut rx) = manager();
        manager.send("hello")?;
        assert!(rx.try_recv().is_err());

        activate(&mut manager, &mut rx, "labs", "abc123")?;
        manager.send("   ")?;
        assert!(rx.try_recv().is_err());
        assert_eq!(manager.session().state(), SessionState::Active);

        return Ok(());
    }

    #[test]
    fn it_goes_critical_on_503() -> Result<()> {
        let (mut manager, mut rx) = manager();
        activate(&mut manager, &mut rx, "labs", "abc123")?;
        let epoch = send(&mut manager, &mut rx, "hello")?;

        manager.handle_event(Event::MessageResponse(epoch, Err(RequestError::Status(503))));

        assert_eq!(manager.session().state(), SessionState::Critical);
        assert_eq!(
            manager.notification().unwrap().level,
            NotificationLevel::Critical
        );

        manager.send("again")?;
        manager.start_session("homework")?;
        manager.load_history(&HistoryLink {
            session: "abc123".to_string(),
            branch: "labs".to_string(),
        })?;
        manager.submit_feedback(0, true)?;
        manager.reset_session();
        assert!(rx.try_recv().is_err());
        assert_eq!(manager.session().state(), SessionState::Critical);
        assert_eq!(
            manager.notification().unwrap().level,
            NotificationLevel::Critical
        );

        return Ok(());
    }

    #[test]
    fn it_marks_the_message_failed_on_429() -> Result<()> {
        let (mut manager, mut rx) = manager();
        activate(&mut manager, &mut rx, "labs", "abc123")?;
        let epoch = send(&mut manager, &mut rx, "hello")?;

        manager.handle_event(Event::MessageResponse(epoch, Err(RequestError::Status(429))));

        assert_eq!(manager.session().state(), SessionState::Active);
        assert!(manager.surface().controls.input);
        assert!(manager.messages()[0].failed);
        assert!(manager.surface().transcript[0].failed);
        assert_eq!(manager.messages().len(), 1);

        let notification = manager.notification().unwrap();
        assert_eq!(notification.level, NotificationLevel::Info);
        insta::assert_snapshot!(notification.text, @"Error sending message: Too Many Requests (429). You have exceeded your rate limit.");

        // Retrying is up to the user.
        assert!(rx.try_recv().is_err());
        send(&mut manager, &mut rx, "hello")?;

        return Ok(());
    }

    #[test]
    fn it_recovers_from_network_failures() -> Result<()> {
        let (mut manager, mut rx) = manager();
        activate(&mut manager, &mut rx, "labs", "abc123")?;
        let epoch = send(&mut manager, &mut rx, "hello")?;

        manager.handle_event(Event::MessageResponse(
            epoch,
            Err(RequestError::Network("connection reset".to_string())),
        ));

        assert_eq!(manager.session().state(), SessionState::Active);
        assert!(manager.messages()[0].failed);
        return Ok(());
    }
}

mod load_history {
    use super::*;

    fn link() -> HistoryLink {
        return HistoryLink {
            session: "old789".to_string(),
            branch: "homework".to_string(),
        };
    }

    fn fetch(manager: &mut Manager, rx: &mut mpsc::UnboundedReceiver<Action>) -> Result<u64> {
        manager.load_history(&link())?;
        match rx.try_recv()? {
            Action::FetchHistory(epoch, request) => {
                assert_eq!(request.session, "old789");
                assert_eq!(request.branch, "homework");
                return Ok(epoch);
            }
            _ => bail!("Wrong enum"),
        }
    }

    #[test]
    fn it_renders_every_message_in_order() -> Result<()> {
        let (mut manager, mut rx) = manager();
        let epoch = fetch(&mut manager, &mut rx)?;
        assert!(!manager.surface().controls.input);

        let record: ConversationRecord = serde_json::from_str(conversation_history_fixture())?;
        manager.handle_event(Event::HistoryResponse(
            epoch,
            crate::domain::models::HistoryRequest {
                session: "old789".to_string(),
                branch: "homework".to_string(),
            },
            Ok(record),
        ));

        let transcript = &manager.surface().transcript;
        assert_eq!(transcript.len(), 3);
        assert_eq!(transcript[0].content, "What is recursion?");
        assert_eq!(transcript[1].role, Role::Assistant);
        assert!(transcript[1].accepts_feedback());
        assert!(!transcript[0].accepts_feedback());
        assert!(!transcript[2].accepts_feedback());
        assert_eq!(transcript[2].content, "Can you show an example?");

        assert_eq!(manager.session().state(), SessionState::Active);
        assert_eq!(manager.session().id(), Some("old789"));
        assert_eq!(manager.session().branch(), Some("homework"));
        assert!(manager.surface().controls.input);

        return Ok(());
    }

    #[test]
    fn it_leaves_the_transcript_empty_on_failure() -> Result<()> {
        let (mut manager, mut rx) = manager();
        activate(&mut manager, &mut rx, "labs", "abc123")?;
        let epoch = send(&mut manager, &mut rx, "hello")?;
        manager.handle_event(Event::MessageResponse(epoch, Ok(reply("<p>hi</p>", 1))));

        let epoch = fetch(&mut manager, &mut rx)?;
        manager.handle_event(Event::HistoryResponse(
            epoch,
            crate::domain::models::HistoryRequest {
                session: "old789".to_string(),
                branch: "homework".to_string(),
            },
            Err(RequestError::Network("connection refused".to_string())),
        ));

        assert!(manager.surface().transcript.is_empty());
        assert!(manager.messages().is_empty());
        assert_eq!(manager.session().state(), SessionState::Idle);
        let notification = manager.notification().unwrap();
        assert_eq!(notification.level, NotificationLevel::Info);

        return Ok(());
    }

    #[test]
    fn it_drops_a_reply_for_the_replaced_conversation() -> Result<()> {
        let (mut manager, mut rx) = manager();
        activate(&mut manager, &mut rx, "labs", "abc123")?;
        let send_epoch = send(&mut manager, &mut rx, "hello")?;

        let history_epoch = fetch(&mut manager, &mut rx)?;
        let record: ConversationRecord = serde_json::from_str(conversation_history_fixture())?;
        manager.apply_history(ConversationRecord {
            session: "old789".to_string(),
            ..record
        });
        assert_eq!(manager.messages().len(), 3);

        manager.handle_event(Event::MessageResponse(
            send_epoch,
            Ok(reply("<p>late</p>", 1)),
        ));
        assert_ne!(send_epoch, history_epoch);
        assert_eq!(manager.messages().len(), 3);
        assert_eq!(manager.session().state(), SessionState::Active);

        return Ok(());
    }
}

mod reset_session {
    use super::*;

    #[test]
    fn it_returns_to_idle() -> Result<()> {
        let (mut manager, mut rx) = manager();
        activate(&mut manager, &mut rx, "labs", "abc123")?;
        let epoch = send(&mut manager, &mut rx, "hello")?;
        manager.handle_event(Event::MessageResponse(epoch, Ok(reply("<p>hi</p>", 1))));

        manager.reset_session();

        assert_eq!(manager.session().state(), SessionState::Idle);
        assert_eq!(manager.session().id(), None);
        assert!(manager.messages().is_empty());
        assert!(manager.surface().transcript.is_empty());
        assert!(manager.notification().is_none());
        assert!(manager.surface().notification.is_none());
        assert!(manager.surface().controls.topics);
        assert!(!manager.surface().controls.input);
        assert_eq!(manager.surface().topic, None);
        // The sidebar keeps the conversation around for rehydration.
        assert_eq!(manager.history_links().len(), 1);
        assert!(rx.try_recv().is_err());

        return Ok(());
    }

    #[test]
    fn it_is_ignored_while_sending() -> Result<()> {
        let (mut manager, mut rx) = manager();
        activate(&mut manager, &mut rx, "labs", "abc123")?;
        let epoch = send(&mut manager, &mut rx, "hello")?;
        assert!(!manager.controls().new_chat);

        manager.reset_session();
        assert_eq!(manager.session().state(), SessionState::Sending);
        assert_eq!(manager.session().id(), Some("abc123"));
        assert_eq!(manager.messages().len(), 1);

        manager.start_session("homework")?;
        assert!(rx.try_recv().is_err());

        manager.handle_event(Event::MessageResponse(epoch, Ok(reply("<p>hi</p>", 1))));
        assert_eq!(manager.session().state(), SessionState::Active);
        assert_eq!(manager.messages().len(), 2);

        return Ok(());
    }

    #[test]
    fn it_is_ignored_while_requesting() -> Result<()> {
        let (mut manager, mut rx) = manager();
        manager.start_session("labs")?;
        let epoch = match rx.try_recv()? {
            Action::RequestSession(epoch, _) => epoch,
            _ => bail!("Wrong enum"),
        };

        manager.reset_session();
        assert_eq!(manager.session().state(), SessionState::Requesting);

        manager.handle_event(Event::SessionResponse(
            epoch,
            "labs".to_string(),
            Ok("abc123".to_string()),
        ));
        assert_eq!(manager.session().state(), SessionState::Active);
        assert_eq!(manager.session().id(), Some("abc123"));
        assert_eq!(manager.history_links().len(), 1);

        return Ok(());
    }
}

mod submit_feedback {
    use super::*;

    fn with_reply() -> Result<(Manager, mpsc::UnboundedReceiver<Action>)> {
        let (mut manager, mut rx) = manager();
        activate(&mut manager, &mut rx, "labs", "abc123")?;
        let epoch = send(&mut manager, &mut rx, "hello")?;
        manager.handle_event(Event::MessageResponse(epoch, Ok(reply("<p>hi</p>", 1))));
        return Ok((manager, rx));
    }

    fn vote(
        manager: &mut Manager,
        rx: &mut mpsc::UnboundedReceiver<Action>,
        like: bool,
        result: Result<(), RequestError>,
    ) -> Result<()> {
        manager.submit_feedback(1, like)?;
        match rx.try_recv()? {
            Action::SendFeedback(epoch, position, request) => {
                assert_eq!(request.index, 1);
                assert_eq!(request.like, like);
                assert_eq!(request.session_id, "abc123");
                assert_eq!(request.branch, "labs");
                manager.handle_event(Event::FeedbackResponse(epoch, position, request, result));
            }
            _ => bail!("Wrong enum"),
        }

        return Ok(());
    }

    #[test]
    fn it_selects_on_success() -> Result<()> {
        let (mut manager, mut rx) = with_reply()?;
        vote(&mut manager, &mut rx, true, Ok(()))?;

        assert_eq!(manager.messages()[1].feedback, Some(Feedback::Like));
        assert_eq!(
            manager.surface().transcript[1].feedback,
            Some(Feedback::Like)
        );
        let notification = manager.notification().unwrap();
        assert_eq!(notification.level, NotificationLevel::Success);
        assert_eq!(notification.text, "Feedback sent!");

        return Ok(());
    }

    #[test]
    fn it_is_idempotent() -> Result<()> {
        let (mut manager, mut rx) = with_reply()?;
        vote(&mut manager, &mut rx, true, Ok(()))?;

        manager.submit_feedback(1, true)?;
        assert!(rx.try_recv().is_err());
        assert_eq!(manager.messages()[1].feedback, Some(Feedback::Like));

        return Ok(());
    }

    #[test]
    fn it_replaces_the_selection() -> Result<()> {
        let (mut manager, mut rx) = with_reply()?;
        vote(&mut manager, &mut rx, true, Ok(()))?;
        vote(&mut manager, &mut rx, false, Ok(()))?;

        assert_eq!(manager.messages()[1].feedback, Some(Feedback::Dislike));
        assert_eq!(
            manager.surface().transcript[1].feedback,
            Some(Feedback::Dislike)
        );

        return Ok(());
    }

    #[test]
    fn it_keeps_the_selection_on_failure() -> Result<()> {
        let (mut manager, mut rx) = with_reply()?;
        vote(&mut manager, &mut rx, true, Ok(()))?;
        vote(
            &mut manager,
            &mut rx,
            false,
            Err(RequestError::Status(500)),
        )?;

        assert_eq!(manager.messages()[1].feedback, Some(Feedback::Like));
        // Feedback failures never escalate.
        assert_eq!(manager.session().state(), SessionState::Active);
        let notification = manager.notification().unwrap();
        assert_eq!(notification.level, NotificationLevel::Info);
        insta::assert_snapshot!(notification.text, @"Error sending feedback. Try again later.");

        return Ok(());
    }

    #[test]
    fn it_ignores_user_messages() -> Result<()> {
        let (mut manager, mut rx) = with_reply()?;
        manager.submit_feedback(0, true)?;
        assert!(rx.try_recv().is_err());

        return Ok(());
    }
}

mod events {
    use super::*;

    #[test]
    fn it_updates_requests_remaining() {
        let (mut manager, _rx) = manager();
        manager.handle_event(Event::RequestsRemaining(7));
        assert_eq!(manager.surface().requests_remaining, Some(7));
    }

    #[test]
    fn it_hides_notifications_on_tick() -> Result<()> {
        let (mut manager, mut rx) = manager_with(ClientSettings {
            notification_timeout: std::time::Duration::from_millis(0),
            ..ClientSettings::default()
        });
        activate(&mut manager, &mut rx, "labs", "abc123")?;
        assert!(manager.surface().notification.is_some());

        manager.handle_event(Event::UITick());
        assert!(manager.surface().notification.is_none());
        assert!(manager.notification().is_none());

        return Ok(());
    }
}
