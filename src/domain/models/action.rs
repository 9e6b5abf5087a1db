use super::FeedbackRequest;
use super::HistoryRequest;
use super::MessageRequest;

/// Requests for the worker. The leading number is the transcript epoch the
/// request was issued in and is echoed back on the matching `Event`.
pub enum Action {
    RequestSession(u64, String),
    SendMessage(u64, MessageRequest),
    SendFeedback(u64, usize, FeedbackRequest),
    FetchHistory(u64, HistoryRequest),
}
