use tui_textarea::Input;

use super::ConversationRecord;
use super::FeedbackRequest;
use super::HistoryRequest;
use super::MessageReply;
use super::RequestError;

pub enum Event {
    SessionResponse(u64, String, Result<String, RequestError>),
    MessageResponse(u64, Result<MessageReply, RequestError>),
    FeedbackResponse(u64, usize, FeedbackRequest, Result<(), RequestError>),
    HistoryResponse(u64, HistoryRequest, Result<ConversationRecord, RequestError>),
    RequestsRemaining(u32),
    KeyboardCharInput(Input),
    KeyboardCTRLC(),
    KeyboardEnter(),
    KeyboardPaste(String),
    UICloseHelp(),
    UIResize(),
    UIScrollDown(),
    UIScrollUp(),
    UIScrollPageDown(),
    UIScrollPageUp(),
    UIScrollTop(),
    UIScrollBottom(),
    UITick(),
}
