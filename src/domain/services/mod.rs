pub mod actions;
mod bubble;
mod bubble_list;
mod chat_view;
mod classifier;
pub mod events;
mod feedback;
mod notifications;
mod pipeline;
mod rate_limit;
mod scroll;
mod session_manager;

pub use bubble::*;
pub use bubble_list::*;
pub use chat_view::*;
pub use classifier::*;
pub use feedback::*;
pub use notifications::*;
pub use pipeline::*;
pub use rate_limit::*;
pub use scroll::*;
pub use session_manager::*;
