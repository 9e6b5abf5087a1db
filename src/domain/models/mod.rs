mod action;
mod backend;
mod conversation;
mod error;
mod event;
mod loading;
mod message;
mod notification;
mod session;
mod slash_commands;
mod surface;
mod textarea;

pub use action::*;
pub use backend::*;
pub use conversation::*;
pub use error::*;
pub use event::*;
pub use loading::*;
pub use message::*;
pub use notification::*;
pub use session::*;
pub use slash_commands::*;
pub use surface::*;
pub use textarea::*;
