mod author;
mod chat_policy;
mod event;
mod executor;
mod failure;
mod message;
mod provider;
mod scene_context;
mod session;
mod slash_commands;

pub use author::*;
pub use chat_policy::*;
pub use event::*;
pub use executor::*;
pub use failure::*;
pub use message::*;
pub use provider::*;
pub use scene_context::*;
pub use session::*;
pub use slash_commands::*;
