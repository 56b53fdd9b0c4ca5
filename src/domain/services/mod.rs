mod app_state;
mod code_extractor;
mod conversation_store;
mod dispatcher;
pub mod events;
mod store_file;
#[cfg(test)]
pub mod test_providers;
mod transcript;

pub use app_state::*;
pub use code_extractor::*;
pub use conversation_store::*;
pub use dispatcher::*;
pub use store_file::*;
pub use transcript::*;
