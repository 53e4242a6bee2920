pub mod fetch;
pub mod sync;

pub use fetch::FetchCommands;
pub use sync::SyncCommands;
