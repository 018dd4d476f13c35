//! Accepting connections and running their handlers.
//!
//! - **`listener`**: resolves and binds the listening socket
//! - **`dispatcher`**: the accept loop, one task per connection
//! - **`reaper`**: reclaims finished handler tasks

pub mod dispatcher;
pub mod listener;
pub mod reaper;

pub use dispatcher::Dispatcher;
pub use reaper::Reaper;
