//! Server-side state: the key-value store and the command processor that
//! executes queries against it.

mod processor;
mod state;

pub use processor::CommandProcessor;
pub use state::{Store, StoreGuard};
