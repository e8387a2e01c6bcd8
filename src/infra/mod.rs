//! In-memory backends for the queue and result store.

pub mod queue;
pub mod results;

pub use queue::InMemoryQueue;
pub use results::InMemoryResultStore;
