//! Model access for docsmith: provider implementations and the shared client
//! the docstring generator talks to.

mod client;
pub mod providers;

pub use client::{CompletionClient, ModelClient, ModelSettings};
pub use providers::*;
