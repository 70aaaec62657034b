//! Coordination service client layer.
//!
//! This module defines the [`CoordinationClient`] seam the reconciliation
//! core talks to, plus the implementations shipped with the crate:
//! - [`MemoryClient`]: in-process store, used for previews and tests
//! - [`LocalClient`]: single-file store on local disk
//! - [`NamespacedClient`]: transparent base-path prefix
//! - [`RetryingClient`]: per-call timeout and retry policy

mod local;
mod memory;
mod namespace;
mod retry;
mod store;
// mockall output carries no docs.
#[cfg_attr(test, allow(missing_docs))]
mod traits;

pub use local::{LocalClient, STORE_DIR, STORE_FILE};
pub use memory::MemoryClient;
pub use namespace::NamespacedClient;
pub use retry::{
    RetryPolicy, RetryingClient, DEFAULT_MAX_RETRIES, DEFAULT_RETRY_DELAY_MS, DEFAULT_TIMEOUT_SECS,
};
pub use traits::{ClientResult, CoordinationClient};

#[cfg(test)]
pub use traits::MockCoordinationClient;
