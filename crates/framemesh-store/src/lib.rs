//! # Framemesh Store
//!
//! The shared state layer of the framemesh coordination system.
//!
//! ## Components
//!
//! - [`SharedStore`] - Key-value store visible to every context, with change
//!   notifications ([`MemoryStore`], [`FileStore`])
//! - [`LeaseLock`] - Best-effort exclusive ownership of a named resource,
//!   built on the store with a write-then-verify protocol
//! - [`SingletonSlot`] - "At most one live handler instance" adoption on top
//!   of the lease lock and a ready notification
//!
//! The store deliberately offers no compare-and-swap; the lease protocol
//! compensates optimistically and is documented as best-effort, not
//! linearizable.

mod error;
mod lease;
mod singleton;
mod store;

pub use error::StoreError;
pub use lease::{LeaseGuard, LeaseLock, LeaseRecord};
pub use singleton::{AdoptionConfig, SingletonSlot};
pub use store::{FileStore, MemoryStore, SharedStore, StoreEvent, StoreOp};
