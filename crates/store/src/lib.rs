//! Durable collaborators: blob storage, account documents, and the
//! persisted planner grid.
//!
//! Each collaborator is an async trait with an in-memory implementation;
//! blobs additionally have a local-filesystem backend.

pub mod account;
pub mod blob;
pub mod error;
pub mod planner;

pub use account::{AccountRepo, AccountService, MemoryAccountRepo};
pub use blob::{BlobStore, LocalBlobStore, MemoryBlobStore};
pub use error::StoreError;
pub use planner::{MemoryPlannerRepo, PlannerRepo, PlannerStore, SlotDocument};
