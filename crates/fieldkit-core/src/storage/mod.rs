//! # Persistent Storage
//!
//! Disk-backed [`Repository`](crate::repository::Repository) implementations.

mod redb_store;

pub use redb_store::RedbRepository;
