//! # Ontosync Client
//!
//! Idempotent sync client for a remote, multi-writer ontology store.
//!
//! This crate provides:
//! - Entity creation with duplicate-label recovery
//! - Fetch-merge-submit partial updates
//! - Annotation and relationship link management with blank-out deletion
//! - An HTTP transport plus an in-memory backend for tests
//! - Bounded fan-out for batches of independent calls
//!
//! ## Architecture
//!
//! The store being synced against has no transactions, never hard-deletes,
//! and enforces label uniqueness per account. Every operation is therefore
//! written to **converge on replay**:
//! 1. Validate input locally before any network call
//! 2. Resolve every referenced record before the first mutation
//! 3. On a duplicate report, recover the account's own record instead of
//!    failing
//! 4. Re-fetch after every mutation so callers observe the store's
//!    normalization
//!
//! ## Key Invariants
//!
//! - A rejected input performs zero transport calls
//! - A dangling reference fails the operation before any write
//! - Replaying a create or link-add converges on the first result
//! - Deleting something absent writes nothing

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod batch;
mod client;
mod config;
mod error;
mod http;
mod links;
mod memory;
mod resolver;
mod transport;

pub use batch::fan_out;
pub use client::SyncClient;
pub use config::{ClientConfig, API_KEY_VAR, BASIC_PASSWORD_VAR, BASIC_USER_VAR};
pub use error::{ClientError, ClientResult};
pub use http::{HttpClient, HttpTransport, ReqwestClient};
pub use links::LinkManager;
pub use memory::MemoryBackend;
pub use resolver::DuplicateResolver;
pub use transport::ApiTransport;
