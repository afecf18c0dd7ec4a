//! # Ontosync Protocol
//!
//! Wire payloads and pure reconciliation logic for Ontosync.
//!
//! This crate provides:
//! - Request/response payload structs with lenient JSON decoding (the
//!   store answers the same logical query with different shapes depending
//!   on which endpoint handled it)
//! - `CallOutcome`, the tagged result of every remote call, so callers
//!   branch on a variant instead of matching error-message text
//! - The record-set reconciler for synonym and external-identifier lists
//!
//! This is a pure protocol crate with no I/O operations.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod outcome;
mod payload;
mod reconcile;

pub use error::{ProtocolError, ProtocolResult};
pub use outcome::{classify, CallOutcome};
pub use payload::{
    AnnotationBlank, AnnotationRecord, AnnotationSubmission, EntityRecord, EntitySubmission,
    RelationshipBlank, RelationshipRecord, RelationshipSubmission, ReservedId, SearchHit,
    SuperclassRef, UserInfo, BLANK_FIELD,
};
pub use reconcile::{
    merge_by, merge_existing_ids, merge_synonyms, remove_by, remove_existing_ids, remove_synonyms,
};
