//! # Ontosync Model
//!
//! Domain model for the Ontosync curation client.
//!
//! This crate provides:
//! - Prefixed entity identifiers with provisional/permanent namespaces
//! - The controlled vocabulary of entity kinds
//! - Entities with synonym and external-identifier sub-records
//! - Annotation and relationship link records (composite identity)
//! - Per-operation input structs with local shape validation
//!
//! This is a pure data crate with no I/O operations.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod entity;
mod error;
mod id;
mod input;

pub use entity::{
    AccountId, AnnotationLink, Entity, EntityKind, ExistingId, RelationshipLink, Synonym,
};
pub use error::{ModelError, ModelResult};
pub use id::{EntityId, Namespace};
pub use input::{EntityUpdate, NewEntity};
