//! Annotation and relationship link management.
//!
//! Links are triples over entity row ids with composite identity: an
//! annotation is `(subject, annotation type, value)`, a relationship is
//! `(entity1, relationship type, entity2)`. Every leg is resolved to a
//! live record before anything is written, so a dangling reference fails
//! the whole operation without a partial mutation.
//!
//! Deletion is a blank-out: the store keeps the link row and overwrites
//! its payload fields with a sentinel. Deleting an absent link is a no-op
//! that performs no write at all.

use crate::error::{ClientError, ClientResult};
use crate::transport::{expect_ok, ApiTransport};
use ontosync_model::{AccountId, AnnotationLink, Entity, EntityId, RelationshipLink};
use ontosync_protocol::{AnnotationSubmission, CallOutcome, RelationshipSubmission};

/// Manages link triples between entities.
pub struct LinkManager<'a, T: ApiTransport + ?Sized> {
    transport: &'a T,
    account: AccountId,
}

impl<'a, T: ApiTransport + ?Sized> LinkManager<'a, T> {
    /// Creates a link manager scoped to one account.
    pub fn new(transport: &'a T, account: AccountId) -> Self {
        Self { transport, account }
    }

    /// Resolves a leg of a triple, failing with [`ClientError::EntityDoesNotExist`].
    fn resolve(&self, id: &EntityId) -> ClientResult<Entity> {
        match self.transport.entity_by_id(id)? {
            CallOutcome::Ok(entity) => Ok(entity),
            CallOutcome::NotFound => Err(ClientError::EntityDoesNotExist { id: id.curie() }),
            CallOutcome::Conflict(detail) => Err(ClientError::rejected(400, detail)),
            CallOutcome::Fatal { status, detail } => Err(ClientError::rejected(status, detail)),
        }
    }

    /// Attaches an annotation to an entity. Idempotent: if the identical
    /// triple already exists, the existing link is returned.
    pub fn add_annotation(
        &self,
        subject: &EntityId,
        annotation: &EntityId,
        value: &str,
    ) -> ClientResult<AnnotationLink> {
        let subject = self.resolve(subject)?;
        let annotation = self.resolve(annotation)?;

        let submission = AnnotationSubmission {
            tid: subject.row_id,
            annotation_tid: annotation.row_id,
            value: value.to_string(),
            term_version: subject.version,
            annotation_term_version: annotation.version,
            orig_uid: Some(self.account.as_u64()),
        };
        match self.transport.add_annotation(&submission)? {
            CallOutcome::Ok(link) => Ok(link),
            CallOutcome::Conflict(_) => {
                tracing::warn!(
                    subject = %subject.id,
                    annotation = %annotation.id,
                    value,
                    "annotation already present, reusing existing link"
                );
                self.find_annotation(subject.row_id, annotation.row_id, value)?
                    .ok_or_else(|| {
                        ClientError::rejected(
                            400,
                            "store reported a duplicate annotation it does not list",
                        )
                    })
            }
            CallOutcome::NotFound => Err(ClientError::EntityDoesNotExist {
                id: subject.id.curie(),
            }),
            CallOutcome::Fatal { status, detail } => Err(ClientError::rejected(status, detail)),
        }
    }

    /// Detaches an annotation by blanking out its link row.
    ///
    /// Returns the link as it was before the blank-out, or `None` when no
    /// matching triple exists (in which case nothing is written).
    pub fn delete_annotation(
        &self,
        subject: &EntityId,
        annotation: &EntityId,
        value: &str,
    ) -> ClientResult<Option<AnnotationLink>> {
        let subject = self.resolve(subject)?;
        let annotation = self.resolve(annotation)?;

        let Some(link) = self.find_annotation(subject.row_id, annotation.row_id, value)? else {
            tracing::warn!(
                subject = %subject.id,
                annotation = %annotation.id,
                value,
                "annotation to delete was not found; nothing to do"
            );
            return Ok(None);
        };
        expect_ok(
            self.transport.blank_annotation(link.link_id)?,
            &subject.id.curie(),
        )?;
        Ok(Some(link))
    }

    fn find_annotation(
        &self,
        subject_tid: u64,
        annotation_tid: u64,
        value: &str,
    ) -> ClientResult<Option<AnnotationLink>> {
        Ok(self
            .transport
            .annotations_for(subject_tid)?
            .into_iter()
            .find(|link| link.matches(subject_tid, annotation_tid, value)))
    }

    /// Links two entities through a relationship type. Idempotent the same
    /// way annotation addition is.
    pub fn add_relationship(
        &self,
        entity1: &EntityId,
        relationship: &EntityId,
        entity2: &EntityId,
    ) -> ClientResult<RelationshipLink> {
        let entity1 = self.resolve(entity1)?;
        let relationship = self.resolve(relationship)?;
        let entity2 = self.resolve(entity2)?;

        let submission = RelationshipSubmission {
            term1_id: entity1.row_id,
            relationship_tid: relationship.row_id,
            term2_id: entity2.row_id,
            term1_version: entity1.version,
            term2_version: entity2.version,
            relationship_term_version: relationship.version,
            orig_uid: Some(self.account.as_u64()),
        };
        match self.transport.add_relationship(&submission)? {
            CallOutcome::Ok(link) => Ok(link),
            CallOutcome::Conflict(_) => {
                tracing::warn!(
                    entity1 = %entity1.id,
                    relationship = %relationship.id,
                    entity2 = %entity2.id,
                    "relationship already present, reusing existing link"
                );
                self.find_relationship(entity1.row_id, relationship.row_id, entity2.row_id)?
                    .ok_or_else(|| {
                        ClientError::rejected(
                            400,
                            "store reported a duplicate relationship it does not list",
                        )
                    })
            }
            CallOutcome::NotFound => Err(ClientError::EntityDoesNotExist {
                id: entity1.id.curie(),
            }),
            CallOutcome::Fatal { status, detail } => Err(ClientError::rejected(status, detail)),
        }
    }

    /// Unlinks two entities by blanking out the relationship row.
    pub fn delete_relationship(
        &self,
        entity1: &EntityId,
        relationship: &EntityId,
        entity2: &EntityId,
    ) -> ClientResult<Option<RelationshipLink>> {
        let entity1 = self.resolve(entity1)?;
        let relationship = self.resolve(relationship)?;
        let entity2 = self.resolve(entity2)?;

        let Some(link) =
            self.find_relationship(entity1.row_id, relationship.row_id, entity2.row_id)?
        else {
            tracing::warn!(
                entity1 = %entity1.id,
                relationship = %relationship.id,
                entity2 = %entity2.id,
                "relationship to delete was not found; nothing to do"
            );
            return Ok(None);
        };
        expect_ok(
            self.transport.blank_relationship(link.link_id)?,
            &entity1.id.curie(),
        )?;
        Ok(Some(link))
    }

    fn find_relationship(
        &self,
        entity1_tid: u64,
        relationship_tid: u64,
        entity2_tid: u64,
    ) -> ClientResult<Option<RelationshipLink>> {
        Ok(self
            .transport
            .relationships_for(entity1_tid)?
            .into_iter()
            .find(|link| link.matches(entity1_tid, relationship_tid, entity2_tid)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryBackend;
    use ontosync_model::EntityKind;

    fn backend_with_entities() -> (MemoryBackend, Entity, Entity, Entity) {
        let account = AccountId::new(1);
        let backend = MemoryBackend::new(account);
        let subject = backend.seed_entity("brain", EntityKind::Term, account);
        let annotation = backend.seed_entity("hasDbXref", EntityKind::Annotation, account);
        let other = backend.seed_entity("neuron", EntityKind::Term, account);
        (backend, subject, annotation, other)
    }

    #[test]
    fn add_annotation_is_idempotent() {
        let (backend, subject, annotation, _) = backend_with_entities();
        let links = LinkManager::new(&backend, AccountId::new(1));

        let first = links
            .add_annotation(&subject.id, &annotation.id, "PMID:123")
            .unwrap();
        let second = links
            .add_annotation(&subject.id, &annotation.id, "PMID:123")
            .unwrap();
        assert_eq!(first, second);

        // Same subject and type with a different value is a distinct link.
        let third = links
            .add_annotation(&subject.id, &annotation.id, "PMID:456")
            .unwrap();
        assert_ne!(first.link_id, third.link_id);
    }

    #[test]
    fn dangling_leg_fails_before_any_write() {
        let (backend, subject, _, _) = backend_with_entities();
        let links = LinkManager::new(&backend, AccountId::new(1));
        let ghost = EntityId::parse("ont_9999999").unwrap();

        let before = backend.mutations();
        let err = links
            .add_annotation(&subject.id, &ghost, "PMID:123")
            .unwrap_err();
        assert!(matches!(err, ClientError::EntityDoesNotExist { id } if id == "ONT:9999999"));
        assert_eq!(backend.mutations(), before);
    }

    #[test]
    fn delete_missing_annotation_writes_nothing() {
        let (backend, subject, annotation, _) = backend_with_entities();
        let links = LinkManager::new(&backend, AccountId::new(1));

        let before = backend.mutations();
        let deleted = links
            .delete_annotation(&subject.id, &annotation.id, "PMID:123")
            .unwrap();
        assert!(deleted.is_none());
        assert_eq!(backend.mutations(), before);
    }

    #[test]
    fn delete_annotation_blanks_and_returns_link() {
        let (backend, subject, annotation, _) = backend_with_entities();
        let links = LinkManager::new(&backend, AccountId::new(1));

        let added = links
            .add_annotation(&subject.id, &annotation.id, "PMID:123")
            .unwrap();
        let deleted = links
            .delete_annotation(&subject.id, &annotation.id, "PMID:123")
            .unwrap();
        assert_eq!(deleted, Some(added));

        // Once blanked the triple no longer matches; a second delete is a
        // no-op.
        let again = links
            .delete_annotation(&subject.id, &annotation.id, "PMID:123")
            .unwrap();
        assert!(again.is_none());
    }

    #[test]
    fn relationship_roundtrip() {
        let (backend, subject, _, other) = backend_with_entities();
        let account = AccountId::new(1);
        let relation = backend.seed_entity("partOf", EntityKind::Relationship, account);
        let links = LinkManager::new(&backend, account);

        let link = links
            .add_relationship(&subject.id, &relation.id, &other.id)
            .unwrap();
        let again = links
            .add_relationship(&subject.id, &relation.id, &other.id)
            .unwrap();
        assert_eq!(link, again);

        let deleted = links
            .delete_relationship(&subject.id, &relation.id, &other.id)
            .unwrap();
        assert_eq!(deleted, Some(link));
        assert!(links
            .delete_relationship(&subject.id, &relation.id, &other.id)
            .unwrap()
            .is_none());
    }
}
