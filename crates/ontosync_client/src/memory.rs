//! In-memory store backend for tests and local experiments.
//!
//! Reproduces the store's observable behavior at the transport seam,
//! including the quirks the client has to cope with: duplicate labels are
//! reported as conflicts no matter which account owns the colliding record,
//! and link deletion is a blank-out, not a row removal.

use crate::error::ClientResult;
use crate::transport::ApiTransport;
use ontosync_model::{
    AccountId, AnnotationLink, Entity, EntityId, EntityKind, RelationshipLink,
};
use ontosync_protocol::{
    AnnotationSubmission, CallOutcome, EntitySubmission, RelationshipSubmission, SearchHit,
    UserInfo, BLANK_FIELD,
};
use parking_lot::Mutex;

/// An in-memory store backend.
pub struct MemoryBackend {
    account: AccountId,
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    next_row: u64,
    next_fragment: u64,
    next_link: u64,
    entities: Vec<Entity>,
    annotations: Vec<AnnotationLink>,
    relationships: Vec<RelationshipLink>,
    calls: u64,
    mutations: u64,
}

impl Inner {
    fn fresh_fragment(&mut self) -> EntityId {
        self.next_fragment += 1;
        // Seven-digit fragments, the way the store renders them.
        EntityId::provisional(format!("{:07}", self.next_fragment))
    }

    fn superclass_from(&self, submission: &EntitySubmission) -> Result<Option<EntityId>, String> {
        let Some(tid) = submission
            .superclasses
            .iter()
            .find_map(|sc| sc.superclass_tid)
        else {
            return Ok(None);
        };
        self.entities
            .iter()
            .find(|e| e.row_id == tid)
            .map(|e| Some(e.id.clone()))
            .ok_or_else(|| format!("unknown superclass row {tid}"))
    }

    fn label_taken(&self, label: &str, excluding_row: Option<u64>) -> bool {
        self.entities.iter().any(|e| {
            e.label.eq_ignore_ascii_case(label) && Some(e.row_id) != excluding_row
        })
    }
}

impl MemoryBackend {
    /// Creates a backend whose credentials resolve to the given account.
    pub fn new(account: AccountId) -> Self {
        Self {
            account,
            inner: Mutex::new(Inner::default()),
        }
    }

    /// Total transport calls made so far.
    pub fn calls(&self) -> u64 {
        self.inner.lock().calls
    }

    /// Transport calls that mutate store state.
    pub fn mutations(&self) -> u64 {
        self.inner.lock().mutations
    }

    /// Inserts an entity directly, bypassing the transport seam.
    ///
    /// Used to stage records owned by other accounts.
    pub fn seed_entity(&self, label: &str, kind: EntityKind, owner: AccountId) -> Entity {
        let mut inner = self.inner.lock();
        let id = inner.fresh_fragment();
        inner.next_row += 1;
        let entity = Entity {
            id,
            row_id: inner.next_row,
            label: label.to_string(),
            kind,
            definition: None,
            comment: None,
            superclass: None,
            synonyms: Vec::new(),
            existing_ids: Vec::new(),
            owner,
            version: 1,
        };
        inner.entities.push(entity.clone());
        entity
    }
}

impl ApiTransport for MemoryBackend {
    fn user_info(&self) -> ClientResult<CallOutcome<UserInfo>> {
        let mut inner = self.inner.lock();
        inner.calls += 1;
        Ok(CallOutcome::Ok(UserInfo {
            id: self.account.as_u64(),
        }))
    }

    fn reserve_id(&self, _label: &str, _kind: EntityKind) -> ClientResult<CallOutcome<EntityId>> {
        let mut inner = self.inner.lock();
        inner.calls += 1;
        inner.mutations += 1;
        let id = inner.fresh_fragment();
        Ok(CallOutcome::Ok(id))
    }

    fn create_entity(&self, submission: &EntitySubmission) -> ClientResult<CallOutcome<EntityId>> {
        let mut inner = self.inner.lock();
        inner.calls += 1;
        inner.mutations += 1;

        if inner.label_taken(&submission.label, None) {
            return Ok(CallOutcome::Conflict(format!(
                "lexeme with label {:?} already exists",
                submission.label
            )));
        }
        let Some(raw_id) = submission.ilx.as_deref() else {
            return Ok(CallOutcome::Fatal {
                status: 400,
                detail: "no reserved identifier attached".into(),
            });
        };
        let id = match EntityId::parse(raw_id) {
            Ok(id) => id,
            Err(e) => {
                return Ok(CallOutcome::Fatal {
                    status: 400,
                    detail: e.to_string(),
                })
            }
        };
        let superclass = match inner.superclass_from(submission) {
            Ok(superclass) => superclass,
            Err(detail) => return Ok(CallOutcome::Fatal { status: 400, detail }),
        };

        inner.next_row += 1;
        let entity = Entity {
            id: id.clone(),
            row_id: inner.next_row,
            label: submission.label.clone(),
            kind: submission.kind,
            definition: submission.definition.clone().filter(|s| !s.is_empty()),
            comment: submission.comment.clone().filter(|s| !s.is_empty()),
            superclass,
            synonyms: submission.synonyms.clone(),
            existing_ids: submission.existing_ids.clone(),
            owner: submission.uid.map(AccountId::new).unwrap_or(self.account),
            version: 1,
        };
        inner.entities.push(entity);
        Ok(CallOutcome::Ok(id))
    }

    fn edit_entity(
        &self,
        row_id: u64,
        submission: &EntitySubmission,
    ) -> ClientResult<CallOutcome<EntityId>> {
        let mut inner = self.inner.lock();
        inner.calls += 1;
        inner.mutations += 1;

        if !inner.entities.iter().any(|e| e.row_id == row_id) {
            return Ok(CallOutcome::NotFound);
        }
        if inner.label_taken(&submission.label, Some(row_id)) {
            return Ok(CallOutcome::Conflict(format!(
                "lexeme with label {:?} already exists",
                submission.label
            )));
        }
        let superclass = match inner.superclass_from(submission) {
            Ok(superclass) => superclass,
            Err(detail) => return Ok(CallOutcome::Fatal { status: 400, detail }),
        };

        let Some(entity) = inner.entities.iter_mut().find(|e| e.row_id == row_id) else {
            return Ok(CallOutcome::NotFound);
        };
        entity.label = submission.label.clone();
        entity.kind = submission.kind;
        entity.definition = submission.definition.clone().filter(|s| !s.is_empty());
        entity.comment = submission.comment.clone().filter(|s| !s.is_empty());
        entity.superclass = superclass;
        entity.synonyms = submission.synonyms.clone();
        entity.existing_ids = submission.existing_ids.clone();
        entity.version += 1;
        Ok(CallOutcome::Ok(entity.id.clone()))
    }

    fn entity_by_id(&self, id: &EntityId) -> ClientResult<CallOutcome<Entity>> {
        let mut inner = self.inner.lock();
        inner.calls += 1;
        Ok(match inner.entities.iter().find(|e| &e.id == id) {
            Some(entity) => CallOutcome::Ok(entity.clone()),
            None => CallOutcome::NotFound,
        })
    }

    fn search_label(&self, label: &str) -> ClientResult<Vec<SearchHit>> {
        let mut inner = self.inner.lock();
        inner.calls += 1;
        let needle = label.to_lowercase();
        Ok(inner
            .entities
            .iter()
            .filter(|e| e.label.to_lowercase().contains(&needle))
            .map(|e| SearchHit {
                ilx: Some(e.id.to_string()),
                label: e.label.clone(),
            })
            .collect())
    }

    fn add_annotation(
        &self,
        submission: &AnnotationSubmission,
    ) -> ClientResult<CallOutcome<AnnotationLink>> {
        let mut inner = self.inner.lock();
        inner.calls += 1;
        inner.mutations += 1;

        let duplicate = inner.annotations.iter().any(|link| {
            link.matches(submission.tid, submission.annotation_tid, &submission.value)
        });
        if duplicate {
            return Ok(CallOutcome::Conflict("annotation already exists".into()));
        }
        inner.next_link += 1;
        let link = AnnotationLink {
            link_id: inner.next_link,
            subject_tid: submission.tid,
            annotation_tid: submission.annotation_tid,
            value: submission.value.clone(),
        };
        inner.annotations.push(link.clone());
        Ok(CallOutcome::Ok(link))
    }

    fn annotations_for(&self, subject_tid: u64) -> ClientResult<Vec<AnnotationLink>> {
        let mut inner = self.inner.lock();
        inner.calls += 1;
        Ok(inner
            .annotations
            .iter()
            .filter(|link| link.subject_tid == subject_tid)
            .cloned()
            .collect())
    }

    fn blank_annotation(&self, link_id: u64) -> ClientResult<CallOutcome<()>> {
        let mut inner = self.inner.lock();
        inner.calls += 1;
        inner.mutations += 1;
        match inner.annotations.iter_mut().find(|l| l.link_id == link_id) {
            Some(link) => {
                link.subject_tid = 0;
                link.annotation_tid = 0;
                link.value = BLANK_FIELD.to_string();
                Ok(CallOutcome::Ok(()))
            }
            None => Ok(CallOutcome::NotFound),
        }
    }

    fn add_relationship(
        &self,
        submission: &RelationshipSubmission,
    ) -> ClientResult<CallOutcome<RelationshipLink>> {
        let mut inner = self.inner.lock();
        inner.calls += 1;
        inner.mutations += 1;

        let duplicate = inner.relationships.iter().any(|link| {
            link.matches(
                submission.term1_id,
                submission.relationship_tid,
                submission.term2_id,
            )
        });
        if duplicate {
            return Ok(CallOutcome::Conflict("relationship already exists".into()));
        }
        inner.next_link += 1;
        let link = RelationshipLink {
            link_id: inner.next_link,
            entity1_tid: submission.term1_id,
            relationship_tid: submission.relationship_tid,
            entity2_tid: submission.term2_id,
        };
        inner.relationships.push(link.clone());
        Ok(CallOutcome::Ok(link))
    }

    fn relationships_for(&self, subject_tid: u64) -> ClientResult<Vec<RelationshipLink>> {
        let mut inner = self.inner.lock();
        inner.calls += 1;
        Ok(inner
            .relationships
            .iter()
            .filter(|link| link.entity1_tid == subject_tid || link.entity2_tid == subject_tid)
            .cloned()
            .collect())
    }

    fn blank_relationship(&self, link_id: u64) -> ClientResult<CallOutcome<()>> {
        let mut inner = self.inner.lock();
        inner.calls += 1;
        inner.mutations += 1;
        match inner.relationships.iter_mut().find(|l| l.link_id == link_id) {
            Some(link) => {
                link.entity1_tid = 0;
                link.relationship_tid = 0;
                link.entity2_tid = 0;
                Ok(CallOutcome::Ok(()))
            }
            None => Ok(CallOutcome::NotFound),
        }
    }
}
