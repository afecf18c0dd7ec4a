//! Transport layer abstraction for store operations.

use crate::error::{ClientError, ClientResult};
use ontosync_model::{AnnotationLink, Entity, EntityId, EntityKind, RelationshipLink};
use ontosync_protocol::{
    AnnotationSubmission, CallOutcome, EntitySubmission, RelationshipSubmission, SearchHit,
    UserInfo,
};

/// A transport handles raw store calls.
///
/// This trait abstracts the wire, allowing for different implementations
/// (HTTP against a deployment, in-memory for testing). Implementations
/// normalize responses into typed payloads and [`CallOutcome`]s; domain
/// decisions (duplicate recovery, merge, idempotence) live above this seam.
pub trait ApiTransport: Send + Sync {
    /// Fetches the account behind the configured credentials.
    fn user_info(&self) -> ClientResult<CallOutcome<UserInfo>>;

    /// Reserves a fresh provisional identifier for a label and kind.
    fn reserve_id(&self, label: &str, kind: EntityKind) -> ClientResult<CallOutcome<EntityId>>;

    /// Populates a reserved identifier with a full record.
    ///
    /// Answers with the identifier of the created record; the caller
    /// re-fetches to observe the store's normalization.
    fn create_entity(&self, submission: &EntitySubmission) -> ClientResult<CallOutcome<EntityId>>;

    /// Submits a whole-record edit for the row.
    fn edit_entity(
        &self,
        row_id: u64,
        submission: &EntitySubmission,
    ) -> ClientResult<CallOutcome<EntityId>>;

    /// Fetches a full entity record by identifier.
    fn entity_by_id(&self, id: &EntityId) -> ClientResult<CallOutcome<Entity>>;

    /// Runs a crude label search; hits are skeletons, not full records.
    fn search_label(&self, label: &str) -> ClientResult<Vec<SearchHit>>;

    /// Creates an annotation link.
    fn add_annotation(
        &self,
        submission: &AnnotationSubmission,
    ) -> ClientResult<CallOutcome<AnnotationLink>>;

    /// Lists annotation links whose subject is the given row.
    fn annotations_for(&self, subject_tid: u64) -> ClientResult<Vec<AnnotationLink>>;

    /// Blanks out an annotation link. The row survives; its payload fields
    /// are overwritten with the sentinel.
    fn blank_annotation(&self, link_id: u64) -> ClientResult<CallOutcome<()>>;

    /// Creates a relationship link.
    fn add_relationship(
        &self,
        submission: &RelationshipSubmission,
    ) -> ClientResult<CallOutcome<RelationshipLink>>;

    /// Lists relationship links in which the given row takes part.
    fn relationships_for(&self, subject_tid: u64) -> ClientResult<Vec<RelationshipLink>>;

    /// Blanks out a relationship link.
    fn blank_relationship(&self, link_id: u64) -> ClientResult<CallOutcome<()>>;
}

/// Unwraps an outcome where only success is acceptable.
///
/// `subject` names what the call was about, for the error message.
pub(crate) fn expect_ok<T>(outcome: CallOutcome<T>, subject: &str) -> ClientResult<T> {
    match outcome {
        CallOutcome::Ok(value) => Ok(value),
        CallOutcome::NotFound => Err(ClientError::EntityDoesNotExist {
            id: subject.to_string(),
        }),
        CallOutcome::Conflict(detail) => Err(ClientError::rejected(400, detail)),
        CallOutcome::Fatal { status, detail } => Err(ClientError::rejected(status, detail)),
    }
}
