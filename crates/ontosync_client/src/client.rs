//! The sync client: idempotent entity operations over a transport.
//!
//! The store is multi-writer, has no transactions, and never deletes.
//! Every operation here is written so that replaying it converges instead
//! of duplicating: creation recovers the account's own record on a label
//! collision, updates merge into a fresh fetch instead of overwriting, and
//! link management reuses existing triples.

use crate::batch::fan_out;
use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::http::{HttpTransport, ReqwestClient};
use crate::links::LinkManager;
use crate::resolver::DuplicateResolver;
use crate::transport::{expect_ok, ApiTransport};
use ontosync_model::{
    AccountId, AnnotationLink, Entity, EntityId, EntityUpdate, NewEntity, RelationshipLink,
};
use ontosync_protocol::{
    merge_existing_ids, merge_synonyms, remove_existing_ids, remove_synonyms, CallOutcome,
    EntitySubmission, SuperclassRef,
};

const DEFAULT_BATCH_WIDTH: usize = 4;

/// A client bound to one account on one store deployment.
pub struct SyncClient<T: ApiTransport> {
    transport: T,
    account: AccountId,
    batch_width: usize,
}

impl SyncClient<HttpTransport<ReqwestClient>> {
    /// Connects to a deployment over HTTP.
    ///
    /// Validates the configuration locally, then probes the account behind
    /// the API key; a client that constructs successfully is authenticated.
    pub fn connect(config: ClientConfig) -> ClientResult<Self> {
        config.validate()?;
        let client = ReqwestClient::new(&config)?;
        let transport =
            HttpTransport::new(config.base_url.clone(), config.api_key.clone(), client);
        let mut client = Self::new(transport)?;
        client.batch_width = config.batch_width;
        Ok(client)
    }
}

impl<T: ApiTransport> SyncClient<T> {
    /// Creates a client over an already-built transport.
    ///
    /// Probes the account once; credential problems surface here rather
    /// than on the first real operation.
    pub fn new(transport: T) -> ClientResult<Self> {
        let account = match transport.user_info()? {
            CallOutcome::Ok(info) => info.account(),
            CallOutcome::Fatal {
                status: 401 | 403, ..
            }
            | CallOutcome::NotFound => return Err(ClientError::IncorrectApiKey),
            CallOutcome::Conflict(detail) => return Err(ClientError::rejected(400, detail)),
            CallOutcome::Fatal { status, detail } => {
                return Err(ClientError::rejected(status, detail))
            }
        };
        tracing::debug!(%account, "authenticated against store");
        Ok(Self {
            transport,
            account,
            batch_width: DEFAULT_BATCH_WIDTH,
        })
    }

    /// The account behind the configured credentials.
    #[must_use]
    pub fn account(&self) -> AccountId {
        self.account
    }

    /// The underlying transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// A link manager over this client's transport and account.
    #[must_use]
    pub fn links(&self) -> LinkManager<'_, T> {
        LinkManager::new(&self.transport, self.account)
    }

    /// A duplicate resolver over this client's transport and account.
    #[must_use]
    pub fn resolver(&self) -> DuplicateResolver<'_, T> {
        DuplicateResolver::new(&self.transport, self.account)
    }

    /// Runs `op` over `items` with the configured fan-out width.
    ///
    /// Results come back per item in input order; items succeed or fail
    /// independently, there is no cross-item atomicity. See [`fan_out`]
    /// for the threading behavior.
    pub fn batch<I, R, F>(&self, items: Vec<I>, op: F) -> Vec<R>
    where
        I: Send,
        R: Send,
        F: Fn(&Self, I) -> R + Sync,
    {
        fan_out(items, self.batch_width, |item| op(self, item))
    }

    /// Fetches an entity by identifier.
    pub fn get_entity(&self, id: &EntityId) -> ClientResult<Entity> {
        match self.transport.entity_by_id(id)? {
            CallOutcome::Ok(entity) => Ok(entity),
            CallOutcome::NotFound => Err(ClientError::EntityDoesNotExist { id: id.curie() }),
            CallOutcome::Conflict(detail) => Err(ClientError::rejected(400, detail)),
            CallOutcome::Fatal { status, detail } => Err(ClientError::rejected(status, detail)),
        }
    }

    /// Resolves a reference held by another record.
    fn resolve(&self, id: &EntityId) -> ClientResult<Entity> {
        match self.transport.entity_by_id(id)? {
            CallOutcome::Ok(entity) => Ok(entity),
            CallOutcome::NotFound => Err(ClientError::ReferenceNotFound {
                reference: id.curie(),
            }),
            CallOutcome::Conflict(detail) => Err(ClientError::rejected(400, detail)),
            CallOutcome::Fatal { status, detail } => Err(ClientError::rejected(status, detail)),
        }
    }

    /// Creates an entity, converging on the existing record if this account
    /// already created one with the same label.
    ///
    /// Creation is two-phase: reserve a provisional identifier, then
    /// populate it with the full record. Validation and reference
    /// resolution run before the reservation, so a bad input never leaves
    /// a half-created record behind. The created entity is re-fetched so
    /// the caller sees the store's normalization, not the submitted input.
    pub fn create_entity(&self, input: &NewEntity) -> ClientResult<Entity> {
        input.validate()?;
        let superclass_tid = match &input.superclass {
            Some(id) => Some(self.resolve(id)?.row_id),
            None => None,
        };

        let reserved = expect_ok(
            self.transport.reserve_id(&input.label, input.kind)?,
            &input.label,
        )?;
        tracing::debug!(id = %reserved, label = %input.label, "reserved provisional identifier");

        let mut submission = EntitySubmission::new(input.label.clone(), input.kind);
        submission.definition = input.definition.clone();
        submission.comment = input.comment.clone();
        submission.superclasses = superclass_tid
            .map(SuperclassRef::from_tid)
            .into_iter()
            .collect();
        submission.synonyms = input.synonyms.clone();
        submission.existing_ids = input.existing_ids.clone();
        submission.ilx = Some(reserved.to_string());
        submission.uid = Some(self.account.as_u64());

        match self.transport.create_entity(&submission)? {
            CallOutcome::Ok(id) => self.get_entity(&id),
            CallOutcome::Conflict(detail) => {
                tracing::info!(label = %input.label, detail, "label collision on create");
                match self.resolver().recover_own(&input.label)? {
                    Some(own) => {
                        tracing::warn!(
                            id = %own.id,
                            label = %input.label,
                            "entity already existed, returning it"
                        );
                        Ok(own)
                    }
                    None => Err(ClientError::AlreadyExists {
                        label: input.label.clone(),
                    }),
                }
            }
            CallOutcome::NotFound => Err(ClientError::EntityDoesNotExist {
                id: reserved.curie(),
            }),
            CallOutcome::Fatal { status, detail } => Err(ClientError::rejected(status, detail)),
        }
    }

    /// Applies a partial update on top of a fresh fetch.
    ///
    /// The store only takes whole-record edits, so the update is computed
    /// as fetch, merge, submit: scalars overwrite only when supplied, and
    /// list-valued sub-records go through merge-then-remove so records
    /// other writers appended since the last fetch survive. The edited
    /// entity is re-fetched before being returned.
    pub fn update_entity(&self, id: &EntityId, update: &EntityUpdate) -> ClientResult<Entity> {
        update.validate()?;
        let current = self.get_entity(id)?;
        if update.is_empty() {
            return Ok(current);
        }

        let superclass_id = update
            .superclass
            .clone()
            .or_else(|| current.superclass.clone());
        let superclass_tid = match &superclass_id {
            Some(superclass) => Some(self.resolve(superclass)?.row_id),
            None => None,
        };

        let synonyms = remove_synonyms(
            &merge_synonyms(&current.synonyms, &update.add_synonyms, false),
            &update.delete_synonyms,
        );
        let existing_ids = remove_existing_ids(
            &merge_existing_ids(&current.existing_ids, &update.add_existing_ids, false),
            &update.delete_existing_ids,
        );

        let mut submission = EntitySubmission::new(
            update.label.clone().unwrap_or_else(|| current.label.clone()),
            update.kind.unwrap_or(current.kind),
        );
        submission.definition = update.definition.clone().or_else(|| current.definition.clone());
        submission.comment = update.comment.clone().or_else(|| current.comment.clone());
        submission.superclasses = superclass_tid
            .map(SuperclassRef::from_tid)
            .into_iter()
            .collect();
        submission.synonyms = synonyms;
        submission.existing_ids = existing_ids;
        submission.version = Some(current.version);

        match self.transport.edit_entity(current.row_id, &submission)? {
            CallOutcome::Ok(returned) => self.get_entity(&returned),
            CallOutcome::Conflict(_) => Err(ClientError::AlreadyExists {
                label: submission.label,
            }),
            CallOutcome::NotFound => Err(ClientError::EntityDoesNotExist { id: id.curie() }),
            CallOutcome::Fatal { status, detail } => Err(ClientError::rejected(status, detail)),
        }
    }

    /// Attaches an annotation; see [`LinkManager::add_annotation`].
    pub fn add_annotation(
        &self,
        subject: &EntityId,
        annotation: &EntityId,
        value: &str,
    ) -> ClientResult<AnnotationLink> {
        self.links().add_annotation(subject, annotation, value)
    }

    /// Detaches an annotation; see [`LinkManager::delete_annotation`].
    pub fn delete_annotation(
        &self,
        subject: &EntityId,
        annotation: &EntityId,
        value: &str,
    ) -> ClientResult<Option<AnnotationLink>> {
        self.links().delete_annotation(subject, annotation, value)
    }

    /// Links two entities; see [`LinkManager::add_relationship`].
    pub fn add_relationship(
        &self,
        entity1: &EntityId,
        relationship: &EntityId,
        entity2: &EntityId,
    ) -> ClientResult<RelationshipLink> {
        self.links().add_relationship(entity1, relationship, entity2)
    }

    /// Unlinks two entities; see [`LinkManager::delete_relationship`].
    pub fn delete_relationship(
        &self,
        entity1: &EntityId,
        relationship: &EntityId,
        entity2: &EntityId,
    ) -> ClientResult<Option<RelationshipLink>> {
        self.links()
            .delete_relationship(entity1, relationship, entity2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryBackend;
    use ontosync_model::EntityKind;

    fn client() -> SyncClient<MemoryBackend> {
        SyncClient::new(MemoryBackend::new(AccountId::new(1))).unwrap()
    }

    #[test]
    fn construction_probes_account() {
        let client = client();
        assert_eq!(client.account(), AccountId::new(1));
        assert_eq!(client.transport().calls(), 1);
    }

    #[test]
    fn invalid_input_never_reaches_transport() {
        let client = client();
        let calls_after_probe = client.transport().calls();

        let err = client
            .create_entity(&NewEntity::new("", EntityKind::Term))
            .unwrap_err();
        assert!(matches!(err, ClientError::InvalidEntityShape(_)));
        assert_eq!(client.transport().calls(), calls_after_probe);
    }

    #[test]
    fn missing_superclass_aborts_before_reservation() {
        let client = client();
        let ghost = EntityId::parse("ont_9999999").unwrap();
        let mutations_before = client.transport().mutations();

        let err = client
            .create_entity(&NewEntity::new("brain", EntityKind::Term).with_superclass(ghost))
            .unwrap_err();
        assert!(matches!(err, ClientError::ReferenceNotFound { .. }));
        assert_eq!(client.transport().mutations(), mutations_before);
    }

    #[test]
    fn empty_update_is_a_fetch() {
        let client = client();
        let created = client
            .create_entity(&NewEntity::new("brain", EntityKind::Term))
            .unwrap();

        let mutations_before = client.transport().mutations();
        let fetched = client
            .update_entity(&created.id, &EntityUpdate::new())
            .unwrap();
        assert_eq!(fetched, created);
        assert_eq!(client.transport().mutations(), mutations_before);
    }

    #[test]
    fn batch_uses_configured_width() {
        let client = client();
        // Width comes from the client, not the call site; results keep
        // input order regardless.
        let doubled = client.batch((0..7).collect(), |_, n: u32| n * 2);
        assert_eq!(doubled, (0..7).map(|n| n * 2).collect::<Vec<_>>());
    }

    #[test]
    fn unknown_entity_errors() {
        let client = client();
        let ghost = EntityId::parse("ont_0000404").unwrap();
        let err = client.get_entity(&ghost).unwrap_err();
        assert!(matches!(
            err,
            ClientError::EntityDoesNotExist { id } if id == "ONT:0000404"
        ));
    }
}
