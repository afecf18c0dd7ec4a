//! Recovery of an account's own record after a duplicate-label conflict.
//!
//! The store reports a duplicate label with a bare error message and no
//! pointer to the colliding record. Label search is the only way back to
//! it, and search is crude: it returns fuzzy hits as skeletons. The
//! resolver narrows hits to an exact label match, fetches the full record,
//! and accepts it only if the submitting account owns it.

use crate::error::{ClientError, ClientResult};
use crate::transport::ApiTransport;
use ontosync_model::{AccountId, Entity, EntityId};
use ontosync_protocol::CallOutcome;

/// Resolves duplicate-label conflicts back to an owned record.
pub struct DuplicateResolver<'a, T: ApiTransport + ?Sized> {
    transport: &'a T,
    account: AccountId,
}

impl<'a, T: ApiTransport + ?Sized> DuplicateResolver<'a, T> {
    /// Creates a resolver scoped to one account.
    pub fn new(transport: &'a T, account: AccountId) -> Self {
        Self { transport, account }
    }

    /// Looks for an entity with this exact label owned by the account.
    ///
    /// Returns `None` when every colliding record belongs to someone else;
    /// label uniqueness is per account, so a foreign match is not ours to
    /// reuse.
    pub fn recover_own(&self, label: &str) -> ClientResult<Option<Entity>> {
        let wanted = normalize_label(label);
        let hits = self.transport.search_label(label)?;
        tracing::debug!(label, hits = hits.len(), "scanning label collisions");

        for hit in hits {
            if normalize_label(&hit.label) != wanted {
                continue;
            }
            let Some(raw_id) = hit.ilx.as_deref() else {
                continue;
            };
            let id = EntityId::parse(raw_id)
                .map_err(|e| ClientError::BadResponse(e.into()))?;
            match self.transport.entity_by_id(&id)? {
                CallOutcome::Ok(entity) if entity.owner == self.account => {
                    tracing::debug!(id = %entity.id, "collision resolved to own record");
                    return Ok(Some(entity));
                }
                // Foreign owner, or a hit the store no longer serves.
                CallOutcome::Ok(_) | CallOutcome::NotFound => continue,
                CallOutcome::Conflict(detail) => {
                    return Err(ClientError::rejected(400, detail));
                }
                CallOutcome::Fatal { status, detail } => {
                    return Err(ClientError::rejected(status, detail));
                }
            }
        }
        Ok(None)
    }
}

/// Case- and whitespace-insensitive label comparison key.
fn normalize_label(label: &str) -> String {
    label.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryBackend;
    use ontosync_model::EntityKind;

    #[test]
    fn finds_own_record_among_fuzzy_hits() {
        let account = AccountId::new(1);
        let backend = MemoryBackend::new(account);
        backend.seed_entity("brain stem", EntityKind::Term, account);
        let own = backend.seed_entity("brain", EntityKind::Term, account);

        let resolver = DuplicateResolver::new(&backend, account);
        let found = resolver.recover_own("Brain").unwrap();
        assert_eq!(found.map(|e| e.id), Some(own.id));
    }

    #[test]
    fn foreign_match_is_not_recovered() {
        let account = AccountId::new(1);
        let backend = MemoryBackend::new(account);
        backend.seed_entity("brain", EntityKind::Term, AccountId::new(2));

        let resolver = DuplicateResolver::new(&backend, account);
        assert!(resolver.recover_own("brain").unwrap().is_none());
    }

    #[test]
    fn label_normalization_collapses_whitespace() {
        assert_eq!(normalize_label("  Brain   Stem "), "brain stem");
        assert_eq!(normalize_label("brain stem"), "brain stem");
    }
}
