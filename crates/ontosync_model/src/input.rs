//! Per-operation input structs.
//!
//! Each public client operation takes its own struct rather than a grab-bag
//! of optional arguments. For updates, `Option` distinguishes "leave this
//! field alone" from "set it", which matters because setting a field to an
//! empty string is a real edit on a store that has no delete, only blank-out.

use crate::entity::{EntityKind, ExistingId, Synonym};
use crate::error::{ModelError, ModelResult};
use crate::id::EntityId;

/// Input for creating an entity.
#[derive(Debug, Clone, PartialEq)]
pub struct NewEntity {
    /// Required label, unique per submitting account.
    pub label: String,
    /// Required kind from the controlled vocabulary.
    pub kind: EntityKind,
    /// Optional definition text.
    pub definition: Option<String>,
    /// Optional curator comment.
    pub comment: Option<String>,
    /// Optional superclass reference, resolved before any mutation.
    pub superclass: Option<EntityId>,
    /// Synonyms to attach at creation.
    pub synonyms: Vec<Synonym>,
    /// External identifiers to attach at creation.
    pub existing_ids: Vec<ExistingId>,
}

impl NewEntity {
    /// Creates a minimal new-entity input.
    pub fn new(label: impl Into<String>, kind: EntityKind) -> Self {
        Self {
            label: label.into(),
            kind,
            definition: None,
            comment: None,
            superclass: None,
            synonyms: Vec::new(),
            existing_ids: Vec::new(),
        }
    }

    /// Sets the definition.
    #[must_use]
    pub fn with_definition(mut self, definition: impl Into<String>) -> Self {
        self.definition = Some(definition.into());
        self
    }

    /// Sets the comment.
    #[must_use]
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    /// Sets the superclass reference.
    #[must_use]
    pub fn with_superclass(mut self, superclass: EntityId) -> Self {
        self.superclass = Some(superclass);
        self
    }

    /// Appends a synonym.
    #[must_use]
    pub fn with_synonym(mut self, synonym: Synonym) -> Self {
        self.synonyms.push(synonym);
        self
    }

    /// Appends an external identifier.
    #[must_use]
    pub fn with_existing_id(mut self, existing_id: ExistingId) -> Self {
        self.existing_ids.push(existing_id);
        self
    }

    /// Validates the input shape locally.
    ///
    /// Runs before any remote call: a rejected input never touches the
    /// network.
    pub fn validate(&self) -> ModelResult<()> {
        if self.label.trim().is_empty() {
            return Err(ModelError::MissingLabel);
        }
        validate_sub_records(&self.label, &self.synonyms, &self.existing_ids)
    }
}

/// Input for partially updating an entity.
///
/// Scalar fields set to `None` keep their current value. Additions are
/// applied before deletions, so adding and deleting the same key in one
/// update nets to absence.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntityUpdate {
    /// New label, if supplied.
    pub label: Option<String>,
    /// New kind, if supplied.
    pub kind: Option<EntityKind>,
    /// New definition, if supplied (empty string blanks it).
    pub definition: Option<String>,
    /// New comment, if supplied (empty string blanks it).
    pub comment: Option<String>,
    /// New superclass reference, if supplied.
    pub superclass: Option<EntityId>,
    /// Synonyms to merge in, keyed on literal.
    pub add_synonyms: Vec<Synonym>,
    /// Synonyms to drop, keyed on literal.
    pub delete_synonyms: Vec<Synonym>,
    /// External identifiers to merge in, keyed on iri.
    pub add_existing_ids: Vec<ExistingId>,
    /// External identifiers to drop, keyed on iri.
    pub delete_existing_ids: Vec<ExistingId>,
}

impl EntityUpdate {
    /// Creates an empty update.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a new label.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Sets a new kind.
    #[must_use]
    pub fn with_kind(mut self, kind: EntityKind) -> Self {
        self.kind = Some(kind);
        self
    }

    /// Sets a new definition.
    #[must_use]
    pub fn with_definition(mut self, definition: impl Into<String>) -> Self {
        self.definition = Some(definition.into());
        self
    }

    /// Sets a new comment.
    #[must_use]
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    /// Sets a new superclass reference.
    #[must_use]
    pub fn with_superclass(mut self, superclass: EntityId) -> Self {
        self.superclass = Some(superclass);
        self
    }

    /// Queues a synonym addition.
    #[must_use]
    pub fn add_synonym(mut self, synonym: Synonym) -> Self {
        self.add_synonyms.push(synonym);
        self
    }

    /// Queues a synonym deletion.
    #[must_use]
    pub fn delete_synonym(mut self, synonym: Synonym) -> Self {
        self.delete_synonyms.push(synonym);
        self
    }

    /// Queues an external-identifier addition.
    #[must_use]
    pub fn add_existing_id(mut self, existing_id: ExistingId) -> Self {
        self.add_existing_ids.push(existing_id);
        self
    }

    /// Queues an external-identifier deletion.
    #[must_use]
    pub fn delete_existing_id(mut self, existing_id: ExistingId) -> Self {
        self.delete_existing_ids.push(existing_id);
        self
    }

    /// Returns true if the update changes nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.label.is_none()
            && self.kind.is_none()
            && self.definition.is_none()
            && self.comment.is_none()
            && self.superclass.is_none()
            && self.add_synonyms.is_empty()
            && self.delete_synonyms.is_empty()
            && self.add_existing_ids.is_empty()
            && self.delete_existing_ids.is_empty()
    }

    /// Validates the update shape locally.
    pub fn validate(&self) -> ModelResult<()> {
        // Blanking the label is not an edit the store can represent.
        if let Some(label) = &self.label {
            if label.trim().is_empty() {
                return Err(ModelError::MissingLabel);
            }
        }
        let label = self.label.as_deref().unwrap_or("");
        validate_sub_records(label, &self.add_synonyms, &self.add_existing_ids)
    }
}

fn validate_sub_records(
    label: &str,
    synonyms: &[Synonym],
    existing_ids: &[ExistingId],
) -> ModelResult<()> {
    for synonym in synonyms {
        if synonym.literal.trim().is_empty() {
            return Err(ModelError::EmptySynonym {
                label: label.to_string(),
            });
        }
    }
    for existing_id in existing_ids {
        if existing_id.iri.trim().is_empty() {
            return Err(ModelError::IncompleteExistingId {
                label: label.to_string(),
                field: "iri",
            });
        }
        if existing_id.curie.trim().is_empty() {
            return Err(ModelError::IncompleteExistingId {
                label: label.to_string(),
                field: "curie",
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_entity_builder() {
        let superclass = EntityId::parse("ont_0108124").unwrap();
        let input = NewEntity::new("brain", EntityKind::Term)
            .with_definition("Part of the central nervous system")
            .with_comment("Cannot live without it")
            .with_superclass(superclass.clone())
            .with_synonym(Synonym::new("Encephalon"))
            .with_existing_id(ExistingId::new(
                "http://uri.neuinfo.org/nif/nifstd/birnlex_796",
                "BIRNLEX:796",
            ));

        assert_eq!(input.label, "brain");
        assert_eq!(input.superclass, Some(superclass));
        assert_eq!(input.synonyms.len(), 1);
        input.validate().unwrap();
    }

    #[test]
    fn new_entity_requires_label() {
        assert_eq!(
            NewEntity::new("", EntityKind::Term).validate(),
            Err(ModelError::MissingLabel)
        );
        assert_eq!(
            NewEntity::new("   ", EntityKind::Term).validate(),
            Err(ModelError::MissingLabel)
        );
    }

    #[test]
    fn new_entity_rejects_malformed_sub_records() {
        let input = NewEntity::new("brain", EntityKind::Term).with_synonym(Synonym::new(""));
        assert!(matches!(
            input.validate(),
            Err(ModelError::EmptySynonym { .. })
        ));

        let input =
            NewEntity::new("brain", EntityKind::Term).with_existing_id(ExistingId::new("", "X:1"));
        assert!(matches!(
            input.validate(),
            Err(ModelError::IncompleteExistingId { field: "iri", .. })
        ));

        let input = NewEntity::new("brain", EntityKind::Term)
            .with_existing_id(ExistingId::new("http://x.org/1", ""));
        assert!(matches!(
            input.validate(),
            Err(ModelError::IncompleteExistingId { field: "curie", .. })
        ));
    }

    #[test]
    fn update_empty_and_omitted() {
        let update = EntityUpdate::new();
        assert!(update.is_empty());
        update.validate().unwrap();

        // Setting a field to empty is an edit, not an omission.
        let update = EntityUpdate::new().with_definition("");
        assert!(!update.is_empty());
        update.validate().unwrap();

        let update = EntityUpdate::new().with_label("  ");
        assert_eq!(update.validate(), Err(ModelError::MissingLabel));
    }
}
