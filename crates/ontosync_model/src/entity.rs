//! Entities, their sub-records, and link records.

use crate::error::ModelError;
use crate::id::EntityId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identifier for a submitting account.
///
/// Labels are unique per account, not globally: the same label may exist
/// many times in the store, owned by different accounts. Only a match owned
/// by this account counts as "already created by me".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AccountId(pub u64);

impl AccountId {
    /// Creates a new account ID.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw ID value.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "acct:{}", self.0)
    }
}

/// The controlled vocabulary of entity kinds.
///
/// The store only accepts the lowercase forms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    /// An ordinary ontology term.
    Term,
    /// An annotation type, usable as the predicate of an annotation link.
    Annotation,
    /// A relationship type, usable as the predicate of a relationship link.
    Relationship,
    /// Common data element.
    Cde,
    /// Federated data element.
    Fde,
    /// Personal data element.
    Pde,
}

impl EntityKind {
    /// All kinds, in the order the store documents them.
    pub const ALL: [EntityKind; 6] = [
        EntityKind::Term,
        EntityKind::Annotation,
        EntityKind::Relationship,
        EntityKind::Cde,
        EntityKind::Fde,
        EntityKind::Pde,
    ];

    /// Returns the lowercase wire form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            EntityKind::Term => "term",
            EntityKind::Annotation => "annotation",
            EntityKind::Relationship => "relationship",
            EntityKind::Cde => "cde",
            EntityKind::Fde => "fde",
            EntityKind::Pde => "pde",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = ModelError;

    // Case-insensitive: the store itself only takes lowercase, so parsing
    // folds before matching rather than bouncing mixed-case input.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "term" => Ok(EntityKind::Term),
            "annotation" => Ok(EntityKind::Annotation),
            "relationship" => Ok(EntityKind::Relationship),
            "cde" => Ok(EntityKind::Cde),
            "fde" => Ok(EntityKind::Fde),
            "pde" => Ok(EntityKind::Pde),
            _ => Err(ModelError::unknown_kind(s)),
        }
    }
}

/// A synonym sub-record.
///
/// Deduplication key is the literal; the classifier is a secondary
/// attribute that merge logic may overwrite or fill.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Synonym {
    /// The synonym text.
    pub literal: String,
    /// Optional classifier, e.g. `obo:hasExactSynonym`.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

impl Synonym {
    /// Creates a synonym with no classifier.
    pub fn new(literal: impl Into<String>) -> Self {
        Self {
            literal: literal.into(),
            kind: None,
        }
    }

    /// Creates a synonym with a classifier.
    pub fn with_kind(literal: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            literal: literal.into(),
            kind: Some(kind.into()),
        }
    }

    /// Returns true if the classifier is set to a non-empty value.
    ///
    /// The store round-trips an absent classifier as `""`, so both forms
    /// count as unset.
    #[must_use]
    pub fn has_kind(&self) -> bool {
        self.kind.as_deref().is_some_and(|k| !k.is_empty())
    }
}

/// An external-identifier sub-record mapping this entity to another
/// vocabulary.
///
/// Deduplication key is the iri.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExistingId {
    /// Full IRI of the external identifier.
    pub iri: String,
    /// Compact curie form of the external identifier.
    pub curie: String,
    /// Whether this is the preferred identifier for the entity.
    #[serde(default, with = "flag")]
    pub preferred: bool,
}

impl ExistingId {
    /// Creates a non-preferred external identifier.
    pub fn new(iri: impl Into<String>, curie: impl Into<String>) -> Self {
        Self {
            iri: iri.into(),
            curie: curie.into(),
            preferred: false,
        }
    }

    /// Marks this identifier as preferred.
    #[must_use]
    pub fn preferred(mut self) -> Self {
        self.preferred = true;
        self
    }
}

/// Serde adapter for the store's `"0"` / `"1"` flag strings.
///
/// Responses are not consistent about the type: the same flag comes back
/// as a string, a number, or a bool depending on which endpoint answered.
mod flag {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &bool, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(if *value { "1" } else { "0" })
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Bool(bool),
            Int(i64),
            Str(String),
        }
        Ok(match Option::<Raw>::deserialize(deserializer)? {
            None => false,
            Some(Raw::Bool(b)) => b,
            Some(Raw::Int(i)) => i != 0,
            Some(Raw::Str(s)) => s == "1" || s.eq_ignore_ascii_case("true"),
        })
    }
}

/// A fully materialized entity record, normalized from whichever endpoint
/// shape it arrived in.
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    /// Prefixed identifier, always in canonical internal form.
    pub id: EntityId,
    /// The store's internal numeric row id; link triples reference this.
    pub row_id: u64,
    /// The label, unique per owning account.
    pub label: String,
    /// Entity kind.
    pub kind: EntityKind,
    /// Optional definition text.
    pub definition: Option<String>,
    /// Optional curator comment.
    pub comment: Option<String>,
    /// Optional superclass reference.
    pub superclass: Option<EntityId>,
    /// Synonym sub-records.
    pub synonyms: Vec<Synonym>,
    /// External-identifier sub-records.
    pub existing_ids: Vec<ExistingId>,
    /// The account that created the entity.
    pub owner: AccountId,
    /// The store's edit version counter at fetch time.
    pub version: u64,
}

impl Entity {
    /// Renders the entity's curie form.
    #[must_use]
    pub fn curie(&self) -> String {
        self.id.curie()
    }
}

/// A directed annotation link.
///
/// Identity is the composite `(subject, annotation type, value)`; two links
/// differing only in value are distinct links, not versions of one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotationLink {
    /// The store's row id for the link itself.
    pub link_id: u64,
    /// Row id of the annotated entity.
    pub subject_tid: u64,
    /// Row id of the annotation-type entity.
    pub annotation_tid: u64,
    /// The annotation value.
    pub value: String,
}

impl AnnotationLink {
    /// Returns true if this link matches the given composite key.
    #[must_use]
    pub fn matches(&self, subject_tid: u64, annotation_tid: u64, value: &str) -> bool {
        self.subject_tid == subject_tid
            && self.annotation_tid == annotation_tid
            && self.value == value
    }
}

/// A directed relationship link.
///
/// Identity is the composite of all three entity row ids; there is no value
/// payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationshipLink {
    /// The store's row id for the link itself.
    pub link_id: u64,
    /// Row id of the first entity.
    pub entity1_tid: u64,
    /// Row id of the relationship-type entity.
    pub relationship_tid: u64,
    /// Row id of the second entity.
    pub entity2_tid: u64,
}

impl RelationshipLink {
    /// Returns true if this link matches the given composite key.
    #[must_use]
    pub fn matches(&self, entity1_tid: u64, relationship_tid: u64, entity2_tid: u64) -> bool {
        self.entity1_tid == entity1_tid
            && self.relationship_tid == relationship_tid
            && self.entity2_tid == entity2_tid
    }
}
