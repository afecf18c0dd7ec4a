//! Wire payload structs.
//!
//! Decoding is deliberately lenient about scalar types: the store renders
//! the same numeric id as a number, a quoted string, or `false` depending
//! on which endpoint produced the response. Everything is normalized into
//! the typed model here, at the boundary, and nowhere else.

use crate::error::{ProtocolError, ProtocolResult};
use ontosync_model::{
    AccountId, AnnotationLink, Entity, EntityId, EntityKind, ExistingId, RelationshipLink, Synonym,
};
use serde::{Deserialize, Serialize};

/// The sentinel written into a link's payload fields by a blank-out edit.
///
/// The store has no row deletion; a "deleted" link is one whose fields hold
/// this value.
pub const BLANK_FIELD: &str = " ";

/// Account details returned by the user-info probe.
#[derive(Debug, Clone, Deserialize)]
pub struct UserInfo {
    /// Numeric account id.
    #[serde(deserialize_with = "lenient::u64_required")]
    pub id: u64,
}

impl UserInfo {
    /// Returns the account identifier.
    #[must_use]
    pub fn account(&self) -> AccountId {
        AccountId::new(self.id)
    }
}

/// Response of the identifier-reservation endpoint.
///
/// Older deployments answer with `ilx`, newer ones with `fragment`; both
/// carry the reserved identifier.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReservedId {
    /// The reserved identifier (older shape).
    #[serde(default)]
    pub ilx: Option<String>,
    /// The reserved identifier (newer shape).
    #[serde(default)]
    pub fragment: Option<String>,
}

impl ReservedId {
    /// Extracts the reserved identifier from whichever field carries it.
    pub fn entity_id(&self) -> ProtocolResult<EntityId> {
        let raw = self
            .ilx
            .as_deref()
            .or(self.fragment.as_deref())
            .ok_or(ProtocolError::IncompleteRecord { field: "ilx" })?;
        Ok(EntityId::parse(raw)?)
    }
}

/// A superclass reference, in either of the shapes the store uses.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SuperclassRef {
    /// Prefixed identifier (present in fetched records).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ilx: Option<String>,
    /// Numeric row id (the only field edit submissions accept).
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient::opt_u64"
    )]
    pub superclass_tid: Option<u64>,
}

impl SuperclassRef {
    /// Builds the submission shape from a resolved row id.
    #[must_use]
    pub fn from_tid(tid: u64) -> Self {
        Self {
            ilx: None,
            superclass_tid: Some(tid),
        }
    }
}

/// Whole-record entity submission, used by both the populate step of
/// creation and by edits (the store has no incremental field edits).
#[derive(Debug, Clone, Serialize)]
pub struct EntitySubmission {
    /// Entity label.
    pub label: String,
    /// Entity kind, lowercase on the wire.
    #[serde(rename = "type")]
    pub kind: EntityKind,
    /// Definition, omitted when untouched.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub definition: Option<String>,
    /// Comment, omitted when untouched.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    /// Superclass references by row id.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub superclasses: Vec<SuperclassRef>,
    /// Full synonym list.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub synonyms: Vec<Synonym>,
    /// Full external-identifier list.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub existing_ids: Vec<ExistingId>,
    /// Reserved identifier, attached when populating a fresh reservation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ilx: Option<String>,
    /// Submitting account id; the store does not fill this in on its own.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uid: Option<u64>,
    /// Version counter carried over from the fetch an edit is based on.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<u64>,
}

impl EntitySubmission {
    /// Creates a minimal submission.
    pub fn new(label: impl Into<String>, kind: EntityKind) -> Self {
        Self {
            label: label.into(),
            kind,
            definition: None,
            comment: None,
            superclasses: Vec::new(),
            synonyms: Vec::new(),
            existing_ids: Vec::new(),
            ilx: None,
            uid: None,
            version: None,
        }
    }
}

/// A fetched entity record, in whichever shape the endpoint produced.
#[derive(Debug, Clone, Deserialize)]
pub struct EntityRecord {
    /// Numeric row id; absent or `false` when the record does not exist.
    #[serde(default, deserialize_with = "lenient::opt_u64")]
    pub id: Option<u64>,
    /// Prefixed identifier.
    #[serde(default)]
    pub ilx: Option<String>,
    /// Label.
    #[serde(default)]
    pub label: String,
    /// Kind string.
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    /// Definition; the store writes `""` for unset.
    #[serde(default)]
    pub definition: Option<String>,
    /// Comment; the store writes `""` for unset.
    #[serde(default)]
    pub comment: Option<String>,
    /// Superclass references.
    #[serde(default)]
    pub superclasses: Vec<SuperclassRef>,
    /// Synonym sub-records.
    #[serde(default)]
    pub synonyms: Vec<Synonym>,
    /// External-identifier sub-records.
    #[serde(default)]
    pub existing_ids: Vec<ExistingId>,
    /// Owning account id.
    #[serde(default, deserialize_with = "lenient::opt_u64")]
    pub uid: Option<u64>,
    /// Edit version counter.
    #[serde(default, deserialize_with = "lenient::opt_u64")]
    pub version: Option<u64>,
}

impl EntityRecord {
    /// Returns true if the record denotes a nonexistent entity.
    ///
    /// The lookup endpoint answers 200 with a husk record instead of 404.
    #[must_use]
    pub fn is_missing(&self) -> bool {
        matches!(self.id, None | Some(0))
    }

    /// Normalizes the record into the typed model.
    pub fn into_entity(self) -> ProtocolResult<Entity> {
        let row_id = match self.id {
            Some(id) if id != 0 => id,
            _ => return Err(ProtocolError::IncompleteRecord { field: "id" }),
        };
        let ilx = self
            .ilx
            .as_deref()
            .ok_or(ProtocolError::IncompleteRecord { field: "ilx" })?;
        let id = EntityId::parse(ilx)?;
        let kind: EntityKind = self
            .kind
            .as_deref()
            .ok_or(ProtocolError::IncompleteRecord { field: "type" })?
            .parse()
            .map_err(ProtocolError::Model)?;
        let owner = self
            .uid
            .map(AccountId::new)
            .ok_or(ProtocolError::IncompleteRecord { field: "uid" })?;
        let superclass = self
            .superclasses
            .iter()
            .find_map(|sc| sc.ilx.as_deref())
            .map(EntityId::parse)
            .transpose()?;
        Ok(Entity {
            id,
            row_id,
            label: self.label,
            kind,
            definition: none_if_empty(self.definition),
            comment: none_if_empty(self.comment),
            superclass,
            synonyms: self.synonyms,
            existing_ids: self.existing_ids,
            owner,
            version: self.version.unwrap_or(0),
        })
    }
}

/// One hit from the label-search endpoint; a skeleton, not a full record.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchHit {
    /// Prefixed identifier of the hit.
    #[serde(default)]
    pub ilx: Option<String>,
    /// Label of the hit.
    #[serde(default)]
    pub label: String,
}

/// Submission for a new annotation link.
#[derive(Debug, Clone, Serialize)]
pub struct AnnotationSubmission {
    /// Row id of the annotated entity.
    pub tid: u64,
    /// Row id of the annotation-type entity.
    pub annotation_tid: u64,
    /// The annotation value.
    pub value: String,
    /// Version of the annotated entity at fetch time.
    pub term_version: u64,
    /// Version of the annotation-type entity at fetch time.
    pub annotation_term_version: u64,
    /// Submitting account; the store does not fill this in on its own.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub orig_uid: Option<u64>,
}

/// A fetched annotation link row.
#[derive(Debug, Clone, Deserialize)]
pub struct AnnotationRecord {
    /// Row id of the link itself.
    #[serde(default, deserialize_with = "lenient::u64_or_zero")]
    pub id: u64,
    /// Row id of the annotated entity; `0` after a blank-out.
    #[serde(default, deserialize_with = "lenient::u64_or_zero")]
    pub tid: u64,
    /// Row id of the annotation-type entity; `0` after a blank-out.
    #[serde(default, deserialize_with = "lenient::u64_or_zero")]
    pub annotation_tid: u64,
    /// The annotation value.
    #[serde(default)]
    pub value: String,
}

impl AnnotationRecord {
    /// Converts into the typed link.
    #[must_use]
    pub fn into_link(self) -> AnnotationLink {
        AnnotationLink {
            link_id: self.id,
            subject_tid: self.tid,
            annotation_tid: self.annotation_tid,
            value: self.value,
        }
    }
}

/// Submission for a new relationship link.
#[derive(Debug, Clone, Serialize)]
pub struct RelationshipSubmission {
    /// Row id of the first entity.
    pub term1_id: u64,
    /// Row id of the relationship-type entity.
    pub relationship_tid: u64,
    /// Row id of the second entity.
    pub term2_id: u64,
    /// Version of the first entity at fetch time.
    pub term1_version: u64,
    /// Version of the second entity at fetch time.
    pub term2_version: u64,
    /// Version of the relationship-type entity at fetch time.
    pub relationship_term_version: u64,
    /// Submitting account; the store does not fill this in on its own.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub orig_uid: Option<u64>,
}

/// A fetched relationship link row.
#[derive(Debug, Clone, Deserialize)]
pub struct RelationshipRecord {
    /// Row id of the link itself.
    #[serde(default, deserialize_with = "lenient::u64_or_zero")]
    pub id: u64,
    /// Row id of the first entity; `0` after a blank-out.
    #[serde(default, deserialize_with = "lenient::u64_or_zero")]
    pub term1_id: u64,
    /// Row id of the relationship-type entity; `0` after a blank-out.
    #[serde(default, deserialize_with = "lenient::u64_or_zero")]
    pub relationship_tid: u64,
    /// Row id of the second entity; `0` after a blank-out.
    #[serde(default, deserialize_with = "lenient::u64_or_zero")]
    pub term2_id: u64,
}

impl RelationshipRecord {
    /// Converts into the typed link.
    #[must_use]
    pub fn into_link(self) -> RelationshipLink {
        RelationshipLink {
            link_id: self.id,
            entity1_tid: self.term1_id,
            relationship_tid: self.relationship_tid,
            entity2_tid: self.term2_id,
        }
    }
}

/// Blank-out edit payload for an annotation link.
#[derive(Debug, Clone, Serialize)]
pub struct AnnotationBlank {
    tid: &'static str,
    annotation_tid: &'static str,
    value: &'static str,
    term_version: &'static str,
    annotation_term_version: &'static str,
}

impl AnnotationBlank {
    /// Creates the blank payload.
    #[must_use]
    pub fn new() -> Self {
        Self {
            tid: BLANK_FIELD,
            annotation_tid: BLANK_FIELD,
            value: BLANK_FIELD,
            term_version: BLANK_FIELD,
            annotation_term_version: BLANK_FIELD,
        }
    }
}

impl Default for AnnotationBlank {
    fn default() -> Self {
        Self::new()
    }
}

/// Blank-out edit payload for a relationship link.
#[derive(Debug, Clone, Serialize)]
pub struct RelationshipBlank {
    term1_id: &'static str,
    relationship_tid: &'static str,
    term2_id: &'static str,
    term1_version: &'static str,
    term2_version: &'static str,
    relationship_term_version: &'static str,
}

impl RelationshipBlank {
    /// Creates the blank payload.
    #[must_use]
    pub fn new() -> Self {
        Self {
            term1_id: BLANK_FIELD,
            relationship_tid: BLANK_FIELD,
            term2_id: BLANK_FIELD,
            term1_version: BLANK_FIELD,
            term2_version: BLANK_FIELD,
            relationship_term_version: BLANK_FIELD,
        }
    }
}

impl Default for RelationshipBlank {
    fn default() -> Self {
        Self::new()
    }
}

fn none_if_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.is_empty())
}

/// Lenient scalar decoding for the store's unstable id rendering.
mod lenient {
    use serde::{Deserialize, Deserializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Int(u64),
        Bool(bool),
        Str(String),
    }

    fn normalize(raw: Raw) -> Result<Option<u64>, String> {
        Ok(match raw {
            Raw::Int(n) => Some(n),
            Raw::Bool(true) => Some(1),
            Raw::Bool(false) => None,
            Raw::Str(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    None
                } else {
                    Some(
                        trimmed
                            .parse()
                            .map_err(|_| format!("not a numeric id: {s:?}"))?,
                    )
                }
            }
        })
    }

    pub fn opt_u64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u64>, D::Error> {
        match Option::<Raw>::deserialize(deserializer)? {
            None => Ok(None),
            Some(raw) => normalize(raw).map_err(serde::de::Error::custom),
        }
    }

    pub fn u64_or_zero<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
        Ok(opt_u64(deserializer)?.unwrap_or(0))
    }

    pub fn u64_required<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
        opt_u64(deserializer)?.ok_or_else(|| serde::de::Error::custom("missing numeric id"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entity_record_full_shape() {
        let raw = r#"{
            "id": "101",
            "ilx": "tmp_0738406",
            "label": "brain",
            "type": "term",
            "definition": "Part of the central nervous system",
            "comment": "",
            "superclasses": [{"ilx": "ont_0108124", "superclass_tid": "55"}],
            "synonyms": [{"literal": "Encephalon", "type": ""}],
            "existing_ids": [
                {"iri": "http://uri.neuinfo.org/nif/nifstd/birnlex_796",
                 "curie": "BIRNLEX:796", "preferred": "1"}
            ],
            "uid": 34142,
            "version": "3"
        }"#;
        let record: EntityRecord = serde_json::from_str(raw).unwrap();
        assert!(!record.is_missing());
        let entity = record.into_entity().unwrap();
        assert_eq!(entity.row_id, 101);
        assert_eq!(entity.id.to_string(), "tmp_0738406");
        assert_eq!(entity.kind, EntityKind::Term);
        // Empty comment normalizes away.
        assert_eq!(entity.comment, None);
        assert_eq!(entity.superclass.unwrap().to_string(), "ont_0108124");
        assert_eq!(entity.owner, AccountId::new(34142));
        assert_eq!(entity.version, 3);
        assert!(entity.existing_ids[0].preferred);
    }

    #[test]
    fn entity_record_husk_for_missing() {
        let record: EntityRecord = serde_json::from_str(r#"{"id": false}"#).unwrap();
        assert!(record.is_missing());
        assert!(record.into_entity().is_err());
    }

    #[test]
    fn reserved_id_both_shapes() {
        let old: ReservedId = serde_json::from_str(r#"{"ilx": "tmp_123"}"#).unwrap();
        assert_eq!(old.entity_id().unwrap().to_string(), "tmp_123");

        let new: ReservedId = serde_json::from_str(r#"{"fragment": "tmp_456"}"#).unwrap();
        assert_eq!(new.entity_id().unwrap().to_string(), "tmp_456");

        let neither = ReservedId::default();
        assert!(neither.entity_id().is_err());
    }

    #[test]
    fn annotation_record_blanked_row() {
        let raw = r#"{"id": 9, "tid": " ", "annotation_tid": " ", "value": " "}"#;
        let record: AnnotationRecord = serde_json::from_str(raw).unwrap();
        let link = record.into_link();
        // Blanked rows keep their row id but match no real composite key.
        assert_eq!(link.link_id, 9);
        assert_eq!(link.subject_tid, 0);
        assert_eq!(link.annotation_tid, 0);
    }

    #[test]
    fn blank_payload_shapes() {
        let json = serde_json::to_value(AnnotationBlank::new()).unwrap();
        assert_eq!(json["tid"], BLANK_FIELD);
        assert_eq!(json["value"], BLANK_FIELD);

        let json = serde_json::to_value(RelationshipBlank::new()).unwrap();
        assert_eq!(json["term1_id"], BLANK_FIELD);
        assert_eq!(json["relationship_term_version"], BLANK_FIELD);
    }

    #[test]
    fn submission_omits_untouched_fields() {
        let submission = EntitySubmission::new("brain", EntityKind::Term);
        let json = serde_json::to_value(&submission).unwrap();
        assert_eq!(json["label"], "brain");
        assert_eq!(json["type"], "term");
        assert!(json.get("definition").is_none());
        assert!(json.get("superclasses").is_none());
        assert!(json.get("version").is_none());
    }
}
