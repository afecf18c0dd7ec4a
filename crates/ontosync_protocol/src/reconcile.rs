//! Record-set reconciliation for list-valued sub-records.
//!
//! Other accounts edit the same entities concurrently, and the store has no
//! incremental list edits: every update submits the whole record. These
//! helpers compute the submitted list from the freshly fetched one, so an
//! update adds or amends records without destroying entries another writer
//! appended since the last fetch.

use ontosync_model::{ExistingId, Synonym};

/// Merges `incoming` records into `reference` keyed by a projection.
///
/// Each incoming record either folds into the reference record sharing its
/// key (`fold` decides what, if anything, to take from it) or is appended.
/// Reference records keep their order; appended records follow in incoming
/// order. An empty reference returns `incoming` verbatim.
pub fn merge_by<T, K, KF, FF>(reference: &[T], incoming: &[T], key: KF, mut fold: FF) -> Vec<T>
where
    T: Clone,
    K: PartialEq,
    KF: Fn(&T) -> K,
    FF: FnMut(&mut T, &T),
{
    if reference.is_empty() {
        return incoming.to_vec();
    }
    let mut merged = reference.to_vec();
    for record in incoming {
        let record_key = key(record);
        match merged.iter().position(|existing| key(existing) == record_key) {
            Some(i) => fold(&mut merged[i], record),
            None => merged.push(record.clone()),
        }
    }
    merged
}

/// Drops every reference record whose projected key matches a record in
/// `to_remove`; everything else passes through unchanged.
pub fn remove_by<T, K, KF>(reference: &[T], to_remove: &[T], key: KF) -> Vec<T>
where
    T: Clone,
    K: PartialEq,
    KF: Fn(&T) -> K,
{
    reference
        .iter()
        .filter(|record| !to_remove.iter().any(|gone| key(gone) == key(record)))
        .cloned()
        .collect()
}

/// Merges synonym lists keyed on literal.
///
/// The classifier is the secondary attribute: non-passive merges take the
/// incoming classifier whenever it is set; passive merges only fill a
/// classifier the reference record does not have yet. An unset incoming
/// classifier never clobbers a set one.
#[must_use]
pub fn merge_synonyms(reference: &[Synonym], incoming: &[Synonym], passive: bool) -> Vec<Synonym> {
    merge_by(
        reference,
        incoming,
        |synonym| synonym.literal.clone(),
        |existing, incoming| {
            if incoming.has_kind() && (!passive || !existing.has_kind()) {
                existing.kind = incoming.kind.clone();
            }
        },
    )
}

/// Drops synonyms keyed on literal.
#[must_use]
pub fn remove_synonyms(reference: &[Synonym], to_remove: &[Synonym]) -> Vec<Synonym> {
    remove_by(reference, to_remove, |synonym| synonym.literal.clone())
}

/// Merges external-identifier lists keyed on iri.
///
/// Curie and the preferred flag are secondary: non-passive merges take a
/// non-empty incoming curie and the incoming flag; passive merges only fill
/// an empty curie and leave the flag alone.
#[must_use]
pub fn merge_existing_ids(
    reference: &[ExistingId],
    incoming: &[ExistingId],
    passive: bool,
) -> Vec<ExistingId> {
    merge_by(
        reference,
        incoming,
        |existing_id| existing_id.iri.clone(),
        |existing, incoming| {
            if !incoming.curie.is_empty() && (!passive || existing.curie.is_empty()) {
                existing.curie = incoming.curie.clone();
            }
            if !passive {
                existing.preferred = incoming.preferred;
            }
        },
    )
}

/// Drops external identifiers keyed on iri.
#[must_use]
pub fn remove_existing_ids(reference: &[ExistingId], to_remove: &[ExistingId]) -> Vec<ExistingId> {
    remove_by(reference, to_remove, |existing_id| existing_id.iri.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn plain(literal: &str) -> Synonym {
        Synonym::with_kind(literal, "")
    }

    fn typed(literal: &str) -> Synonym {
        Synonym::with_kind(literal, "exact")
    }

    #[test]
    fn merge_identity_laws() {
        let records = vec![plain("alt label")];
        assert_eq!(merge_synonyms(&[], &[], false), vec![]);
        assert_eq!(merge_synonyms(&records, &[], false), records);
        assert_eq!(merge_synonyms(&[], &records, false), records);
    }

    #[test]
    fn merge_on_key_matching() {
        // Same literal folds; a set incoming classifier wins over an
        // empty one regardless of direction, and a new literal appends.
        assert_eq!(
            merge_synonyms(&[plain("alt label")], &[typed("alt label")], false),
            vec![typed("alt label")]
        );
        assert_eq!(
            merge_synonyms(&[typed("alt label")], &[plain("alt label")], false),
            vec![typed("alt label")]
        );
        assert_eq!(
            merge_synonyms(&[plain("alt label")], &[typed("alt label 2")], false),
            vec![plain("alt label"), typed("alt label 2")]
        );
    }

    #[test]
    fn merge_passive_preserves_set_classifier() {
        // Passive fills an unset classifier but never replaces a set one.
        assert_eq!(
            merge_synonyms(&[plain("alt label")], &[typed("alt label")], true),
            vec![typed("alt label")]
        );
        let reference = vec![Synonym::with_kind("alt label", "related")];
        assert_eq!(
            merge_synonyms(&reference, &[typed("alt label")], true),
            reference
        );
    }

    #[test]
    fn merge_preserves_reference_order() {
        let reference = vec![plain("a"), plain("b")];
        let incoming = vec![plain("c"), typed("a"), plain("d")];
        let merged = merge_synonyms(&reference, &incoming, false);
        let literals: Vec<&str> = merged.iter().map(|s| s.literal.as_str()).collect();
        assert_eq!(literals, ["a", "b", "c", "d"]);
        assert!(merged[0].has_kind());
    }

    #[test]
    fn remove_basics() {
        let reference = vec![typed("alt label")];
        assert_eq!(remove_synonyms(&[], &[]), vec![]);
        assert_eq!(remove_synonyms(&reference, &[plain("other")]), reference);
        // Keyed on literal alone: classifier mismatch still removes.
        assert_eq!(remove_synonyms(&reference, &[plain("alt label")]), vec![]);
        assert_eq!(remove_synonyms(&reference, &reference), vec![]);
    }

    #[test]
    fn remove_by_composite_key() {
        let reference = vec![typed("alt label")];
        let key = |s: &Synonym| (s.literal.clone(), s.kind.clone());
        // With the classifier in the key, a classifier mismatch no longer
        // matches.
        assert_eq!(remove_by(&reference, &[plain("alt label")], key), reference);
        assert_eq!(remove_by(&reference, &[typed("alt label")], key), vec![]);
    }

    #[test]
    fn existing_id_merge_and_remove() {
        let reference = vec![ExistingId::new("http://x.org/1", "X:1")];
        let incoming = vec![ExistingId::new("http://x.org/1", "XNEW:1").preferred()];
        let merged = merge_existing_ids(&reference, &incoming, false);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].curie, "XNEW:1");
        assert!(merged[0].preferred);

        // Passive keeps the curie already present.
        let merged = merge_existing_ids(&reference, &incoming, true);
        assert_eq!(merged[0].curie, "X:1");
        assert!(!merged[0].preferred);

        let remaining = remove_existing_ids(&merged, &[ExistingId::new("http://x.org/1", "")]);
        assert!(remaining.is_empty());
    }

    fn distinct_synonyms() -> impl Strategy<Value = Vec<Synonym>> {
        proptest::collection::btree_map("[a-z]{1,8}", proptest::option::of("[a-z]{1,6}"), 0..8)
            .prop_map(|map| {
                map.into_iter()
                    .map(|(literal, kind)| Synonym {
                        literal,
                        kind,
                    })
                    .collect()
            })
    }

    proptest! {
        #[test]
        fn prop_merge_with_nothing_is_identity(records in distinct_synonyms()) {
            prop_assert_eq!(merge_synonyms(&records, &[], false), records.clone());
            prop_assert_eq!(merge_synonyms(&[], &records, false), records);
        }

        #[test]
        fn prop_self_removal_empties(records in distinct_synonyms()) {
            prop_assert_eq!(remove_synonyms(&records, &records), vec![]);
        }

        #[test]
        fn prop_merge_then_remove_restores(
            reference in distinct_synonyms(),
            added in distinct_synonyms(),
        ) {
            // Only meaningful when the added keys do not collide with the
            // reference keys.
            let added: Vec<Synonym> = added
                .into_iter()
                .filter(|a| reference.iter().all(|r| r.literal != a.literal))
                .collect();
            let merged = merge_synonyms(&reference, &added, false);
            prop_assert_eq!(remove_synonyms(&merged, &added), reference);
        }
    }
}
