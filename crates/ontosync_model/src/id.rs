//! Prefixed entity identifiers.
//!
//! The backing store only accepts the lowercase, underscore-separated form
//! of an identifier (`ont_0101431`). Callers routinely hold the compact
//! curie form (`ONT:0101431`) or a long-form URI ending in either, so every
//! identifier is normalized once, at the edge, before it is used anywhere.

use crate::error::{ModelError, ModelResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The namespace an identifier was minted in.
///
/// Provisional identifiers belong to records that have not yet been
/// curated; the two namespaces are functionally interchangeable as
/// references.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Namespace {
    /// Curated, permanent records (`ont_` / `ONT:`).
    Permanent,
    /// Not-yet-curated records (`tmp_` / `TMP:`).
    Provisional,
}

impl Namespace {
    /// Returns the lowercase identifier prefix for this namespace.
    #[must_use]
    pub const fn prefix(self) -> &'static str {
        match self {
            Namespace::Permanent => "ont",
            Namespace::Provisional => "tmp",
        }
    }

    /// Returns the uppercase curie prefix for this namespace.
    #[must_use]
    pub const fn curie_prefix(self) -> &'static str {
        match self {
            Namespace::Permanent => "ONT",
            Namespace::Provisional => "TMP",
        }
    }
}

/// A normalized entity identifier.
///
/// Parsing accepts the internal form (`ont_0101431`, any case), the curie
/// form (`ONT:0101431`, any case), and a long-form URI whose last path
/// segment is one of the two. Everything else is rejected; identifiers are
/// permanent, so a typo caught here is a typo that never reaches the store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EntityId {
    ns: Namespace,
    fragment: String,
}

impl EntityId {
    /// Parses and normalizes an identifier from any accepted input form.
    pub fn parse(input: &str) -> ModelResult<Self> {
        // A URI only matters for its last path segment.
        let tail = input.rsplit('/').next().unwrap_or(input);
        let head = tail.get(..4).ok_or_else(|| ModelError::invalid_id(input))?;
        let ns = match head.to_ascii_lowercase().as_str() {
            "ont_" | "ont:" => Namespace::Permanent,
            "tmp_" | "tmp:" => Namespace::Provisional,
            _ => return Err(ModelError::invalid_id(input)),
        };
        let fragment = tail[4..].to_ascii_lowercase();
        if fragment.is_empty() {
            return Err(ModelError::invalid_id(input));
        }
        Ok(Self { ns, fragment })
    }

    /// Creates a provisional identifier from a bare fragment.
    #[must_use]
    pub fn provisional(fragment: impl Into<String>) -> Self {
        Self {
            ns: Namespace::Provisional,
            fragment: fragment.into().to_ascii_lowercase(),
        }
    }

    /// Returns the namespace of this identifier.
    #[must_use]
    pub const fn namespace(&self) -> Namespace {
        self.ns
    }

    /// Returns the fragment following the namespace prefix.
    #[must_use]
    pub fn fragment(&self) -> &str {
        &self.fragment
    }

    /// Returns true if this identifier is in the provisional namespace.
    #[must_use]
    pub const fn is_provisional(&self) -> bool {
        matches!(self.ns, Namespace::Provisional)
    }

    /// Renders the compact curie form, e.g. `ONT:0101431`.
    #[must_use]
    pub fn curie(&self) -> String {
        format!("{}:{}", self.ns.curie_prefix(), self.fragment)
    }

    /// Renders the long-form URI under the given base.
    #[must_use]
    pub fn iri(&self, base: &str) -> String {
        format!("{}/{}", base.trim_end_matches('/'), self)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.ns.prefix(), self.fragment)
    }
}

impl FromStr for EntityId {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for EntityId {
    type Error = ModelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<EntityId> for String {
    fn from(id: EntityId) -> Self {
        id.to_string()
    }
}
