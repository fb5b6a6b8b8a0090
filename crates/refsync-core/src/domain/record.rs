//! Source records and remote record references
//!
//! A [`SourceRecord`] is the read-only snapshot of a catalog item that the
//! property mapper projects onto the remote schema. Values that the catalog
//! computes lazily (citations, attachment paths) are not part of the record;
//! they are requested through the record accessor port when a field needs them.

use serde::{Deserialize, Serialize};

use super::newtypes::{ItemId, RemoteRecordId};

/// Role of a contributor on a catalog item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CreatorRole {
    Author,
    Editor,
    /// Any other contributor type (translator, contributor, ...)
    Other,
}

impl Default for CreatorRole {
    fn default() -> Self {
        CreatorRole::Author
    }
}

/// A single contributor on a catalog item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Creator {
    /// Given name; absent for single-field names (institutions)
    #[serde(default)]
    pub first_name: Option<String>,
    /// Family name, or the full name for single-field names
    pub last_name: String,
    #[serde(default)]
    pub role: CreatorRole,
}

impl Creator {
    /// Creates an author with a two-part name
    pub fn author(first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        Self {
            first_name: Some(first_name.into()),
            last_name: last_name.into(),
            role: CreatorRole::Author,
        }
    }

    /// Creates an editor with a two-part name
    pub fn editor(first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        Self {
            first_name: Some(first_name.into()),
            last_name: last_name.into(),
            role: CreatorRole::Editor,
        }
    }

    /// Name formatted as "Last, First", or just the last name for
    /// single-field names
    pub fn display_name(&self) -> String {
        match self.first_name.as_deref().map(str::trim) {
            Some(first) if !first.is_empty() => format!("{}, {}", self.last_name, first),
            _ => self.last_name.clone(),
        }
    }
}

/// Reference to the remote record previously created for a catalog item
///
/// Both halves are optional: an item that has never been synced carries
/// an empty reference.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteRecordRef {
    #[serde(default)]
    pub id: Option<RemoteRecordId>,
    #[serde(default)]
    pub url: Option<String>,
}

impl RemoteRecordRef {
    /// A reference with no prior remote record
    pub fn none() -> Self {
        Self::default()
    }

    /// A reference to an existing remote record
    pub fn existing(id: RemoteRecordId, url: impl Into<String>) -> Self {
        Self {
            id: Some(id),
            url: Some(url.into()),
        }
    }

    /// Returns true if a prior remote identifier is stored
    pub fn is_linked(&self) -> bool {
        self.id.is_some()
    }
}

/// Result of a successful create or update call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpsertOutcome {
    /// Identifier of the created or updated remote record
    pub id: RemoteRecordId,
    /// Browser URL of the remote record
    pub url: String,
}

impl From<UpsertOutcome> for RemoteRecordRef {
    fn from(outcome: UpsertOutcome) -> Self {
        RemoteRecordRef {
            id: Some(outcome.id),
            url: Some(outcome.url),
        }
    }
}

/// Snapshot of a catalog item as read through the record accessor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRecord {
    pub id: ItemId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub creators: Vec<Creator>,
    #[serde(default, rename = "abstract")]
    pub abstract_note: Option<String>,
    #[serde(default)]
    pub doi: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    /// Publication year parsed from the item's date field
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Remote record previously stored against this item
    #[serde(default)]
    pub remote: RemoteRecordRef,
}

impl SourceRecord {
    /// Creates a record with only an identifier and a title
    pub fn new(id: ItemId, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            creators: Vec::new(),
            abstract_note: None,
            doi: None,
            url: None,
            year: None,
            tags: Vec::new(),
            remote: RemoteRecordRef::none(),
        }
    }

    /// Display names of all contributors with the given role, in catalog order
    pub fn creator_names(&self, role: CreatorRole) -> Vec<String> {
        self.creators
            .iter()
            .filter(|c| c.role == role)
            .map(Creator::display_name)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(key: &str) -> ItemId {
        key.parse().unwrap()
    }

    #[test]
    fn test_display_name_two_part() {
        let creator = Creator::author("Ada", "Lovelace");
        assert_eq!(creator.display_name(), "Lovelace, Ada");
    }

    #[test]
    fn test_display_name_single_field() {
        let creator = Creator {
            first_name: None,
            last_name: "World Health Organization".to_string(),
            role: CreatorRole::Author,
        };
        assert_eq!(creator.display_name(), "World Health Organization");

        let blank_first = Creator {
            first_name: Some("  ".to_string()),
            last_name: "Plato".to_string(),
            role: CreatorRole::Author,
        };
        assert_eq!(blank_first.display_name(), "Plato");
    }

    #[test]
    fn test_creator_names_filters_by_role() {
        let mut record = SourceRecord::new(item("K1"), "On Computable Numbers");
        record.creators = vec![
            Creator::author("Alan", "Turing"),
            Creator::editor("Jack", "Copeland"),
            Creator::author("Alonzo", "Church"),
        ];

        assert_eq!(
            record.creator_names(CreatorRole::Author),
            vec!["Turing, Alan".to_string(), "Church, Alonzo".to_string()]
        );
        assert_eq!(
            record.creator_names(CreatorRole::Editor),
            vec!["Copeland, Jack".to_string()]
        );
    }

    #[test]
    fn test_remote_ref_from_outcome() {
        let outcome = UpsertOutcome {
            id: "R2".parse().unwrap(),
            url: "https://www.notion.so/R2".to_string(),
        };
        let remote: RemoteRecordRef = outcome.into();
        assert!(remote.is_linked());
        assert_eq!(remote.url.as_deref(), Some("https://www.notion.so/R2"));
    }

    #[test]
    fn test_record_deserializes_with_defaults() {
        let json = r#"{"id": "ABCD2345", "title": "Minimal", "abstract": "Short"}"#;
        let record: SourceRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.id, item("ABCD2345"));
        assert_eq!(record.abstract_note.as_deref(), Some("Short"));
        assert!(record.creators.is_empty());
        assert!(!record.remote.is_linked());
    }
}
