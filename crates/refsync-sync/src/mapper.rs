//! Property mapper - projects catalog records onto the remote schema
//!
//! The mapper holds a fixed, ordered list of [`FieldSpec`] rules. For each
//! record it keeps only the rules whose name and kind exist in the remote
//! schema, runs their value producers and assembles a [`PropertyPayload`].
//!
//! ## Value rules
//!
//! - Free text is truncated to [`MAX_TEXT_LEN`] Unicode scalar values
//! - Multi-valued text (creator lists) is joined with `\n`, then truncated
//! - Tag labels have every `,` replaced with `;` (the remote reserves commas
//!   as option separators)
//! - The `Name` title falls back from the in-text citation to the full
//!   citation and finally to the raw title
//!
//! Empty values are still sent (as empty text, `null` or `[]`); only fields
//! absent from the schema are left out.

use std::collections::HashSet;
use std::sync::Arc;

use refsync_core::domain::{
    CreatorRole, PropertyKind, PropertyPayload, PropertyValue, SourceRecord,
};
use refsync_core::ports::{CitationFormat, IRecordAccessor};
use tracing::{debug, warn};

use crate::schema_cache::RemoteSchemaCache;
use crate::SyncError;

/// Maximum length of a text value sent to the remote, in Unicode scalar values
pub const MAX_TEXT_LEN: usize = 2000;

// ============================================================================
// Value helpers
// ============================================================================

/// Truncates text to [`MAX_TEXT_LEN`] characters
pub fn truncate_text(text: &str) -> String {
    match text.char_indices().nth(MAX_TEXT_LEN) {
        Some((end, _)) => text[..end].to_string(),
        None => text.to_string(),
    }
}

/// Replaces every comma in a tag label with a semicolon
pub fn sanitize_tag(tag: &str) -> String {
    tag.replace(',', ";")
}

/// Joins values with newlines and truncates the result
pub fn join_lines<I, S>(values: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let joined = values
        .into_iter()
        .map(|v| v.as_ref().to_string())
        .collect::<Vec<_>>()
        .join("\n");
    truncate_text(&joined)
}

/// Sanitizes tag labels, dropping blanks and duplicates while keeping order
pub fn sanitize_tags<I, S>(tags: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    tags.into_iter()
        .map(|t| sanitize_tag(t.as_ref().trim()))
        .filter(|t| !t.is_empty())
        .filter(|t| seen.insert(t.clone()))
        .collect()
}

// ============================================================================
// FieldSpec
// ============================================================================

/// Where a field's value comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldSource {
    /// In-text citation, then full citation, then raw title
    CitationName,
    Title,
    Authors,
    Editors,
    Abstract,
    Doi,
    Url,
    Year,
    Tags,
    /// Full bibliography entry, formatted by the catalog
    FullCitation,
    /// Short in-text citation, formatted by the catalog
    InTextCitation,
    /// Local path of the primary attachment
    FilePath,
}

/// A candidate mapping rule: remote field name, required kind and producer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: PropertyKind,
    pub source: FieldSource,
}

impl FieldSpec {
    pub const fn new(name: &'static str, kind: PropertyKind, source: FieldSource) -> Self {
        Self { name, kind, source }
    }
}

/// Canonical field set, in payload order
pub const DEFAULT_FIELDS: &[FieldSpec] = &[
    FieldSpec::new("Name", PropertyKind::Title, FieldSource::CitationName),
    FieldSpec::new("Title", PropertyKind::RichText, FieldSource::Title),
    FieldSpec::new("Authors", PropertyKind::RichText, FieldSource::Authors),
    FieldSpec::new("Editors", PropertyKind::RichText, FieldSource::Editors),
    FieldSpec::new("Abstract", PropertyKind::RichText, FieldSource::Abstract),
    FieldSpec::new("DOI", PropertyKind::RichText, FieldSource::Doi),
    FieldSpec::new("URL", PropertyKind::Url, FieldSource::Url),
    FieldSpec::new("Year", PropertyKind::Number, FieldSource::Year),
    FieldSpec::new("Tags", PropertyKind::MultiSelect, FieldSource::Tags),
    FieldSpec::new("Full Citation", PropertyKind::RichText, FieldSource::FullCitation),
    FieldSpec::new("In-Text Citation", PropertyKind::RichText, FieldSource::InTextCitation),
    FieldSpec::new("File Path", PropertyKind::RichText, FieldSource::FilePath),
];

/// Raw value produced by a source before it is shaped into a field kind
enum Produced {
    Text(String),
    Number(Option<f64>),
    Labels(Vec<String>),
}

impl Produced {
    fn into_value(self, spec: &FieldSpec) -> Result<PropertyValue, SyncError> {
        match (spec.kind, self) {
            (PropertyKind::Title, Produced::Text(t)) => Ok(PropertyValue::Title(truncate_text(&t))),
            (PropertyKind::RichText, Produced::Text(t)) => {
                Ok(PropertyValue::RichText(truncate_text(&t)))
            }
            (PropertyKind::Url, Produced::Text(t)) => {
                Ok(PropertyValue::Url(Some(t).filter(|u| !u.is_empty())))
            }
            (PropertyKind::Number, Produced::Number(n)) => Ok(PropertyValue::Number(n)),
            (PropertyKind::MultiSelect, Produced::Labels(labels)) => {
                Ok(PropertyValue::MultiSelect(labels))
            }
            (kind, _) => Err(SyncError::Mapping {
                field: spec.name.to_string(),
                message: format!("source {:?} cannot produce a {kind} value", spec.source),
            }),
        }
    }
}

// ============================================================================
// PropertyMapper
// ============================================================================

/// Builds schema-filtered payloads for catalog records
pub struct PropertyMapper {
    schema: Arc<RemoteSchemaCache>,
    accessor: Arc<dyn IRecordAccessor>,
    fields: Vec<FieldSpec>,
}

impl PropertyMapper {
    /// Creates a mapper with the canonical field set
    pub fn new(schema: Arc<RemoteSchemaCache>, accessor: Arc<dyn IRecordAccessor>) -> Self {
        Self::with_fields(schema, accessor, DEFAULT_FIELDS.to_vec())
    }

    /// Creates a mapper with a custom field list
    ///
    /// Later rules reusing an earlier rule's name are dropped.
    pub fn with_fields(
        schema: Arc<RemoteSchemaCache>,
        accessor: Arc<dyn IRecordAccessor>,
        fields: Vec<FieldSpec>,
    ) -> Self {
        let mut names = HashSet::new();
        let fields = fields
            .into_iter()
            .filter(|spec| {
                let unique = names.insert(spec.name);
                if !unique {
                    warn!(field = spec.name, "Duplicate field rule ignored");
                }
                unique
            })
            .collect();

        Self {
            schema,
            accessor,
            fields,
        }
    }

    /// Field rules in payload order
    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    /// Builds the payload for one record
    ///
    /// # Errors
    /// - [`SyncError::Remote`] if the schema cannot be fetched
    /// - [`SyncError::Mapping`] if a producer fails
    pub async fn build_payload(&self, record: &SourceRecord) -> Result<PropertyPayload, SyncError> {
        let schema = self.schema.get_schema().await?;
        let mut payload = PropertyPayload::new();

        for spec in self.fields.iter().filter(|s| schema.has_field(s.name, s.kind)) {
            let value = self.produce(spec, record).await?.into_value(spec)?;
            payload.insert(spec.name, value);
        }

        debug!(
            item_id = %record.id,
            fields = payload.len(),
            "Built property payload"
        );
        Ok(payload)
    }

    async fn produce(&self, spec: &FieldSpec, record: &SourceRecord) -> Result<Produced, SyncError> {
        let produced = match spec.source {
            FieldSource::CitationName => {
                let mut name = self.citation(spec, record, CitationFormat::InText).await?;
                if name.is_empty() {
                    name = self.citation(spec, record, CitationFormat::Bibliography).await?;
                }
                if name.is_empty() {
                    name = record.title.clone();
                }
                Produced::Text(name)
            }
            FieldSource::Title => Produced::Text(record.title.clone()),
            FieldSource::Authors => Produced::Text(join_lines(record.creator_names(CreatorRole::Author))),
            FieldSource::Editors => Produced::Text(join_lines(record.creator_names(CreatorRole::Editor))),
            FieldSource::Abstract => Produced::Text(record.abstract_note.clone().unwrap_or_default()),
            FieldSource::Doi => Produced::Text(record.doi.clone().unwrap_or_default()),
            FieldSource::Url => Produced::Text(record.url.clone().unwrap_or_default()),
            FieldSource::Year => Produced::Number(record.year.map(f64::from)),
            FieldSource::Tags => Produced::Labels(sanitize_tags(&record.tags)),
            FieldSource::FullCitation => {
                Produced::Text(self.citation(spec, record, CitationFormat::Bibliography).await?)
            }
            FieldSource::InTextCitation => {
                Produced::Text(self.citation(spec, record, CitationFormat::InText).await?)
            }
            FieldSource::FilePath => {
                let path = self
                    .accessor
                    .resolve_file_path(&record.id)
                    .await
                    .map_err(|e| mapping_error(spec, e))?;
                Produced::Text(path.map(|p| p.display().to_string()).unwrap_or_default())
            }
        };
        Ok(produced)
    }

    async fn citation(
        &self,
        spec: &FieldSpec,
        record: &SourceRecord,
        format: CitationFormat,
    ) -> Result<String, SyncError> {
        let citation = self
            .accessor
            .format_citation(&record.id, format)
            .await
            .map_err(|e| mapping_error(spec, e))?;
        Ok(citation.map(|c| c.trim().to_string()).unwrap_or_default())
    }
}

fn mapping_error(spec: &FieldSpec, err: anyhow::Error) -> SyncError {
    SyncError::Mapping {
        field: spec.name.to_string(),
        message: format!("{err:#}"),
    }
}
