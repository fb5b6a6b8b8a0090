//! Schema command - Show the properties of the target database
//!
//! Lists every property of the remote database with its kind and marks the
//! ones the default field mapping writes to. Fields the mapping expects but
//! the database lacks (or has with another kind) are reported so the user
//! can fix the database before syncing.

use anyhow::{Context, Result};
use clap::Args;
use refsync_core::domain::{PropertyKind, RemoteSchema};
use refsync_sync::mapper::DEFAULT_FIELDS;
use refsync_sync::FieldSpec;
use serde_json::json;
use tracing::info;

use super::CommandContext;
use crate::output::{count_noun, get_formatter};

/// Schema command
#[derive(Debug, Args)]
pub struct SchemaCommand {}

impl SchemaCommand {
    pub async fn execute(&self, ctx: &CommandContext) -> Result<()> {
        let formatter = get_formatter(ctx.format);
        let connection = ctx.connect().await?;

        let schema = connection
            .engine
            .schema()
            .await
            .context("Failed to retrieve database schema")?;
        info!(fields = schema.len(), "Retrieved database schema");

        let missing = unmatched_fields(&schema, DEFAULT_FIELDS);

        if ctx.format.is_json() {
            let properties: Vec<_> = schema
                .fields()
                .into_iter()
                .map(|(name, kind)| {
                    json!({
                        "name": name,
                        "kind": kind.to_string(),
                        "mapped": is_mapped(name, kind, DEFAULT_FIELDS),
                    })
                })
                .collect();
            let missing: Vec<_> = missing
                .iter()
                .map(|f| json!({"name": f.name, "kind": f.kind.to_string()}))
                .collect();
            formatter.print_json(&json!({
                "database_id": connection.engine.settings().database_id,
                "properties": properties,
                "missing": missing,
            }));
            return Ok(());
        }

        formatter.success(&format!(
            "Database {} has {}",
            connection.engine.settings().database_id,
            count_noun(schema.len(), "field")
        ));
        for (name, kind) in schema.fields() {
            let marker = if is_mapped(name, kind, DEFAULT_FIELDS) {
                "  (mapped)"
            } else {
                ""
            };
            formatter.field(name, &format!("{kind}{marker}"));
        }

        if !missing.is_empty() {
            formatter.info("");
            formatter.warn(&format!(
                "{} not written (absent or of another kind):",
                count_noun(missing.len(), "mapped field")
            ));
            for field in missing {
                formatter.field(field.name, &format!("expected {}", field.kind));
            }
        }

        Ok(())
    }
}

fn is_mapped(name: &str, kind: PropertyKind, fields: &[FieldSpec]) -> bool {
    fields.iter().any(|f| f.name == name && f.kind == kind)
}

/// Mapping rules the schema cannot accept
fn unmatched_fields<'a>(schema: &RemoteSchema, fields: &'a [FieldSpec]) -> Vec<&'a FieldSpec> {
    fields
        .iter()
        .filter(|f| !schema.has_field(f.name, f.kind))
        .collect()
}
