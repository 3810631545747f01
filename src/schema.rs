use crate::completion::{strip_code_fences, CompletionClient};
use crate::error::PipelineError;
use serde::Deserialize;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;

/// One candidate field: `key` is the machine identifier the dataset will
/// carry, `label` the human-facing name.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SchemaOption {
    pub key: String,
    pub label: String,
}

/// Ranked candidate fields for one request, most likely option first.
/// Immutable once resolved; a new request produces a new schema.
#[derive(Debug, Clone, Deserialize)]
pub struct Schema {
    pub metrics: Vec<SchemaOption>,
    #[serde(rename = "groupBy")]
    pub group_by: Vec<SchemaOption>,
}

const SYSTEM_PROMPT: &str = "\
You are a data visualization assistant. From the user's request, propose \
candidate metrics (measurable quantities) and groupBy dimensions \
(categorical or temporal axes to compare across). Reply with plain JSON \
only - no prose, no markdown code fences. Order each list with the most \
likely candidate first.

Output shape (example):
{
  \"metrics\": [{ \"key\": \"count\", \"label\": \"Count\" }],
  \"groupBy\": [{ \"key\": \"year\", \"label\": \"Year\" }]
}";

/// Turns a natural-language request into a ranked [`Schema`] via the
/// completion capability.
pub struct SchemaResolver {
    client: Arc<dyn CompletionClient>,
}

impl SchemaResolver {
    pub fn new(client: Arc<dyn CompletionClient>) -> Self {
        Self { client }
    }

    /// Resolve a request into a schema. No retry: a failure requires
    /// explicit re-submission by the user.
    pub async fn resolve(&self, request: &str) -> Result<Schema, PipelineError> {
        let request = request.trim();
        if request.is_empty() {
            return Err(PipelineError::SchemaParse("request is empty".to_string()));
        }

        let raw = self
            .client
            .complete(SYSTEM_PROMPT, request)
            .await
            .map_err(|e| PipelineError::SchemaParse(format!("completion request failed: {e}")))?;

        let cleaned = strip_code_fences(&raw);
        let mut schema: Schema = serde_json::from_str(&cleaned).map_err(|e| {
            PipelineError::SchemaParse(format!("response was not valid JSON: {e}"))
        })?;

        schema.metrics = dedup_options(schema.metrics);
        schema.group_by = dedup_options(schema.group_by);
        if schema.metrics.is_empty() || schema.group_by.is_empty() {
            return Err(PipelineError::SchemaParse(
                "schema needs at least one metric and one groupBy option".to_string(),
            ));
        }

        debug!(
            metrics = schema.metrics.len(),
            group_by = schema.group_by.len(),
            "schema resolved"
        );
        Ok(schema)
    }
}

/// Drop options with empty keys and later duplicates, preserving the
/// ranking order. Guarantees key uniqueness within the list.
fn dedup_options(options: Vec<SchemaOption>) -> Vec<SchemaOption> {
    let mut seen = HashSet::new();
    options
        .into_iter()
        .filter(|opt| !opt.key.is_empty() && seen.insert(opt.key.clone()))
        .collect()
}
