use crate::completion::{strip_code_fences, CompletionClient};
use crate::csv_reader;
use crate::error::PipelineError;
use crate::normalize::{normalize_rows, NormalizedRow, Value};
use std::cmp::Ordering;
use std::sync::Arc;
use tracing::debug;

/// Row ordering contract for one synthesis call. Exactly one applies per
/// call: it is requested from the completion capability in the prompt and
/// then enforced locally, since the capability does not guarantee
/// compliance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowOrder {
    /// Ascending by the first group key. Numeric years and ISO dates
    /// compare chronologically under this ordering.
    GroupAscending,
    /// Descending by the first metric.
    MagnitudeDescending,
}

/// Synthesizes a concrete dataset for one chosen metric/dimension
/// combination via the completion capability, then decodes and normalizes
/// it.
pub struct DatasetSynthesizer {
    client: Arc<dyn CompletionClient>,
}

impl DatasetSynthesizer {
    pub fn new(client: Arc<dyn CompletionClient>) -> Self {
        Self { client }
    }

    /// Produce at most `max_rows` normalized rows for the request. Both
    /// `max_rows` and `order` are call-site decisions, not hidden
    /// constants.
    pub async fn synthesize(
        &self,
        request: &str,
        metrics: &[String],
        group_by: &[String],
        max_rows: usize,
        order: RowOrder,
    ) -> Result<Vec<NormalizedRow>, PipelineError> {
        let system = system_prompt(metrics, group_by, max_rows);
        let user = user_prompt(request, metrics, group_by, max_rows, order);

        let raw = self
            .client
            .complete(&system, &user)
            .await
            .map_err(|e| PipelineError::Synthesis(format!("completion request failed: {e}")))?;

        let csv_text = strip_code_fences(&raw);
        let raw_rows = csv_reader::decode_rows(&csv_text)
            .map_err(|e| PipelineError::Synthesis(format!("could not decode dataset: {e}")))?;
        let mut rows = normalize_rows(&raw_rows);

        if rows.is_empty() {
            return Err(PipelineError::Synthesis(
                "synthesized dataset has no data rows".to_string(),
            ));
        }
        validate_fields(&rows, metrics, group_by)?;

        rows.truncate(max_rows);
        enforce_order(&mut rows, metrics, group_by, order);

        debug!(rows = rows.len(), ?order, "dataset synthesized");
        Ok(rows)
    }
}

fn system_prompt(metrics: &[String], group_by: &[String], max_rows: usize) -> String {
    let columns: Vec<&str> = group_by
        .iter()
        .chain(metrics.iter())
        .map(String::as_str)
        .collect();
    format!(
        "You are a data analyst. Follow every rule below and reply with a \
         CSV header row and data rows only - no explanations, no code \
         fences.\n\
         - Columns, in this order: {}\n\
         - At most {} data rows\n\
         - Comma separated, header row first, plain CSV only",
        columns.join(", "),
        max_rows
    )
}

fn user_prompt(
    request: &str,
    metrics: &[String],
    group_by: &[String],
    max_rows: usize,
    order: RowOrder,
) -> String {
    let order_rule = match order {
        RowOrder::GroupAscending => {
            "Sort rows ascending by the group key; when the group key is a \
             year, month, or date, use chronological order."
        }
        RowOrder::MagnitudeDescending => "Sort rows in descending order of the first metric.",
    };
    format!(
        "User request: \"{}\"\n\
         metrics: {}\n\
         groups: {}\n\
         maxRows: {}\n\
         Group the rows by the chosen dimensions. Aggregate count-like \
         metrics by sum, and rate- or intensity-like metrics (magnitude, \
         depth) by mean.\n\
         {}\n\
         If the request names no period, cover the last 3 years.\n\
         Use the exact field keys above as the CSV header, not display \
         labels. Return CSV only, with no commentary.",
        request,
        metrics.join(", "),
        group_by.join(", "),
        max_rows,
        order_rule
    )
}

/// Reject the row set wholesale when any row is missing a requested field.
fn validate_fields(
    rows: &[NormalizedRow],
    metrics: &[String],
    group_by: &[String],
) -> Result<(), PipelineError> {
    for key in metrics.iter().chain(group_by.iter()) {
        let lower = key.to_lowercase();
        if rows.iter().any(|row| !row.contains_key(&lower)) {
            return Err(PipelineError::Synthesis(format!(
                "synthesized rows are missing the requested field '{key}'"
            )));
        }
    }
    Ok(())
}

fn enforce_order(
    rows: &mut [NormalizedRow],
    metrics: &[String],
    group_by: &[String],
    order: RowOrder,
) {
    match order {
        RowOrder::GroupAscending => {
            let Some(key) = group_by.first().map(|k| k.to_lowercase()) else {
                return;
            };
            rows.sort_by(|a, b| compare_values(a.get(&key), b.get(&key)));
        }
        RowOrder::MagnitudeDescending => {
            let Some(key) = metrics.first().map(|k| k.to_lowercase()) else {
                return;
            };
            rows.sort_by(|a, b| {
                let a = a.get(&key).map(Value::as_metric).unwrap_or(0.0);
                let b = b.get(&key).map(Value::as_metric).unwrap_or(0.0);
                b.partial_cmp(&a).unwrap_or(Ordering::Equal)
            });
        }
    }
}

/// Numeric comparison when both sides are numbers, lexicographic on the
/// rendered text otherwise (ISO dates order chronologically either way).
fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            x.partial_cmp(y).unwrap_or(Ordering::Equal)
        }
        (x, y) => {
            let x = x.map(|v| v.to_string()).unwrap_or_default();
            let y = y.map(|v| v.to_string()).unwrap_or_default();
            x.cmp(&y)
        }
    }
}
