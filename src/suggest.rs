use crate::schema::Schema;

/// One concrete metric × dimension combination offered for generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Suggestion {
    pub id: String,
    pub metrics: Vec<String>,
    pub group_by: Vec<String>,
    pub title: String,
}

/// Cap on the expanded combination list shown to the user.
pub const MAX_SUGGESTIONS: usize = 6;

/// Expand a ranked schema into one-metric-by-one-dimension proposals:
/// the Cartesian product of metrics × groupBy in list order, truncated to
/// [`MAX_SUGGESTIONS`]. The schema's own ranking is the only ordering.
pub fn expand_suggestions(schema: &Schema) -> Vec<Suggestion> {
    let mut suggestions = Vec::new();
    'product: for metric in &schema.metrics {
        for group in &schema.group_by {
            if suggestions.len() == MAX_SUGGESTIONS {
                break 'product;
            }
            suggestions.push(Suggestion {
                id: suggestion_id(&[metric.key.clone()], &[group.key.clone()]),
                metrics: vec![metric.key.clone()],
                group_by: vec![group.key.clone()],
                title: format!("{} × {}", metric.label, group.label),
            });
        }
    }
    suggestions
}

/// Deterministic id for a combination: re-deriving the same metric/group
/// choice yields the same id, so selections survive re-expansion.
pub fn suggestion_id(metrics: &[String], groups: &[String]) -> String {
    format!("{}__{}", metrics.join("-"), groups.join("-"))
}
