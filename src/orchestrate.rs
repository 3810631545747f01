use crate::completion::CompletionClient;
use crate::error::PipelineError;
use crate::normalize::NormalizedRow;
use crate::schema::{Schema, SchemaResolver};
use crate::suggest::{expand_suggestions, Suggestion};
use crate::synthesize::{DatasetSynthesizer, RowOrder};
use std::sync::Arc;
use tracing::{info, warn};

/// Where the interactive session currently stands. There is no terminal
/// step; the user can cycle indefinitely.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Input,
    Suggestions,
    Detail,
}

/// One completed synthesis: the suggestion that requested it and its
/// normalized rows, collected in selection order.
#[derive(Debug, Clone)]
pub struct ChartResult {
    pub suggestion: Suggestion,
    pub rows: Vec<NormalizedRow>,
}

/// The suggestion-driven session state machine:
/// `input -> suggestions -> detail`, with back-transitions.
///
/// Owns the active schema, the suggestion list, the selection, and the
/// chart results for one request generation; submitting a new request
/// discards all of them. All network-bound work is awaited sequentially -
/// there is no concurrent writer to this state.
pub struct Workbench {
    resolver: SchemaResolver,
    synthesizer: DatasetSynthesizer,
    max_rows: usize,
    row_order: RowOrder,
    step: Step,
    request: String,
    schema: Option<Schema>,
    suggestions: Vec<Suggestion>,
    selected: Vec<String>,
    results: Vec<ChartResult>,
}

impl Workbench {
    /// `max_rows` and `row_order` are the per-call synthesis contract this
    /// workbench applies to every generation.
    pub fn new(client: Arc<dyn CompletionClient>, max_rows: usize, row_order: RowOrder) -> Self {
        Self {
            resolver: SchemaResolver::new(client.clone()),
            synthesizer: DatasetSynthesizer::new(client),
            max_rows,
            row_order,
            step: Step::Input,
            request: String::new(),
            schema: None,
            suggestions: Vec::new(),
            selected: Vec::new(),
            results: Vec::new(),
        }
    }

    pub fn step(&self) -> Step {
        self.step
    }

    pub fn schema(&self) -> Option<&Schema> {
        self.schema.as_ref()
    }

    pub fn suggestions(&self) -> &[Suggestion] {
        &self.suggestions
    }

    pub fn selected(&self) -> &[String] {
        &self.selected
    }

    pub fn results(&self) -> &[ChartResult] {
        &self.results
    }

    /// Submit a request: resolve its schema and expand the suggestion list.
    ///
    /// On success the previous generation (suggestions, selection, results)
    /// is discarded and the session moves to `Suggestions`. On failure the
    /// session stays exactly where it was and the error is surfaced to the
    /// caller.
    pub async fn submit(&mut self, request: &str) -> Result<(), PipelineError> {
        let request = request.trim();
        if request.is_empty() {
            // Rejected before any network call is made.
            return Err(PipelineError::SchemaParse("request is empty".to_string()));
        }

        match self.resolver.resolve(request).await {
            Ok(schema) => {
                self.request = request.to_string();
                self.suggestions = expand_suggestions(&schema);
                self.schema = Some(schema);
                self.selected.clear();
                self.results.clear();
                self.step = Step::Suggestions;
                info!(suggestions = self.suggestions.len(), "request accepted");
                Ok(())
            }
            Err(err) => {
                warn!(%err, "schema resolution failed");
                Err(err)
            }
        }
    }

    /// Toggle a suggestion in the multi-select set. Unknown ids are
    /// ignored; selecting twice removes the selection again. Insertion
    /// order is what generation will replay.
    pub fn toggle_select(&mut self, id: &str) {
        if self.selected.iter().any(|s| s == id) {
            self.selected.retain(|s| s != id);
        } else if self.suggestions.iter().any(|s| s.id == id) {
            self.selected.push(id.to_string());
        }
    }

    /// Generate one dataset per selected suggestion, strictly sequentially
    /// in selection order.
    ///
    /// Each success appends a [`ChartResult`]; the first failure aborts the
    /// remaining sequence, drops the partial run, and returns the session
    /// to `Suggestions` with the selection intact so the user can retry
    /// without re-choosing.
    pub async fn generate(&mut self) -> Result<(), PipelineError> {
        if self.selected.is_empty() {
            return Err(PipelineError::Synthesis(
                "no suggestions selected".to_string(),
            ));
        }

        self.results.clear();
        for id in self.selected.clone() {
            let Some(suggestion) = self.suggestions.iter().find(|s| s.id == id).cloned() else {
                continue;
            };
            info!(id = %suggestion.id, "synthesizing dataset");
            match self
                .synthesizer
                .synthesize(
                    &self.request,
                    &suggestion.metrics,
                    &suggestion.group_by,
                    self.max_rows,
                    self.row_order,
                )
                .await
            {
                Ok(rows) => self.results.push(ChartResult { suggestion, rows }),
                Err(err) => {
                    warn!(id = %id, %err, "synthesis failed, aborting remaining selections");
                    self.results.clear();
                    self.step = Step::Suggestions;
                    return Err(err);
                }
            }
        }

        self.step = Step::Detail;
        Ok(())
    }

    /// Step back one state. State is kept; only a new submission discards
    /// the current generation.
    pub fn back(&mut self) {
        self.step = match self.step {
            Step::Detail => Step::Suggestions,
            Step::Suggestions | Step::Input => Step::Input,
        };
    }
}
