use crate::completion::CompletionClient;
use crate::normalize::NormalizedRow;
use anyhow::{Context, Result};

/// How many rows of the dataset the analysis prompt quotes as a sample.
const SAMPLE_ROWS: usize = 5;

const SYSTEM_PROMPT: &str = "\
You are a data analysis expert. Given a chart's data structure and a \
sample of its rows, describe the main trends and anything notable, \
concisely and in plain language.";

/// Ask the completion capability for a short prose summary of a generated
/// chart. Auxiliary feature: failures bubble to the caller and never move
/// the session state machine.
pub async fn summarize_chart(
    client: &dyn CompletionClient,
    rows: &[NormalizedRow],
    axis_key: &str,
    series_keys: &[String],
) -> Result<String> {
    let sample = &rows[..rows.len().min(SAMPLE_ROWS)];
    let sample_json =
        serde_json::to_string_pretty(sample).context("could not serialize sample rows")?;

    let user = format!(
        "Data structure:\n  X axis: {}\n  Y axis: {}\nSample rows:\n{}\n\
         Summarize the key points of this data in 5 to 7 sentences.",
        axis_key,
        series_keys.join(", "),
        sample_json
    );

    let text = client.complete(SYSTEM_PROMPT, &user).await?;
    Ok(text.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::Value;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct CapturingClient {
        seen_user: Mutex<String>,
    }

    #[async_trait]
    impl CompletionClient for CapturingClient {
        async fn complete(&self, _system: &str, user: &str) -> Result<String> {
            *self.seen_user.lock().unwrap() = user.to_string();
            Ok("  A clear upward trend.  ".to_string())
        }
    }

    #[tokio::test]
    async fn test_summary_includes_structure_and_trims() {
        let client = CapturingClient {
            seen_user: Mutex::new(String::new()),
        };
        let rows: Vec<NormalizedRow> = (0..8)
            .map(|i| {
                [
                    ("year".to_string(), Value::Number(2015.0 + i as f64)),
                    ("count".to_string(), Value::Number(i as f64)),
                ]
                .into_iter()
                .collect()
            })
            .collect();

        let summary = summarize_chart(&client, &rows, "year", &["count".to_string()])
            .await
            .unwrap();
        assert_eq!(summary, "A clear upward trend.");

        let prompt = client.seen_user.lock().unwrap().clone();
        assert!(prompt.contains("X axis: year"));
        assert!(prompt.contains("Y axis: count"));
        // Only the first SAMPLE_ROWS rows are quoted
        assert!(prompt.contains("2015"));
        assert!(!prompt.contains("2022"));
    }
}
