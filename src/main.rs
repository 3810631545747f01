use anyhow::{anyhow, Context, Result};
use clap::Parser;
use std::sync::Arc;

use promptgraph::analysis::summarize_chart;
use promptgraph::encode::{project_rows, resolve_encoding, Encoding, SeriesKind};
use promptgraph::normalize::NormalizedRow;
use promptgraph::{CompletionConfig, OpenAiClient, RowOrder, Workbench};

#[derive(Parser, Debug)]
#[command(name = "promptgraph")]
#[command(about = "Generate chart-ready datasets from a natural-language request", long_about = None)]
struct Args {
    /// Natural-language description of the data to visualize
    /// (e.g., "earthquake activity in Japan over the last decade")
    request: String,

    /// Suggestion numbers to generate (1-based, comma separated), or "all".
    /// Defaults to the top-ranked suggestion.
    #[arg(long, default_value = "1")]
    select: String,

    /// Maximum data rows per synthesized dataset
    #[arg(long, default_value_t = 25)]
    max_rows: usize,

    /// Row ordering contract: "group" (ascending by group key,
    /// chronological for temporal keys) or "magnitude" (descending by the
    /// first metric)
    #[arg(long, default_value = "group")]
    order: String,

    /// Series kind applied to every metric: line, bar, pie, or scatter
    #[arg(long, default_value = "line")]
    kind: String,

    /// Also ask the model for a prose summary of each generated chart
    #[arg(long)]
    analyze: bool,

    /// Completion model name
    #[arg(long)]
    model: Option<String>,

    /// Completion endpoint URL
    #[arg(long)]
    endpoint: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    let order = match args.order.as_str() {
        "group" => RowOrder::GroupAscending,
        "magnitude" => RowOrder::MagnitudeDescending,
        other => return Err(anyhow!("unknown row order '{other}' (use group or magnitude)")),
    };
    let kind = match args.kind.as_str() {
        "line" => SeriesKind::Line,
        "bar" => SeriesKind::Bar,
        "pie" => SeriesKind::Pie,
        "scatter" => SeriesKind::Scatter,
        other => return Err(anyhow!("unknown series kind '{other}'")),
    };

    // The only ambient read: the credential and overrides are folded into
    // the injected config here, never inside the pipeline.
    let api_key = std::env::var("OPENAI_API_KEY")
        .context("OPENAI_API_KEY must be set to reach the completion endpoint")?;
    let mut config = CompletionConfig {
        api_key,
        ..CompletionConfig::default()
    };
    if let Some(model) = args.model {
        config.model = model;
    }
    if let Some(endpoint) = args.endpoint {
        config.endpoint = endpoint;
    }

    let client = Arc::new(OpenAiClient::new(config));
    let mut workbench = Workbench::new(client.clone(), args.max_rows, order);

    workbench.submit(&args.request).await?;

    println!("Suggestions:");
    for (i, suggestion) in workbench.suggestions().iter().enumerate() {
        println!(
            "  {}. {}  (metric: {}; axis: {})",
            i + 1,
            suggestion.title,
            suggestion.metrics.join(", "),
            suggestion.group_by.join(", ")
        );
    }

    let picks = parse_selection(&args.select, workbench.suggestions().len())?;
    let ids: Vec<String> = picks
        .iter()
        .map(|&i| workbench.suggestions()[i].id.clone())
        .collect();
    for id in &ids {
        workbench.toggle_select(id);
    }

    workbench.generate().await?;

    for result in workbench.results() {
        let metric_kinds: Vec<(String, SeriesKind)> = result
            .suggestion
            .metrics
            .iter()
            .map(|m| (m.clone(), kind))
            .collect();
        let encoding = resolve_encoding(&result.rows, &metric_kinds, &result.suggestion.group_by)?;

        println!("\n== {} ==", result.suggestion.title);
        print_table(&result.rows, &encoding);
        for series in &encoding.series {
            println!("  series '{}': {:?} in {}", series.key, series.kind, series.color);
        }

        if args.analyze {
            let series_keys: Vec<String> =
                encoding.series.iter().map(|s| s.key.clone()).collect();
            let summary =
                summarize_chart(&*client, &result.rows, &encoding.axis_key, &series_keys)
                    .await
                    .context("chart analysis failed")?;
            println!("\n{summary}");
        }
    }

    Ok(())
}

/// Parse "all" or a 1-based comma-separated list into 0-based indices.
fn parse_selection(input: &str, available: usize) -> Result<Vec<usize>> {
    if available == 0 {
        return Err(anyhow!("no suggestions to select from"));
    }
    if input.trim() == "all" {
        return Ok((0..available).collect());
    }
    let mut picks = Vec::new();
    for part in input.split(',') {
        let n: usize = part
            .trim()
            .parse()
            .map_err(|_| anyhow!("invalid selection '{part}'"))?;
        if n == 0 || n > available {
            return Err(anyhow!("selection {n} is out of range (1..={available})"));
        }
        picks.push(n - 1);
    }
    Ok(picks)
}

/// Print a generated dataset as an aligned text table: the axis column
/// first, then one numeric column per series.
fn print_table(rows: &[NormalizedRow], encoding: &Encoding) {
    let projected = project_rows(rows, encoding);

    let mut headers = vec![encoding.axis_key.clone()];
    headers.extend(encoding.series.iter().map(|s| s.key.clone()));

    let mut cells: Vec<Vec<String>> = vec![headers];
    for (axis, values) in &projected {
        let mut row = vec![axis.to_string()];
        row.extend(values.iter().map(|v| format_number(*v)));
        cells.push(row);
    }

    let columns = cells[0].len();
    let widths: Vec<usize> = (0..columns)
        .map(|c| cells.iter().map(|row| row[c].len()).max().unwrap_or(0))
        .collect();

    for (i, row) in cells.iter().enumerate() {
        let line: Vec<String> = row
            .iter()
            .zip(&widths)
            .map(|(cell, w)| format!("{cell:>width$}", width = *w))
            .collect();
        println!("  {}", line.join("  "));
        if i == 0 {
            println!("  {}", widths.iter().map(|w| "-".repeat(*w)).collect::<Vec<_>>().join("  "));
        }
    }
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}
