use crate::error::PipelineError;
use crate::normalize::{NormalizedRow, Value};
use crate::palette::ColorPalette;

/// How one series is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeriesKind {
    Line,
    Bar,
    Pie,
    Scatter,
}

/// One rendered series: the metric key that feeds it, its kind, and its
/// palette color.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeriesEncoding {
    pub key: String,
    pub kind: SeriesKind,
    pub color: &'static str,
}

/// The mapping from normalized fields to visual channels. Derived, never
/// persisted; recomputed whenever rows or chosen metrics change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Encoding {
    pub axis_key: String,
    pub series: Vec<SeriesEncoding>,
}

/// Derive the encoding for a normalized row set.
///
/// Axis selection tries, in order, every chosen groupBy key, then `year`,
/// then `date` - the first one present in the first row wins. The
/// user-chosen dimensions deliberately outrank the temporal fallbacks, and
/// `year` outranks `date`.
pub fn resolve_encoding(
    rows: &[NormalizedRow],
    metric_kinds: &[(String, SeriesKind)],
    group_by: &[String],
) -> Result<Encoding, PipelineError> {
    if rows.is_empty() || metric_kinds.is_empty() || group_by.is_empty() {
        return Err(PipelineError::Encoding(
            "rows, metrics, and groupBy must all be non-empty".to_string(),
        ));
    }

    let first_row = &rows[0];
    let axis_key = group_by
        .iter()
        .map(|k| k.to_lowercase())
        .chain(["year".to_string(), "date".to_string()])
        .find(|k| first_row.contains_key(k))
        .ok_or_else(|| {
            PipelineError::Encoding("no axis candidate present in the data".to_string())
        })?;

    // Pie mode is all-or-nothing: when every metric is a pie, the whole
    // encoding collapses to a single pie over the first metric.
    let all_pie = metric_kinds.iter().all(|(_, kind)| *kind == SeriesKind::Pie);
    let chosen = if all_pie {
        &metric_kinds[..1]
    } else {
        metric_kinds
    };

    let palette = ColorPalette::default_series();
    let series = chosen
        .iter()
        .enumerate()
        .map(|(index, (key, kind))| SeriesEncoding {
            key: key.to_lowercase(),
            kind: *kind,
            color: palette.color_for(index),
        })
        .collect();

    Ok(Encoding { axis_key, series })
}

/// Project rows down to the axis value plus one numeric column per series,
/// in encoding order. Missing or non-numeric metric cells read as zero so
/// every point stays drawable.
pub fn project_rows(rows: &[NormalizedRow], encoding: &Encoding) -> Vec<(Value, Vec<f64>)> {
    rows.iter()
        .map(|row| {
            let axis = row.get(&encoding.axis_key).cloned().unwrap_or(Value::Missing);
            let values = encoding
                .series
                .iter()
                .map(|s| row.get(&s.key).map(Value::as_metric).unwrap_or(0.0))
                .collect();
            (axis, values)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::csv_reader::RawRow;
    use crate::normalize::normalize_rows;

    fn rows(header: &[&str], data: &[&[&str]]) -> Vec<NormalizedRow> {
        let raw: Vec<RawRow> = data
            .iter()
            .map(|cells| {
                header
                    .iter()
                    .zip(cells.iter())
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect()
            })
            .collect();
        normalize_rows(&raw)
    }

    fn kinds(pairs: &[(&str, SeriesKind)]) -> Vec<(String, SeriesKind)> {
        pairs.iter().map(|(k, kind)| (k.to_string(), *kind)).collect()
    }

    fn groups(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn test_axis_prefers_group_by() {
        let rows = rows(&["region", "year", "count"], &[&["Kanto", "2020", "3"]]);
        let encoding = resolve_encoding(
            &rows,
            &kinds(&[("count", SeriesKind::Line)]),
            &groups(&["region"]),
        )
        .unwrap();
        assert_eq!(encoding.axis_key, "region");
    }

    #[test]
    fn test_axis_falls_back_to_year_before_date() {
        let rows = rows(&["date", "count"], &[&["2020-05-01", "12"]]);
        // The derived "year" field outranks "date" even though only "date"
        // was synthesized.
        let encoding = resolve_encoding(
            &rows,
            &kinds(&[("count", SeriesKind::Bar)]),
            &groups(&["month"]),
        )
        .unwrap();
        assert_eq!(encoding.axis_key, "year");
    }

    #[test]
    fn test_axis_resolution_is_deterministic() {
        let rows = rows(&["year", "count"], &[&["2020", "3"]]);
        let metric_kinds = kinds(&[("count", SeriesKind::Line)]);
        let group_by = groups(&["year"]);
        let first = resolve_encoding(&rows, &metric_kinds, &group_by).unwrap();
        for _ in 0..10 {
            let again = resolve_encoding(&rows, &metric_kinds, &group_by).unwrap();
            assert_eq!(again.axis_key, first.axis_key);
        }
    }

    #[test]
    fn test_no_axis_candidate_fails() {
        let rows = rows(&["count"], &[&["3"]]);
        let err = resolve_encoding(
            &rows,
            &kinds(&[("count", SeriesKind::Line)]),
            &groups(&["region"]),
        )
        .unwrap_err();
        assert!(matches!(err, PipelineError::Encoding(_)));
    }

    #[test]
    fn test_empty_inputs_fail() {
        let populated = rows(&["year", "count"], &[&["2020", "3"]]);
        let metric_kinds = kinds(&[("count", SeriesKind::Line)]);
        assert!(resolve_encoding(&[], &metric_kinds, &groups(&["year"])).is_err());
        assert!(resolve_encoding(&populated, &[], &groups(&["year"])).is_err());
        assert!(resolve_encoding(&populated, &metric_kinds, &[]).is_err());
    }

    #[test]
    fn test_pie_collapses_to_first_metric() {
        let rows = rows(
            &["year", "count", "avg_mag"],
            &[&["2020", "3", "5.5"]],
        );
        let encoding = resolve_encoding(
            &rows,
            &kinds(&[("count", SeriesKind::Pie), ("avg_mag", SeriesKind::Pie)]),
            &groups(&["year"]),
        )
        .unwrap();
        assert_eq!(encoding.series.len(), 1);
        assert_eq!(encoding.series[0].key, "count");
    }

    #[test]
    fn test_mixed_kinds_keep_all_series() {
        let rows = rows(
            &["year", "count", "avg_mag"],
            &[&["2020", "3", "5.5"]],
        );
        let encoding = resolve_encoding(
            &rows,
            &kinds(&[("count", SeriesKind::Pie), ("avg_mag", SeriesKind::Line)]),
            &groups(&["year"]),
        )
        .unwrap();
        assert_eq!(encoding.series.len(), 2);
    }

    #[test]
    fn test_series_colors_follow_palette_order() {
        let rows = rows(
            &["year", "a", "b"],
            &[&["2020", "1", "2"]],
        );
        let encoding = resolve_encoding(
            &rows,
            &kinds(&[("a", SeriesKind::Line), ("b", SeriesKind::Line)]),
            &groups(&["year"]),
        )
        .unwrap();
        assert_eq!(encoding.series[0].color, "#8884d8");
        assert_eq!(encoding.series[1].color, "#82ca9d");
    }

    #[test]
    fn test_project_rows_zero_fills_missing_metrics() {
        let rows = rows(
            &["year", "count", "avg_mag"],
            &[&["2020", "3", ""], &["2021", "4", "5.5"]],
        );
        let encoding = resolve_encoding(
            &rows,
            &kinds(&[("count", SeriesKind::Line), ("avg_mag", SeriesKind::Line)]),
            &groups(&["year"]),
        )
        .unwrap();
        let projected = project_rows(&rows, &encoding);
        assert_eq!(projected[0].1, vec![3.0, 0.0]);
        assert_eq!(projected[1].1, vec![4.0, 5.5]);
    }
}
